//! Behaviour tests for dependency-ordered service lifecycles.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use eyre::{WrapErr, eyre};
use lintel::config::ContainerConfig;
use lintel::container::{
    domain::{
        DependencyKind, Injector, LifecycleEvent, LifecycleEventKind, ServiceMode, ServiceName,
        ServiceState, ServiceValue,
    },
    ports::{Service, StartContext, StartError, StopContext},
    services::{ContainerError, ControllerHandle, ServiceRegistry},
};
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use tokio::sync::broadcast;

type Journal = Arc<Mutex<Vec<String>>>;

struct Recorder {
    label: String,
    journal: Journal,
}

#[async_trait]
impl Service for Recorder {
    async fn start(&self, _context: &StartContext) -> Result<(), StartError> {
        self.record("start");
        Ok(())
    }

    async fn stop(&self, _context: &StopContext) {
        self.record("stop");
    }

    fn value(&self) -> ServiceValue {
        Arc::new(self.label.clone())
    }
}

impl Recorder {
    fn record(&self, hook: &str) {
        self.journal
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(format!("{hook}:{}", self.label));
    }
}

#[derive(Default)]
struct LifecycleWorld {
    registry: Option<ServiceRegistry>,
    events: Option<broadcast::Receiver<LifecycleEvent>>,
    journal: Journal,
    handles: HashMap<String, ControllerHandle>,
    injectors: HashMap<(String, String), Injector<String>>,
    last_error: Option<ContainerError>,
}

impl LifecycleWorld {
    fn registry(&mut self) -> Result<ServiceRegistry, eyre::Report> {
        if let Some(registry) = &self.registry {
            return Ok(registry.clone());
        }
        let registry = ServiceRegistry::new(&ContainerConfig::default())
            .wrap_err("registry needs a runtime")?;
        self.events = Some(registry.subscribe());
        self.registry = Some(registry.clone());
        Ok(registry)
    }

    fn handle(&self, name: &str) -> Result<&ControllerHandle, eyre::Report> {
        self.handles
            .get(name)
            .ok_or_else(|| eyre!("service {name} should be registered"))
    }

    fn recorder(&self, label: &str) -> Arc<Recorder> {
        Arc::new(Recorder {
            label: label.to_owned(),
            journal: Arc::clone(&self.journal),
        })
    }

    fn position(&self, entry: &str) -> Result<usize, eyre::Report> {
        self.journal
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .position(|recorded| recorded == entry)
            .ok_or_else(|| eyre!("journal should contain {entry}"))
    }
}

#[fixture]
fn world() -> LifecycleWorld {
    LifecycleWorld::default()
}

fn run_async<T>(future: impl Future<Output = T>) -> Result<T, eyre::Report> {
    tokio::task::block_in_place(|| {
        tokio::runtime::Handle::current()
            .block_on(tokio::time::timeout(Duration::from_secs(5), future))
    })
    .wrap_err("operation should finish in time")
}

fn service_name(name: &str) -> Result<ServiceName, eyre::Report> {
    ServiceName::parse(name).wrap_err("valid service name expected")
}

#[given(r#"a service "{name}" with no dependencies"#)]
fn service_without_dependencies(
    world: &mut LifecycleWorld,
    name: String,
) -> Result<(), eyre::Report> {
    let registry = world.registry()?;
    let handle = registry
        .builder(service_name(&name)?, world.recorder(&name))
        .set_initial_mode(ServiceMode::Never)
        .install()
        .wrap_err("registration should succeed")?;
    world.handles.insert(name, handle);
    Ok(())
}

#[given(r#"a service "{name}" that requires "{target}""#)]
fn service_requiring(
    world: &mut LifecycleWorld,
    name: String,
    target: String,
) -> Result<(), eyre::Report> {
    let registry = world.registry()?;
    let handle = registry
        .builder(service_name(&name)?, world.recorder(&name))
        .add_dependency_without_injection(DependencyKind::Required, service_name(&target)?)
        .set_initial_mode(ServiceMode::Never)
        .install()
        .wrap_err("registration should succeed")?;
    world.handles.insert(name, handle);
    Ok(())
}

#[given(r#"a service "{name}" that optionally uses "{target}""#)]
fn service_optionally_using(
    world: &mut LifecycleWorld,
    name: String,
    target: String,
) -> Result<(), eyre::Report> {
    let registry = world.registry()?;
    let injector = Injector::<String>::new();
    let handle = registry
        .builder(service_name(&name)?, world.recorder(&name))
        .add_dependency(DependencyKind::Optional, service_name(&target)?, injector.slot())
        .set_initial_mode(ServiceMode::Never)
        .install()
        .wrap_err("registration should succeed")?;
    world.injectors.insert((name.clone(), target), injector);
    world.handles.insert(name, handle);
    Ok(())
}

#[when("both services are active")]
fn all_services_active(world: &mut LifecycleWorld) -> Result<(), eyre::Report> {
    let registry = world.registry()?;
    for handle in world.handles.values() {
        registry
            .set_mode(handle, ServiceMode::Active)
            .wrap_err("mode change should succeed")?;
    }
    Ok(())
}

#[when(r#"service "{name}" is active"#)]
fn service_active(world: &mut LifecycleWorld, name: String) -> Result<(), eyre::Report> {
    let registry = world.registry()?;
    registry
        .set_mode(world.handle(&name)?, ServiceMode::Active)
        .wrap_err("mode change should succeed")
}

#[when(r#"service "{name}" is removed"#)]
fn service_removed(world: &mut LifecycleWorld, name: String) -> Result<(), eyre::Report> {
    let registry = world.registry()?;
    let handle = world.handle(&name)?.clone();
    run_async(registry.unregister(&handle))
}

#[when(r#"another service named "{name}" is registered"#)]
fn register_duplicate(world: &mut LifecycleWorld, name: String) -> Result<(), eyre::Report> {
    let registry = world.registry()?;
    let result = registry
        .builder(service_name(&name)?, world.recorder("duplicate"))
        .install();
    world.last_error = result.err();
    Ok(())
}

#[then(r#"service "{name}" is up"#)]
fn service_is_up(world: &mut LifecycleWorld, name: String) -> Result<(), eyre::Report> {
    let handle = world.handle(&name)?;
    run_async(handle.await_up())?.wrap_err("service should reach up")
}

#[then(r#"service "{name}" is down"#)]
fn service_is_down(world: &mut LifecycleWorld, name: String) -> Result<(), eyre::Report> {
    let handle = world.handle(&name)?;
    run_async(handle.await_state(ServiceState::Down))?.wrap_err("service should reach down")
}

#[then(r#""{first}" reached up before "{second}""#)]
fn reached_up_in_order(
    world: &mut LifecycleWorld,
    first: String,
    second: String,
) -> Result<(), eyre::Report> {
    let first_start = world.position(&format!("start:{first}"))?;
    let second_start = world.position(&format!("start:{second}"))?;
    if first_start >= second_start {
        return Err(eyre!("{first} should start before {second}"));
    }
    Ok(())
}

#[then(r#"service "{dependent}" stopped before "{dependency}" was removed"#)]
fn stopped_before_removal(
    world: &mut LifecycleWorld,
    dependent: String,
    dependency: String,
) -> Result<(), eyre::Report> {
    let events = world
        .events
        .as_mut()
        .ok_or_else(|| eyre!("event subscription should exist"))?;
    let mut seen = Vec::new();
    loop {
        let event = run_async(events.recv())?.wrap_err("event stream should stay open")?;
        let removed = event.kind == LifecycleEventKind::Removed
            && event.service.to_string() == dependency;
        seen.push(event);
        if removed {
            break;
        }
    }

    let dependent_down = seen
        .iter()
        .position(|event| {
            event.service.to_string() == dependent && event.kind == LifecycleEventKind::Down
        })
        .ok_or_else(|| eyre!("{dependent} should have stopped"))?;
    let dependency_stopping = seen
        .iter()
        .position(|event| {
            event.service.to_string() == dependency && event.kind == LifecycleEventKind::Stopping
        })
        .ok_or_else(|| eyre!("{dependency} should have stopped"))?;
    if dependent_down >= dependency_stopping {
        return Err(eyre!("{dependent} should be down before {dependency} stops"));
    }
    Ok(())
}

#[then(r#"the injector of "{name}" for "{target}" is unset"#)]
fn injector_is_unset(
    world: &mut LifecycleWorld,
    name: String,
    target: String,
) -> Result<(), eyre::Report> {
    let injector = world
        .injectors
        .get(&(name, target))
        .ok_or_else(|| eyre!("injector should be tracked"))?;
    if injector.is_set() {
        return Err(eyre!("injector should be unset"));
    }
    Ok(())
}

#[then("registration fails with a duplicate name error")]
fn duplicate_name_error(world: &mut LifecycleWorld) -> Result<(), eyre::Report> {
    match &world.last_error {
        Some(ContainerError::DuplicateName(_)) => Ok(()),
        other => Err(eyre!("expected duplicate name error, got {other:?}")),
    }
}

#[then("{count:usize} service is registered")]
fn registered_count(world: &mut LifecycleWorld, count: usize) -> Result<(), eyre::Report> {
    let registered = world.registry()?.names().len();
    if registered != count {
        return Err(eyre!("expected {count} services, got {registered}"));
    }
    Ok(())
}

#[scenario(
    path = "tests/features/service_lifecycle.feature",
    name = "Required dependency starts first and stops last"
)]
#[tokio::test(flavor = "multi_thread")]
async fn required_dependency_orders_lifecycle(world: LifecycleWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/service_lifecycle.feature",
    name = "Missing optional dependency does not block start"
)]
#[tokio::test(flavor = "multi_thread")]
async fn missing_optional_dependency(world: LifecycleWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/service_lifecycle.feature",
    name = "Duplicate names are rejected"
)]
#[tokio::test(flavor = "multi_thread")]
async fn duplicate_names_rejected(world: LifecycleWorld) {
    let _ = world;
}
