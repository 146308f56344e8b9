//! Service registry: registration, mode changes, and the transition workers.

use super::{
    ContainerError, ContainerResult, ControllerHandle, ServiceBuilder,
    table::{ControllerTable, StartJob, StopJob, Transition},
};
use crate::config::ContainerConfig;
use crate::container::{
    domain::{
        ControllerId, ControllerStatus, Dependency, DependencyKind, InjectionSlot,
        LifecycleEvent, LifecycleEventKind, ServiceDescriptor, ServiceMode, ServiceName,
        ServiceState,
    },
    ports::{Service, StartContext, StopContext},
};
use mockable::{Clock, DefaultClock};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::runtime::Handle;
use tokio::sync::{OwnedSemaphorePermit, Semaphore, broadcast};
use tracing::{debug, info, warn};

/// Registry of named services with dependency-ordered lifecycles.
///
/// The registry is cheap to clone and is passed explicitly to the code that
/// installs services. Lifecycle hooks run on tokio tasks spawned onto the
/// runtime that created the registry. At most one hook runs per controller
/// at a time, and independent controllers transition concurrently up to
/// [`ContainerConfig::max_concurrent_transitions`].
#[derive(Clone)]
pub struct ServiceRegistry {
    inner: Arc<RegistryInner>,
}

struct RegistryInner {
    table: Mutex<ControllerTable>,
    runtime: Handle,
    permits: Option<Arc<Semaphore>>,
    events: broadcast::Sender<LifecycleEvent>,
    clock: Arc<dyn Clock + Send + Sync>,
}

impl ServiceRegistry {
    /// Creates a registry bound to the current tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns [`ContainerError::NoRuntime`] when called outside a tokio
    /// runtime.
    pub fn new(config: &ContainerConfig) -> ContainerResult<Self> {
        Self::with_clock(config, Arc::new(DefaultClock))
    }

    /// Creates a registry that timestamps events with `clock`.
    ///
    /// # Errors
    ///
    /// Returns [`ContainerError::NoRuntime`] when called outside a tokio
    /// runtime.
    pub fn with_clock(
        config: &ContainerConfig,
        clock: Arc<dyn Clock + Send + Sync>,
    ) -> ContainerResult<Self> {
        let runtime = Handle::try_current().map_err(|_| ContainerError::NoRuntime)?;
        let permits = (config.max_concurrent_transitions > 0)
            .then(|| Arc::new(Semaphore::new(config.max_concurrent_transitions)));
        let (events, _) = broadcast::channel(config.event_channel_capacity.max(1));

        Ok(Self {
            inner: Arc::new(RegistryInner {
                table: Mutex::new(ControllerTable::default()),
                runtime,
                permits,
                events,
                clock,
            }),
        })
    }

    /// Starts a fluent registration for `service` under `name`.
    #[must_use]
    pub fn builder(&self, name: ServiceName, service: Arc<dyn Service>) -> ServiceBuilder<'_> {
        ServiceBuilder::new(self, name, service)
    }

    /// Registers a service and creates its controller in the `Down` state.
    ///
    /// # Errors
    ///
    /// Returns [`ContainerError::DuplicateName`] when the name or any alias
    /// is already registered, or [`ContainerError::DependencyCycle`] when a
    /// required dependency leads back to the new service. The registry is
    /// unchanged in either case.
    pub fn register(
        &self,
        descriptor: ServiceDescriptor,
        service: Arc<dyn Service>,
    ) -> ContainerResult<ControllerHandle> {
        let name = descriptor.name().clone();
        let mode = descriptor.initial_mode();
        let (handle, transitions) = {
            let mut table = self.inner.lock();
            let (id, status) = table.insert(descriptor, service)?;
            (
                ControllerHandle::new(id, name.clone(), status),
                table.evaluate(),
            )
        };
        info!(service = %name, mode = %mode, "service registered");
        self.inner.dispatch(transitions);
        Ok(handle)
    }

    /// Appends a dependency to a registered controller.
    ///
    /// Unknown targets are accepted. A required dependency on an unknown
    /// target blocks the controller until the target registers.
    ///
    /// # Errors
    ///
    /// Returns [`ContainerError::StaleHandle`] when the controller has been
    /// removed, or [`ContainerError::DependencyCycle`] when a required
    /// dependency on `target` would lead back to this controller.
    pub fn add_dependency(
        &self,
        handle: &ControllerHandle,
        target: ServiceName,
        kind: DependencyKind,
        slot: Option<Arc<dyn InjectionSlot>>,
    ) -> ContainerResult<()> {
        let dependency = match slot {
            Some(slot) => Dependency::new(target, kind, slot),
            None => Dependency::ordering_only(target, kind),
        };
        let transitions = {
            let mut table = self.inner.lock();
            table.add_dependency(handle.id(), handle.name(), dependency)?;
            table.evaluate()
        };
        self.inner.dispatch(transitions);
        Ok(())
    }

    /// Changes the desired mode and returns without waiting for transitions.
    ///
    /// Setting [`ServiceMode::Active`] or [`ServiceMode::OnDemand`] clears a
    /// recorded start failure, which retries the start.
    ///
    /// # Errors
    ///
    /// Returns [`ContainerError::StaleHandle`] when the controller has been
    /// removed.
    pub fn set_mode(&self, handle: &ControllerHandle, mode: ServiceMode) -> ContainerResult<()> {
        let transitions = {
            let mut table = self.inner.lock();
            table.set_mode(handle.id(), handle.name(), mode)?;
            table.evaluate()
        };
        debug!(service = %handle.name(), mode = %mode, "service mode changed");
        self.inner.dispatch(transitions);
        Ok(())
    }

    /// Stops the controller if it is up, then removes it and its aliases.
    ///
    /// Dependents that require it are stopped first. Calling this on a
    /// removed controller returns immediately.
    pub async fn unregister(&self, handle: &ControllerHandle) {
        if self.set_mode(handle, ServiceMode::Remove).is_err() {
            debug!(service = %handle.name(), "controller already removed");
        }
        handle.await_removed().await;
    }

    /// Checks that every required dependency names a registered service.
    ///
    /// # Errors
    ///
    /// Returns [`ContainerError::UnknownTarget`] naming the first unresolved
    /// required dependency, or [`ContainerError::StaleHandle`] when the
    /// controller has been removed.
    pub fn verify_dependencies(&self, handle: &ControllerHandle) -> ContainerResult<()> {
        let table = self.inner.lock();
        if !table.contains(handle.id()) {
            return Err(ContainerError::StaleHandle(handle.name().clone()));
        }
        match table.first_unknown_target(handle.id()) {
            Some(target) => Err(ContainerError::UnknownTarget {
                service: handle.name().clone(),
                target,
            }),
            None => Ok(()),
        }
    }

    /// Resolves a name or alias to its controller.
    #[must_use]
    pub fn controller(&self, name: &ServiceName) -> Option<ControllerHandle> {
        self.inner
            .lock()
            .lookup(name)
            .map(|(id, primary, status)| ControllerHandle::new(id, primary, status))
    }

    /// Returns the current state of `handle`'s controller.
    #[must_use]
    pub fn state(&self, handle: &ControllerHandle) -> ServiceState {
        self.status(handle).state
    }

    /// Returns the current status of `handle`'s controller, including the
    /// last start failure and any unresolved required targets.
    #[must_use]
    pub fn status(&self, handle: &ControllerHandle) -> ControllerStatus {
        let mut status = handle.status();
        if !self.inner.lock().contains(handle.id()) {
            status.state = ServiceState::Removed;
        }
        status
    }

    /// Returns the primary names of all registered controllers, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<ServiceName> {
        self.inner.lock().primary_names()
    }

    /// Subscribes to lifecycle events emitted after this call.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<LifecycleEvent> {
        self.inner.events.subscribe()
    }
}

impl fmt::Debug for ServiceRegistry {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("ServiceRegistry")
            .field("services", &self.names())
            .finish_non_exhaustive()
    }
}

impl RegistryInner {
    fn lock(&self) -> MutexGuard<'_, ControllerTable> {
        self.table.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, controller: ControllerId, service: &ServiceName, kind: LifecycleEventKind) {
        let event = LifecycleEvent {
            controller,
            service: service.clone(),
            kind,
            at: self.clock.utc(),
        };
        // No subscribers is not an error.
        let _receivers = self.events.send(event).unwrap_or(0);
    }

    fn dispatch(self: &Arc<Self>, transitions: Vec<Transition>) {
        for transition in transitions {
            match transition {
                Transition::Start(job) => {
                    debug!(service = %job.name, "start planned");
                    let inner = Arc::clone(self);
                    self.runtime.spawn(inner.run_start(job));
                }
                Transition::Stop(job) => {
                    debug!(service = %job.name, "stop planned");
                    let inner = Arc::clone(self);
                    self.runtime.spawn(inner.run_stop(job));
                }
                Transition::Removed { id, name } => {
                    info!(service = %name, "service removed");
                    self.publish(id, &name, LifecycleEventKind::Removed);
                }
            }
        }
    }

    async fn acquire_permit(&self) -> Option<OwnedSemaphorePermit> {
        let permits = self.permits.as_ref()?;
        Arc::clone(permits).acquire_owned().await.ok()
    }

    /// Publishes a planned transition once its hook holds a permit.
    fn enter_hook(&self, id: ControllerId, name: &ServiceName, kind: LifecycleEventKind) {
        self.lock().begin_hook(id);
        debug!(service = %name, event = ?kind, "running lifecycle hook");
        self.publish(id, name, kind);
    }

    async fn run_start(self: Arc<Self>, job: StartJob) {
        let outcome = {
            let _permit = self.acquire_permit().await;
            self.enter_hook(job.id, &job.name, LifecycleEventKind::Starting);
            self.start_service(&job).await
        };

        let transitions = {
            let mut table = self.lock();
            table.complete_start(job.id, &outcome, self.clock.utc());
            table.evaluate()
        };

        match outcome {
            Ok(()) => {
                info!(service = %job.name, "service started");
                self.publish(job.id, &job.name, LifecycleEventKind::Up);
            }
            Err(message) => {
                warn!(service = %job.name, error = %message, "service failed to start");
                self.publish(job.id, &job.name, LifecycleEventKind::StartFailed(message));
            }
        }
        self.dispatch(transitions);
    }

    async fn start_service(&self, job: &StartJob) -> Result<(), String> {
        for (slot, value) in &job.injections {
            slot.inject(Arc::clone(value))
                .map_err(|err| format!("dependency injection failed: {err}"))?;
        }

        let service = Arc::clone(&job.service);
        let context = StartContext::new(job.id, job.name.clone());
        // The hook runs in its own task so a panic is reported as a failure.
        match self
            .runtime
            .spawn(async move { service.start(&context).await })
            .await
        {
            Ok(Ok(())) => Ok(()),
            Ok(Err(err)) => Err(err.to_string()),
            Err(join_error) => Err(format!("start hook aborted: {join_error}")),
        }
    }

    async fn run_stop(self: Arc<Self>, job: StopJob) {
        {
            let _permit = self.acquire_permit().await;
            self.enter_hook(job.id, &job.name, LifecycleEventKind::Stopping);
            let service = Arc::clone(&job.service);
            let context = StopContext::new(job.id, job.name.clone());
            if let Err(join_error) = self
                .runtime
                .spawn(async move { service.stop(&context).await })
                .await
            {
                warn!(service = %job.name, error = %join_error, "stop hook aborted");
            }
        }

        let transitions = {
            let mut table = self.lock();
            table.complete_stop(job.id);
            table.evaluate()
        };
        info!(service = %job.name, "service stopped");
        self.publish(job.id, &job.name, LifecycleEventKind::Down);
        self.dispatch(transitions);
    }
}
