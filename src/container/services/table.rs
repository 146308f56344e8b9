//! Controller table and the resolution algorithm.
//!
//! The table owns every controller and the name index. [`ControllerTable::evaluate`]
//! decides which controllers start, stop, or are removed, marks them as
//! transitioning, and returns the hook work for the registry to run. No hook
//! runs while the table is borrowed.

use super::{ContainerError, ContainerResult};
use crate::container::{
    domain::{
        ControllerId, ControllerStatus, Dependency, InjectionSlot, ServiceDescriptor, ServiceMode,
        ServiceName, ServiceState, ServiceValue, StartFailure,
    },
    ports::Service,
};
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::watch;

pub(super) struct ControllerEntry {
    id: ControllerId,
    descriptor: ServiceDescriptor,
    service: Arc<dyn Service>,
    state: ServiceState,
    /// A start or stop has been planned but its hook is not running yet.
    queued: bool,
    mode: ServiceMode,
    failure: Option<StartFailure>,
    status: watch::Sender<ControllerStatus>,
}

impl ControllerEntry {
    fn required(&self) -> impl Iterator<Item = &Dependency> {
        self.descriptor
            .dependencies()
            .iter()
            .filter(|dependency| dependency.is_required())
    }

    /// State reported to observers. A queued transition still shows the
    /// state it is leaving.
    const fn published_state(&self) -> ServiceState {
        match (self.state, self.queued) {
            (ServiceState::Starting, true) => ServiceState::Down,
            (ServiceState::Stopping, true) => ServiceState::Up,
            (state, _) => state,
        }
    }

    fn clear_injectors(&self) {
        for slot in self
            .descriptor
            .dependencies()
            .iter()
            .filter_map(Dependency::slot)
        {
            slot.clear();
        }
    }
}

/// Hook work decided by the table.
pub(super) enum Transition {
    Start(StartJob),
    Stop(StopJob),
    Removed {
        id: ControllerId,
        name: ServiceName,
    },
}

/// Everything needed to run a start hook outside the table lock.
pub(super) struct StartJob {
    pub(super) id: ControllerId,
    pub(super) name: ServiceName,
    pub(super) service: Arc<dyn Service>,
    pub(super) injections: Vec<(Arc<dyn InjectionSlot>, ServiceValue)>,
}

/// Everything needed to run a stop hook outside the table lock.
pub(super) struct StopJob {
    pub(super) id: ControllerId,
    pub(super) name: ServiceName,
    pub(super) service: Arc<dyn Service>,
}

#[derive(Default)]
pub(super) struct ControllerTable {
    controllers: HashMap<ControllerId, ControllerEntry>,
    names: HashMap<ServiceName, ControllerId>,
}

impl ControllerTable {
    pub(super) fn insert(
        &mut self,
        descriptor: ServiceDescriptor,
        service: Arc<dyn Service>,
    ) -> ContainerResult<(ControllerId, watch::Receiver<ControllerStatus>)> {
        if let Some(taken) = descriptor
            .all_names()
            .find(|name| self.names.contains_key(*name))
        {
            return Err(ContainerError::DuplicateName(taken.clone()));
        }
        let names: Vec<&ServiceName> = descriptor.all_names().collect();
        if let Some(target) = descriptor
            .dependencies()
            .iter()
            .filter(|dependency| dependency.is_required())
            .map(Dependency::target)
            .find(|target| self.leads_back(target, &names))
        {
            return Err(ContainerError::DependencyCycle {
                service: descriptor.name().clone(),
                target: target.clone(),
            });
        }

        let id = ControllerId::new();
        let mode = descriptor.initial_mode();
        let (status, receiver) = watch::channel(ControllerStatus::new(mode));
        for name in descriptor.all_names() {
            self.names.insert(name.clone(), id);
        }
        self.controllers.insert(
            id,
            ControllerEntry {
                id,
                descriptor,
                service,
                state: ServiceState::Down,
                queued: false,
                mode,
                failure: None,
                status,
            },
        );
        Ok((id, receiver))
    }

    pub(super) fn lookup(
        &self,
        name: &ServiceName,
    ) -> Option<(ControllerId, ServiceName, watch::Receiver<ControllerStatus>)> {
        let id = self.names.get(name)?;
        let entry = self.controllers.get(id)?;
        Some((
            entry.id,
            entry.descriptor.name().clone(),
            entry.status.subscribe(),
        ))
    }

    pub(super) fn contains(&self, id: ControllerId) -> bool {
        self.controllers.contains_key(&id)
    }

    pub(super) fn primary_names(&self) -> Vec<ServiceName> {
        let mut names: Vec<ServiceName> = self
            .controllers
            .values()
            .map(|entry| entry.descriptor.name().clone())
            .collect();
        names.sort();
        names
    }

    pub(super) fn add_dependency(
        &mut self,
        id: ControllerId,
        name: &ServiceName,
        dependency: Dependency,
    ) -> ContainerResult<()> {
        let entry = self
            .controllers
            .get(&id)
            .ok_or_else(|| ContainerError::StaleHandle(name.clone()))?;
        if dependency.is_required() {
            let names: Vec<&ServiceName> = entry.descriptor.all_names().collect();
            if self.leads_back(dependency.target(), &names) {
                return Err(ContainerError::DependencyCycle {
                    service: name.clone(),
                    target: dependency.target().clone(),
                });
            }
        }
        if let Some(entry) = self.controllers.get_mut(&id) {
            entry.descriptor.push_dependency(dependency);
        }
        Ok(())
    }

    /// Returns whether following required dependencies from `target` reaches
    /// any of `names`. Unregistered targets end the walk.
    fn leads_back(&self, target: &ServiceName, names: &[&ServiceName]) -> bool {
        let mut visited = HashSet::new();
        let mut pending = vec![target];
        while let Some(current) = pending.pop() {
            if names.contains(&current) {
                return true;
            }
            let Some(entry) = self.resolve(current) else {
                continue;
            };
            if visited.insert(entry.id) {
                pending.extend(entry.required().map(Dependency::target));
            }
        }
        false
    }

    pub(super) fn set_mode(
        &mut self,
        id: ControllerId,
        name: &ServiceName,
        mode: ServiceMode,
    ) -> ContainerResult<()> {
        let entry = self
            .controllers
            .get_mut(&id)
            .ok_or_else(|| ContainerError::StaleHandle(name.clone()))?;
        entry.mode = mode;
        if matches!(mode, ServiceMode::Active | ServiceMode::OnDemand) {
            entry.failure = None;
        }
        Ok(())
    }

    /// Returns the first required dependency that resolves to nothing.
    pub(super) fn first_unknown_target(&self, id: ControllerId) -> Option<ServiceName> {
        let entry = self.controllers.get(&id)?;
        entry
            .required()
            .find(|dependency| !self.names.contains_key(dependency.target()))
            .map(|dependency| dependency.target().clone())
    }

    /// Marks the planned transition of `id` as running and publishes it.
    pub(super) fn begin_hook(&mut self, id: ControllerId) {
        if let Some(entry) = self.controllers.get_mut(&id) {
            entry.queued = false;
        }
        self.publish_statuses();
    }

    /// Records the outcome of a start hook.
    pub(super) fn complete_start(
        &mut self,
        id: ControllerId,
        outcome: &Result<(), String>,
        now: DateTime<Utc>,
    ) {
        let Some(entry) = self.controllers.get_mut(&id) else {
            return;
        };
        match outcome {
            Ok(()) => entry.state = ServiceState::Up,
            Err(message) => {
                entry.clear_injectors();
                entry.state = ServiceState::Down;
                entry.failure = Some(StartFailure {
                    message: message.clone(),
                    at: now,
                });
            }
        }
    }

    /// Records that a stop hook returned.
    pub(super) fn complete_stop(&mut self, id: ControllerId) {
        if let Some(entry) = self.controllers.get_mut(&id) {
            entry.clear_injectors();
            entry.state = ServiceState::Down;
        }
    }

    /// Runs resolution until no controller can make progress.
    pub(super) fn evaluate(&mut self) -> Vec<Transition> {
        let mut transitions = Vec::new();
        loop {
            let wanted = self.wanted();
            let stop_requested = self.stop_requested(&wanted);
            let ids: Vec<ControllerId> = self.controllers.keys().copied().collect();
            let before = transitions.len();

            for id in ids {
                if let Some(transition) = self.step(id, &wanted, &stop_requested) {
                    transitions.push(transition);
                }
            }

            if transitions.len() == before {
                break;
            }
        }
        self.publish_statuses();
        transitions
    }

    fn resolve(&self, name: &ServiceName) -> Option<&ControllerEntry> {
        self.names
            .get(name)
            .and_then(|id| self.controllers.get(id))
    }

    /// Controllers in `Active` mode plus on-demand controllers they require,
    /// transitively.
    fn wanted(&self) -> HashSet<ControllerId> {
        let mut wanted: HashSet<ControllerId> = self
            .controllers
            .values()
            .filter(|entry| entry.mode == ServiceMode::Active)
            .map(|entry| entry.id)
            .collect();
        let mut pending: Vec<ControllerId> = wanted.iter().copied().collect();

        while let Some(id) = pending.pop() {
            let Some(entry) = self.controllers.get(&id) else {
                continue;
            };
            for dependency in entry.required() {
                if let Some(target) = self.resolve(dependency.target())
                    && target.mode == ServiceMode::OnDemand
                    && wanted.insert(target.id)
                {
                    pending.push(target.id);
                }
            }
        }
        wanted
    }

    fn stop_requested(&self, wanted: &HashSet<ControllerId>) -> HashSet<ControllerId> {
        let mut memo = HashMap::new();
        let mut visiting = HashSet::new();
        for id in self.controllers.keys() {
            self.is_stop_requested(*id, wanted, &mut memo, &mut visiting);
        }
        memo.into_iter()
            .filter_map(|(id, requested)| requested.then_some(id))
            .collect()
    }

    fn is_stop_requested(
        &self,
        id: ControllerId,
        wanted: &HashSet<ControllerId>,
        memo: &mut HashMap<ControllerId, bool>,
        visiting: &mut HashSet<ControllerId>,
    ) -> bool {
        if let Some(known) = memo.get(&id) {
            return *known;
        }
        let Some(entry) = self.controllers.get(&id) else {
            return true;
        };
        // Required cycles are rejected on insert, so a back edge adds nothing.
        if !visiting.insert(id) {
            return false;
        }

        let mut requested =
            matches!(entry.mode, ServiceMode::Never | ServiceMode::Remove) || !wanted.contains(&id);
        if !requested {
            for dependency in entry.required() {
                let blocked = match self.resolve(dependency.target()) {
                    None => true,
                    Some(target) => {
                        target.state != ServiceState::Up
                            || self.is_stop_requested(target.id, wanted, memo, visiting)
                    }
                };
                if blocked {
                    requested = true;
                    break;
                }
            }
        }

        visiting.remove(&id);
        memo.insert(id, requested);
        requested
    }

    fn step(
        &mut self,
        id: ControllerId,
        wanted: &HashSet<ControllerId>,
        stop_requested: &HashSet<ControllerId>,
    ) -> Option<Transition> {
        let entry = self.controllers.get(&id)?;
        let (state, mode, failed) = (entry.state, entry.mode, entry.failure.is_some());
        match state {
            ServiceState::Down if mode == ServiceMode::Remove => self.remove(id),
            ServiceState::Down
                if wanted.contains(&id) && !failed && self.required_ready(id, stop_requested) =>
            {
                self.begin_start(id)
            }
            ServiceState::Up if stop_requested.contains(&id) && !self.has_active_dependents(id) => {
                self.begin_stop(id)
            }
            _ => None,
        }
    }

    fn required_ready(&self, id: ControllerId, stop_requested: &HashSet<ControllerId>) -> bool {
        let Some(entry) = self.controllers.get(&id) else {
            return false;
        };
        entry.required().all(|dependency| {
            self.resolve(dependency.target()).is_some_and(|target| {
                target.state == ServiceState::Up && !stop_requested.contains(&target.id)
            })
        })
    }

    fn has_active_dependents(&self, id: ControllerId) -> bool {
        self.controllers.values().any(|entry| {
            matches!(
                entry.state,
                ServiceState::Starting | ServiceState::Up | ServiceState::Stopping
            ) && entry
                .required()
                .any(|dependency| self.names.get(dependency.target()) == Some(&id))
        })
    }

    fn begin_start(&mut self, id: ControllerId) -> Option<Transition> {
        let entry = self.controllers.get(&id)?;
        let injections = entry
            .descriptor
            .dependencies()
            .iter()
            .filter_map(|dependency| {
                let slot = dependency.slot()?;
                let target = self.resolve(dependency.target())?;
                (target.state == ServiceState::Up)
                    .then(|| (Arc::clone(slot), target.service.value()))
            })
            .collect();
        let job = StartJob {
            id,
            name: entry.descriptor.name().clone(),
            service: Arc::clone(&entry.service),
            injections,
        };

        let starting = self.controllers.get_mut(&id)?;
        starting.state = ServiceState::Starting;
        starting.queued = true;
        Some(Transition::Start(job))
    }

    fn begin_stop(&mut self, id: ControllerId) -> Option<Transition> {
        let entry = self.controllers.get_mut(&id)?;
        entry.state = ServiceState::Stopping;
        entry.queued = true;
        Some(Transition::Stop(StopJob {
            id,
            name: entry.descriptor.name().clone(),
            service: Arc::clone(&entry.service),
        }))
    }

    fn remove(&mut self, id: ControllerId) -> Option<Transition> {
        let entry = self.controllers.remove(&id)?;
        for alias in entry.descriptor.all_names() {
            if self.names.get(alias) == Some(&id) {
                self.names.remove(alias);
            }
        }
        entry.clear_injectors();
        entry.status.send_modify(|status| {
            status.state = ServiceState::Removed;
            status.mode = ServiceMode::Remove;
        });
        Some(Transition::Removed {
            id,
            name: entry.descriptor.name().clone(),
        })
    }

    fn publish_statuses(&self) {
        for entry in self.controllers.values() {
            let unknown_targets: Vec<ServiceName> = entry
                .required()
                .filter(|dependency| !self.names.contains_key(dependency.target()))
                .map(|dependency| dependency.target().clone())
                .collect();
            let next = ControllerStatus {
                state: entry.published_state(),
                mode: entry.mode,
                failure: entry.failure.clone(),
                unknown_targets,
            };
            entry.status.send_if_modified(|current| {
                if *current == next {
                    return false;
                }
                *current = next;
                true
            });
        }
    }
}
