//! Fluent service registration.

use super::{ContainerError, ContainerResult, ControllerHandle, ServiceRegistry};
use crate::container::{
    domain::{
        ContainerDomainError, Dependency, DependencyKind, InjectionSlot, ServiceDescriptor,
        ServiceMode, ServiceName,
    },
    ports::Service,
};
use std::sync::Arc;

/// Builder that collects aliases, dependencies, and the initial mode before
/// installing a service.
///
/// Validation errors are deferred to [`ServiceBuilder::install`] so calls
/// can be chained.
#[must_use = "a service builder does nothing until installed"]
pub struct ServiceBuilder<'registry> {
    registry: &'registry ServiceRegistry,
    descriptor: ServiceDescriptor,
    service: Arc<dyn Service>,
    error: Option<ContainerDomainError>,
}

impl<'registry> ServiceBuilder<'registry> {
    pub(super) fn new(
        registry: &'registry ServiceRegistry,
        name: ServiceName,
        service: Arc<dyn Service>,
    ) -> Self {
        Self {
            registry,
            descriptor: ServiceDescriptor::new(name),
            service,
            error: None,
        }
    }

    /// Adds an alias that resolves to the same controller.
    pub fn add_alias(mut self, alias: ServiceName) -> Self {
        if self.error.is_none()
            && let Err(err) = self.descriptor.insert_alias(alias)
        {
            self.error = Some(err);
        }
        self
    }

    /// Adds a dependency whose value is injected into `slot`.
    pub fn add_dependency(
        mut self,
        kind: DependencyKind,
        target: ServiceName,
        slot: Arc<dyn InjectionSlot>,
    ) -> Self {
        self.descriptor
            .push_dependency(Dependency::new(target, kind, slot));
        self
    }

    /// Adds a dependency that only constrains start order.
    pub fn add_dependency_without_injection(
        mut self,
        kind: DependencyKind,
        target: ServiceName,
    ) -> Self {
        self.descriptor
            .push_dependency(Dependency::ordering_only(target, kind));
        self
    }

    /// Sets the initial mode. `Remove` is ignored.
    pub fn set_initial_mode(mut self, mode: ServiceMode) -> Self {
        self.descriptor.set_initial_mode(mode);
        self
    }

    /// Registers the service.
    ///
    /// # Errors
    ///
    /// Returns [`ContainerError::Domain`] for a deferred validation error,
    /// [`ContainerError::DuplicateName`] when a name is taken, or
    /// [`ContainerError::DependencyCycle`] when a required dependency leads
    /// back to this service.
    pub fn install(self) -> ContainerResult<ControllerHandle> {
        if let Some(err) = self.error {
            return Err(ContainerError::Domain(err));
        }
        self.registry.register(self.descriptor, self.service)
    }
}
