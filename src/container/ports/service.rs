//! Lifecycle contract implemented by services hosted in the registry.

use crate::container::domain::{ControllerId, ServiceName, ServiceValue};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Context passed to [`Service::start`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartContext {
    controller: ControllerId,
    name: ServiceName,
}

impl StartContext {
    /// Creates a start context.
    #[must_use]
    pub const fn new(controller: ControllerId, name: ServiceName) -> Self {
        Self { controller, name }
    }

    /// Returns the controller being started.
    #[must_use]
    pub const fn controller(&self) -> ControllerId {
        self.controller
    }

    /// Returns the primary name of the service being started.
    #[must_use]
    pub const fn name(&self) -> &ServiceName {
        &self.name
    }
}

/// Context passed to [`Service::stop`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StopContext {
    controller: ControllerId,
    name: ServiceName,
}

impl StopContext {
    /// Creates a stop context.
    #[must_use]
    pub const fn new(controller: ControllerId, name: ServiceName) -> Self {
        Self { controller, name }
    }

    /// Returns the controller being stopped.
    #[must_use]
    pub const fn controller(&self) -> ControllerId {
        self.controller
    }

    /// Returns the primary name of the service being stopped.
    #[must_use]
    pub const fn name(&self) -> &ServiceName {
        &self.name
    }
}

/// Failure reported by a service's start hook.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct StartError {
    message: String,
    #[source]
    source: Option<Arc<dyn std::error::Error + Send + Sync>>,
}

impl StartError {
    /// Creates a start error with a message.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    /// Creates a start error wrapping an underlying cause.
    #[must_use]
    pub fn with_source(
        message: impl Into<String>,
        err: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            message: message.into(),
            source: Some(Arc::new(err)),
        }
    }

    /// Returns the failure message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// A unit with start/stop hooks whose value can be injected into dependents.
///
/// Hooks run on a registry worker, never while registry locks are held.
/// Errors from [`Service::start`] are recorded on the controller and do not
/// propagate to unrelated callers.
#[async_trait]
pub trait Service: Send + Sync {
    /// Starts the service. Injectors are filled before this runs.
    async fn start(&self, context: &StartContext) -> Result<(), StartError>;

    /// Stops the service. Injectors are cleared after this returns.
    async fn stop(&self, context: &StopContext);

    /// Returns the value injected into dependents.
    fn value(&self) -> ServiceValue;
}
