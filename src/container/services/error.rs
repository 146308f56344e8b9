//! Error types for registry operations.

use crate::container::domain::{ContainerDomainError, ServiceName};
use thiserror::Error;

/// Errors returned by [`super::ServiceRegistry`] and [`super::ControllerHandle`].
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ContainerError {
    /// Domain validation failed.
    #[error(transparent)]
    Domain(#[from] ContainerDomainError),

    /// The name or one of the aliases is already registered.
    #[error("service name already registered: {0}")]
    DuplicateName(ServiceName),

    /// A required dependency would make a service transitively require
    /// itself.
    #[error("required dependency of {service} on {target} closes a cycle")]
    DependencyCycle {
        /// The service declaring the dependency.
        service: ServiceName,
        /// The dependency target that leads back to `service`.
        target: ServiceName,
    },

    /// A required dependency names a service that is not registered.
    #[error("service {service} depends on unknown service {target}")]
    UnknownTarget {
        /// The blocked service.
        service: ServiceName,
        /// The unresolved dependency name.
        target: ServiceName,
    },

    /// The last start attempt failed.
    #[error("service {service} failed to start: {message}")]
    StartFailed {
        /// The failed service.
        service: ServiceName,
        /// Failure message recorded on the controller.
        message: String,
    },

    /// The handle refers to a controller that no longer exists.
    #[error("controller for {0} is no longer registered")]
    StaleHandle(ServiceName),

    /// The controller was removed while a caller was waiting on it.
    #[error("service {0} was removed")]
    Removed(ServiceName),

    /// The registry was created outside a tokio runtime.
    #[error("service registry requires a tokio runtime")]
    NoRuntime,
}

/// Result type for registry operations.
pub type ContainerResult<T> = Result<T, ContainerError>;
