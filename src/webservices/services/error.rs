//! Errors raised while installing endpoint services.

use crate::container::{domain::ContainerDomainError, services::ContainerError};
use crate::management::domain::ObjectName;
use thiserror::Error;

/// Result type for endpoint service installation.
pub type EndpointServiceResult<T> = Result<T, EndpointServiceError>;

/// Errors returned by [`super::install`] and [`super::uninstall`].
#[derive(Debug, Clone, Error)]
pub enum EndpointServiceError {
    /// The endpoint's management name lacks a key property needed for its
    /// alias.
    #[error("endpoint {endpoint} has no '{property}' key property")]
    MissingEndpointProperty {
        /// Endpoint management name.
        endpoint: ObjectName,
        /// Missing key.
        property: &'static str,
    },

    /// A derived service name is invalid.
    #[error(transparent)]
    Name(#[from] ContainerDomainError),

    /// The registry refused the operation.
    #[error(transparent)]
    Container(#[from] ContainerError),
}
