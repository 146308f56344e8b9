//! Error types for web-service domain validation.

use thiserror::Error;

/// Errors returned while constructing web-service domain values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum WebServicesDomainError {
    /// A deployment unit name is empty after trimming.
    #[error("deployment unit name must not be empty")]
    EmptyDeploymentName,

    /// An endpoint short name is empty after trimming.
    #[error("endpoint short name must not be empty")]
    EmptyShortName,

    /// A security domain name is empty after trimming.
    #[error("security domain name must not be empty")]
    EmptySecurityDomain,
}
