//! Error types for container domain validation and parsing.

use super::ServiceName;
use thiserror::Error;

/// Errors returned while constructing container domain values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ContainerDomainError {
    /// A service name has no segments.
    #[error("service name must have at least one segment")]
    EmptyServiceName,

    /// A service name segment is empty after trimming.
    #[error("service name '{0}' contains an empty segment")]
    EmptySegment(String),

    /// A quoted segment is missing its closing quote.
    #[error("service name '{0}' has an unterminated quoted segment")]
    UnterminatedQuote(String),

    /// A descriptor lists its own primary name as an alias.
    #[error("service {0} cannot alias itself")]
    AliasMatchesName(ServiceName),
}

/// Error returned while parsing a service mode.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown service mode: {0}")]
pub struct ParseServiceModeError(pub String);
