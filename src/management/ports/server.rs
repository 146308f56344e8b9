//! Management server port.

use crate::management::domain::{ManagedObject, ObjectName};
use std::sync::Arc;
use thiserror::Error;

/// Result type for management server operations.
pub type ManagementResult<T> = Result<T, ManagementError>;

/// Shared handle to a management server, as published by the container.
pub type SharedManagementServer = Arc<dyn ManagementServer>;

/// Registry of named management objects.
///
/// Calls are synchronous and must not block for long; they run inside
/// service start and stop hooks.
pub trait ManagementServer: Send + Sync {
    /// Publishes `object` under `name`.
    ///
    /// # Errors
    ///
    /// Returns [`ManagementError::NotCompliant`] when the object exposes no
    /// management interface, or [`ManagementError::AlreadyRegistered`] when
    /// `name` is taken.
    fn register(&self, object: ManagedObject, name: &ObjectName) -> ManagementResult<()>;

    /// Withdraws the object published under `name`.
    ///
    /// # Errors
    ///
    /// Returns [`ManagementError::NotRegistered`] when nothing is published
    /// under `name`.
    fn unregister(&self, name: &ObjectName) -> ManagementResult<()>;

    /// Returns whether an object is published under `name`.
    fn is_registered(&self, name: &ObjectName) -> bool;
}

/// Errors returned by management servers.
#[derive(Debug, Clone, Error)]
pub enum ManagementError {
    /// The object has no management interface.
    #[error("object for {name} is not a compliant management object: {reason}")]
    NotCompliant {
        /// Name the object was offered under.
        name: ObjectName,
        /// Why the server rejected it.
        reason: String,
    },

    /// Another object is published under the name.
    #[error("an object is already registered as {0}")]
    AlreadyRegistered(ObjectName),

    /// Nothing is published under the name.
    #[error("no object is registered as {0}")]
    NotRegistered(ObjectName),

    /// Server-side failure.
    #[error("management server error: {0}")]
    Runtime(Arc<dyn std::error::Error + Send + Sync>),
}

impl ManagementError {
    /// Wraps a server-side error.
    pub fn runtime(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Runtime(Arc::new(err))
    }

    /// Returns whether the failure means the object itself was unsuitable.
    #[must_use]
    pub const fn is_not_compliant(&self) -> bool {
        matches!(self, Self::NotCompliant { .. })
    }
}
