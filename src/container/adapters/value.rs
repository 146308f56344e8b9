//! Service that publishes a fixed value.

use crate::container::{
    domain::ServiceValue,
    ports::{Service, StartContext, StartError, StopContext},
};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

/// Service with no-op hooks whose value never changes.
///
/// Hosts use this to expose plain values, such as a security domain context
/// or a management server, to services that depend on them.
#[derive(Debug)]
pub struct ValueService<T> {
    value: Arc<T>,
}

impl<T> ValueService<T>
where
    T: Send + Sync + 'static,
{
    /// Creates a service publishing `value`.
    #[must_use]
    pub fn new(value: T) -> Self {
        Self {
            value: Arc::new(value),
        }
    }

    /// Creates a service publishing an already shared value.
    #[must_use]
    pub const fn from_shared(value: Arc<T>) -> Self {
        Self { value }
    }
}

#[async_trait]
impl<T> Service for ValueService<T>
where
    T: Send + Sync + 'static,
{
    async fn start(&self, context: &StartContext) -> Result<(), StartError> {
        debug!(service = %context.name(), "value service started");
        Ok(())
    }

    async fn stop(&self, context: &StopContext) {
        debug!(service = %context.name(), "value service stopped");
    }

    fn value(&self) -> ServiceValue {
        Arc::clone(&self.value) as ServiceValue
    }
}
