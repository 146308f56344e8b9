//! Message record processors attached to endpoints.

use serde_json::Value;

/// Processor that records messages passing through an endpoint.
pub trait RecordProcessor: Send + Sync {
    /// Returns the processor name, unique per endpoint.
    fn name(&self) -> &str;

    /// Returns whether the processor is currently recording.
    fn is_recording(&self) -> bool {
        false
    }

    /// Returns the processor's own management attributes.
    ///
    /// Processors that return `None` are published through the generic
    /// [`crate::management::domain::ManagedRecordProcessor`] view instead.
    fn management_attributes(&self) -> Option<Value> {
        None
    }
}
