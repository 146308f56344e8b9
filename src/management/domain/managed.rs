//! Objects that can be published to a management server.

use crate::webservices::domain::{Endpoint, RecordProcessor};
use serde_json::{Value, json};
use std::fmt;
use std::sync::Arc;

/// Object handed to [`crate::management::ports::ManagementServer::register`].
#[derive(Clone)]
pub enum ManagedObject {
    /// Management view of a web-service endpoint.
    Endpoint(ManagedEndpoint),
    /// A record processor published as itself. Only compliant when the
    /// processor exposes its own management attributes.
    RecordProcessor(Arc<dyn RecordProcessor>),
    /// Generic management view wrapping any record processor.
    RecordProcessorAdapter(ManagedRecordProcessor),
}

impl ManagedObject {
    /// Returns a short label for logs.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Endpoint(_) => "endpoint",
            Self::RecordProcessor(_) => "record_processor",
            Self::RecordProcessorAdapter(_) => "record_processor_adapter",
        }
    }

    /// Returns the attributes the object exposes, or `None` when it has no
    /// management interface.
    #[must_use]
    pub fn attributes(&self) -> Option<Value> {
        match self {
            Self::Endpoint(endpoint) => Some(endpoint.attributes()),
            Self::RecordProcessor(processor) => processor.management_attributes(),
            Self::RecordProcessorAdapter(adapter) => Some(adapter.attributes()),
        }
    }
}

impl fmt::Debug for ManagedObject {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Endpoint(endpoint) => formatter
                .debug_tuple("Endpoint")
                .field(&endpoint.endpoint.name().to_string())
                .finish(),
            Self::RecordProcessor(processor) => formatter
                .debug_tuple("RecordProcessor")
                .field(&processor.name())
                .finish(),
            Self::RecordProcessorAdapter(adapter) => formatter
                .debug_tuple("RecordProcessorAdapter")
                .field(&adapter.processor.name())
                .finish(),
        }
    }
}

/// Management view of an endpoint.
#[derive(Clone)]
pub struct ManagedEndpoint {
    endpoint: Arc<Endpoint>,
}

impl ManagedEndpoint {
    /// Wraps `endpoint`.
    #[must_use]
    pub const fn new(endpoint: Arc<Endpoint>) -> Self {
        Self { endpoint }
    }

    /// Returns the wrapped endpoint.
    #[must_use]
    pub const fn endpoint(&self) -> &Arc<Endpoint> {
        &self.endpoint
    }

    /// Returns the endpoint's current attributes.
    #[must_use]
    pub fn attributes(&self) -> Value {
        let processors: Vec<&str> = self
            .endpoint
            .record_processors()
            .iter()
            .map(|processor| processor.name())
            .collect();
        json!({
            "name": self.endpoint.name().to_string(),
            "shortName": self.endpoint.short_name(),
            "securityDomain": self
                .endpoint
                .security_domain_context()
                .map(|context| context.domain_name().to_owned()),
            "recordProcessors": processors,
        })
    }
}

/// Generic management view for record processors that do not expose one.
#[derive(Clone)]
pub struct ManagedRecordProcessor {
    processor: Arc<dyn RecordProcessor>,
}

impl ManagedRecordProcessor {
    /// Wraps `processor`.
    #[must_use]
    pub const fn new(processor: Arc<dyn RecordProcessor>) -> Self {
        Self { processor }
    }

    /// Returns the wrapped processor.
    #[must_use]
    pub const fn processor(&self) -> &Arc<dyn RecordProcessor> {
        &self.processor
    }

    /// Returns the processor's attributes.
    #[must_use]
    pub fn attributes(&self) -> Value {
        json!({
            "name": self.processor.name(),
            "recording": self.processor.is_recording(),
        })
    }
}
