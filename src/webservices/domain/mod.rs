//! Domain model for deployed web-service endpoints.

mod deployment;
mod endpoint;
mod error;
mod record_processor;
mod security;

pub use deployment::DeploymentUnit;
pub use endpoint::{CONTEXT_PROPERTY, ENDPOINT_PROPERTY, Endpoint, RECORD_PROCESSOR_PROPERTY};
pub use error::WebServicesDomainError;
pub use record_processor::RecordProcessor;
pub use security::{
    DEFAULT_SECURITY_DOMAIN, JAAS_CONTEXT_PREFIX, SecurityDomainContext,
    deployment_security_domain_name,
};
