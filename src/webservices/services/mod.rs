//! Endpoint service, its naming scheme, and install helpers.

mod endpoint_service;
mod error;
mod host;
mod names;

pub use endpoint_service::{EndpointService, install, uninstall};
pub use error::{EndpointServiceError, EndpointServiceResult};
pub use host::{install_management_server, install_security_domain};
pub use names::{
    endpoint_alias, endpoint_service_base, endpoint_service_name, management_server_service_name,
    security_domain_service_base, security_domain_service_name,
};
