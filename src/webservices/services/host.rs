//! Helpers for hosts that publish the services endpoints depend on.

use super::{EndpointServiceResult, management_server_service_name, security_domain_service_name};
use crate::container::{
    adapters::ValueService,
    domain::ServiceDescriptor,
    services::{ControllerHandle, ServiceRegistry},
};
use crate::management::ports::SharedManagementServer;
use crate::webservices::domain::SecurityDomainContext;
use std::sync::Arc;

/// Publishes `context` under `security.domain.<domain>`.
///
/// # Errors
///
/// Returns [`super::EndpointServiceError::Container`] when the name is
/// already registered.
pub fn install_security_domain(
    registry: &ServiceRegistry,
    context: SecurityDomainContext,
) -> EndpointServiceResult<ControllerHandle> {
    let name = security_domain_service_name(context.domain_name())?;
    let handle = registry.register(
        ServiceDescriptor::new(name),
        Arc::new(ValueService::new(context)),
    )?;
    Ok(handle)
}

/// Publishes `server` under `management.server`.
///
/// # Errors
///
/// Returns [`super::EndpointServiceError::Container`] when a management
/// server is already registered.
pub fn install_management_server(
    registry: &ServiceRegistry,
    server: SharedManagementServer,
) -> EndpointServiceResult<ControllerHandle> {
    let handle = registry.register(
        ServiceDescriptor::new(management_server_service_name()?),
        Arc::new(ValueService::new(server)),
    )?;
    Ok(handle)
}
