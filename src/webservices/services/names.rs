//! Well-known service names for web-service endpoints.

use super::{EndpointServiceError, EndpointServiceResult};
use crate::container::domain::{ContainerDomainError, ServiceName};
use crate::webservices::domain::{CONTEXT_PROPERTY, DeploymentUnit, ENDPOINT_PROPERTY, Endpoint};

/// Returns `ws.endpoint`, the parent of every endpoint service.
///
/// # Errors
///
/// Never fails for the built-in segments; the result type follows
/// [`ServiceName::of`].
pub fn endpoint_service_base() -> Result<ServiceName, ContainerDomainError> {
    ServiceName::of(["ws", "endpoint"])
}

/// Returns `security.domain`, the parent of every security domain service.
///
/// # Errors
///
/// Never fails for the built-in segments; the result type follows
/// [`ServiceName::of`].
pub fn security_domain_service_base() -> Result<ServiceName, ContainerDomainError> {
    ServiceName::of(["security", "domain"])
}

/// Returns `security.domain.<domain>`.
///
/// # Errors
///
/// Returns [`ContainerDomainError::EmptySegment`] when `domain` is blank.
pub fn security_domain_service_name(domain: &str) -> Result<ServiceName, ContainerDomainError> {
    security_domain_service_base()?.append(domain)
}

/// Returns `management.server`, the name the management server is
/// published under.
///
/// # Errors
///
/// Never fails for the built-in segments; the result type follows
/// [`ServiceName::of`].
pub fn management_server_service_name() -> Result<ServiceName, ContainerDomainError> {
    ServiceName::of(["management", "server"])
}

/// Returns `ws.endpoint.[parent.]unit.short_name`.
///
/// # Errors
///
/// Returns [`ContainerDomainError::EmptySegment`] when `short_name` is
/// blank.
pub fn endpoint_service_name(
    unit: &DeploymentUnit,
    short_name: &str,
) -> Result<ServiceName, ContainerDomainError> {
    let mut name = endpoint_service_base()?;
    if let Some(parent) = unit.parent() {
        name = name.append(parent)?;
    }
    name.append(unit.name())?.append(short_name)
}

/// Returns `ws.endpoint."context=<context>".<endpoint>`, built from the
/// endpoint's key properties.
///
/// # Errors
///
/// Returns [`EndpointServiceError::MissingEndpointProperty`] when the
/// endpoint name lacks the `context` or `endpoint` key property.
pub fn endpoint_alias(endpoint: &Endpoint) -> EndpointServiceResult<ServiceName> {
    let property = |key: &'static str| {
        endpoint
            .name()
            .key_property(key)
            .ok_or_else(|| EndpointServiceError::MissingEndpointProperty {
                endpoint: endpoint.name().clone(),
                property: key,
            })
    };
    let context = property(CONTEXT_PROPERTY)?;
    let endpoint_name = property(ENDPOINT_PROPERTY)?;

    Ok(endpoint_service_base()?
        .append(format!("{CONTEXT_PROPERTY}={context}"))?
        .append(endpoint_name)?)
}
