//! Container service that runs one web-service endpoint.

use super::{
    EndpointServiceResult, endpoint_alias, endpoint_service_name, management_server_service_name,
    security_domain_service_name,
};
use crate::container::{
    domain::{DependencyKind, Injector, ServiceMode, ServiceName, ServiceValue},
    ports::{Service, StartContext, StartError, StopContext},
    services::{ContainerError, ControllerHandle, ServiceRegistry},
};
use crate::management::{
    domain::{ManagedEndpoint, ManagedObject, ManagedRecordProcessor},
    ports::{ManagementServer, SharedManagementServer},
    services::register_with_fallback,
};
use crate::webservices::domain::{
    DeploymentUnit, Endpoint, RecordProcessor, SecurityDomainContext,
    deployment_security_domain_name,
};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Service whose value is a deployed [`Endpoint`].
///
/// While up, the endpoint carries its security domain's context, and the
/// endpoint and its record processors are published to the management
/// server if one was injected. Management failures are logged and never
/// stop the endpoint from running.
pub struct EndpointService {
    endpoint: Arc<Endpoint>,
    name: ServiceName,
    security_domain_context: Injector<SecurityDomainContext>,
    management_server: Injector<SharedManagementServer>,
}

impl EndpointService {
    /// Creates the service for `endpoint`, installed as `name`.
    #[must_use]
    pub fn new(endpoint: Arc<Endpoint>, name: ServiceName) -> Self {
        Self {
            endpoint,
            name,
            security_domain_context: Injector::new(),
            management_server: Injector::new(),
        }
    }

    /// Returns the endpoint.
    #[must_use]
    pub const fn endpoint(&self) -> &Arc<Endpoint> {
        &self.endpoint
    }

    /// Returns the service name.
    #[must_use]
    pub const fn name(&self) -> &ServiceName {
        &self.name
    }

    /// Returns the slot for the required security domain context.
    #[must_use]
    pub const fn security_domain_context_injector(&self) -> &Injector<SecurityDomainContext> {
        &self.security_domain_context
    }

    /// Returns the slot for the optional management server.
    #[must_use]
    pub const fn management_server_injector(&self) -> &Injector<SharedManagementServer> {
        &self.management_server
    }

    fn register_record_processor(
        &self,
        server: &dyn ManagementServer,
        processor: &Arc<dyn RecordProcessor>,
    ) {
        let name = match self.endpoint.record_processor_name(processor.as_ref()) {
            Ok(name) => name,
            Err(err) => {
                warn!(processor = processor.name(), error = %err, "cannot name record processor");
                return;
            }
        };
        let candidates = [
            ManagedObject::RecordProcessor(Arc::clone(processor)),
            ManagedObject::RecordProcessorAdapter(ManagedRecordProcessor::new(Arc::clone(
                processor,
            ))),
        ];
        match register_with_fallback(server, &name, candidates) {
            Ok(0) => debug!(object = %name, "record processor registered"),
            Ok(_) => debug!(object = %name, "record processor registered through adapter"),
            Err(err) => warn!(object = %name, error = %err, "cannot register record processor"),
        }
    }

    fn unregister_record_processor(
        &self,
        server: &dyn ManagementServer,
        processor: &Arc<dyn RecordProcessor>,
    ) {
        let Ok(name) = self.endpoint.record_processor_name(processor.as_ref()) else {
            return;
        };
        if let Err(err) = server.unregister(&name) {
            warn!(object = %name, error = %err, "cannot unregister record processor");
        }
    }

    fn register_endpoint(&self, server: &dyn ManagementServer) {
        let object = ManagedObject::Endpoint(ManagedEndpoint::new(Arc::clone(&self.endpoint)));
        if let Err(err) = server.register(object, self.endpoint.name()) {
            warn!(
                endpoint = self.endpoint.short_name(),
                error = %err,
                "cannot register endpoint with management server"
            );
        }
    }

    fn unregister_endpoint(&self, server: &dyn ManagementServer) {
        if let Err(err) = server.unregister(self.endpoint.name()) {
            warn!(
                endpoint = self.endpoint.short_name(),
                error = %err,
                "cannot unregister endpoint from management server"
            );
        }
    }
}

#[async_trait]
impl Service for EndpointService {
    async fn start(&self, _context: &StartContext) -> Result<(), StartError> {
        info!(service = %self.name, endpoint = %self.endpoint.name(), "starting endpoint");
        let security = self.security_domain_context.get().map_err(|err| {
            StartError::with_source(
                format!(
                    "endpoint {} has no security domain context",
                    self.endpoint.short_name()
                ),
                err,
            )
        })?;
        self.endpoint
            .set_security_domain_context(Some(security.as_ref().clone()));

        let Some(server) = self.management_server.get_optional() else {
            info!(
                endpoint = self.endpoint.short_name(),
                "management server not available, endpoint is not published"
            );
            return Ok(());
        };
        for processor in self.endpoint.record_processors() {
            self.register_record_processor(server.as_ref().as_ref(), processor);
        }
        self.register_endpoint(server.as_ref().as_ref());
        Ok(())
    }

    async fn stop(&self, _context: &StopContext) {
        info!(service = %self.name, endpoint = %self.endpoint.name(), "stopping endpoint");
        self.endpoint.set_security_domain_context(None);

        let Some(server) = self.management_server.get_optional() else {
            debug!(
                endpoint = self.endpoint.short_name(),
                "management server not available, nothing to unpublish"
            );
            return;
        };
        self.unregister_endpoint(server.as_ref().as_ref());
        for processor in self.endpoint.record_processors() {
            self.unregister_record_processor(server.as_ref().as_ref(), processor);
        }
    }

    fn value(&self) -> ServiceValue {
        Arc::clone(&self.endpoint) as ServiceValue
    }
}

/// Installs the service for `endpoint`, deployed in `unit`.
///
/// The service is registered as `ws.endpoint.[parent.]unit.short_name` with
/// the alias `ws.endpoint."context=<context>".<endpoint>`. It requires
/// `security.domain.<domain>` and optionally uses `management.server`.
///
/// # Errors
///
/// Returns [`super::EndpointServiceError::MissingEndpointProperty`] when the
/// endpoint name lacks a key property used in the alias, or
/// [`super::EndpointServiceError::Container`] when a name is taken.
pub fn install(
    registry: &ServiceRegistry,
    endpoint: Arc<Endpoint>,
    unit: &DeploymentUnit,
) -> EndpointServiceResult<ControllerHandle> {
    let name = endpoint_service_name(unit, endpoint.short_name())?;
    let alias = endpoint_alias(&endpoint)?;
    let domain = deployment_security_domain_name(endpoint.declared_security_domain());
    let security_domain = security_domain_service_name(&domain)?;
    let management_server = management_server_service_name()?;

    let service = Arc::new(EndpointService::new(endpoint, name.clone()));
    let security_slot = service.security_domain_context_injector().slot();
    let management_slot = service.management_server_injector().slot();
    let handle = registry
        .builder(name.clone(), service)
        .add_alias(alias)
        .add_dependency(DependencyKind::Required, security_domain, security_slot)
        .add_dependency(DependencyKind::Optional, management_server, management_slot)
        .set_initial_mode(ServiceMode::Active)
        .install()?;

    info!(service = %name, security_domain = %domain, "endpoint service installed");
    Ok(handle)
}

/// Requests removal of the service for `endpoint`, deployed in `unit`.
///
/// Returns without waiting for the stop. Returns `false` when no such
/// service is registered.
///
/// # Errors
///
/// Returns [`super::EndpointServiceError::Name`] when the service name
/// cannot be formed.
pub fn uninstall(
    registry: &ServiceRegistry,
    endpoint: &Endpoint,
    unit: &DeploymentUnit,
) -> EndpointServiceResult<bool> {
    let name = endpoint_service_name(unit, endpoint.short_name())?;
    let Some(handle) = registry.controller(&name) else {
        debug!(service = %name, "endpoint service not installed");
        return Ok(false);
    };
    match registry.set_mode(&handle, ServiceMode::Remove) {
        Ok(()) => {
            info!(service = %name, "endpoint service removal requested");
            Ok(true)
        }
        Err(ContainerError::StaleHandle(_)) => Ok(false),
        Err(err) => Err(err.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::domain::ControllerId;
    use crate::management::{
        domain::ObjectName,
        ports::{ManagementError, ManagementResult},
    };
    use mockall::mock;
    use rstest::{fixture, rstest};
    use std::io;

    mock! {
        Server {}

        impl ManagementServer for Server {
            fn register(&self, object: ManagedObject, name: &ObjectName) -> ManagementResult<()>;
            fn unregister(&self, name: &ObjectName) -> ManagementResult<()>;
            fn is_registered(&self, name: &ObjectName) -> bool;
        }
    }

    struct Buffer;

    impl RecordProcessor for Buffer {
        fn name(&self) -> &str {
            "buffer"
        }
    }

    #[fixture]
    fn service() -> EndpointService {
        let name = ObjectName::parse("lintel.ws:context=shop,endpoint=Orders")
            .expect("valid object name");
        let endpoint = Endpoint::new(name, "Orders")
            .expect("valid endpoint")
            .with_record_processor(Arc::new(Buffer));
        let service_name = ServiceName::parse("ws.endpoint.shop.Orders").expect("valid name");
        EndpointService::new(Arc::new(endpoint), service_name)
    }

    fn start_context(service: &EndpointService) -> StartContext {
        StartContext::new(ControllerId::new(), service.name().clone())
    }

    #[rstest]
    #[tokio::test]
    async fn start_without_security_context_fails(service: EndpointService) {
        let result = service.start(&start_context(&service)).await;

        let err = result.expect_err("start should fail");
        assert!(err.message().contains("security domain context"));
        assert_eq!(service.endpoint().security_domain_context(), None);
    }

    #[rstest]
    #[tokio::test]
    async fn management_failures_do_not_fail_the_start(service: EndpointService) {
        let mut server = MockServer::new();
        server
            .expect_register()
            .returning(|_, _| Err(ManagementError::runtime(io::Error::other("console offline"))));
        let server: SharedManagementServer = Arc::new(server);
        service
            .security_domain_context_injector()
            .set(Arc::new(SecurityDomainContext::new("other").expect("domain")));
        service.management_server_injector().set(Arc::new(server));

        let result = service.start(&start_context(&service)).await;

        assert!(result.is_ok());
        assert_eq!(
            service
                .endpoint()
                .security_domain_context()
                .map(|context| context.domain_name().to_owned()),
            Some("other".to_owned())
        );
    }

    #[rstest]
    #[tokio::test]
    async fn stop_unregisters_endpoint_before_processors(service: EndpointService) {
        let mut server = MockServer::new();
        let mut sequence = mockall::Sequence::new();
        let endpoint_name = service.endpoint().name().clone();
        let processor_name = endpoint_name
            .clone()
            .with_property("recordProcessor", "buffer")
            .expect("valid name");
        server
            .expect_unregister()
            .with(mockall::predicate::eq(endpoint_name))
            .times(1)
            .in_sequence(&mut sequence)
            .returning(|_| Ok(()));
        server
            .expect_unregister()
            .with(mockall::predicate::eq(processor_name))
            .times(1)
            .in_sequence(&mut sequence)
            .returning(|_| Ok(()));
        let server: SharedManagementServer = Arc::new(server);
        service.management_server_injector().set(Arc::new(server));
        service.endpoint().set_security_domain_context(Some(
            SecurityDomainContext::new("other").expect("domain"),
        ));

        service
            .stop(&StopContext::new(ControllerId::new(), service.name().clone()))
            .await;

        assert_eq!(service.endpoint().security_domain_context(), None);
    }

    #[rstest]
    fn value_is_the_endpoint(service: EndpointService) {
        let value = service.value();

        let endpoint = value.downcast::<Endpoint>().expect("endpoint value");
        assert!(Arc::ptr_eq(&endpoint, service.endpoint()));
    }
}
