//! Deployed web-service endpoints.

use super::{RecordProcessor, SecurityDomainContext, WebServicesDomainError};
use crate::management::domain::{ObjectName, ObjectNameError};
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

/// Key property naming the web context of an endpoint.
pub const CONTEXT_PROPERTY: &str = "context";

/// Key property naming the endpoint within its context.
pub const ENDPOINT_PROPERTY: &str = "endpoint";

/// Key property naming a record processor under its endpoint.
pub const RECORD_PROCESSOR_PROPERTY: &str = "recordProcessor";

/// A deployed web-service endpoint.
///
/// The security domain context is set while the endpoint's service is up
/// and cleared when it stops.
pub struct Endpoint {
    name: ObjectName,
    short_name: String,
    declared_security_domain: Option<String>,
    record_processors: Vec<Arc<dyn RecordProcessor>>,
    security_context: RwLock<Option<SecurityDomainContext>>,
}

impl Endpoint {
    /// Creates an endpoint with no record processors and no declared
    /// security domain.
    ///
    /// # Errors
    ///
    /// Returns [`WebServicesDomainError::EmptyShortName`] when `short_name`
    /// is blank.
    pub fn new(
        name: ObjectName,
        short_name: impl Into<String>,
    ) -> Result<Self, WebServicesDomainError> {
        let short_name = short_name.into();
        if short_name.trim().is_empty() {
            return Err(WebServicesDomainError::EmptyShortName);
        }
        Ok(Self {
            name,
            short_name,
            declared_security_domain: None,
            record_processors: Vec::new(),
            security_context: RwLock::new(None),
        })
    }

    /// Records the security domain declared by the deployment descriptor.
    #[must_use]
    pub fn with_declared_security_domain(mut self, domain: impl Into<String>) -> Self {
        self.declared_security_domain = Some(domain.into());
        self
    }

    /// Attaches a record processor.
    #[must_use]
    pub fn with_record_processor(mut self, processor: Arc<dyn RecordProcessor>) -> Self {
        self.record_processors.push(processor);
        self
    }

    /// Returns the management name of the endpoint.
    #[must_use]
    pub const fn name(&self) -> &ObjectName {
        &self.name
    }

    /// Returns the short name used in service names.
    #[must_use]
    pub fn short_name(&self) -> &str {
        &self.short_name
    }

    /// Returns the security domain declared by the deployment, verbatim.
    #[must_use]
    pub fn declared_security_domain(&self) -> Option<&str> {
        self.declared_security_domain.as_deref()
    }

    /// Returns the attached record processors.
    #[must_use]
    pub fn record_processors(&self) -> &[Arc<dyn RecordProcessor>] {
        &self.record_processors
    }

    /// Returns the management name of `processor` under this endpoint.
    ///
    /// # Errors
    ///
    /// Returns an [`ObjectNameError`] when the processor name cannot be
    /// used as a key property value.
    pub fn record_processor_name(
        &self,
        processor: &dyn RecordProcessor,
    ) -> Result<ObjectName, ObjectNameError> {
        self.name
            .clone()
            .with_property(RECORD_PROCESSOR_PROPERTY, processor.name())
    }

    /// Replaces the attached security domain context.
    pub fn set_security_domain_context(&self, context: Option<SecurityDomainContext>) {
        *self
            .security_context
            .write()
            .unwrap_or_else(PoisonError::into_inner) = context;
    }

    /// Returns the attached security domain context.
    #[must_use]
    pub fn security_domain_context(&self) -> Option<SecurityDomainContext> {
        self.security_context
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl fmt::Debug for Endpoint {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let processors: Vec<&str> = self
            .record_processors
            .iter()
            .map(|processor| processor.name())
            .collect();
        formatter
            .debug_struct("Endpoint")
            .field("name", &self.name)
            .field("short_name", &self.short_name)
            .field("declared_security_domain", &self.declared_security_domain)
            .field("record_processors", &processors)
            .field("security_context", &self.security_domain_context())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    struct Journal;

    impl RecordProcessor for Journal {
        fn name(&self) -> &str {
            "journal"
        }
    }

    fn endpoint() -> Endpoint {
        let name = ObjectName::parse("lintel.ws:context=shop,endpoint=Orders")
            .expect("valid object name");
        Endpoint::new(name, "Orders")
            .expect("valid endpoint")
            .with_record_processor(Arc::new(Journal))
    }

    #[rstest]
    fn processor_names_extend_the_endpoint_name() {
        let endpoint = endpoint();
        let processor = Arc::clone(&endpoint.record_processors()[0]);

        let name = endpoint
            .record_processor_name(processor.as_ref())
            .expect("valid processor name");

        assert_eq!(
            name.to_string(),
            "lintel.ws:context=shop,endpoint=Orders,recordProcessor=journal"
        );
    }

    #[rstest]
    fn security_context_can_be_attached_and_cleared() {
        let endpoint = endpoint();
        let context = SecurityDomainContext::new("shop-realm").expect("valid domain");

        endpoint.set_security_domain_context(Some(context.clone()));
        assert_eq!(endpoint.security_domain_context(), Some(context));

        endpoint.set_security_domain_context(None);
        assert_eq!(endpoint.security_domain_context(), None);
    }

    #[rstest]
    fn blank_short_name_is_rejected() {
        let name = ObjectName::parse("lintel.ws:endpoint=Orders").expect("valid object name");

        assert!(matches!(
            Endpoint::new(name, "  "),
            Err(WebServicesDomainError::EmptyShortName)
        ));
    }
}
