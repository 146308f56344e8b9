//! Security domain contexts and deployment domain resolution.

use super::WebServicesDomainError;
use serde::{Deserialize, Serialize};

/// Domain used when a deployment declares none.
pub const DEFAULT_SECURITY_DOMAIN: &str = "other";

/// Naming-context prefix some deployments put in front of the domain name.
pub const JAAS_CONTEXT_PREFIX: &str = "java:/jaas/";

/// Authentication context of a security domain, attached to endpoints while
/// they run.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SecurityDomainContext {
    domain_name: String,
}

impl SecurityDomainContext {
    /// Creates a context for `domain_name`.
    ///
    /// # Errors
    ///
    /// Returns [`WebServicesDomainError::EmptySecurityDomain`] when the name
    /// is blank.
    pub fn new(domain_name: impl Into<String>) -> Result<Self, WebServicesDomainError> {
        let domain_name = domain_name.into();
        if domain_name.trim().is_empty() {
            return Err(WebServicesDomainError::EmptySecurityDomain);
        }
        Ok(Self { domain_name })
    }

    /// Returns the security domain name.
    #[must_use]
    pub fn domain_name(&self) -> &str {
        &self.domain_name
    }
}

/// Resolves the security domain an endpoint runs under.
///
/// The declared name is trimmed and loses a leading [`JAAS_CONTEXT_PREFIX`].
/// No declaration, or one that is blank after that, resolves to
/// [`DEFAULT_SECURITY_DOMAIN`].
#[must_use]
pub fn deployment_security_domain_name(declared: Option<&str>) -> String {
    let Some(declared) = declared else {
        return DEFAULT_SECURITY_DOMAIN.to_owned();
    };
    let trimmed = declared.trim();
    let unprefixed = trimmed
        .strip_prefix(JAAS_CONTEXT_PREFIX)
        .unwrap_or(trimmed);
    if unprefixed.is_empty() {
        DEFAULT_SECURITY_DOMAIN.to_owned()
    } else {
        unprefixed.to_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(None, "other")]
    #[case(Some("shop-realm"), "shop-realm")]
    #[case(Some("  shop-realm \n"), "shop-realm")]
    #[case(Some("java:/jaas/shop-realm"), "shop-realm")]
    #[case(Some(" java:/jaas/shop-realm "), "shop-realm")]
    #[case(Some("java:/jaas/"), "other")]
    #[case(Some("   "), "other")]
    fn resolves_declared_domain(#[case] declared: Option<&str>, #[case] expected: &str) {
        assert_eq!(deployment_security_domain_name(declared), expected);
    }

    #[rstest]
    fn context_rejects_blank_domain() {
        assert_eq!(
            SecurityDomainContext::new(" "),
            Err(WebServicesDomainError::EmptySecurityDomain)
        );
    }
}
