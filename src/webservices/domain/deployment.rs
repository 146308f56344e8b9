//! Deployment units that own endpoints.

use super::WebServicesDomainError;
use serde::{Deserialize, Serialize};

/// A deployed archive, optionally nested inside a parent archive.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeploymentUnit {
    name: String,
    parent: Option<String>,
}

impl DeploymentUnit {
    /// Creates a top-level deployment unit.
    ///
    /// # Errors
    ///
    /// Returns [`WebServicesDomainError::EmptyDeploymentName`] when `name`
    /// is blank.
    pub fn new(name: impl Into<String>) -> Result<Self, WebServicesDomainError> {
        Ok(Self {
            name: non_blank(name.into())?,
            parent: None,
        })
    }

    /// Creates a unit nested inside `parent`.
    ///
    /// # Errors
    ///
    /// Returns [`WebServicesDomainError::EmptyDeploymentName`] when either
    /// name is blank.
    pub fn nested(
        parent: impl Into<String>,
        name: impl Into<String>,
    ) -> Result<Self, WebServicesDomainError> {
        Ok(Self {
            name: non_blank(name.into())?,
            parent: Some(non_blank(parent.into())?),
        })
    }

    /// Returns the unit name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the parent unit name, if nested.
    #[must_use]
    pub fn parent(&self) -> Option<&str> {
        self.parent.as_deref()
    }
}

fn non_blank(name: String) -> Result<String, WebServicesDomainError> {
    if name.trim().is_empty() {
        return Err(WebServicesDomainError::EmptyDeploymentName);
    }
    Ok(name)
}
