//! Error types for management name parsing.

use thiserror::Error;

/// Errors returned while parsing or extending an [`super::ObjectName`].
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ObjectNameError {
    /// The name has no `:` separating the domain from its properties.
    #[error("object name '{0}' is missing the domain separator")]
    MissingDomain(String),

    /// The domain part is empty.
    #[error("object name '{0}' has an empty domain")]
    EmptyDomain(String),

    /// The name carries no key properties.
    #[error("object name '{0}' has no key properties")]
    NoProperties(String),

    /// A key property is not of the form `key=value`.
    #[error("object name '{name}' has a malformed key property '{property}'")]
    MalformedProperty {
        /// Name being parsed.
        name: String,
        /// Offending property text.
        property: String,
    },

    /// A key or value contains a reserved character.
    #[error("'{0}' contains a reserved character (one of ',', '=', ':', '\"', '*', '?')")]
    ReservedCharacter(String),

    /// The same key appears twice.
    #[error("key property '{0}' is repeated")]
    DuplicateKey(String),
}
