//! Management object names of the form `domain:key=value,key2=value2`.

use super::ObjectNameError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

const RESERVED: [char; 6] = [',', '=', ':', '"', '*', '?'];

/// Name under which an object is published to a management server.
///
/// Key properties keep their insertion order, and [`fmt::Display`] writes
/// them in that order. Two names are equal only when they were written the
/// same way.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectName {
    domain: String,
    properties: Vec<(String, String)>,
}

impl ObjectName {
    /// Creates a name with a single key property.
    ///
    /// # Errors
    ///
    /// Returns [`ObjectNameError::EmptyDomain`] for a blank domain, or
    /// [`ObjectNameError::ReservedCharacter`] when any part contains a
    /// reserved character.
    pub fn new(
        domain: impl Into<String>,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<Self, ObjectNameError> {
        let domain = domain.into();
        if domain.trim().is_empty() {
            return Err(ObjectNameError::EmptyDomain(domain));
        }
        ensure_unreserved(&domain)?;
        Self {
            domain,
            properties: Vec::new(),
        }
        .with_property(key, value)
    }

    /// Parses `domain:key=value[,key=value...]`.
    ///
    /// # Errors
    ///
    /// Returns an [`ObjectNameError`] describing the first malformed part.
    pub fn parse(value: &str) -> Result<Self, ObjectNameError> {
        let (domain, properties) = value
            .split_once(':')
            .ok_or_else(|| ObjectNameError::MissingDomain(value.to_owned()))?;
        if domain.trim().is_empty() {
            return Err(ObjectNameError::EmptyDomain(value.to_owned()));
        }
        if properties.trim().is_empty() {
            return Err(ObjectNameError::NoProperties(value.to_owned()));
        }

        let mut name = Self {
            domain: domain.to_owned(),
            properties: Vec::new(),
        };
        ensure_unreserved(&name.domain)?;
        for property in properties.split(',') {
            let (key, val) = property.split_once('=').ok_or_else(|| {
                ObjectNameError::MalformedProperty {
                    name: value.to_owned(),
                    property: property.to_owned(),
                }
            })?;
            if key.is_empty() || val.is_empty() {
                return Err(ObjectNameError::MalformedProperty {
                    name: value.to_owned(),
                    property: property.to_owned(),
                });
            }
            name = name.with_property(key, val)?;
        }
        Ok(name)
    }

    /// Returns the domain part.
    #[must_use]
    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// Returns the value of `key`, if present.
    #[must_use]
    pub fn key_property(&self, key: &str) -> Option<&str> {
        self.properties
            .iter()
            .find(|(candidate, _)| candidate == key)
            .map(|(_, value)| value.as_str())
    }

    /// Returns the key properties in insertion order.
    pub fn properties(&self) -> impl Iterator<Item = (&str, &str)> {
        self.properties
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_str()))
    }

    /// Returns a copy of this name with one more key property.
    ///
    /// # Errors
    ///
    /// Returns [`ObjectNameError::DuplicateKey`] when `key` is already
    /// present, or [`ObjectNameError::ReservedCharacter`] when the key or
    /// value contains a reserved character.
    pub fn with_property(
        mut self,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<Self, ObjectNameError> {
        let key = key.into();
        let value = value.into();
        ensure_unreserved(&key)?;
        ensure_unreserved(&value)?;
        if key.is_empty() || value.is_empty() {
            return Err(ObjectNameError::MalformedProperty {
                name: self.to_string(),
                property: format!("{key}={value}"),
            });
        }
        if self.key_property(&key).is_some() {
            return Err(ObjectNameError::DuplicateKey(key));
        }
        self.properties.push((key, value));
        Ok(self)
    }
}

fn ensure_unreserved(part: &str) -> Result<(), ObjectNameError> {
    if part.contains(RESERVED) {
        return Err(ObjectNameError::ReservedCharacter(part.to_owned()));
    }
    Ok(())
}

impl fmt::Display for ObjectName {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}:", self.domain)?;
        for (index, (key, value)) in self.properties.iter().enumerate() {
            if index > 0 {
                formatter.write_str(",")?;
            }
            write!(formatter, "{key}={value}")?;
        }
        Ok(())
    }
}

impl FromStr for ObjectName {
    type Err = ObjectNameError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::parse(value)
    }
}

impl Serialize for ObjectName {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ObjectName {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}
