//! Hierarchical service names.

use super::ContainerDomainError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Hierarchical identifier for a registered service.
///
/// A name is an ordered, non-empty sequence of non-empty segments such as
/// `ws.endpoint.shop.OrderService`. Segments containing `.`, `=` or `"` are
/// rendered quoted so that [`ServiceName::parse`] can read them back.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ServiceName(Vec<String>);

impl ServiceName {
    /// Creates a name from explicit segments.
    ///
    /// # Errors
    ///
    /// Returns [`ContainerDomainError::EmptyServiceName`] when no segments are
    /// given, or [`ContainerDomainError::EmptySegment`] when any segment is
    /// empty after trimming.
    pub fn of<I, S>(segments: I) -> Result<Self, ContainerDomainError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let collected: Vec<String> = segments.into_iter().map(Into::into).collect();
        if collected.is_empty() {
            return Err(ContainerDomainError::EmptyServiceName);
        }
        if collected.iter().any(|segment| segment.trim().is_empty()) {
            return Err(ContainerDomainError::EmptySegment(collected.join(".")));
        }
        Ok(Self(collected))
    }

    /// Parses the dotted display form, honouring double-quoted segments.
    ///
    /// # Errors
    ///
    /// Returns [`ContainerDomainError`] when the input is empty, contains an
    /// empty segment, or leaves a quote open.
    pub fn parse(value: &str) -> Result<Self, ContainerDomainError> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(ContainerDomainError::EmptyServiceName);
        }

        let mut segments = Vec::new();
        let mut current = String::new();
        let mut in_quotes = false;
        let mut chars = trimmed.chars();

        while let Some(ch) = chars.next() {
            match ch {
                '"' => in_quotes = !in_quotes,
                '\\' if in_quotes => match chars.next() {
                    Some(escaped) => current.push(escaped),
                    None => return Err(ContainerDomainError::UnterminatedQuote(value.to_owned())),
                },
                '.' if !in_quotes => segments.push(std::mem::take(&mut current)),
                other => current.push(other),
            }
        }

        if in_quotes {
            return Err(ContainerDomainError::UnterminatedQuote(value.to_owned()));
        }
        segments.push(current);

        if segments.iter().any(|segment| segment.trim().is_empty()) {
            return Err(ContainerDomainError::EmptySegment(value.to_owned()));
        }
        Ok(Self(segments))
    }

    /// Returns a child name with `segment` appended.
    ///
    /// # Errors
    ///
    /// Returns [`ContainerDomainError::EmptySegment`] when `segment` is empty
    /// after trimming.
    pub fn append(&self, segment: impl Into<String>) -> Result<Self, ContainerDomainError> {
        let next = segment.into();
        if next.trim().is_empty() {
            return Err(ContainerDomainError::EmptySegment(format!("{self}.")));
        }
        let mut segments = self.0.clone();
        segments.push(next);
        Ok(Self(segments))
    }

    /// Returns the name without its last segment, if any remain.
    #[must_use]
    pub fn parent(&self) -> Option<Self> {
        match self.0.split_last() {
            Some((_, rest)) if !rest.is_empty() => Some(Self(rest.to_vec())),
            _ => None,
        }
    }

    /// Returns the ordered segments.
    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.0
    }

    /// Returns the last segment.
    #[must_use]
    pub fn simple_name(&self) -> &str {
        self.0.last().map_or("", String::as_str)
    }

    /// Returns whether `other` lives strictly beneath this name.
    #[must_use]
    pub fn is_parent_of(&self, other: &Self) -> bool {
        other.0.len() > self.0.len() && other.0.starts_with(&self.0)
    }
}

fn write_segment(formatter: &mut fmt::Formatter<'_>, segment: &str) -> fmt::Result {
    if !segment.contains(['.', '=', '"', '\\']) {
        return formatter.write_str(segment);
    }
    formatter.write_str("\"")?;
    for ch in segment.chars() {
        if matches!(ch, '"' | '\\') {
            formatter.write_str("\\")?;
        }
        write!(formatter, "{ch}")?;
    }
    formatter.write_str("\"")
}

impl fmt::Display for ServiceName {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, segment) in self.0.iter().enumerate() {
            if index > 0 {
                formatter.write_str(".")?;
            }
            write_segment(formatter, segment)?;
        }
        Ok(())
    }
}

impl TryFrom<&str> for ServiceName {
    type Error = ContainerDomainError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}
