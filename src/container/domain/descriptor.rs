//! Service descriptors: names, aliases, dependencies, and modes.

use super::{ContainerDomainError, InjectionSlot, ParseServiceModeError, ServiceName};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

/// Whether a dependency gates the start of its dependent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DependencyKind {
    /// The dependent may only start once the target is up.
    Required,
    /// The target is injected if it is up at start time, and ignored otherwise.
    Optional,
}

impl DependencyKind {
    /// Returns the canonical string representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Required => "required",
            Self::Optional => "optional",
        }
    }
}

impl fmt::Display for DependencyKind {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Desired lifecycle mode of a controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceMode {
    /// Start as soon as dependencies allow.
    Active,
    /// Start only while a wanted service requires it.
    OnDemand,
    /// Stay down.
    Never,
    /// Stop if running, then remove the controller and its names.
    Remove,
}

impl ServiceMode {
    /// Returns the canonical string representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::OnDemand => "on_demand",
            Self::Never => "never",
            Self::Remove => "remove",
        }
    }

    /// Returns whether this mode is accepted as an initial mode.
    #[must_use]
    pub const fn is_initial(self) -> bool {
        !matches!(self, Self::Remove)
    }
}

impl fmt::Display for ServiceMode {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl TryFrom<&str> for ServiceMode {
    type Error = ParseServiceModeError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "active" => Ok(Self::Active),
            "on_demand" => Ok(Self::OnDemand),
            "never" => Ok(Self::Never),
            "remove" => Ok(Self::Remove),
            _ => Err(ParseServiceModeError(value.to_owned())),
        }
    }
}

/// One declared dependency of a service.
#[derive(Clone)]
pub struct Dependency {
    target: ServiceName,
    kind: DependencyKind,
    slot: Option<Arc<dyn InjectionSlot>>,
}

impl Dependency {
    /// Creates a dependency that injects into `slot`.
    #[must_use]
    pub fn new(target: ServiceName, kind: DependencyKind, slot: Arc<dyn InjectionSlot>) -> Self {
        Self {
            target,
            kind,
            slot: Some(slot),
        }
    }

    /// Creates a dependency that only affects ordering.
    #[must_use]
    pub const fn ordering_only(target: ServiceName, kind: DependencyKind) -> Self {
        Self {
            target,
            kind,
            slot: None,
        }
    }

    /// Returns the name of the target service.
    #[must_use]
    pub const fn target(&self) -> &ServiceName {
        &self.target
    }

    /// Returns the dependency kind.
    #[must_use]
    pub const fn kind(&self) -> DependencyKind {
        self.kind
    }

    /// Returns the injection slot, if any.
    #[must_use]
    pub fn slot(&self) -> Option<&Arc<dyn InjectionSlot>> {
        self.slot.as_ref()
    }

    /// Returns whether this dependency gates start.
    #[must_use]
    pub const fn is_required(&self) -> bool {
        matches!(self.kind, DependencyKind::Required)
    }
}

impl fmt::Debug for Dependency {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("Dependency")
            .field("target", &self.target)
            .field("kind", &self.kind)
            .field("slot", &self.slot.as_ref().map(|slot| slot.expected_type()))
            .finish()
    }
}

/// Everything the registry needs to know about a service before it runs.
#[derive(Debug, Clone)]
pub struct ServiceDescriptor {
    name: ServiceName,
    aliases: BTreeSet<ServiceName>,
    dependencies: Vec<Dependency>,
    initial_mode: ServiceMode,
}

impl ServiceDescriptor {
    /// Creates a descriptor with no aliases or dependencies in `Active` mode.
    #[must_use]
    pub const fn new(name: ServiceName) -> Self {
        Self {
            name,
            aliases: BTreeSet::new(),
            dependencies: Vec::new(),
            initial_mode: ServiceMode::Active,
        }
    }

    /// Adds an alias.
    ///
    /// # Errors
    ///
    /// Returns [`ContainerDomainError::AliasMatchesName`] when `alias` equals
    /// the primary name.
    pub fn with_alias(mut self, alias: ServiceName) -> Result<Self, ContainerDomainError> {
        self.insert_alias(alias)?;
        Ok(self)
    }

    /// Appends a dependency.
    #[must_use]
    pub fn with_dependency(mut self, dependency: Dependency) -> Self {
        self.dependencies.push(dependency);
        self
    }

    /// Sets the initial mode. `Remove` is ignored and leaves the mode unchanged.
    #[must_use]
    pub const fn with_initial_mode(mut self, mode: ServiceMode) -> Self {
        if mode.is_initial() {
            self.initial_mode = mode;
        }
        self
    }

    /// Returns the primary name.
    #[must_use]
    pub const fn name(&self) -> &ServiceName {
        &self.name
    }

    /// Returns the aliases in sorted order.
    #[must_use]
    pub const fn aliases(&self) -> &BTreeSet<ServiceName> {
        &self.aliases
    }

    /// Returns the dependencies in declaration order.
    #[must_use]
    pub fn dependencies(&self) -> &[Dependency] {
        &self.dependencies
    }

    /// Returns the initial mode.
    #[must_use]
    pub const fn initial_mode(&self) -> ServiceMode {
        self.initial_mode
    }

    /// Returns the primary name followed by every alias.
    pub fn all_names(&self) -> impl Iterator<Item = &ServiceName> {
        std::iter::once(&self.name).chain(self.aliases.iter())
    }

    /// Returns whether `name` is the primary name or an alias.
    #[must_use]
    pub fn answers_to(&self, name: &ServiceName) -> bool {
        self.name == *name || self.aliases.contains(name)
    }

    pub(crate) fn insert_alias(&mut self, alias: ServiceName) -> Result<(), ContainerDomainError> {
        if alias == self.name {
            return Err(ContainerDomainError::AliasMatchesName(alias));
        }
        self.aliases.insert(alias);
        Ok(())
    }

    pub(crate) fn push_dependency(&mut self, dependency: Dependency) {
        self.dependencies.push(dependency);
    }

    pub(crate) fn set_initial_mode(&mut self, mode: ServiceMode) {
        if mode.is_initial() {
            self.initial_mode = mode;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::domain::Injector;
    use rstest::rstest;

    fn name(value: &str) -> ServiceName {
        ServiceName::parse(value).expect("valid service name")
    }

    #[test]
    fn alias_equal_to_name_is_rejected() {
        let result = ServiceDescriptor::new(name("ws.a")).with_alias(name("ws.a"));

        assert_eq!(
            result.map(|descriptor| descriptor.aliases().len()),
            Err(ContainerDomainError::AliasMatchesName(name("ws.a")))
        );
    }

    #[test]
    fn descriptor_answers_to_name_and_aliases() {
        let descriptor = ServiceDescriptor::new(name("ws.a"))
            .with_alias(name("ws.alias"))
            .expect("distinct alias");

        assert!(descriptor.answers_to(&name("ws.a")));
        assert!(descriptor.answers_to(&name("ws.alias")));
        assert!(!descriptor.answers_to(&name("ws.b")));
        assert_eq!(descriptor.all_names().count(), 2);
    }

    #[test]
    fn remove_is_not_an_initial_mode() {
        let descriptor = ServiceDescriptor::new(name("ws.a"))
            .with_initial_mode(ServiceMode::Never)
            .with_initial_mode(ServiceMode::Remove);

        assert_eq!(descriptor.initial_mode(), ServiceMode::Never);
    }

    #[test]
    fn dependencies_keep_declaration_order() {
        let injector: Injector<String> = Injector::new();
        let descriptor = ServiceDescriptor::new(name("ws.a"))
            .with_dependency(Dependency::new(
                name("security.domain.other"),
                DependencyKind::Required,
                injector.slot(),
            ))
            .with_dependency(Dependency::ordering_only(
                name("management.server"),
                DependencyKind::Optional,
            ));

        let targets: Vec<String> = descriptor
            .dependencies()
            .iter()
            .map(|dependency| dependency.target().to_string())
            .collect();
        assert_eq!(targets, ["security.domain.other", "management.server"]);
        assert!(descriptor.dependencies().first().is_some_and(Dependency::is_required));
    }

    #[rstest]
    #[case("active", ServiceMode::Active)]
    #[case("ON_DEMAND", ServiceMode::OnDemand)]
    #[case(" never ", ServiceMode::Never)]
    #[case("remove", ServiceMode::Remove)]
    fn service_mode_parses_canonical_names(#[case] input: &str, #[case] expected: ServiceMode) {
        assert_eq!(ServiceMode::try_from(input), Ok(expected));
    }

    #[test]
    fn service_mode_rejects_unknown_value() {
        assert_eq!(
            ServiceMode::try_from("lazy"),
            Err(ParseServiceModeError("lazy".to_owned()))
        );
    }
}
