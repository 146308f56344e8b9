//! Registry configuration.
//!
//! Configuration is loaded in layers with `figment`:
//! 1. Compiled defaults
//! 2. An optional TOML file
//! 3. Environment variables prefixed with `LINTEL_`
//!
//! Later layers override earlier ones.

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;
use tracing::debug;

/// Environment variable prefix for configuration overrides.
pub const ENV_PREFIX: &str = "LINTEL_";

const DEFAULT_MAX_CONCURRENT_TRANSITIONS: usize = 0;
const DEFAULT_EVENT_CHANNEL_CAPACITY: usize = 256;

/// Errors returned while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A provider failed or a value could not be deserialized.
    #[error("failed to load configuration: {0}")]
    Load(#[from] Box<figment::Error>),

    /// A value is outside its accepted range.
    #[error("invalid configuration value for {field}: {reason}")]
    InvalidValue {
        /// Offending field.
        field: &'static str,
        /// Why the value is rejected.
        reason: String,
    },
}

/// Tunables for [`crate::container::services::ServiceRegistry`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContainerConfig {
    /// Upper bound on lifecycle hooks running at once. `0`, the default,
    /// means unbounded.
    ///
    /// A positive bound is shared by the whole registry, so that many hung
    /// hooks also hold back unrelated services.
    pub max_concurrent_transitions: usize,
    /// Buffer size of the lifecycle event broadcast channel.
    pub event_channel_capacity: usize,
}

impl Default for ContainerConfig {
    fn default() -> Self {
        Self {
            max_concurrent_transitions: DEFAULT_MAX_CONCURRENT_TRANSITIONS,
            event_channel_capacity: DEFAULT_EVENT_CHANNEL_CAPACITY,
        }
    }
}

impl ContainerConfig {
    /// Loads defaults overridden by `LINTEL_*` environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when an override cannot be deserialized or the
    /// result fails validation.
    pub fn load() -> Result<Self, ConfigError> {
        Self::extract(Self::base_figment())
    }

    /// Loads defaults, then `path`, then environment overrides.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the file or an override cannot be
    /// deserialized, or the result fails validation.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        debug!(path = %path.display(), "loading container configuration file");
        let figment = Figment::new()
            .merge(Serialized::defaults(Self::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed(ENV_PREFIX));
        Self::extract(figment)
    }

    /// Checks value ranges.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] when the event channel capacity
    /// is zero.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.event_channel_capacity == 0 {
            return Err(ConfigError::InvalidValue {
                field: "event_channel_capacity",
                reason: "must be at least 1".to_owned(),
            });
        }
        Ok(())
    }

    fn base_figment() -> Figment {
        Figment::new()
            .merge(Serialized::defaults(Self::default()))
            .merge(Env::prefixed(ENV_PREFIX))
    }

    fn extract(figment: Figment) -> Result<Self, ConfigError> {
        let config: Self = figment.extract().map_err(Box::new)?;
        config.validate()?;
        debug!(
            max_concurrent_transitions = config.max_concurrent_transitions,
            event_channel_capacity = config.event_channel_capacity,
            "container configuration loaded"
        );
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_are_valid() {
        let config = ContainerConfig::default();

        assert_eq!(config.max_concurrent_transitions, 0);
        assert_eq!(config.event_channel_capacity, 256);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn zero_event_capacity_is_rejected() {
        let config = ContainerConfig {
            event_channel_capacity: 0,
            ..ContainerConfig::default()
        };

        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue {
                field: "event_channel_capacity",
                ..
            })
        ));
    }

    #[test]
    fn file_values_override_defaults() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file should be created");
        writeln!(file, "max_concurrent_transitions = 2").expect("temp file should be writable");

        let config =
            ContainerConfig::load_from_file(file.path()).expect("configuration should load");

        assert_eq!(config.max_concurrent_transitions, 2);
        assert_eq!(config.event_channel_capacity, 256);
    }
}
