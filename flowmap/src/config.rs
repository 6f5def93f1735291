//! Configuration for mapper construction.

use crate::errors::ConfigurationError;
use serde::{Deserialize, Serialize};

/// Environment variable overriding [`MapperConfig::activity_namespace`].
pub const ENV_ACTIVITY_NAMESPACE: &str = "FLOWMAP_ACTIVITY_NAMESPACE";
/// Environment variable overriding [`MapperConfig::cache_enabled`].
pub const ENV_CACHE_ENABLED: &str = "FLOWMAP_CACHE_ENABLED";
/// Environment variable overriding [`MapperConfig::strict_types`].
pub const ENV_STRICT_TYPES: &str = "FLOWMAP_STRICT_TYPES";

/// Settings shared by the mapper factories.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapperConfig {
    /// Prefix under which default output mappers publish activity outputs.
    #[serde(default = "default_activity_namespace")]
    pub activity_namespace: String,
    /// Whether task mappers are cached by identity.
    #[serde(default = "default_cache_enabled")]
    pub cache_enabled: bool,
    /// Whether a failed type coercion aborts the mapping.
    ///
    /// When disabled, the uncoerced value is written instead.
    #[serde(default = "default_strict_types")]
    pub strict_types: bool,
}

fn default_activity_namespace() -> String {
    "_A".to_string()
}

fn default_cache_enabled() -> bool {
    true
}

fn default_strict_types() -> bool {
    true
}

impl Default for MapperConfig {
    fn default() -> Self {
        Self {
            activity_namespace: default_activity_namespace(),
            cache_enabled: default_cache_enabled(),
            strict_types: default_strict_types(),
        }
    }
}

impl MapperConfig {
    /// Creates a configuration with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a configuration from `FLOWMAP_*` environment variables.
    ///
    /// Unset variables keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError` if a variable holds an invalid value.
    pub fn from_env() -> Result<Self, ConfigurationError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigurationError> {
        let mut config = Self::default();

        if let Some(namespace) = lookup(ENV_ACTIVITY_NAMESPACE) {
            config = config.with_activity_namespace(namespace);
        }
        if let Some(raw) = lookup(ENV_CACHE_ENABLED) {
            config.cache_enabled = parse_flag(ENV_CACHE_ENABLED, &raw)?;
        }
        if let Some(raw) = lookup(ENV_STRICT_TYPES) {
            config.strict_types = parse_flag(ENV_STRICT_TYPES, &raw)?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Sets the activity output namespace, trimming surrounding whitespace.
    #[must_use]
    pub fn with_activity_namespace(mut self, namespace: impl Into<String>) -> Self {
        let namespace = namespace.into();
        self.activity_namespace = namespace.trim().to_string();
        self
    }

    /// Enables or disables the identity cache.
    #[must_use]
    pub const fn with_cache_enabled(mut self, enabled: bool) -> Self {
        self.cache_enabled = enabled;
        self
    }

    /// Enables or disables strict type coercion.
    #[must_use]
    pub const fn with_strict_types(mut self, strict: bool) -> Self {
        self.strict_types = strict;
        self
    }

    /// Checks the configuration for unusable values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError` if the namespace is empty, has
    /// surrounding whitespace or contains a dot.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        let namespace = self.activity_namespace.as_str();
        if namespace.trim().is_empty() {
            return Err(ConfigurationError::new(
                "activity_namespace",
                "namespace must not be empty",
            ));
        }
        if namespace.trim() != namespace {
            return Err(ConfigurationError::new(
                "activity_namespace",
                format!("namespace '{namespace}' must not have surrounding whitespace"),
            ));
        }
        if namespace.contains('.') {
            return Err(ConfigurationError::new(
                "activity_namespace",
                format!("namespace '{namespace}' must not contain '.'"),
            ));
        }
        Ok(())
    }

    /// Returns the attribute prefix for a task's default outputs.
    #[must_use]
    pub fn task_output_prefix(&self, task_id: &str) -> String {
        format!("{}.{}.", self.activity_namespace, task_id)
    }
}

fn parse_flag(key: &str, raw: &str) -> Result<bool, ConfigurationError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(ConfigurationError::new(
            key,
            format!("expected a boolean, got '{other}'"),
        )),
    }
}
