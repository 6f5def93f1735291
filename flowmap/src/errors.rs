//! Error types for flowmap.
//!
//! Resolution failures surface from `Mapper::apply`; configuration failures
//! surface when a mapper is constructed, before any task runs.

use crate::data::DataType;
use serde_json::Value;
use std::collections::HashMap;
use thiserror::Error;

/// The main error type for mapping operations.
#[derive(Debug, Clone, Error)]
pub enum MappingError {
    /// A mapping source could not be evaluated.
    #[error("{0}")]
    Resolution(#[from] ResolutionError),

    /// A mapper could not be built from its definition.
    #[error("{0}")]
    Configuration(#[from] ConfigurationError),

    /// A value could not be coerced to its declared type.
    #[error("{0}")]
    TypeCoercion(#[from] TypeCoercionError),
}

impl MappingError {
    /// Returns a stable error code for diagnostics.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Resolution(_) => "MAPPING-RESOLUTION",
            Self::Configuration(_) => "MAPPING-CONFIGURATION",
            Self::TypeCoercion(_) => "MAPPING-TYPE-COERCION",
        }
    }

    /// Returns true for errors raised while building a mapper.
    #[must_use]
    pub const fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration(_))
    }

    /// Converts to a dictionary representation.
    #[must_use]
    pub fn to_dict(&self) -> HashMap<String, Value> {
        let mut map = match self {
            Self::Resolution(err) => err.to_dict(),
            Self::Configuration(err) => err.to_dict(),
            Self::TypeCoercion(err) => err.to_dict(),
        };
        map.insert("code".to_string(), serde_json::json!(self.code()));
        map.insert("message".to_string(), serde_json::json!(self.to_string()));
        map
    }
}

/// Error raised when a mapping's source expression cannot be evaluated.
#[derive(Debug, Clone, Error)]
#[error("{}", self.render())]
pub struct ResolutionError {
    /// The expression that failed.
    pub expression: String,
    /// Why it failed.
    pub reason: String,
    /// Position of the failing entry in its mapper definition.
    pub mapping_index: Option<usize>,
    /// Target attribute of the failing entry.
    pub target: Option<String>,
}

impl ResolutionError {
    /// Creates a new resolution error.
    #[must_use]
    pub fn new(expression: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            expression: expression.into(),
            reason: reason.into(),
            mapping_index: None,
            target: None,
        }
    }

    /// Creates an error for a reference to an attribute that does not exist.
    #[must_use]
    pub fn unknown_attribute(expression: impl Into<String>, name: &str) -> Self {
        Self::new(expression, format!("attribute '{name}' not found"))
    }

    /// Records which mapping entry failed.
    #[must_use]
    pub fn with_mapping(mut self, index: usize, target: impl Into<String>) -> Self {
        self.mapping_index = Some(index);
        self.target = Some(target.into());
        self
    }

    fn render(&self) -> String {
        match (&self.mapping_index, &self.target) {
            (Some(index), Some(target)) => format!(
                "Mapping #{index} to '{target}' failed: cannot resolve '{}': {}",
                self.expression, self.reason
            ),
            _ => format!("Cannot resolve '{}': {}", self.expression, self.reason),
        }
    }

    /// Converts to a dictionary representation.
    #[must_use]
    pub fn to_dict(&self) -> HashMap<String, Value> {
        let mut map = HashMap::new();
        map.insert("type".to_string(), serde_json::json!("ResolutionError"));
        map.insert("expression".to_string(), serde_json::json!(self.expression));
        map.insert("reason".to_string(), serde_json::json!(self.reason));
        if let Some(index) = self.mapping_index {
            map.insert("mapping_index".to_string(), serde_json::json!(index));
        }
        if let Some(ref target) = self.target {
            map.insert("target".to_string(), serde_json::json!(target));
        }
        map
    }
}

impl From<TypeCoercionError> for ResolutionError {
    fn from(err: TypeCoercionError) -> Self {
        Self::new(err.value.clone(), err.to_string())
    }
}

/// Error raised when a mapper cannot be built.
#[derive(Debug, Clone, Error)]
#[error("Invalid mapper configuration for '{key}': {message}")]
pub struct ConfigurationError {
    /// The mapper identity or task the error concerns.
    pub key: String,
    /// What is wrong.
    pub message: String,
}

impl ConfigurationError {
    /// Creates a new configuration error.
    #[must_use]
    pub fn new(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            message: message.into(),
        }
    }

    /// Converts to a dictionary representation.
    #[must_use]
    pub fn to_dict(&self) -> HashMap<String, Value> {
        let mut map = HashMap::new();
        map.insert("type".to_string(), serde_json::json!("ConfigurationError"));
        map.insert("key".to_string(), serde_json::json!(self.key));
        map.insert("detail".to_string(), serde_json::json!(self.message));
        map
    }
}

/// Error raised when a value cannot be coerced to a declared type.
#[derive(Debug, Clone, Error)]
#[error("Cannot coerce {value} to {target_type}: {reason}")]
pub struct TypeCoercionError {
    /// The offending value, rendered as JSON.
    pub value: String,
    /// The requested type.
    pub target_type: DataType,
    /// Why coercion failed.
    pub reason: String,
}

impl TypeCoercionError {
    /// Creates a new type coercion error.
    #[must_use]
    pub fn new(value: &Value, target_type: DataType, reason: impl Into<String>) -> Self {
        Self {
            value: value.to_string(),
            target_type,
            reason: reason.into(),
        }
    }

    /// Converts to a dictionary representation.
    #[must_use]
    pub fn to_dict(&self) -> HashMap<String, Value> {
        let mut map = HashMap::new();
        map.insert("type".to_string(), serde_json::json!("TypeCoercionError"));
        map.insert("value".to_string(), serde_json::json!(self.value));
        map.insert("target_type".to_string(), serde_json::json!(self.target_type));
        map.insert("reason".to_string(), serde_json::json!(self.reason));
        map
    }
}
