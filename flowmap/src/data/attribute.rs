//! Named, typed attribute values.

use super::DataType;
use crate::errors::TypeCoercionError;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A named value with a declared type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attribute {
    name: String,
    #[serde(rename = "type", default)]
    data_type: DataType,
    #[serde(default)]
    value: Value,
}

impl Attribute {
    /// Creates a new attribute, coercing the value to the declared type.
    ///
    /// # Errors
    ///
    /// Returns `TypeCoercionError` if the value cannot be coerced.
    pub fn new(
        name: impl Into<String>,
        data_type: DataType,
        value: Value,
    ) -> Result<Self, TypeCoercionError> {
        Ok(Self {
            name: name.into(),
            value: data_type.coerce(value)?,
            data_type,
        })
    }

    /// Creates an attribute without coercing the value.
    ///
    /// Scopes store values as written; coercion is the writer's concern.
    #[must_use]
    pub fn raw(name: impl Into<String>, data_type: DataType, value: Value) -> Self {
        Self {
            name: name.into(),
            data_type,
            value,
        }
    }

    /// Creates an attribute of type `any`.
    #[must_use]
    pub fn untyped(name: impl Into<String>, value: Value) -> Self {
        Self::raw(name, DataType::Any, value)
    }

    /// Returns the attribute name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the declared type.
    #[must_use]
    pub const fn data_type(&self) -> DataType {
        self.data_type
    }

    /// Returns the value.
    #[must_use]
    pub const fn value(&self) -> &Value {
        &self.value
    }

    /// Consumes the attribute and returns its value.
    #[must_use]
    pub fn into_value(self) -> Value {
        self.value
    }
}
