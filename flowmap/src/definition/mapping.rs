//! Declarative mapping definitions.

use crate::errors::ConfigurationError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::fmt;

/// How a mapping entry's value is interpreted.
///
/// Flow definitions may spell the type either by name or by its legacy
/// numeric code (`1` assign, `2` literal, `4` object).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Value", into = "String")]
pub enum MappingType {
    /// The value is a reference resolved against the input scope.
    Assign,
    /// The value is copied verbatim.
    Literal,
    /// The value is a JSON template whose `$` string leaves are references.
    Object,
}

impl MappingType {
    /// Returns the canonical name of the mapping type.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Assign => "assign",
            Self::Literal => "literal",
            Self::Object => "object",
        }
    }
}

impl fmt::Display for MappingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<MappingType> for String {
    fn from(value: MappingType) -> Self {
        value.as_str().to_string()
    }
}

impl TryFrom<Value> for MappingType {
    type Error = String;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match &value {
            Value::String(s) => match s.to_ascii_lowercase().as_str() {
                "assign" => Ok(Self::Assign),
                "literal" => Ok(Self::Literal),
                "object" => Ok(Self::Object),
                other => Err(format!("unknown mapping type '{other}'")),
            },
            Value::Number(n) => match n.as_u64() {
                Some(1) => Ok(Self::Assign),
                Some(2) => Ok(Self::Literal),
                Some(4) => Ok(Self::Object),
                _ => Err(format!("unsupported mapping type code {n}")),
            },
            _ => Err(format!("invalid mapping type {value}")),
        }
    }
}

/// A single `target <- source` mapping entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MappingDef {
    /// How `value` is interpreted.
    #[serde(rename = "type")]
    pub mapping_type: MappingType,
    /// The source expression, literal or template.
    pub value: Value,
    /// The attribute the result is written to.
    pub map_to: String,
}

impl MappingDef {
    /// Creates a new mapping entry.
    #[must_use]
    pub fn new(mapping_type: MappingType, map_to: impl Into<String>, value: Value) -> Self {
        Self {
            mapping_type,
            value,
            map_to: map_to.into(),
        }
    }

    /// Creates a mapping that resolves a reference.
    #[must_use]
    pub fn assign(map_to: impl Into<String>, reference: impl Into<String>) -> Self {
        Self::new(MappingType::Assign, map_to, Value::String(reference.into()))
    }

    /// Creates a mapping that writes a constant.
    #[must_use]
    pub fn literal(map_to: impl Into<String>, value: Value) -> Self {
        Self::new(MappingType::Literal, map_to, value)
    }

    /// Creates a mapping that fills in a JSON template.
    #[must_use]
    pub fn object(map_to: impl Into<String>, template: Value) -> Self {
        Self::new(MappingType::Object, map_to, template)
    }

    fn validate(&self, key: &str, index: usize) -> Result<(), ConfigurationError> {
        if self.map_to.trim().is_empty() {
            return Err(ConfigurationError::new(
                key,
                format!("mapping #{index} has an empty target"),
            ));
        }

        if self.mapping_type == MappingType::Assign {
            match self.value.as_str() {
                Some(reference) if !reference.trim().is_empty() => {}
                _ => {
                    return Err(ConfigurationError::new(
                        key,
                        format!(
                            "mapping #{index} to '{}' must assign from a non-empty reference, got {}",
                            self.map_to, self.value
                        ),
                    ))
                }
            }
        }

        Ok(())
    }
}

/// An ordered list of mapping entries.
///
/// When several entries target the same attribute, the later one wins.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MapperDef {
    /// The mapping entries, applied in order.
    #[serde(default)]
    pub mappings: Vec<MappingDef>,
}

impl MapperDef {
    /// Creates an empty mapper definition.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a mapper definition from entries.
    #[must_use]
    pub fn from_mappings(mappings: Vec<MappingDef>) -> Self {
        Self { mappings }
    }

    /// Appends an entry.
    #[must_use]
    pub fn with_mapping(mut self, mapping: MappingDef) -> Self {
        self.mappings.push(mapping);
        self
    }

    /// Returns the number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.mappings.len()
    }

    /// Returns true if there are no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }

    /// Iterates over the entries in order.
    pub fn iter(&self) -> std::slice::Iter<'_, MappingDef> {
        self.mappings.iter()
    }

    /// Returns the distinct target attributes, in first-seen order.
    #[must_use]
    pub fn targets(&self) -> Vec<&str> {
        let mut targets: Vec<&str> = Vec::new();
        for mapping in &self.mappings {
            if !targets.contains(&mapping.map_to.as_str()) {
                targets.push(&mapping.map_to);
            }
        }
        targets
    }

    /// Checks every entry for problems detectable before execution.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError` naming `key` and the first bad entry.
    pub fn validate(&self, key: &str) -> Result<(), ConfigurationError> {
        self.mappings
            .iter()
            .enumerate()
            .try_for_each(|(index, mapping)| mapping.validate(key, index))
    }

    /// Returns a SHA-256 fingerprint of the definition content.
    #[must_use]
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        for mapping in &self.mappings {
            hasher.update(mapping.mapping_type.as_str().as_bytes());
            hasher.update([0]);
            hasher.update(mapping.map_to.as_bytes());
            hasher.update([0]);
            hasher.update(mapping.value.to_string().as_bytes());
            hasher.update([0xff]);
        }
        hex::encode(hasher.finalize())
    }
}

impl<'a> IntoIterator for &'a MapperDef {
    type Item = &'a MappingDef;
    type IntoIter = std::slice::Iter<'a, MappingDef>;

    fn into_iter(self) -> Self::IntoIter {
        self.mappings.iter()
    }
}
