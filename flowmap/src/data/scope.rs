//! Thread-safe attribute scopes.

use super::{Attribute, DataType};
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Read access to a set of named attributes.
///
/// Absence is a normal outcome: lookups never fail.
pub trait Scope: Send + Sync {
    /// Gets an attribute by name.
    fn get_attr(&self, name: &str) -> Option<Attribute>;
}

/// A scope that can also be written to.
pub trait MutableScope: Scope {
    /// Adds an attribute, replacing any attribute with the same name.
    fn add_attr(&self, name: &str, data_type: DataType, value: Value);
}

/// The general purpose mutable scope.
///
/// Reads that miss fall through to the parent scope, if any. Writes always
/// land in this scope and never reach the parent.
#[derive(Default)]
pub struct SimpleScope {
    attrs: RwLock<HashMap<String, Attribute>>,
    parent: Option<Arc<dyn Scope>>,
}

impl SimpleScope {
    /// Creates a new empty scope.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty scope that reads through to `parent`.
    #[must_use]
    pub fn with_parent(parent: Arc<dyn Scope>) -> Self {
        Self {
            attrs: RwLock::new(HashMap::new()),
            parent: Some(parent),
        }
    }

    /// Creates a scope holding the given attributes.
    ///
    /// Later attributes replace earlier ones with the same name.
    #[must_use]
    pub fn from_attrs(attrs: impl IntoIterator<Item = Attribute>) -> Self {
        let attrs = attrs
            .into_iter()
            .map(|attr| (attr.name().to_string(), attr))
            .collect();
        Self {
            attrs: RwLock::new(attrs),
            parent: None,
        }
    }

    /// Gets the value of an attribute, if present.
    #[must_use]
    pub fn value(&self, name: &str) -> Option<Value> {
        self.get_attr(name).map(Attribute::into_value)
    }

    /// Returns a snapshot of the attributes held directly by this scope.
    #[must_use]
    pub fn attrs(&self) -> Vec<Attribute> {
        self.attrs.read().values().cloned().collect()
    }

    /// Returns a snapshot of name/value pairs held directly by this scope.
    #[must_use]
    pub fn to_dict(&self) -> HashMap<String, Value> {
        self.attrs
            .read()
            .iter()
            .map(|(k, v)| (k.clone(), v.value().clone()))
            .collect()
    }

    /// Returns the names of the attributes held directly by this scope.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.attrs.read().keys().cloned().collect()
    }

    /// Returns the number of attributes held directly by this scope.
    #[must_use]
    pub fn len(&self) -> usize {
        self.attrs.read().len()
    }

    /// Returns true if this scope holds no attributes of its own.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.attrs.read().is_empty()
    }
}

impl Scope for SimpleScope {
    fn get_attr(&self, name: &str) -> Option<Attribute> {
        if let Some(attr) = self.attrs.read().get(name) {
            return Some(attr.clone());
        }
        self.parent.as_ref().and_then(|parent| parent.get_attr(name))
    }
}

impl MutableScope for SimpleScope {
    fn add_attr(&self, name: &str, data_type: DataType, value: Value) {
        self.attrs
            .write()
            .insert(name.to_string(), Attribute::raw(name, data_type, value));
    }
}

impl Clone for SimpleScope {
    fn clone(&self) -> Self {
        Self {
            attrs: RwLock::new(self.attrs.read().clone()),
            parent: self.parent.clone(),
        }
    }
}

impl fmt::Debug for SimpleScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SimpleScope")
            .field("attrs", &*self.attrs.read())
            .field("has_parent", &self.parent.is_some())
            .finish()
    }
}

/// A read-only scope over a fixed set of attributes.
#[derive(Debug, Clone, Default)]
pub struct FixedScope {
    attrs: HashMap<String, Attribute>,
}

impl FixedScope {
    /// Creates a scope from the given attributes.
    #[must_use]
    pub fn new(attrs: impl IntoIterator<Item = Attribute>) -> Self {
        Self {
            attrs: attrs
                .into_iter()
                .map(|attr| (attr.name().to_string(), attr))
                .collect(),
        }
    }

    /// Returns the number of attributes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.attrs.len()
    }

    /// Returns true if the scope is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.attrs.is_empty()
    }
}

impl Scope for FixedScope {
    fn get_attr(&self, name: &str) -> Option<Attribute> {
        self.attrs.get(name).cloned()
    }
}
