//! Resolution of mapping source expressions.
//!
//! The [`Resolver`] trait is the seam to the expression language. The bundled
//! [`ScopeResolver`] understands plain attribute references only.

mod reference;

pub use reference::{PathSegment, Reference, ReferenceSource};

use crate::config::MapperConfig;
use crate::data::Scope;
use crate::errors::ResolutionError;
use serde_json::Value;
use std::fmt::Debug;

/// Evaluates a mapping source expression against a scope.
pub trait Resolver: Send + Sync + Debug {
    /// Resolves `expression` to a value.
    ///
    /// # Errors
    ///
    /// Returns `ResolutionError` if the expression cannot be evaluated.
    fn resolve(&self, expression: &str, scope: &dyn Scope) -> Result<Value, ResolutionError>;
}

/// Resolves attribute references against the given scope.
///
/// A resolver without an activity namespace rejects `$activity[...]`
/// references; output mappings use it so they can only read what their own
/// task produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopeResolver {
    activity_namespace: Option<String>,
}

impl ScopeResolver {
    /// Creates a resolver that maps `$activity[t].x` to `<namespace>.t.x`.
    #[must_use]
    pub fn new(activity_namespace: impl Into<String>) -> Self {
        Self {
            activity_namespace: Some(activity_namespace.into()),
        }
    }

    /// Creates a resolver using the configured activity namespace.
    #[must_use]
    pub fn from_config(config: &MapperConfig) -> Self {
        Self::new(config.activity_namespace.clone())
    }

    /// Creates a resolver limited to the attributes of the given scope.
    #[must_use]
    pub const fn scope_only() -> Self {
        Self {
            activity_namespace: None,
        }
    }

    fn attribute_name(&self, expression: &str, reference: &Reference) -> Result<String, ResolutionError> {
        match reference.source() {
            ReferenceSource::Scope => Ok(reference.attribute().to_string()),
            ReferenceSource::Activity(task_id) => match &self.activity_namespace {
                Some(namespace) => Ok(format!("{namespace}.{task_id}.{}", reference.attribute())),
                None => Err(ResolutionError::new(
                    expression,
                    "activity references are not available in this mapping",
                )),
            },
        }
    }
}

impl Default for ScopeResolver {
    fn default() -> Self {
        Self::from_config(&MapperConfig::default())
    }
}

impl Resolver for ScopeResolver {
    fn resolve(&self, expression: &str, scope: &dyn Scope) -> Result<Value, ResolutionError> {
        let reference = Reference::parse(expression)?;
        let name = self.attribute_name(expression, &reference)?;
        let attr = scope
            .get_attr(&name)
            .ok_or_else(|| ResolutionError::unknown_attribute(expression, &name))?;

        reference
            .navigate(attr.into_value())
            .map_err(|reason| ResolutionError::new(expression, reason))
    }
}
