//! Mappers and the factories that build them.
//!
//! A [`Mapper`] copies attribute values from an input scope into an output
//! scope. Mappers are stateless with respect to any single execution: one
//! cached instance serves every concurrent run of the same task.

mod basic;
mod cache;
mod default_output;
mod environment;
mod factory;
pub mod legacy;

pub use basic::BasicMapper;
pub use cache::{BaseMapperFactory, CachingBaseFactory};
pub use default_output::DefaultActivityOutputMapper;
pub use environment::{BaseFactorySource, MapperEnvironment};
pub use factory::{BasicMapperFactory, MapperFactory, MapperFactoryBuilder};

use crate::data::{MutableScope, Scope};
use crate::definition::Task;
use crate::errors::MappingError;
use std::fmt::{self, Debug};

/// Copies and transforms attributes between two scopes.
pub trait Mapper: Send + Sync + Debug {
    /// Applies the mapping, reading from `input` and writing into `output`.
    ///
    /// A failed call may leave `output` partially written.
    ///
    /// # Errors
    ///
    /// Returns `MappingError::Resolution` naming the failing entry.
    fn apply(&self, input: &dyn Scope, output: &dyn MutableScope) -> Result<(), MappingError>;
}

/// The transition of a task a mapper serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MapperPhase {
    /// Upstream scope into the task's scope.
    Input,
    /// Task scope into the flow scope, from an authored mapping.
    Output,
    /// Task scope into the flow scope, from activity metadata.
    DefaultOutput,
}

impl MapperPhase {
    /// Returns the phase suffix used in mapper identities.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Input => "input",
            Self::Output => "output",
            Self::DefaultOutput => "output.default",
        }
    }

    /// Returns the cache identity of this phase of `task`.
    #[must_use]
    pub fn mapper_id(self, task: &Task) -> String {
        format!("{}.{}.{}", task.definition_name(), task.id(), self.as_str())
    }
}

impl fmt::Display for MapperPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mapper_ids() {
        let task = Task::new("orders", "lookup");
        assert_eq!(MapperPhase::Input.mapper_id(&task), "orders.lookup.input");
        assert_eq!(MapperPhase::Output.mapper_id(&task), "orders.lookup.output");
        assert_eq!(
            MapperPhase::DefaultOutput.mapper_id(&task),
            "orders.lookup.output.default"
        );
    }
}
