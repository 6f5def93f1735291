//! Pass-through output mapper derived from activity metadata.

use super::{Mapper, MapperPhase};
use crate::config::MapperConfig;
use crate::data::{MutableScope, Scope};
use crate::definition::{ActivityMetadata, Task};
use crate::errors::{ConfigurationError, MappingError};
use std::sync::Arc;
use tracing::debug;

/// Publishes every declared output of a task's activity.
///
/// Each output `name` found in the input scope is written to the output
/// scope as `<namespace>.<task_id>.<name>` with its declared type. Outputs
/// the activity did not produce are skipped.
#[derive(Debug, Clone)]
pub struct DefaultActivityOutputMapper {
    task_id: String,
    attr_prefix: String,
    metadata: Arc<ActivityMetadata>,
}

impl DefaultActivityOutputMapper {
    /// Creates the mapper for a task.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError` if the task is not bound to an activity,
    /// or if the task id or a declared output name contains a `.`, which
    /// would let two tasks publish under the same name.
    pub fn for_task(task: &Task, config: &MapperConfig) -> Result<Self, ConfigurationError> {
        let key = || MapperPhase::DefaultOutput.mapper_id(task);
        let metadata = task.activity().ok_or_else(|| {
            ConfigurationError::new(key(), "task has no activity metadata to derive outputs from")
        })?;

        if task.id().contains('.') {
            return Err(ConfigurationError::new(
                key(),
                format!("task id '{}' must not contain '.'", task.id()),
            ));
        }
        if let Some(decl) = metadata.outputs.iter().find(|decl| decl.name.contains('.')) {
            return Err(ConfigurationError::new(
                key(),
                format!("output name '{}' must not contain '.'", decl.name),
            ));
        }

        Ok(Self {
            task_id: task.id().to_string(),
            attr_prefix: config.task_output_prefix(task.id()),
            metadata: Arc::clone(metadata),
        })
    }

    /// Returns the id of the task whose outputs are published.
    #[must_use]
    pub fn task_id(&self) -> &str {
        &self.task_id
    }

    /// Returns the prefix prepended to each output name.
    #[must_use]
    pub fn attr_prefix(&self) -> &str {
        &self.attr_prefix
    }

    /// Returns the name an output is published under.
    #[must_use]
    pub fn output_name(&self, name: &str) -> String {
        format!("{}{}", self.attr_prefix, name)
    }

    /// Returns the activity metadata.
    #[must_use]
    pub fn metadata(&self) -> &Arc<ActivityMetadata> {
        &self.metadata
    }
}

impl Mapper for DefaultActivityOutputMapper {
    fn apply(&self, input: &dyn Scope, output: &dyn MutableScope) -> Result<(), MappingError> {
        for decl in &self.metadata.outputs {
            match input.get_attr(&decl.name) {
                Some(attr) => {
                    output.add_attr(&self.output_name(&decl.name), decl.data_type, attr.into_value());
                }
                None => debug!(
                    task_id = %self.task_id,
                    output = %decl.name,
                    "Declared output not produced, skipping"
                ),
            }
        }
        Ok(())
    }
}
