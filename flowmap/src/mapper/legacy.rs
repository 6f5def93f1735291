//! Task-level mapper API for flows authored against the older naming.
//!
//! Every operation delegates to the matching activity-level operation of
//! [`MapperFactory`]. Scheduled for removal once no flow definitions use the
//! task-level names.

use super::{DefaultActivityOutputMapper, Mapper, MapperFactory};
use crate::definition::{MapperDef, Task};
use crate::errors::MappingError;
use std::sync::Arc;

/// The default output mapper under its task-level name.
#[deprecated(note = "use `DefaultActivityOutputMapper`")]
pub type DefaultTaskOutputMapper = DefaultActivityOutputMapper;

/// Task-level names for the [`MapperFactory`] operations.
///
/// Implemented for every mapper factory.
pub trait TaskMapperFactory {
    /// Same as [`MapperFactory::new_activity_input_mapper`].
    ///
    /// # Errors
    ///
    /// Returns `MappingError::Configuration` if the definition is invalid.
    #[deprecated(note = "use `MapperFactory::new_activity_input_mapper`")]
    fn new_task_input_mapper(
        &self,
        task: &Task,
        def: &Arc<MapperDef>,
    ) -> Result<Arc<dyn Mapper>, MappingError>;

    /// Same as [`MapperFactory::new_activity_output_mapper`].
    ///
    /// # Errors
    ///
    /// Returns `MappingError::Configuration` if the definition is invalid.
    #[deprecated(note = "use `MapperFactory::new_activity_output_mapper`")]
    fn new_task_output_mapper(
        &self,
        task: &Task,
        def: &Arc<MapperDef>,
    ) -> Result<Arc<dyn Mapper>, MappingError>;

    /// Same as [`MapperFactory::default_activity_output_mapper`].
    ///
    /// # Errors
    ///
    /// Returns `MappingError::Configuration` if the task has no activity.
    #[deprecated(note = "use `MapperFactory::default_activity_output_mapper`")]
    fn default_task_output_mapper(&self, task: &Task) -> Result<Arc<dyn Mapper>, MappingError>;
}

impl<F: MapperFactory + ?Sized> TaskMapperFactory for F {
    fn new_task_input_mapper(
        &self,
        task: &Task,
        def: &Arc<MapperDef>,
    ) -> Result<Arc<dyn Mapper>, MappingError> {
        self.new_activity_input_mapper(task, def)
    }

    fn new_task_output_mapper(
        &self,
        task: &Task,
        def: &Arc<MapperDef>,
    ) -> Result<Arc<dyn Mapper>, MappingError> {
        self.new_activity_output_mapper(task, def)
    }

    fn default_task_output_mapper(&self, task: &Task) -> Result<Arc<dyn Mapper>, MappingError> {
        self.default_activity_output_mapper(task)
    }
}

#[cfg(test)]
#[allow(deprecated)]
mod tests {
    use super::*;
    use crate::config::MapperConfig;
    use crate::data::DataType;
    use crate::definition::{ActivityMetadata, MappingDef};
    use crate::mapper::BasicMapperFactory;

    fn task() -> Task {
        Task::new("orders", "log_1")
            .with_activity(Arc::new(ActivityMetadata::new("log").with_output("message", DataType::String)))
    }

    #[test]
    fn test_task_names_share_the_activity_cache() {
        let factory = BasicMapperFactory::build_default();
        let def = Arc::new(MapperDef::new().with_mapping(MappingDef::assign("m", "$.x")));
        let task = task();

        let current = factory.new_activity_input_mapper(&task, &def).unwrap();
        let legacy = factory.new_task_input_mapper(&task, &def).unwrap();
        assert!(Arc::ptr_eq(&current, &legacy));

        let current = factory.new_activity_output_mapper(&task, &def).unwrap();
        let legacy = factory.new_task_output_mapper(&task, &def).unwrap();
        assert!(Arc::ptr_eq(&current, &legacy));

        let current = factory.default_activity_output_mapper(&task).unwrap();
        let legacy = factory.default_task_output_mapper(&task).unwrap();
        assert!(Arc::ptr_eq(&current, &legacy));
    }

    #[test]
    fn test_works_through_trait_objects() {
        let factory: Arc<dyn MapperFactory> = Arc::new(BasicMapperFactory::build_default());
        assert!(factory.default_task_output_mapper(&task()).is_ok());
    }

    #[test]
    fn test_type_alias() {
        let mapper: DefaultTaskOutputMapper =
            DefaultActivityOutputMapper::for_task(&task(), &MapperConfig::default()).unwrap();
        assert_eq!(mapper.task_id(), "log_1");
    }
}
