//! The mapper factory used by the execution engine.

use super::{BaseMapperFactory, CachingBaseFactory, DefaultActivityOutputMapper, Mapper, MapperPhase};
use crate::config::MapperConfig;
use crate::definition::{MapperDef, Task};
use crate::errors::{ConfigurationError, MappingError};
use crate::resolve::{Resolver, ScopeResolver};
use std::fmt;
use std::sync::Arc;

/// Identity used for mappers built outside any task.
const ADHOC_MAPPER_ID: &str = "adhoc";

/// Builds the mappers the engine applies around each task.
///
/// Task mappers are cached by `definition_name.task_id.phase`, so every
/// running instance of a flow shares one mapper per task transition.
pub trait MapperFactory: Send + Sync {
    /// Builds a fresh, uncached mapper with resolver access.
    ///
    /// # Errors
    ///
    /// Returns `MappingError::Configuration` if the definition is invalid.
    fn new_mapper(&self, def: &Arc<MapperDef>) -> Result<Arc<dyn Mapper>, MappingError>;

    /// Returns the cached input mapper of `task`, with resolver access.
    ///
    /// # Errors
    ///
    /// Returns `MappingError::Configuration` if the definition is invalid.
    fn new_activity_input_mapper(
        &self,
        task: &Task,
        def: &Arc<MapperDef>,
    ) -> Result<Arc<dyn Mapper>, MappingError>;

    /// Returns the cached output mapper of `task`.
    ///
    /// Output mappers have no resolver: they only read the task's own scope.
    ///
    /// # Errors
    ///
    /// Returns `MappingError::Configuration` if the definition is invalid.
    fn new_activity_output_mapper(
        &self,
        task: &Task,
        def: &Arc<MapperDef>,
    ) -> Result<Arc<dyn Mapper>, MappingError>;

    /// Returns the cached pass-through output mapper of `task`.
    ///
    /// # Errors
    ///
    /// Returns `MappingError::Configuration` if the task has no activity.
    fn default_activity_output_mapper(&self, task: &Task) -> Result<Arc<dyn Mapper>, MappingError>;

    /// Returns the base factory backing this factory, if it exposes one.
    fn base_factory(&self) -> Option<Arc<dyn BaseMapperFactory>> {
        None
    }
}

/// The standard [`MapperFactory`].
pub struct BasicMapperFactory {
    base: Arc<dyn BaseMapperFactory>,
    resolver: Arc<dyn Resolver>,
    config: MapperConfig,
}

impl BasicMapperFactory {
    /// Creates a factory from explicit collaborators.
    #[must_use]
    pub fn new(
        base: Arc<dyn BaseMapperFactory>,
        resolver: Arc<dyn Resolver>,
        config: MapperConfig,
    ) -> Self {
        Self {
            base,
            resolver,
            config,
        }
    }

    /// Creates a factory with the bundled base factory and resolver.
    #[must_use]
    pub fn build_default() -> Self {
        let config = MapperConfig::default();
        Self::new(
            Arc::new(CachingBaseFactory::new(&config)),
            Arc::new(ScopeResolver::from_config(&config)),
            config,
        )
    }

    /// Returns a builder.
    #[must_use]
    pub fn builder() -> MapperFactoryBuilder {
        MapperFactoryBuilder::default()
    }

    /// Returns the configuration.
    #[must_use]
    pub const fn config(&self) -> &MapperConfig {
        &self.config
    }

    /// Returns the resolver given to input mappers.
    #[must_use]
    pub fn resolver(&self) -> &Arc<dyn Resolver> {
        &self.resolver
    }
}

impl fmt::Debug for BasicMapperFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BasicMapperFactory")
            .field("resolver", &self.resolver)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl MapperFactory for BasicMapperFactory {
    fn new_mapper(&self, def: &Arc<MapperDef>) -> Result<Arc<dyn Mapper>, MappingError> {
        self.base
            .new_mapper(ADHOC_MAPPER_ID, Arc::clone(def), Some(Arc::clone(&self.resolver)))
    }

    fn new_activity_input_mapper(
        &self,
        task: &Task,
        def: &Arc<MapperDef>,
    ) -> Result<Arc<dyn Mapper>, MappingError> {
        self.base.new_unique_mapper(
            &MapperPhase::Input.mapper_id(task),
            Arc::clone(def),
            Some(Arc::clone(&self.resolver)),
        )
    }

    fn new_activity_output_mapper(
        &self,
        task: &Task,
        def: &Arc<MapperDef>,
    ) -> Result<Arc<dyn Mapper>, MappingError> {
        self.base
            .new_unique_mapper(&MapperPhase::Output.mapper_id(task), Arc::clone(def), None)
    }

    fn default_activity_output_mapper(&self, task: &Task) -> Result<Arc<dyn Mapper>, MappingError> {
        let id = MapperPhase::DefaultOutput.mapper_id(task);
        self.base.get_or_build(&id, None, &mut || -> Result<Arc<dyn Mapper>, MappingError> {
            let mapper = DefaultActivityOutputMapper::for_task(task, &self.config)?;
            Ok(Arc::new(mapper) as Arc<dyn Mapper>)
        })
    }

    fn base_factory(&self) -> Option<Arc<dyn BaseMapperFactory>> {
        Some(Arc::clone(&self.base))
    }
}

/// Builder for [`BasicMapperFactory`].
///
/// Collaborators left unset are replaced by the bundled implementations.
#[derive(Default)]
pub struct MapperFactoryBuilder {
    config: MapperConfig,
    base: Option<Arc<dyn BaseMapperFactory>>,
    resolver: Option<Arc<dyn Resolver>>,
}

impl MapperFactoryBuilder {
    /// Sets the configuration.
    #[must_use]
    pub fn with_config(mut self, config: MapperConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the base factory.
    #[must_use]
    pub fn with_base_factory(mut self, base: Arc<dyn BaseMapperFactory>) -> Self {
        self.base = Some(base);
        self
    }

    /// Sets the resolver given to input mappers.
    #[must_use]
    pub fn with_resolver(mut self, resolver: Arc<dyn Resolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    /// Builds the factory.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError` if the configuration is invalid.
    pub fn build(self) -> Result<BasicMapperFactory, ConfigurationError> {
        self.config.validate()?;

        let base = self
            .base
            .unwrap_or_else(|| Arc::new(CachingBaseFactory::new(&self.config)));
        let resolver = self
            .resolver
            .unwrap_or_else(|| Arc::new(ScopeResolver::from_config(&self.config)));

        Ok(BasicMapperFactory::new(base, resolver, self.config))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{DataType, MutableScope, Scope, SimpleScope};
    use crate::definition::{ActivityMetadata, MappingDef};
    use crate::errors::ResolutionError;
    use serde_json::{json, Value};

    #[derive(Debug)]
    struct UpperResolver;

    impl Resolver for UpperResolver {
        fn resolve(&self, expression: &str, scope: &dyn Scope) -> Result<Value, ResolutionError> {
            let name = expression.trim_start_matches("$.");
            scope
                .get_attr(name)
                .and_then(|attr| attr.value().as_str().map(str::to_uppercase))
                .map(Value::String)
                .ok_or_else(|| ResolutionError::unknown_attribute(expression, name))
        }
    }

    fn task(id: &str) -> Task {
        Task::new("orders", id)
            .with_activity(Arc::new(ActivityMetadata::new("log").with_output("message", DataType::String)))
    }

    fn def() -> Arc<MapperDef> {
        Arc::new(MapperDef::new().with_mapping(MappingDef::assign("message", "$.text")))
    }

    fn text_scope() -> SimpleScope {
        let scope = SimpleScope::new();
        scope.add_attr("text", DataType::String, json!("hello"));
        scope
    }

    #[test]
    fn test_input_and_output_mappers_are_cached_per_phase() {
        let factory = BasicMapperFactory::build_default();
        let task = task("log_1");

        let input = factory.new_activity_input_mapper(&task, &def()).unwrap();
        let input_again = factory.new_activity_input_mapper(&task, &def()).unwrap();
        let output = factory.new_activity_output_mapper(&task, &def()).unwrap();
        let other_task = factory.new_activity_input_mapper(&self::task("log_2"), &def()).unwrap();

        assert!(Arc::ptr_eq(&input, &input_again));
        assert!(!Arc::ptr_eq(&input, &output));
        assert!(!Arc::ptr_eq(&input, &other_task));
    }

    #[test]
    fn test_new_mapper_is_fresh() {
        let factory = BasicMapperFactory::build_default();
        let first = factory.new_mapper(&def()).unwrap();
        let second = factory.new_mapper(&def()).unwrap();
        assert!(!Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_only_input_mappers_use_the_resolver() {
        let factory = BasicMapperFactory::builder()
            .with_resolver(Arc::new(UpperResolver))
            .build()
            .unwrap();
        let task = task("log_1");

        let out = SimpleScope::new();
        factory
            .new_activity_input_mapper(&task, &def())
            .unwrap()
            .apply(&text_scope(), &out)
            .unwrap();
        assert_eq!(out.value("message"), Some(json!("HELLO")));

        let out = SimpleScope::new();
        factory
            .new_activity_output_mapper(&task, &def())
            .unwrap()
            .apply(&text_scope(), &out)
            .unwrap();
        assert_eq!(out.value("message"), Some(json!("hello")));
    }

    #[test]
    fn test_default_output_mapper_cached() {
        let factory = BasicMapperFactory::build_default();
        let task = task("log_1");

        let first = factory.default_activity_output_mapper(&task).unwrap();
        let second = factory.default_activity_output_mapper(&task).unwrap();
        assert!(Arc::ptr_eq(&first, &second));

        let out = SimpleScope::new();
        let input = SimpleScope::new();
        input.add_attr("message", DataType::String, json!("done"));
        first.apply(&input, &out).unwrap();
        assert_eq!(out.value("_A.log_1.message"), Some(json!("done")));
    }

    #[test]
    fn test_default_output_mapper_requires_activity() {
        let factory = BasicMapperFactory::build_default();
        let err = factory
            .default_activity_output_mapper(&Task::new("orders", "bare"))
            .unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_builder_rejects_bad_config() {
        let result = BasicMapperFactory::builder()
            .with_config(MapperConfig::default().with_activity_namespace(""))
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn test_builder_uses_given_base_factory() {
        let base = Arc::new(CachingBaseFactory::default());
        let factory = BasicMapperFactory::builder()
            .with_base_factory(base.clone())
            .build()
            .unwrap();

        factory.new_activity_input_mapper(&task("log_1"), &def()).unwrap();

        assert!(base.contains("orders.log_1.input"));
        assert!(factory.base_factory().is_some());
    }
}
