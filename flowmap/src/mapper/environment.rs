//! Wiring of mapper factories for an execution engine.
//!
//! The engine receives a [`MapperEnvironment`] at startup instead of reaching
//! for a process-wide factory.

use super::{BaseMapperFactory, BasicMapperFactory, CachingBaseFactory, Mapper, MapperFactory};
use crate::config::MapperConfig;
use crate::definition::Task;
use crate::errors::{ConfigurationError, MappingError};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Where the environment's base factory came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BaseFactorySource {
    /// Exposed by the mapper factory itself.
    Provided,
    /// The bundled [`CachingBaseFactory`], because the mapper factory exposes none.
    Bundled,
}

/// The mapper factories an engine uses for task transitions.
#[derive(Clone)]
pub struct MapperEnvironment {
    factory: Arc<dyn MapperFactory>,
    base: Arc<dyn BaseMapperFactory>,
    base_source: BaseFactorySource,
}

impl MapperEnvironment {
    /// Creates an environment around `factory`.
    ///
    /// The base factory is taken from `factory` when it exposes one, and is
    /// otherwise a bundled [`CachingBaseFactory`] built from `config`.
    #[must_use]
    pub fn new(factory: Arc<dyn MapperFactory>, config: &MapperConfig) -> Self {
        let (base, base_source) = match factory.base_factory() {
            Some(base) => (base, BaseFactorySource::Provided),
            None => {
                debug!("Mapper factory exposes no base factory, using the bundled one");
                let base: Arc<dyn BaseMapperFactory> = Arc::new(CachingBaseFactory::new(config));
                (base, BaseFactorySource::Bundled)
            }
        };

        Self {
            factory,
            base,
            base_source,
        }
    }

    /// Creates an environment with the bundled factory and resolver.
    #[must_use]
    pub fn build_default() -> Self {
        Self::new(
            Arc::new(BasicMapperFactory::build_default()),
            &MapperConfig::default(),
        )
    }

    /// Creates an environment with the bundled factory and the given settings.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError` if the configuration is invalid.
    pub fn from_config(config: MapperConfig) -> Result<Self, ConfigurationError> {
        let factory = BasicMapperFactory::builder()
            .with_config(config.clone())
            .build()?;
        Ok(Self::new(Arc::new(factory), &config))
    }

    /// Returns the mapper factory.
    #[must_use]
    pub fn mapper_factory(&self) -> &Arc<dyn MapperFactory> {
        &self.factory
    }

    /// Returns the base factory, for mappers that belong to no task.
    #[must_use]
    pub fn base_factory(&self) -> &Arc<dyn BaseMapperFactory> {
        &self.base
    }

    /// Returns where the base factory came from.
    #[must_use]
    pub const fn base_source(&self) -> BaseFactorySource {
        self.base_source
    }

    /// Returns the input mapper of `task`, or `None` if it has no input mapping.
    ///
    /// # Errors
    ///
    /// Returns `MappingError::Configuration` if the mapping is invalid.
    pub fn input_mapper_for(&self, task: &Task) -> Result<Option<Arc<dyn Mapper>>, MappingError> {
        task.input_mapper()
            .map(|def| self.factory.new_activity_input_mapper(task, def))
            .transpose()
    }

    /// Returns the output mapper of `task`.
    ///
    /// Tasks without an authored output mapping get the default output mapper.
    ///
    /// # Errors
    ///
    /// Returns `MappingError::Configuration` if the mapping is invalid or the
    /// task has neither an output mapping nor activity metadata.
    pub fn output_mapper_for(&self, task: &Task) -> Result<Arc<dyn Mapper>, MappingError> {
        match task.output_mapper() {
            Some(def) => self.factory.new_activity_output_mapper(task, def),
            None => self.factory.default_activity_output_mapper(task),
        }
    }
}

impl fmt::Debug for MapperEnvironment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MapperEnvironment")
            .field("base_source", &self.base_source)
            .finish_non_exhaustive()
    }
}
