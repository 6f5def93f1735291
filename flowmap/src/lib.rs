//! # Flowmap
//!
//! Attribute binding for flow execution engines.
//!
//! Flowmap moves data between the tasks of a flow:
//!
//! - **Scopes**: named, typed attributes that tasks read from and write to
//! - **Mapper definitions**: ordered assign, literal and object mappings
//! - **Mappers**: apply a definition, or publish an activity's declared outputs
//! - **Factories**: build mappers once per task transition and share them
//!   across every running instance of a flow
//!
//! ## Quick Start
//!
//! ```rust
//! use flowmap::prelude::*;
//! use serde_json::json;
//!
//! let env = MapperEnvironment::build_default();
//! let task = Task::new("orders", "notify").with_input_mapper(
//!     MapperDef::new().with_mapping(MappingDef::assign("to", "$.customer.email")),
//! );
//!
//! let flow = SimpleScope::new();
//! flow.add_attr("customer", DataType::Object, json!({"email": "ada@example.com"}));
//!
//! let task_scope = SimpleScope::new();
//! if let Some(mapper) = env.input_mapper_for(&task)? {
//!     mapper.apply(&flow, &task_scope)?;
//! }
//! assert_eq!(task_scope.value("to"), Some(json!("ada@example.com")));
//! # Ok::<(), MappingError>(())
//! ```

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    missing_docs,
    rust_2018_idioms
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod config;
pub mod data;
pub mod definition;
pub mod errors;
pub mod mapper;
pub mod resolve;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::config::MapperConfig;
    pub use crate::data::{Attribute, DataType, FixedScope, MutableScope, Scope, SimpleScope};
    pub use crate::definition::{
        ActivityMetadata, AttributeDecl, MapperDef, MappingDef, MappingType, Task,
    };
    pub use crate::errors::{
        ConfigurationError, MappingError, ResolutionError, TypeCoercionError,
    };
    pub use crate::mapper::{
        BaseFactorySource, BaseMapperFactory, BasicMapper, BasicMapperFactory,
        CachingBaseFactory, DefaultActivityOutputMapper, Mapper, MapperEnvironment,
        MapperFactory, MapperFactoryBuilder, MapperPhase,
    };
    pub use crate::resolve::{Resolver, ScopeResolver};
}
