//! Flow definition types consumed by the mappers.
//!
//! Mapper definitions and activity metadata are created once when a flow is
//! loaded and are shared read-only afterwards.

mod mapping;
mod task;

pub use mapping::{MapperDef, MappingDef, MappingType};
pub use task::{ActivityMetadata, AttributeDecl, Task};
