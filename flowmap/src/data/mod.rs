//! Attribute storage.
//!
//! This module provides:
//! - Type tags with value coercion
//! - Named, typed attributes
//! - Read-only and mutable scopes that tasks read from and write to

mod attribute;
mod scope;
mod types;

pub use attribute::Attribute;
pub use scope::{FixedScope, MutableScope, Scope, SimpleScope};
pub use types::DataType;
