//! Type-erased component schemas.

mod component;

pub use component::{ComponentSchema, SchemaFlags};
