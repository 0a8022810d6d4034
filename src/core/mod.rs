//! Core identifiers shared by every other module.

mod entity;
mod name;

pub use entity::Entity;
pub use name::Name;
