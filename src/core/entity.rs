//! Entity identification.
//!
//! An `Entity` is an opaque handle into the component store. The runtime
//! never interprets the raw value; it only passes entities between the
//! store, templates, and rules.
//!
//! One value is reserved: `Entity::NULL`, used wherever a reference may be
//! deliberately empty (unset rule targets, null comparisons in
//! expressions). The null entity compares equal to itself and is never
//! returned by `ComponentStore::create`.

use serde::{Deserialize, Serialize};

/// Opaque handle to an entity in the component store.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Entity(pub u32);

impl Entity {
    /// The reserved null entity.
    pub const NULL: Entity = Entity(u32::MAX);

    /// Create an entity handle from a raw id.
    #[must_use]
    pub const fn from_raw(id: u32) -> Self {
        Self(id)
    }

    /// Get the raw id value.
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Check whether this is the reserved null entity.
    #[must_use]
    pub const fn is_null(self) -> bool {
        self.0 == u32::MAX
    }
}

impl Default for Entity {
    fn default() -> Self {
        Self::NULL
    }
}

impl std::fmt::Display for Entity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_null() {
            write!(f, "Entity(null)")
        } else {
            write!(f, "Entity({})", self.0)
        }
    }
}
