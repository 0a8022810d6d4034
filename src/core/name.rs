//! Hashed name identifiers.
//!
//! Documents address types, fields, functions, states, and events by
//! string name; at runtime everything is resolved through a single hashed
//! id space. `Name::of` is a `const fn`, so well-known ids can live in
//! constants next to the code that uses them.
//!
//! ## Usage
//!
//! ```
//! use statecraft::core::Name;
//!
//! const HEALTH: Name = Name::of("Health");
//!
//! assert_eq!(HEALTH, Name::of("Health"));
//! assert_ne!(HEALTH, Name::of("Mana"));
//! ```

use serde::{Deserialize, Serialize};
use xxhash_rust::const_xxh3::xxh3_64;

/// Hashed identifier for a named thing (type, field, function, state, event).
///
/// The engine never stores the original string; two names collide only if
/// their xxh3 hashes collide.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Name(pub u64);

impl Name {
    /// Hash a string into a name id. Usable in `const` contexts.
    #[must_use]
    pub const fn of(name: &str) -> Self {
        Self(xxh3_64(name.as_bytes()))
    }

    /// Wrap a raw hash value.
    #[must_use]
    pub const fn from_raw(id: u64) -> Self {
        Self(id)
    }

    /// Get the raw hash value.
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl From<&str> for Name {
    fn from(s: &str) -> Self {
        Self::of(s)
    }
}

impl std::fmt::Display for Name {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Name({:#018x})", self.0)
    }
}
