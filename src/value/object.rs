//! Component instances.
//!
//! An `Object` is a constructed instance of a registered type: the type id
//! plus the current field values. Raw access by field id lives here; typed
//! access (kind checks, coercion) goes through the registry's `TypeInfo`.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::core::Name;

use super::Value;

/// A type-erased instance of a registered type.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Object {
    /// Id of the registered type this instance belongs to.
    pub type_id: Name,
    /// Current field values, keyed by field id.
    pub fields: FxHashMap<Name, Value>,
}

impl Object {
    /// Create an empty instance of a type.
    #[must_use]
    pub fn new(type_id: Name) -> Self {
        Self {
            type_id,
            fields: FxHashMap::default(),
        }
    }

    /// Set a field (builder pattern).
    #[must_use]
    pub fn with_field(mut self, field: impl Into<Name>, value: impl Into<Value>) -> Self {
        self.fields.insert(field.into(), value.into());
        self
    }

    /// Raw field read.
    #[must_use]
    pub fn field(&self, field: Name) -> Option<&Value> {
        self.fields.get(&field)
    }

    /// Raw field write. Returns the previous value, if any.
    pub fn set_field(&mut self, field: Name, value: Value) -> Option<Value> {
        self.fields.insert(field, value)
    }

    /// Number of fields currently set.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Check if no fields are set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}
