//! Shared indirect-value pool.
//!
//! Documents can park values in auxiliary shared storage and reference
//! them by `(type id, slot, checksum)`. The pool is a generational arena:
//! every reset bumps the checksum, and a reference carrying a stale
//! checksum fails closed instead of reading whatever now occupies the
//! slot. There is no partial invalidation; the checksum covers the whole
//! pool, matching how the storage is rebuilt wholesale between document
//! loads.

use serde::{Deserialize, Serialize};

use crate::core::Name;

use super::Value;

/// Reference into the shared value pool, standing in for a value.
///
/// Carries the type id the slot was registered under so a reference
/// redirected to a slot of another type also fails closed.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct IndirectRef {
    /// Type id the pooled value was stored under.
    pub type_id: Name,
    /// Slot index in the pool.
    pub slot: u32,
    /// Pool checksum at the time the reference was handed out.
    pub checksum: u32,
}

/// Generational arena backing indirect references.
#[derive(Clone, Debug, Default)]
pub struct ValuePool {
    slots: Vec<Option<(Name, Value)>>,
    checksum: u32,
}

impl ValuePool {
    /// Create an empty pool.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a value and hand out a reference to it.
    pub fn insert(&mut self, type_id: Name, value: Value) -> IndirectRef {
        let slot = self.slots.len() as u32;
        self.slots.push(Some((type_id, value)));
        IndirectRef {
            type_id,
            slot,
            checksum: self.checksum,
        }
    }

    /// Read through a reference.
    ///
    /// Returns `None` for a stale checksum, an out-of-range slot, a freed
    /// slot, or a type-id mismatch.
    #[must_use]
    pub fn get(&self, reference: &IndirectRef) -> Option<&Value> {
        if reference.checksum != self.checksum {
            return None;
        }
        match self.slots.get(reference.slot as usize)? {
            Some((type_id, value)) if *type_id == reference.type_id => Some(value),
            _ => None,
        }
    }

    /// Overwrite the value behind a reference.
    ///
    /// Returns `false` under the same conditions `get` returns `None`.
    pub fn set(&mut self, reference: &IndirectRef, value: Value) -> bool {
        if reference.checksum != self.checksum {
            return false;
        }
        match self.slots.get_mut(reference.slot as usize) {
            Some(Some((type_id, stored))) if *type_id == reference.type_id => {
                *stored = value;
                true
            }
            _ => false,
        }
    }

    /// Free a single slot. Outstanding references to it fail closed.
    pub fn remove(&mut self, reference: &IndirectRef) -> Option<Value> {
        if reference.checksum != self.checksum {
            return None;
        }
        match self.slots.get_mut(reference.slot as usize) {
            Some(entry)
                if matches!(entry.as_ref(), Some((type_id, _)) if *type_id == reference.type_id) =>
            {
                entry.take().map(|(_, value)| value)
            }
            _ => None,
        }
    }

    /// Drop every slot and invalidate all outstanding references.
    pub fn reset(&mut self) {
        self.slots.clear();
        self.checksum = self.checksum.wrapping_add(1);
    }

    /// Number of live slots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    /// Check if the pool holds no live values.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const COUNTER: Name = Name::of("Counter");

    #[test]
    fn test_insert_and_get() {
        let mut pool = ValuePool::new();
        let reference = pool.insert(COUNTER, Value::I64(7));
        assert_eq!(pool.get(&reference), Some(&Value::I64(7)));
    }

    #[test]
    fn test_set_through_reference() {
        let mut pool = ValuePool::new();
        let reference = pool.insert(COUNTER, Value::I64(1));
        assert!(pool.set(&reference, Value::I64(2)));
        assert_eq!(pool.get(&reference), Some(&Value::I64(2)));
    }

    #[test]
    fn test_stale_checksum_fails_closed() {
        let mut pool = ValuePool::new();
        let reference = pool.insert(COUNTER, Value::I64(7));
        pool.reset();
        // A new value now occupies slot 0, but the old reference must not
        // see it.
        let _fresh = pool.insert(COUNTER, Value::I64(99));
        assert_eq!(pool.get(&reference), None);
        assert!(!pool.set(&reference, Value::I64(0)));
    }

    #[test]
    fn test_type_mismatch_fails_closed() {
        let mut pool = ValuePool::new();
        let mut reference = pool.insert(COUNTER, Value::I64(7));
        reference.type_id = Name::of("Other");
        assert_eq!(pool.get(&reference), None);
    }

    #[test]
    fn test_remove_frees_slot() {
        let mut pool = ValuePool::new();
        let reference = pool.insert(COUNTER, Value::I64(7));
        assert_eq!(pool.remove(&reference), Some(Value::I64(7)));
        assert_eq!(pool.get(&reference), None);
        assert!(pool.is_empty());
    }
}
