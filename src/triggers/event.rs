//! Runtime events.
//!
//! Events are instances of registered types: the engine does not know
//! about "damage" or "collision" — documents register event types with
//! whatever fields they need, and gameplay code fires payloads carrying
//! those fields. Trigger conditions then read payload members through
//! the registry.

use serde::{Deserialize, Serialize};

use crate::core::Name;
use crate::value::{Object, Value};

/// An event with a typed payload.
///
/// ## Example
///
/// ```
/// use statecraft::core::Name;
/// use statecraft::triggers::BehaviorEvent;
///
/// let event = BehaviorEvent::new("Damage").with_field("amount", 10i64);
/// assert_eq!(event.event_type, Name::of("Damage"));
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BehaviorEvent {
    /// Registered type id of the event.
    pub event_type: Name,
    /// Field values carried by this occurrence.
    pub payload: Object,
}

impl BehaviorEvent {
    /// Create an event with an empty payload.
    #[must_use]
    pub fn new(event_type: impl Into<Name>) -> Self {
        let event_type = event_type.into();
        Self {
            event_type,
            payload: Object::new(event_type),
        }
    }

    /// Set a payload field (builder pattern).
    #[must_use]
    pub fn with_field(mut self, field: impl Into<Name>, value: impl Into<Value>) -> Self {
        self.payload = self.payload.with_field(field, value);
        self
    }

    /// Raw payload field read.
    #[must_use]
    pub fn field(&self, field: Name) -> Option<&Value> {
        self.payload.field(field)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_payload() {
        let event = BehaviorEvent::new("Damage").with_field("amount", 10i64);
        assert_eq!(event.field(Name::of("amount")), Some(&Value::I64(10)));
        assert_eq!(event.field(Name::of("source")), None);
        assert_eq!(event.payload.type_id, event.event_type);
    }
}
