//! Load-time errors.
//!
//! The runtime split is deliberate: compiling templates, states, and rule
//! sets returns `Result<_, BehaviorError>`, while runtime evaluation
//! (expressions, schema instancing, condition checks) reports failure
//! through empty values, `Option`, or `false` and keeps going. Only
//! whole-operation entry points (`set_state`, `process_event`) surface a
//! `BehaviorError` at runtime, and only for structural problems.

use crate::core::Name;
use thiserror::Error;

/// Errors raised by template/rule compilation and state-machine entry points.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum BehaviorError {
    /// A state was referenced by a name no state in the template carries.
    #[error("unknown state {0}")]
    UnknownState(Name),

    /// A state index (current or requested) is outside the template's
    /// state vector.
    #[error("state index {index} out of range ({len} states)")]
    StateIndexOutOfRange { index: usize, len: usize },

    /// An event arrived whose type id is not registered. Treated as a
    /// content bug and raised eagerly rather than silently ignored.
    #[error("unknown event type {0}")]
    UnknownEventType(Name),

    /// A rule was declared with a condition that can never hold, so no
    /// rule could be generated from it.
    #[error("rule condition can never be met: {0}")]
    InvalidCondition(String),

    /// Condition terms joined by one combinator referenced different
    /// event types; a single rule listens to exactly one event id.
    #[error("condition fragment mixes event types {0} and {1}")]
    MixedEventTypes(Name, Name),

    /// A component schema's field-name and field-value lists diverged.
    #[error("schema for {type_id} has {names} field names but {values} values")]
    MismatchedFields {
        type_id: Name,
        names: usize,
        values: usize,
    },

    /// A rule's transition referenced an entity that could not be found.
    #[error("transition target could not be resolved")]
    UnresolvedTarget,
}
