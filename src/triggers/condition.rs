//! Trigger conditions.
//!
//! A condition is a boolean predicate over one event's payload. The
//! closed sum keeps the shapes the rule builder can produce: a single
//! member comparison, flat AND/OR over children, and the two constants.
//! Nested boolean parenthesization is not representable by design; the
//! builder segments mixed-combinator input into independent rules
//! instead (see [`super::builder`]).
//!
//! Evaluation fails closed: an unresolvable member or an unsupported
//! comparison is simply `false`, never an error.

use serde::{Deserialize, Serialize};

use crate::context::EvalContext;
use crate::core::Name;
use crate::expr::{has_indirection, resolve_value, values_equal, ResolveMode};
use crate::value::Value;

use super::event::BehaviorEvent;

/// How a single comparison relates the member to the stored value.
///
/// Ordered comparisons are declared but not implemented; they evaluate
/// to `false` with a warning.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Comparison {
    Equal,
    NotEqual,
    Less,
    Greater,
}

/// Boolean predicate over an event's payload.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum TriggerCondition {
    /// Compare one payload member against a stored value.
    ///
    /// The stored value may itself need runtime resolution (a member
    /// reference, pool reference, or expression); it resolves through
    /// the indirection protocol at evaluation time, not build time.
    Single {
        member: Name,
        value: Value,
        compare: Comparison,
    },
    /// Every child must hold. Short-circuits left-to-right.
    All(Vec<TriggerCondition>),
    /// At least one child must hold. Short-circuits left-to-right.
    Any(Vec<TriggerCondition>),
    /// Always holds; collapses to "no condition" at build time.
    Always,
    /// Never holds; rejected as a bare top-level condition at build time.
    Never,
}

impl TriggerCondition {
    /// Create a single equality comparison.
    #[must_use]
    pub fn equals(member: impl Into<Name>, value: impl Into<Value>) -> Self {
        Self::Single {
            member: member.into(),
            value: value.into(),
            compare: Comparison::Equal,
        }
    }

    /// Create a single inequality comparison.
    #[must_use]
    pub fn not_equals(member: impl Into<Name>, value: impl Into<Value>) -> Self {
        Self::Single {
            member: member.into(),
            value: value.into(),
            compare: Comparison::NotEqual,
        }
    }

    /// Extend with AND.
    #[must_use]
    pub fn and(self, other: TriggerCondition) -> Self {
        match self {
            Self::All(mut children) => {
                children.push(other);
                Self::All(children)
            }
            _ => Self::All(vec![self, other]),
        }
    }

    /// Extend with OR.
    #[must_use]
    pub fn or(self, other: TriggerCondition) -> Self {
        match self {
            Self::Any(mut children) => {
                children.push(other);
                Self::Any(children)
            }
            _ => Self::Any(vec![self, other]),
        }
    }

    /// Evaluate against an event.
    pub fn condition_met(&self, event: &BehaviorEvent, ctx: &mut EvalContext) -> bool {
        match self {
            TriggerCondition::Single {
                member,
                value,
                compare,
            } => Self::single_met(*member, value, *compare, event, ctx),

            TriggerCondition::All(children) => children
                .iter()
                .all(|child| child.condition_met(event, ctx)),

            TriggerCondition::Any(children) => children
                .iter()
                .any(|child| child.condition_met(event, ctx)),

            TriggerCondition::Always => true,

            TriggerCondition::Never => false,
        }
    }

    fn single_met(
        member: Name,
        value: &Value,
        compare: Comparison,
        event: &BehaviorEvent,
        ctx: &mut EvalContext,
    ) -> bool {
        // Member lookup on the event's runtime type; unresolvable fails
        // closed.
        let actual = match ctx.registry.get(event.event_type) {
            Some(info) => info.get_field(&event.payload, member),
            None => event.payload.field(member).cloned(),
        };
        let Some(actual) = actual else {
            log::debug!("condition: member {member} not present on event payload");
            return false;
        };

        // The stored comparison value resolves now, against the live
        // context. Unresolved indirection participates as null.
        let expected = if has_indirection(value, ctx.registry) {
            resolve_value(value, ctx, ResolveMode::Source).unwrap_or(Value::Empty)
        } else {
            value.clone()
        };

        match compare {
            Comparison::Equal => values_equal(&actual, &expected).unwrap_or(false),
            Comparison::NotEqual => values_equal(&actual, &expected).map_or(false, |eq| !eq),
            Comparison::Less | Comparison::Greater => {
                log::warn!("condition: ordered comparison not implemented, treated as false");
                false
            }
        }
    }
}
