//! Rule-set builder.
//!
//! Rules are authored as a clause chain: `when(event, cond)` followed by
//! any mix of `and_when` / `or_when`. The condition type has no nested
//! parenthesization, so a chain that flips combinator is segmented at
//! the flip into independent rules:
//!
//! `A && B || C` becomes two rules, `(A && B)` and `(C)`; either firing
//! performs the transition. Segments keep left-to-right clause order.
//!
//! Each segment must stay on one event type (a rule is evaluated against
//! a single event), and a segment whose whole condition is `Never` is
//! dropped with a warning rather than registered dead.

use std::time::Duration;

use crate::core::Name;
use crate::error::BehaviorError;

use super::condition::TriggerCondition;
use super::rule::{Rule, TransitionRule};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Combinator {
    All,
    Any,
}

#[derive(Clone, Debug)]
struct Fragment {
    event_type: Name,
    clauses: Vec<TriggerCondition>,
    combinator: Option<Combinator>,
}

impl Fragment {
    fn new(event_type: Name, clause: TriggerCondition) -> Self {
        Self {
            event_type,
            clauses: vec![clause],
            combinator: None,
        }
    }

    /// Collapse into the rule condition, or `None` to drop the fragment.
    ///
    /// `Never` is inert in an OR segment and fatal in an AND segment;
    /// either way the dead part is pruned with a warning instead of
    /// being registered.
    fn into_condition(mut self) -> Option<Option<TriggerCondition>> {
        if self.clauses.contains(&TriggerCondition::Never) {
            log::warn!(
                "rule builder: pruning never-firing clause for event {}",
                self.event_type,
            );
            match self.combinator {
                Some(Combinator::Any) => {
                    self.clauses.retain(|clause| *clause != TriggerCondition::Never);
                }
                _ => return None,
            }
        }
        if self.clauses.is_empty() {
            return None;
        }
        let condition = if self.clauses.len() == 1 {
            self.clauses.remove(0)
        } else {
            match self.combinator {
                Some(Combinator::Any) => TriggerCondition::Any(self.clauses),
                _ => TriggerCondition::All(self.clauses),
            }
        };
        // An always-true condition is the same as no condition at all.
        Some(match condition {
            TriggerCondition::Always => None,
            other => Some(other),
        })
    }
}

/// Builds the rules for one transition from a clause chain.
///
/// ## Example
///
/// ```
/// use statecraft::triggers::{RuleSetBuilder, TransitionRule, TriggerCondition};
///
/// let rules = RuleSetBuilder::new(TransitionRule::to_state("hurt"))
///     .when("Damage", TriggerCondition::equals("amount", 10i64))
///     .and_when("Damage", TriggerCondition::not_equals("blocked", true))
///     .or_when("Damage", TriggerCondition::equals("fatal", true))
///     .build()
///     .unwrap();
/// // The combinator flip segments the chain into two independent rules.
/// assert_eq!(rules.len(), 2);
/// ```
#[derive(Debug)]
pub struct RuleSetBuilder {
    action: TransitionRule,
    delay: Option<Duration>,
    done: Vec<Fragment>,
    pending: Option<Fragment>,
    error: Option<BehaviorError>,
}

impl RuleSetBuilder {
    #[must_use]
    pub fn new(action: TransitionRule) -> Self {
        Self {
            action,
            delay: None,
            done: Vec::new(),
            pending: None,
            error: None,
        }
    }

    /// Delay applied to every rule produced by this builder.
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Start a clause chain.
    #[must_use]
    pub fn when(mut self, event_type: impl Into<Name>, condition: TriggerCondition) -> Self {
        if let Some(fragment) = self.pending.take() {
            self.done.push(fragment);
        }
        self.pending = Some(Fragment::new(event_type.into(), condition));
        self
    }

    /// Join with AND. A flip from OR segments the chain.
    #[must_use]
    pub fn and_when(self, event_type: impl Into<Name>, condition: TriggerCondition) -> Self {
        self.join(Combinator::All, event_type.into(), condition)
    }

    /// Join with OR. A flip from AND segments the chain.
    #[must_use]
    pub fn or_when(self, event_type: impl Into<Name>, condition: TriggerCondition) -> Self {
        self.join(Combinator::Any, event_type.into(), condition)
    }

    fn join(
        mut self,
        combinator: Combinator,
        event_type: Name,
        condition: TriggerCondition,
    ) -> Self {
        if self.error.is_some() {
            return self;
        }
        let Some(mut fragment) = self.pending.take() else {
            // Joining before `when` just starts the chain.
            self.pending = Some(Fragment::new(event_type, condition));
            return self;
        };
        if fragment.combinator.is_some_and(|current| current != combinator) {
            // Combinator flip: the fragment so far becomes its own rule.
            self.done.push(fragment);
            self.pending = Some(Fragment::new(event_type, condition));
            return self;
        }
        if fragment.event_type != event_type {
            self.error = Some(BehaviorError::MixedEventTypes(
                fragment.event_type,
                event_type,
            ));
            return self;
        }
        fragment.combinator = Some(combinator);
        fragment.clauses.push(condition);
        self.pending = Some(fragment);
        self
    }

    /// Finish the chain, yielding `(event type, rule)` pairs.
    pub fn build(mut self) -> Result<Vec<(Name, Rule)>, BehaviorError> {
        if let Some(error) = self.error {
            return Err(error);
        }
        if let Some(fragment) = self.pending.take() {
            self.done.push(fragment);
        }
        if self.done.is_empty() {
            return Err(BehaviorError::InvalidCondition(
                "rule chain has no clauses".into(),
            ));
        }

        let mut rules = Vec::with_capacity(self.done.len());
        for fragment in self.done {
            let event_type = fragment.event_type;
            let Some(condition) = fragment.into_condition() else {
                continue;
            };
            let mut rule = Rule::new(condition, self.action);
            rule.delay = self.delay;
            rules.push((event_type, rule));
        }
        if rules.is_empty() {
            return Err(BehaviorError::InvalidCondition(
                "every clause in the chain can never fire".into(),
            ));
        }
        Ok(rules)
    }
}
