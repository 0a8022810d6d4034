//! Trigger rules.
//!
//! A rule binds an optional condition to a transition: when the
//! condition holds for an incoming event, the targeted entity moves to
//! the named (or indexed) state, optionally after a delay. Target and
//! state are resolved late, against the live entity hierarchy, so the
//! same rule text works for every entity stamped from a template.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::core::{Entity, Name};
use crate::store::ComponentStore;

use super::condition::TriggerCondition;

/// Which entity a transition applies to, relative to the entity whose
/// state machine received the event.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TargetType {
    /// The receiving entity.
    Itself,
    /// The receiving entity's parent.
    Parent,
    /// A named child of the receiving entity.
    Child(Name),
    /// A specific entity, fixed at rule construction.
    Entity(Entity),
    /// A registered player slot.
    Player(u8),
}

impl TargetType {
    /// Resolve to a concrete entity against the live hierarchy.
    ///
    /// `None` when the relation does not exist (no parent, no such
    /// child, unregistered player slot).
    #[must_use]
    pub fn resolve(&self, entity: Entity, store: &ComponentStore) -> Option<Entity> {
        match *self {
            TargetType::Itself => Some(entity),
            TargetType::Parent => store.parent(entity),
            TargetType::Child(name) => store.child(entity, name),
            TargetType::Entity(target) => (!target.is_null()).then_some(target),
            TargetType::Player(slot) => store.player(slot),
        }
    }
}

/// State designator, by registered name or by position.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum StateRef {
    Name(Name),
    Index(usize),
}

impl From<Name> for StateRef {
    fn from(name: Name) -> Self {
        StateRef::Name(name)
    }
}

impl From<&str> for StateRef {
    fn from(name: &str) -> Self {
        StateRef::Name(Name::of(name))
    }
}

impl From<usize> for StateRef {
    fn from(index: usize) -> Self {
        StateRef::Index(index)
    }
}

/// The effect of a fired rule: which entity goes to which state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionRule {
    pub target: TargetType,
    pub state: StateRef,
}

impl TransitionRule {
    #[must_use]
    pub fn new(target: TargetType, state: impl Into<StateRef>) -> Self {
        Self {
            target,
            state: state.into(),
        }
    }

    /// Transition the receiving entity itself.
    #[must_use]
    pub fn to_state(state: impl Into<StateRef>) -> Self {
        Self::new(TargetType::Itself, state)
    }
}

/// One condition/transition pairing under an event type.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    /// `None` means unconditional: the rule fires on every event of its
    /// type.
    pub condition: Option<TriggerCondition>,
    /// Delay between the rule firing and the transition taking effect.
    /// Scheduling is the caller's job; the engine only reports it.
    pub delay: Option<Duration>,
    pub action: TransitionRule,
}

impl Rule {
    #[must_use]
    pub fn new(condition: Option<TriggerCondition>, action: TransitionRule) -> Self {
        Self {
            condition,
            delay: None,
            action,
        }
    }

    /// Unconditional rule.
    #[must_use]
    pub fn always(action: TransitionRule) -> Self {
        Self::new(None, action)
    }

    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}
