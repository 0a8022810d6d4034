//! Events, trigger conditions, and transition rules.

mod builder;
mod condition;
mod event;
mod rule;

pub use builder::RuleSetBuilder;
pub use condition::{Comparison, TriggerCondition};
pub use event::BehaviorEvent;
pub use rule::{Rule, StateRef, TargetType, TransitionRule};
