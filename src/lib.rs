//! # statecraft
//!
//! A data-driven entity behavior runtime: templates describe what an
//! entity is, states describe what it carries and how it reacts, and
//! trigger rules move it between states in response to typed events.
//!
//! ## Design Principles
//!
//! 1. **Game-Agnostic**: No hardcoded component or event types. Documents
//!    register types with the `TypeRegistry` at startup; the engine only
//!    ever sees type-erased `Value`s.
//!
//! 2. **Late Binding**: Schema fields, rule comparison values, and
//!    expression operands may be references (pool slots, component
//!    members, nested schemas, deferred expressions) resolved at the
//!    moment of use, against the live store.
//!
//! 3. **Fail Local**: Load-time problems (bad documents) are `Result`s;
//!    runtime resolution misses are `Option`s, logged and skipped so one
//!    bad field never aborts a transition.
//!
//! ## Modules
//!
//! - `core`: `Name` and `Entity` id types
//! - `value`: the type-erased `Value` sum, objects, and the shared pool
//! - `registry`: runtime type descriptions, fields, and native functions
//! - `expr`: left-to-right expressions and the indirection protocol
//! - `schema`: component construction and patching
//! - `triggers`: events, conditions, and transition rules
//! - `state`: state definitions and entity templates
//! - `store`: the entity-component store

pub mod context;
pub mod core;
pub mod error;
pub mod expr;
pub mod registry;
pub mod schema;
pub mod state;
pub mod store;
pub mod triggers;
pub mod value;

// Re-export commonly used types
pub use crate::core::{Entity, Name};

pub use crate::value::{
    IndirectRef, MemberRef, Object, Value, ValueKind, ValuePool,
};

pub use crate::registry::{
    FieldInfo, FunctionInfo, TypeInfo, TypeRegistry, ASSIGN_OPERATOR, CALL_OPERATOR,
};

pub use crate::context::EvalContext;

pub use crate::expr::{
    assign_value, has_indirection, resolve_value, Expression, Indirection, Operator, ResolveMode,
    Segment,
};

pub use crate::schema::{ComponentSchema, SchemaFlags};

pub use crate::triggers::{
    BehaviorEvent, Comparison, Rule, RuleSetBuilder, StateRef, TargetType, TransitionRule,
    TriggerCondition,
};

pub use crate::state::{EntityTemplate, EventOutcome, StateDefinition, TemplateBuilder};

pub use crate::store::ComponentStore;

pub use crate::error::BehaviorError;
