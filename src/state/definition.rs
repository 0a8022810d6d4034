//! State definitions.
//!
//! A state is a recipe for what an entity carries while the state is
//! active: components to add for the state's duration, components to
//! patch but keep across transitions, components to remove or freeze,
//! and the trigger rules that move the entity onward.
//!
//! `update` performs one transition. Application order is fixed:
//! thaw what the previous state froze, decay what it added, apply this
//! state's removals, additions, and persisted patches, then freeze.
//! Because persisted types are patched in place rather than replaced,
//! re-entering a state is idempotent for them.

use std::time::Duration;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::context::EvalContext;
use crate::core::{Entity, Name};
use crate::registry::TypeRegistry;
use crate::schema::ComponentSchema;
use crate::store::ComponentStore;
use crate::triggers::Rule;
use crate::value::ValuePool;

/// One named (or anonymous) state of an entity template.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct StateDefinition {
    /// States addressed by rules need a name; purely positional states
    /// may go without.
    pub name: Option<Name>,
    /// Components kept across transitions; patched when already live,
    /// constructed when missing.
    pub persist: Vec<ComponentSchema>,
    /// Components owned by this state; decay on the way out unless some
    /// involved state persists them.
    pub add: Vec<ComponentSchema>,
    /// Component types removed on entry.
    pub remove: Vec<Name>,
    /// Component types stashed for the state's duration and restored on
    /// exit.
    pub freeze: Vec<Name>,
    /// Delay between a rule selecting this state and entry taking
    /// effect. Scheduling is the caller's job.
    pub activation_delay: Option<Duration>,
    /// Trigger rules, keyed by event type.
    pub rules: FxHashMap<Name, Vec<Rule>>,
}

impl StateDefinition {
    /// Create an anonymous state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a named state.
    #[must_use]
    pub fn named(name: impl Into<Name>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    /// Persist a component across transitions (builder pattern).
    #[must_use]
    pub fn with_persist(mut self, schema: ComponentSchema) -> Self {
        self.persist.push(schema);
        self
    }

    /// Add a state-owned component (builder pattern).
    #[must_use]
    pub fn with_add(mut self, schema: ComponentSchema) -> Self {
        self.add.push(schema);
        self
    }

    /// Remove a component type on entry (builder pattern).
    #[must_use]
    pub fn with_remove(mut self, type_id: impl Into<Name>) -> Self {
        self.remove.push(type_id.into());
        self
    }

    /// Freeze a component type for the state's duration (builder
    /// pattern).
    #[must_use]
    pub fn with_freeze(mut self, type_id: impl Into<Name>) -> Self {
        self.freeze.push(type_id.into());
        self
    }

    /// Set the entry delay (builder pattern).
    #[must_use]
    pub fn with_activation_delay(mut self, delay: Duration) -> Self {
        self.activation_delay = Some(delay);
        self
    }

    /// Register a rule under an event type (builder pattern).
    #[must_use]
    pub fn with_rule(mut self, event_type: impl Into<Name>, rule: Rule) -> Self {
        self.rules.entry(event_type.into()).or_default().push(rule);
        self
    }

    /// Register a batch of `(event type, rule)` pairs, as produced by
    /// [`crate::triggers::RuleSetBuilder`] (builder pattern).
    #[must_use]
    pub fn with_rules(mut self, rules: Vec<(Name, Rule)>) -> Self {
        for (event_type, rule) in rules {
            self.rules.entry(event_type).or_default().push(rule);
        }
        self
    }

    /// Whether this state persists a component type.
    #[must_use]
    pub fn persists(&self, type_id: Name) -> bool {
        self.persist.iter().any(|schema| schema.type_id == type_id)
    }

    /// Transition an entity into this state.
    ///
    /// `previous` is the state being left, `None` on first entry.
    pub fn update(
        &self,
        registry: &TypeRegistry,
        store: &mut ComponentStore,
        pool: &mut ValuePool,
        entity: Entity,
        previous: Option<&StateDefinition>,
    ) {
        if let Some(prev) = previous {
            for &type_id in &prev.freeze {
                if !store.restore_frozen(entity, type_id) {
                    log::debug!("state: nothing frozen to restore for {type_id}");
                }
            }
            // Components the previous state added decay unless either
            // side persists them.
            for schema in &prev.add {
                let type_id = schema.type_id;
                if prev.persists(type_id) || self.persists(type_id) {
                    continue;
                }
                store.erase(entity, type_id);
            }
        }

        for &type_id in &self.remove {
            store.erase(entity, type_id);
        }

        for schema in &self.add {
            let patch = self.persists(schema.type_id);
            apply_schema(schema, registry, store, pool, entity, patch);
        }
        for schema in &self.persist {
            apply_schema(schema, registry, store, pool, entity, true);
        }

        for &type_id in &self.freeze {
            if !store.freeze(entity, type_id) {
                log::debug!("state: nothing to freeze for {type_id}");
            }
        }
    }
}

/// Attach one schema's component to an entity.
///
/// With `patch_existing` a live instance is taken out, patched in place,
/// and put back; otherwise (or when nothing is live) a fresh instance is
/// constructed. A schema that cannot produce an instance is logged and
/// skipped.
fn apply_schema(
    schema: &ComponentSchema,
    registry: &TypeRegistry,
    store: &mut ComponentStore,
    pool: &mut ValuePool,
    entity: Entity,
    patch_existing: bool,
) {
    if patch_existing {
        if let Some(mut value) = store.take(entity, schema.type_id) {
            let mut ctx = EvalContext::new(registry, store, pool).for_entity(entity);
            schema.apply_fields(&mut value, &mut ctx);
            store.emplace_or_replace(entity, schema.type_id, value);
            return;
        }
    }
    let instance = {
        let mut ctx = EvalContext::new(registry, store, pool).for_entity(entity);
        schema.instance(&mut ctx)
    };
    if instance.is_empty() {
        log::warn!("state: could not construct component {}", schema.type_id);
        return;
    }
    store.emplace_or_replace(entity, schema.type_id, instance);
}
