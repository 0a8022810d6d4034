//! Entity templates.
//!
//! A template is the full data-driven description of an entity kind:
//! base components stamped at creation plus an ordered list of states,
//! the first of which is the initial state. Templates hold no per-entity
//! data; any number of entities run the same template against one
//! [`ComponentStore`].

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::context::EvalContext;
use crate::core::{Entity, Name};
use crate::error::BehaviorError;
use crate::registry::TypeRegistry;
use crate::schema::ComponentSchema;
use crate::state::StateDefinition;
use crate::store::ComponentStore;
use crate::triggers::{BehaviorEvent, StateRef};
use crate::value::ValuePool;

/// Result of offering one event to an entity's state machine.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EventOutcome {
    /// No rule in the current state matched.
    NoMatch,
    /// A rule fired and the transition was performed.
    Transitioned { entity: Entity, state: usize },
    /// A rule fired but the transition carries a delay; nothing was
    /// mutated. The caller schedules the entry itself.
    Deferred {
        entity: Entity,
        state: usize,
        delay: Duration,
    },
}

/// Data-driven description of an entity kind.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct EntityTemplate {
    /// Components every entity of this kind starts with.
    pub components: Vec<ComponentSchema>,
    /// States in declaration order; index 0 is entered at creation.
    pub states: Vec<StateDefinition>,
}

impl EntityTemplate {
    /// Start building a template.
    #[must_use]
    pub fn builder() -> TemplateBuilder {
        TemplateBuilder::default()
    }

    /// Position of a named state.
    #[must_use]
    pub fn find_state(&self, name: Name) -> Option<usize> {
        self.states.iter().position(|state| state.name == Some(name))
    }

    /// Resolve a state designator to a position.
    pub fn state_index(&self, state: impl Into<StateRef>) -> Result<usize, BehaviorError> {
        match state.into() {
            StateRef::Name(name) => self
                .find_state(name)
                .ok_or(BehaviorError::UnknownState(name)),
            StateRef::Index(index) => {
                if index < self.states.len() {
                    Ok(index)
                } else {
                    Err(BehaviorError::StateIndexOutOfRange {
                        index,
                        len: self.states.len(),
                    })
                }
            }
        }
    }

    /// Stamp a new entity: base components, then the initial state.
    pub fn create(
        &self,
        registry: &TypeRegistry,
        store: &mut ComponentStore,
        pool: &mut ValuePool,
    ) -> Entity {
        let entity = store.create();
        for schema in &self.components {
            let instance = {
                let mut ctx = EvalContext::new(registry, store, pool).for_entity(entity);
                schema.instance(&mut ctx)
            };
            if instance.is_empty() {
                log::warn!("template: could not construct component {}", schema.type_id);
                continue;
            }
            store.emplace_or_replace(entity, schema.type_id, instance);
        }
        if let Some(initial) = self.states.first() {
            initial.update(registry, store, pool, entity, None);
            store.set_state_index(entity, 0);
        }
        entity
    }

    /// Move an entity to a state, running the full exit/entry sequence.
    ///
    /// Returns the entered state's position.
    pub fn set_state(
        &self,
        registry: &TypeRegistry,
        store: &mut ComponentStore,
        pool: &mut ValuePool,
        entity: Entity,
        state: impl Into<StateRef>,
    ) -> Result<usize, BehaviorError> {
        let index = self.state_index(state)?;
        let previous = match store.state_index(entity) {
            Some(current) => Some(self.states.get(current).ok_or(
                BehaviorError::StateIndexOutOfRange {
                    index: current,
                    len: self.states.len(),
                },
            )?),
            None => None,
        };
        self.states[index].update(registry, store, pool, entity, previous);
        store.set_state_index(entity, index);
        Ok(index)
    }

    /// Offer one event to an entity's current state.
    ///
    /// Rules registered under the event's type are tried in declaration
    /// order; the first whose condition holds fires and the rest are
    /// skipped. A fired rule with a delay (its own, or the destination
    /// state's activation delay) defers instead of transitioning.
    pub fn process_event(
        &self,
        registry: &TypeRegistry,
        store: &mut ComponentStore,
        pool: &mut ValuePool,
        entity: Entity,
        event: &BehaviorEvent,
    ) -> Result<EventOutcome, BehaviorError> {
        if !registry.contains(event.event_type) {
            return Err(BehaviorError::UnknownEventType(event.event_type));
        }
        let Some(current) = store.state_index(entity) else {
            return Ok(EventOutcome::NoMatch);
        };
        let state = self
            .states
            .get(current)
            .ok_or(BehaviorError::StateIndexOutOfRange {
                index: current,
                len: self.states.len(),
            })?;
        let Some(rules) = state.rules.get(&event.event_type) else {
            return Ok(EventOutcome::NoMatch);
        };

        for rule in rules {
            let met = match &rule.condition {
                None => true,
                Some(condition) => {
                    let mut ctx =
                        EvalContext::new(registry, store, pool).for_entity(entity);
                    condition.condition_met(event, &mut ctx)
                }
            };
            if !met {
                continue;
            }

            let target = rule
                .action
                .target
                .resolve(entity, store)
                .ok_or(BehaviorError::UnresolvedTarget)?;
            let index = self.state_index(rule.action.state)?;

            let delay = rule.delay.or(self.states[index].activation_delay);
            if let Some(delay) = delay {
                return Ok(EventOutcome::Deferred {
                    entity: target,
                    state: index,
                    delay,
                });
            }
            let state = self.set_state(registry, store, pool, target, index)?;
            return Ok(EventOutcome::Transitioned {
                entity: target,
                state,
            });
        }
        Ok(EventOutcome::NoMatch)
    }
}

/// Builds an [`EntityTemplate`], normalizing the state list.
///
/// Adding a state whose name matches an existing one replaces it in
/// place, keeping its position; this is how documents override inherited
/// states. At build time a state that both persists and removes the same
/// type drops the removal, since persistence wins.
#[derive(Debug, Default)]
pub struct TemplateBuilder {
    components: Vec<ComponentSchema>,
    states: Vec<StateDefinition>,
}

impl TemplateBuilder {
    /// Add a base component.
    #[must_use]
    pub fn with_component(mut self, schema: ComponentSchema) -> Self {
        self.components.push(schema);
        self
    }

    /// Add a state, replacing any existing state of the same name.
    #[must_use]
    pub fn with_state(mut self, state: StateDefinition) -> Self {
        if let Some(name) = state.name {
            if let Some(existing) = self
                .states
                .iter_mut()
                .find(|candidate| candidate.name == Some(name))
            {
                *existing = state;
                return self;
            }
        }
        self.states.push(state);
        self
    }

    /// Finish the template.
    #[must_use]
    pub fn build(mut self) -> EntityTemplate {
        for state in &mut self.states {
            let persist: Vec<Name> =
                state.persist.iter().map(|schema| schema.type_id).collect();
            state.remove.retain(|type_id| {
                let kept = !persist.contains(type_id);
                if !kept {
                    log::warn!(
                        "template: {type_id} is both persisted and removed; keeping it",
                    );
                }
                kept
            });
        }
        EntityTemplate {
            components: self.components,
            states: self.states,
        }
    }
}
