//! Evaluation context.
//!
//! Everything runtime evaluation needs to resolve a value is bundled in
//! one borrowed context: the registry, the store, the shared pool, the
//! entity evaluation is happening on, and the trailing context argument
//! list handed to call/assignment operators.
//!
//! Trailing arguments are optional by construction — resolution tries
//! the most specific match first and drops arguments from the back, so
//! only genuinely optional context belongs here.

use smallvec::SmallVec;

use crate::core::{Entity, Name};
use crate::registry::TypeRegistry;
use crate::store::ComponentStore;
use crate::value::{Value, ValuePool};

/// Borrowed context threaded through all runtime evaluation.
pub struct EvalContext<'a> {
    /// Read-only type registry.
    pub registry: &'a TypeRegistry,
    /// The entity-component store.
    pub store: &'a mut ComponentStore,
    /// Shared indirect-value pool.
    pub pool: &'a mut ValuePool,
    /// Entity the evaluation is scoped to. `Entity::NULL` when none.
    pub entity: Entity,
    /// Trailing context arguments for operator resolution, most
    /// significant first.
    pub args: SmallVec<[Value; 4]>,
}

impl<'a> EvalContext<'a> {
    /// Create a context with no scoped entity and no trailing arguments.
    pub fn new(
        registry: &'a TypeRegistry,
        store: &'a mut ComponentStore,
        pool: &'a mut ValuePool,
    ) -> Self {
        Self {
            registry,
            store,
            pool,
            entity: Entity::NULL,
            args: SmallVec::new(),
        }
    }

    /// Scope the context to an entity (builder pattern).
    #[must_use]
    pub fn for_entity(mut self, entity: Entity) -> Self {
        self.entity = entity;
        self
    }

    /// Append a trailing context argument (builder pattern).
    #[must_use]
    pub fn with_arg(mut self, arg: impl Into<Value>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Read a component field on an entity through the registry's typed
    /// accessor, falling back to the raw field map for unregistered
    /// types.
    #[must_use]
    pub fn read_member(&self, entity: Entity, component: Name, field: Name) -> Option<Value> {
        let value = self.store.try_get(entity, component)?;
        let obj = value.as_object()?;
        match self.registry.get(component) {
            Some(info) => info.get_field(obj, field),
            None => obj.field(field).cloned(),
        }
    }

    /// Write a component field on an entity through the typed setter.
    ///
    /// Returns `false` when the entity lacks the component or the field
    /// refuses the value.
    pub fn write_member(
        &mut self,
        entity: Entity,
        component: Name,
        field: Name,
        value: Value,
    ) -> bool {
        let Some(slot) = self.store.try_get_mut(entity, component) else {
            return false;
        };
        let Value::Object(obj) = slot else {
            return false;
        };
        match self.registry.get(component) {
            Some(info) => info.assign_field(self.registry, obj, field, value),
            None => {
                obj.set_field(field, value);
                true
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::TypeInfo;
    use crate::value::{Object, ValueKind};

    const HEALTH: Name = Name::of("Health");
    const HP: Name = Name::of("hp");

    #[test]
    fn test_member_round_trip() {
        let mut registry = TypeRegistry::new();
        registry.register(TypeInfo::new("Health").with_field("hp", ValueKind::I64));
        let mut store = ComponentStore::new();
        let mut pool = ValuePool::new();
        let entity = store.create();
        store.emplace_or_replace(
            entity,
            HEALTH,
            Value::Object(Object::new(HEALTH).with_field("hp", 10i64)),
        );

        let mut ctx = EvalContext::new(&registry, &mut store, &mut pool).for_entity(entity);
        assert_eq!(ctx.read_member(entity, HEALTH, HP), Some(Value::I64(10)));

        assert!(ctx.write_member(entity, HEALTH, HP, Value::I32(25)));
        assert_eq!(ctx.read_member(entity, HEALTH, HP), Some(Value::I64(25)));
    }

    #[test]
    fn test_member_on_missing_component() {
        let registry = TypeRegistry::new();
        let mut store = ComponentStore::new();
        let mut pool = ValuePool::new();
        let entity = store.create();

        let mut ctx = EvalContext::new(&registry, &mut store, &mut pool);
        assert_eq!(ctx.read_member(entity, HEALTH, HP), None);
        assert!(!ctx.write_member(entity, HEALTH, HP, Value::I64(1)));
    }
}
