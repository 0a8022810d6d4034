//! Entity-component store.
//!
//! A minimal store holding type-erased component values per entity, plus
//! the bookkeeping the state machine needs: the current state index, the
//! frozen-component stash, parent/child links for rule targets, and
//! player slots.
//!
//! The store performs no locking; the caller serializes access for the
//! duration of one transition or evaluation.

use rustc_hash::FxHashMap;

use crate::core::{Entity, Name};
use crate::value::Value;

/// Component storage plus per-entity state-machine bookkeeping.
#[derive(Clone, Debug, Default)]
pub struct ComponentStore {
    components: FxHashMap<Entity, FxHashMap<Name, Value>>,
    frozen: FxHashMap<Entity, FxHashMap<Name, Value>>,
    state_index: FxHashMap<Entity, usize>,
    parents: FxHashMap<Entity, Entity>,
    children: FxHashMap<Entity, FxHashMap<Name, Entity>>,
    players: Vec<Entity>,
    next_id: u32,
}

impl ComponentStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a fresh entity.
    pub fn create(&mut self) -> Entity {
        let entity = Entity::from_raw(self.next_id);
        self.next_id += 1;
        self.components.insert(entity, FxHashMap::default());
        entity
    }

    /// Destroy an entity and everything attached to it.
    pub fn destroy(&mut self, entity: Entity) {
        self.components.remove(&entity);
        self.frozen.remove(&entity);
        self.state_index.remove(&entity);
        self.parents.remove(&entity);
        self.children.remove(&entity);
    }

    /// Check whether an entity exists.
    #[must_use]
    pub fn is_alive(&self, entity: Entity) -> bool {
        self.components.contains_key(&entity)
    }

    /// Attach a component value, replacing any existing instance of the
    /// same type.
    pub fn emplace_or_replace(&mut self, entity: Entity, type_id: Name, value: Value) {
        self.components
            .entry(entity)
            .or_default()
            .insert(type_id, value);
    }

    /// Read a component.
    #[must_use]
    pub fn try_get(&self, entity: Entity, type_id: Name) -> Option<&Value> {
        self.components.get(&entity)?.get(&type_id)
    }

    /// Read a component mutably.
    pub fn try_get_mut(&mut self, entity: Entity, type_id: Name) -> Option<&mut Value> {
        self.components.get_mut(&entity)?.get_mut(&type_id)
    }

    /// Detach and return a component.
    pub fn take(&mut self, entity: Entity, type_id: Name) -> Option<Value> {
        self.components.get_mut(&entity)?.remove(&type_id)
    }

    /// Remove a component. Absence is tolerated; returns whether anything
    /// was removed.
    pub fn erase(&mut self, entity: Entity, type_id: Name) -> bool {
        self.components
            .get_mut(&entity)
            .is_some_and(|map| map.remove(&type_id).is_some())
    }

    /// Check whether an entity carries a component type.
    #[must_use]
    pub fn has(&self, entity: Entity, type_id: Name) -> bool {
        self.try_get(entity, type_id).is_some()
    }

    /// Number of components on an entity.
    #[must_use]
    pub fn component_count(&self, entity: Entity) -> usize {
        self.components.get(&entity).map_or(0, FxHashMap::len)
    }

    /// Current state index recorded for an entity.
    #[must_use]
    pub fn state_index(&self, entity: Entity) -> Option<usize> {
        self.state_index.get(&entity).copied()
    }

    /// Record the entity's current state index.
    pub fn set_state_index(&mut self, entity: Entity, index: usize) {
        self.state_index.insert(entity, index);
    }

    /// Move a live component into the frozen stash.
    ///
    /// Returns `false` if the entity does not carry the type.
    pub fn freeze(&mut self, entity: Entity, type_id: Name) -> bool {
        let Some(value) = self.take(entity, type_id) else {
            return false;
        };
        self.frozen.entry(entity).or_default().insert(type_id, value);
        true
    }

    /// Restore a frozen component, replacing any live instance attached
    /// while it was stashed.
    pub fn restore_frozen(&mut self, entity: Entity, type_id: Name) -> bool {
        let Some(value) = self
            .frozen
            .get_mut(&entity)
            .and_then(|stash| stash.remove(&type_id))
        else {
            return false;
        };
        self.emplace_or_replace(entity, type_id, value);
        true
    }

    /// Check whether a component type is currently stashed.
    #[must_use]
    pub fn is_frozen(&self, entity: Entity, type_id: Name) -> bool {
        self.frozen
            .get(&entity)
            .is_some_and(|stash| stash.contains_key(&type_id))
    }

    /// Link a child entity to its parent.
    pub fn set_parent(&mut self, child: Entity, parent: Entity) {
        self.parents.insert(child, parent);
    }

    /// The parent of an entity, if linked.
    #[must_use]
    pub fn parent(&self, entity: Entity) -> Option<Entity> {
        self.parents.get(&entity).copied()
    }

    /// Attach a named child to an entity.
    pub fn set_child(&mut self, parent: Entity, name: Name, child: Entity) {
        self.children.entry(parent).or_default().insert(name, child);
        self.parents.insert(child, parent);
    }

    /// Look up a named child.
    #[must_use]
    pub fn child(&self, parent: Entity, name: Name) -> Option<Entity> {
        self.children.get(&parent)?.get(&name).copied()
    }

    /// Bind a player index to an entity.
    pub fn register_player(&mut self, index: u8, entity: Entity) {
        let index = index as usize;
        if self.players.len() <= index {
            self.players.resize(index + 1, Entity::NULL);
        }
        self.players[index] = entity;
    }

    /// Entity bound to a player index.
    #[must_use]
    pub fn player(&self, index: u8) -> Option<Entity> {
        let entity = *self.players.get(index as usize)?;
        (!entity.is_null()).then_some(entity)
    }

    /// Number of live entities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.components.len()
    }

    /// Check if no entities exist.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Object;

    const HEALTH: Name = Name::of("Health");

    fn health_value(hp: i64) -> Value {
        Value::Object(Object::new(HEALTH).with_field("hp", hp))
    }

    #[test]
    fn test_component_lifecycle() {
        let mut store = ComponentStore::new();
        let entity = store.create();

        store.emplace_or_replace(entity, HEALTH, health_value(100));
        assert!(store.has(entity, HEALTH));

        store.emplace_or_replace(entity, HEALTH, health_value(50));
        assert_eq!(store.component_count(entity), 1);

        assert!(store.erase(entity, HEALTH));
        assert!(!store.erase(entity, HEALTH));
        assert!(!store.has(entity, HEALTH));
    }

    #[test]
    fn test_destroy_clears_everything() {
        let mut store = ComponentStore::new();
        let entity = store.create();
        store.emplace_or_replace(entity, HEALTH, health_value(1));
        store.set_state_index(entity, 2);
        store.destroy(entity);

        assert!(!store.is_alive(entity));
        assert_eq!(store.state_index(entity), None);
    }

    #[test]
    fn test_freeze_and_restore() {
        let mut store = ComponentStore::new();
        let entity = store.create();
        store.emplace_or_replace(entity, HEALTH, health_value(42));

        assert!(store.freeze(entity, HEALTH));
        assert!(!store.has(entity, HEALTH));
        assert!(store.is_frozen(entity, HEALTH));

        // A live instance attached meanwhile loses to the stash on restore.
        store.emplace_or_replace(entity, HEALTH, health_value(1));
        assert!(store.restore_frozen(entity, HEALTH));
        assert_eq!(store.try_get(entity, HEALTH), Some(&health_value(42)));
        assert!(!store.is_frozen(entity, HEALTH));
    }

    #[test]
    fn test_freeze_missing_component() {
        let mut store = ComponentStore::new();
        let entity = store.create();
        assert!(!store.freeze(entity, HEALTH));
        assert!(!store.restore_frozen(entity, HEALTH));
    }

    #[test]
    fn test_hierarchy_and_players() {
        let mut store = ComponentStore::new();
        let parent = store.create();
        let child = store.create();
        let pawn = store.create();

        store.set_child(parent, Name::of("weapon"), child);
        assert_eq!(store.child(parent, Name::of("weapon")), Some(child));
        assert_eq!(store.parent(child), Some(parent));
        assert_eq!(store.child(parent, Name::of("hat")), None);

        store.register_player(1, pawn);
        assert_eq!(store.player(1), Some(pawn));
        assert_eq!(store.player(0), None);
    }
}
