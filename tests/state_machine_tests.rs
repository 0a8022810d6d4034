//! End-to-end state machine tests: template creation, event-driven
//! transitions, component lifetime across states, and template
//! serialization.

use std::time::Duration;

use statecraft::{
    BehaviorEvent, ComponentSchema, ComponentStore, EntityTemplate, EventOutcome, Name,
    Rule, StateDefinition, TargetType, TransitionRule, TriggerCondition, TypeInfo, TypeRegistry,
    Value, ValueKind, ValuePool,
};

const HEALTH: Name = Name::of("Health");
const STUNNED: Name = Name::of("Stunned");
const WEAPON: Name = Name::of("Weapon");

fn registry() -> TypeRegistry {
    let mut registry = TypeRegistry::new();
    registry.register(TypeInfo::new("Health").with_field_default("hp", ValueKind::I64, 100i64));
    registry.register(TypeInfo::new("Stunned"));
    registry.register(TypeInfo::new("Weapon").with_field_default("dmg", ValueKind::I64, 5i64));
    registry.register(TypeInfo::new("Damage").with_field("amount", ValueKind::I64));
    registry
}

fn hp_of(store: &ComponentStore, entity: statecraft::Entity) -> Option<i64> {
    store
        .try_get(entity, HEALTH)?
        .as_object()?
        .field(Name::of("hp"))?
        .as_i64()
}

/// Template: idle with full health; heavy damage moves to hurt, which
/// persists Health at a lower patch value, adds Stunned, and freezes the
/// weapon; recovering returns to idle and undoes all of it.
fn creature() -> EntityTemplate {
    EntityTemplate::builder()
        .with_component(ComponentSchema::new("Weapon"))
        .with_state(
            StateDefinition::named("idle")
                .with_persist(ComponentSchema::new("Health").with_field("hp", 100i64))
                .with_rule(
                    "Damage",
                    Rule::new(
                        Some(TriggerCondition::equals("amount", 10i64)),
                        TransitionRule::to_state("hurt"),
                    ),
                ),
        )
        .with_state(
            StateDefinition::named("hurt")
                .with_persist(ComponentSchema::new("Health").with_field("hp", 50i64))
                .with_add(ComponentSchema::new("Stunned"))
                .with_freeze("Weapon")
                .with_rule("Recover", Rule::always(TransitionRule::to_state("idle"))),
        )
        .build()
}

#[test]
fn full_transition_cycle() {
    let mut registry = registry();
    registry.register(TypeInfo::new("Recover"));
    let mut store = ComponentStore::new();
    let mut pool = ValuePool::new();
    let template = creature();

    let entity = template.create(&registry, &mut store, &mut pool);
    assert_eq!(store.state_index(entity), Some(0));
    assert_eq!(hp_of(&store, entity), Some(100));
    assert!(store.has(entity, WEAPON));
    assert!(!store.has(entity, STUNNED));

    // Weak hit: no rule matches, nothing changes.
    let weak = BehaviorEvent::new("Damage").with_field("amount", 3i64);
    let outcome = template
        .process_event(&registry, &mut store, &mut pool, entity, &weak)
        .unwrap();
    assert_eq!(outcome, EventOutcome::NoMatch);
    assert_eq!(store.state_index(entity), Some(0));

    // Heavy hit: idle -> hurt.
    let heavy = BehaviorEvent::new("Damage").with_field("amount", 10i64);
    let outcome = template
        .process_event(&registry, &mut store, &mut pool, entity, &heavy)
        .unwrap();
    assert_eq!(outcome, EventOutcome::Transitioned { entity, state: 1 });
    assert_eq!(hp_of(&store, entity), Some(50), "persisted Health patched");
    assert!(store.has(entity, STUNNED), "hurt adds Stunned");
    assert!(!store.has(entity, WEAPON), "Weapon frozen while hurt");
    assert!(store.is_frozen(entity, WEAPON));

    // Recover: hurt -> idle. Stunned decays, Weapon thaws.
    let recover = BehaviorEvent::new("Recover");
    let outcome = template
        .process_event(&registry, &mut store, &mut pool, entity, &recover)
        .unwrap();
    assert_eq!(outcome, EventOutcome::Transitioned { entity, state: 0 });
    assert!(!store.has(entity, STUNNED), "state-owned component decayed");
    assert!(store.has(entity, WEAPON), "frozen component restored");
    assert_eq!(hp_of(&store, entity), Some(100), "idle patches Health back up");
}

#[test]
fn reentering_a_state_is_idempotent() {
    let registry = registry();
    let mut store = ComponentStore::new();
    let mut pool = ValuePool::new();
    let template = creature();
    let entity = template.create(&registry, &mut store, &mut pool);

    let before = store.component_count(entity);
    template
        .set_state(&registry, &mut store, &mut pool, entity, "idle")
        .unwrap();
    template
        .set_state(&registry, &mut store, &mut pool, entity, "idle")
        .unwrap();
    assert_eq!(store.component_count(entity), before);
    assert_eq!(hp_of(&store, entity), Some(100));
}

#[test]
fn persisted_components_survive_unrelated_states() {
    let registry = registry();
    let mut store = ComponentStore::new();
    let mut pool = ValuePool::new();
    let template = creature();
    let entity = template.create(&registry, &mut store, &mut pool);

    // Wound the live component outside any schema.
    if let Some(Value::Object(obj)) = store.try_get_mut(entity, HEALTH) {
        obj.set_field(Name::of("hp"), Value::I64(77));
    }

    // A state persisting Health without a field list keeps the live
    // instance as-is.
    let template2 = EntityTemplate::builder()
        .with_state(StateDefinition::named("idle"))
        .with_state(StateDefinition::named("calm").with_persist(ComponentSchema::new("Health")))
        .build();
    template2
        .set_state(&registry, &mut store, &mut pool, entity, "calm")
        .unwrap();
    assert_eq!(hp_of(&store, entity), Some(77));
}

#[test]
fn delayed_transitions_defer_without_mutating() {
    let registry = registry();
    let mut store = ComponentStore::new();
    let mut pool = ValuePool::new();
    let template = EntityTemplate::builder()
        .with_state(StateDefinition::named("idle").with_rule(
            "Damage",
            Rule::always(TransitionRule::to_state("hurt")).with_delay(Duration::from_secs(2)),
        ))
        .with_state(StateDefinition::named("hurt").with_add(ComponentSchema::new("Stunned")))
        .build();
    let entity = template.create(&registry, &mut store, &mut pool);

    let event = BehaviorEvent::new("Damage").with_field("amount", 1i64);
    let outcome = template
        .process_event(&registry, &mut store, &mut pool, entity, &event)
        .unwrap();
    assert_eq!(
        outcome,
        EventOutcome::Deferred {
            entity,
            state: 1,
            delay: Duration::from_secs(2),
        },
    );
    assert!(!store.has(entity, STUNNED));
    assert_eq!(store.state_index(entity), Some(0));

    // The caller performs the entry when the delay elapses.
    template
        .set_state(&registry, &mut store, &mut pool, entity, 1usize)
        .unwrap();
    assert!(store.has(entity, STUNNED));
}

#[test]
fn rules_can_target_the_player_entity() {
    let registry = registry();
    let mut store = ComponentStore::new();
    let mut pool = ValuePool::new();
    let template = EntityTemplate::builder()
        .with_state(StateDefinition::named("idle").with_rule(
            "Damage",
            Rule::always(TransitionRule::new(TargetType::Player(0), "alerted")),
        ))
        .with_state(StateDefinition::named("alerted"))
        .build();

    let pawn = template.create(&registry, &mut store, &mut pool);
    let trap = template.create(&registry, &mut store, &mut pool);
    store.register_player(0, pawn);

    let event = BehaviorEvent::new("Damage").with_field("amount", 1i64);
    let outcome = template
        .process_event(&registry, &mut store, &mut pool, trap, &event)
        .unwrap();
    assert_eq!(
        outcome,
        EventOutcome::Transitioned {
            entity: pawn,
            state: 1,
        },
    );
    assert_eq!(store.state_index(pawn), Some(1));
    assert_eq!(store.state_index(trap), Some(0), "the trap itself stays put");
}

#[test]
fn templates_survive_a_serde_round_trip() {
    let template = creature();
    let json = serde_json::to_string(&template).expect("template serializes");
    let back: EntityTemplate = serde_json::from_str(&json).expect("template deserializes");
    assert_eq!(back, template);
}
