//! Integration tests for expression evaluation: left-to-right order,
//! indirection through the store and pool, null semantics, and
//! assignment.

use proptest::prelude::*;

use statecraft::{
    ComponentStore, EvalContext, Expression, MemberRef, Name, Object, Operator, TypeInfo,
    TypeRegistry, Value, ValueKind, ValuePool,
};

const HEALTH: Name = Name::of("Health");
const HP: Name = Name::of("hp");

fn health_registry() -> TypeRegistry {
    let mut registry = TypeRegistry::new();
    registry.register(TypeInfo::new("Health").with_field_default("hp", ValueKind::I64, 100i64));
    registry
}

fn eval(expr: &Expression) -> Value {
    let registry = TypeRegistry::new();
    let mut store = ComponentStore::new();
    let mut pool = ValuePool::new();
    let mut ctx = EvalContext::new(&registry, &mut store, &mut pool);
    expr.get(&mut ctx)
}

#[test]
fn chains_evaluate_strictly_left_to_right() {
    // 5 + 3 * 2 is (5 + 3) * 2 here, never 5 + (3 * 2).
    let expr = Expression::value(5i64)
        .then(Operator::Add, 3i64)
        .then(Operator::Mul, 2i64);
    assert_eq!(eval(&expr), Value::I64(16), "no operator precedence");

    let expr = Expression::value(10i64)
        .then(Operator::Sub, 4i64)
        .then(Operator::Div, 2i64)
        .then(Operator::Add, 1i64);
    assert_eq!(eval(&expr), Value::I64(4));
}

#[test]
fn mixed_width_operands_promote() {
    let expr = Expression::value(1i32).then(Operator::Add, 2u64);
    assert_eq!(eval(&expr), Value::I64(3));

    let expr = Expression::value(1i64).then(Operator::Add, 0.5f64);
    assert_eq!(eval(&expr), Value::F64(1.5));
}

#[test]
fn null_equality_semantics() {
    // Null equals null.
    let expr = Expression::value(Value::Empty).then(Operator::Equal, Value::Empty);
    assert_eq!(eval(&expr), Value::Bool(true));

    // Null equals an indirection that resolves to nothing.
    let registry = TypeRegistry::new();
    let mut store = ComponentStore::new();
    let mut pool = ValuePool::new();
    let reference = pool.insert(Name::of("Counter"), Value::I64(1));
    pool.remove(&reference);

    let mut ctx = EvalContext::new(&registry, &mut store, &mut pool);
    let dangling = Value::Indirect(reference);
    let expr = Expression::value(Value::Empty).then(Operator::Equal, dangling.clone());
    assert_eq!(expr.get(&mut ctx), Value::Bool(true));

    // But a dangling reference never equals a concrete value.
    let expr = Expression::value(dangling).then(Operator::Equal, 1i64);
    assert_eq!(expr.get(&mut ctx), Value::Bool(false));
}

#[test]
fn stale_pool_reference_reads_as_nothing() {
    let registry = TypeRegistry::new();
    let mut store = ComponentStore::new();
    let mut pool = ValuePool::new();
    let reference = pool.insert(Name::of("Counter"), Value::I64(7));

    // Rebuilding the pool invalidates every outstanding reference, even
    // though slot 0 is occupied again.
    pool.reset();
    pool.insert(Name::of("Counter"), Value::I64(99));

    let mut ctx = EvalContext::new(&registry, &mut store, &mut pool);
    let expr = Expression::value(Value::Indirect(reference));
    assert_eq!(expr.get(&mut ctx), Value::Empty, "stale checksum fails closed");
}

#[test]
fn member_references_resolve_against_the_context_entity() {
    let registry = health_registry();
    let mut store = ComponentStore::new();
    let mut pool = ValuePool::new();
    let entity = store.create();
    store.emplace_or_replace(
        entity,
        HEALTH,
        Value::Object(Object::new(HEALTH).with_field("hp", 40i64)),
    );

    let expr = Expression::value(MemberRef::new("Health", "hp")).then(Operator::Add, 10i64);
    let mut ctx = EvalContext::new(&registry, &mut store, &mut pool).for_entity(entity);
    assert_eq!(expr.get(&mut ctx), Value::I64(50));
}

#[test]
fn compound_assignment_writes_back_through_members() {
    let registry = health_registry();
    let mut store = ComponentStore::new();
    let mut pool = ValuePool::new();
    let entity = store.create();
    store.emplace_or_replace(
        entity,
        HEALTH,
        Value::Object(Object::new(HEALTH).with_field("hp", 40i64)),
    );

    let member = MemberRef::new("Health", "hp");
    let expr = Expression::value(member.clone()).then(Operator::SubAssign, 15i64);
    let mut ctx = EvalContext::new(&registry, &mut store, &mut pool).for_entity(entity);
    assert_eq!(expr.get(&mut ctx), Value::I64(25));

    let read = Expression::value(member);
    assert_eq!(read.get(&mut ctx), Value::I64(25), "store reflects the write");
}

#[test]
fn destination_expression_set() {
    let registry = health_registry();
    let mut store = ComponentStore::new();
    let mut pool = ValuePool::new();
    let entity = store.create();
    store.emplace_or_replace(
        entity,
        HEALTH,
        Value::Object(Object::new(HEALTH).with_field("hp", 0i64)),
    );

    let destination = Expression::value(MemberRef::new("Health", "hp"));
    let mut ctx = EvalContext::new(&registry, &mut store, &mut pool).for_entity(entity);
    assert_eq!(destination.set(Value::I64(77), &mut ctx), Value::I64(77));
    assert_eq!(
        ctx.read_member(entity, HEALTH, HP),
        Some(Value::I64(77)),
    );
}

#[test]
fn subscript_reads_lists_and_maps() {
    let list = Value::List(vec![Value::I64(10), Value::I64(20), Value::I64(30)]);
    let expr = Expression::value(list).then(Operator::Subscript, 1i64);
    assert_eq!(eval(&expr), Value::I64(20));

    let map = Value::Map(
        [(Name::of("hp"), Value::I64(5))]
            .into_iter()
            .collect(),
    );
    let expr = Expression::value(map).then(Operator::Subscript, Value::Symbol(Name::of("hp")));
    assert_eq!(eval(&expr), Value::I64(5));
}

proptest! {
    /// A +/- chain agrees with a left fold over the same operands.
    #[test]
    fn add_sub_chain_matches_left_fold(
        first in -1_000_000i64..1_000_000,
        rest in prop::collection::vec((-1_000_000i64..1_000_000, any::<bool>()), 0..8),
    ) {
        let mut expr = Expression::value(first);
        let mut expected = first;
        for (operand, add) in &rest {
            if *add {
                expr = expr.then(Operator::Add, *operand);
                expected = expected.wrapping_add(*operand);
            } else {
                expr = expr.then(Operator::Sub, *operand);
                expected = expected.wrapping_sub(*operand);
            }
        }
        prop_assert_eq!(eval(&expr), Value::I64(expected));
    }
}
