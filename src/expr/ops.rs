//! Operator application.
//!
//! `apply_operation` is the single funnel every operator in an expression
//! chain goes through. The strategy order is fixed:
//!
//! 1. `Get` through a null-valued indirect right operand is rejected
//!    outright.
//! 2. For `Get`, indirection on either side resolves first.
//! 3. Other non-assignment operators resolve left indirection, then
//!    right, recursing once resolved.
//! 4. Assignment operators resolve only the right (source) operand.
//! 5. Numeric promotion when both operands are arithmetic or boolean.
//! 6. Dispatch to a type-provided operator function by canonical name,
//!    left operand's type first, then right's.
//! 7. Compound assignments decay to their base operator plus a synthetic
//!    assignment.
//! 8. Operator-specific fallbacks (dereference, subscript, null-aware
//!    equality, ordered-comparison decomposition).
//! 9. A final coercion of the arithmetic operand to the other operand's
//!    type, retried once.
//!
//! Failure is an `Option::None`, never an error: the evaluator treats it
//! as a normal halt.

use crate::context::EvalContext;
use crate::value::Value;

use super::indirection::{assign_value, has_indirection, resolve_value, ResolveMode};
use super::Operator;

/// Apply `op` between two operands, resolving indirection as needed.
#[must_use]
pub fn apply_operation(
    left: &Value,
    right: &Value,
    op: Operator,
    ctx: &mut EvalContext,
) -> Option<Value> {
    apply_inner(left, right, op, ctx, false)
}

fn apply_inner(
    left: &Value,
    right: &Value,
    op: Operator,
    ctx: &mut EvalContext,
    retried: bool,
) -> Option<Value> {
    // 1. Member access through a null-valued indirect member designator
    // can never produce anything.
    if op == Operator::Get {
        if let Value::Indirect(reference) = right {
            match ctx.pool.get(reference) {
                Some(value) if !value.is_null() => {}
                _ => return None,
            }
        }
    }

    // 2./3. Resolve indirection: left first, then right. Equality keeps
    // going with an empty value on failed resolution (null-equivalence,
    // step 8); everything else halts.
    let equality = matches!(op, Operator::Equal | Operator::NotEqual);
    if !op.is_assignment() {
        if has_indirection(left, ctx.registry) {
            let resolved = match resolve_value(left, ctx, ResolveMode::Source) {
                Some(value) => value,
                None if equality => Value::Empty,
                None => return None,
            };
            return apply_inner(&resolved, right, op, ctx, retried);
        }
        if has_indirection(right, ctx.registry) {
            let resolved = match resolve_value(right, ctx, ResolveMode::Source) {
                Some(value) => value,
                None if equality => Value::Empty,
                None => return None,
            };
            return apply_inner(left, &resolved, op, ctx, retried);
        }
    } else if has_indirection(right, ctx.registry) {
        // 4. Assignments resolve only the source side; the left operand
        // must keep its destination identity.
        let resolved = resolve_value(right, ctx, ResolveMode::Source)?;
        return apply_inner(left, &resolved, op, ctx, retried);
    }

    // 5. Canonical numeric promotion.
    if !op.is_assignment() && left.is_numeric() && right.is_numeric() {
        if let Some(value) = numeric_op(left, right, op) {
            return Some(value);
        }
    }

    // Plain assignment: operator dispatch, then destination write-through,
    // then copy semantics.
    if op == Operator::Assign {
        if let Some(value) = dispatch(left, right, op, ctx) {
            return Some(value);
        }
        if assign_value(left, right.clone(), ctx) {
            return Some(right.clone());
        }
        return Some(right.clone());
    }

    // 6. Type-provided operator function.
    if let Some(value) = dispatch(left, right, op, ctx) {
        return Some(value);
    }

    // 7. Compound assignment decays to base op + synthetic assignment.
    if let Some(base) = op.base_op() {
        let current = resolve_value(left, ctx, ResolveMode::Source).unwrap_or(Value::Empty);
        let computed = apply_inner(&current, right, base, ctx, retried)?;
        if !assign_value(left, computed.clone(), ctx) {
            log::debug!("compound assignment had no writable destination");
        }
        return Some(computed);
    }

    // 8. Operator-specific fallbacks.
    match op {
        Operator::Dereference => {
            if matches!(left, Value::List(_) | Value::Map(_)) {
                return Some(left.clone());
            }
        }
        Operator::Get => {
            if let Some(value) = member_access(left, right, ctx) {
                return Some(value);
            }
        }
        Operator::Subscript => {
            if let Some(value) = subscript(left, right) {
                return Some(value);
            }
        }
        Operator::Equal => {
            if let Some(eq) = values_equal(left, right) {
                return Some(Value::Bool(eq));
            }
        }
        Operator::NotEqual => {
            if let Some(eq) = values_equal(left, right) {
                return Some(Value::Bool(!eq));
            }
        }
        Operator::GreaterOrEqual => {
            if let Some(value) = decompose_ordered(left, right, Operator::Greater, ctx) {
                return Some(value);
            }
        }
        Operator::LessOrEqual => {
            if let Some(value) = decompose_ordered(left, right, Operator::Less, ctx) {
                return Some(value);
            }
        }
        _ => {}
    }

    // 9. Coerce the arithmetic operand toward the other and retry once.
    if !retried {
        if left.is_numeric() && !right.is_numeric() {
            if let Some(coerced) = left.coerce_to(right.kind()) {
                return apply_inner(&coerced, right, op, ctx, true);
            }
        } else if right.is_numeric() && !left.is_numeric() {
            if let Some(coerced) = right.coerce_to(left.kind()) {
                return apply_inner(left, &coerced, op, ctx, true);
            }
        }
    }

    None
}

/// Null-aware structural equality.
///
/// - null == null (empty values and null entities are all "null");
/// - null against anything else is a falsy-compare: equal exactly when
///   the other side is falsy;
/// - numeric pairs compare after promotion;
/// - same-kind values compare structurally;
/// - symbols compare against strings by hash.
///
/// `None` means the pair is not comparable here and dispatch should be
/// tried instead.
#[must_use]
pub fn values_equal(left: &Value, right: &Value) -> Option<bool> {
    if left.is_null() && right.is_null() {
        return Some(true);
    }
    if left.is_null() {
        return Some(right.is_falsy());
    }
    if right.is_null() {
        return Some(left.is_falsy());
    }
    if left.is_numeric() && right.is_numeric() {
        return match (left.as_i64(), right.as_i64()) {
            (Some(a), Some(b)) => Some(a == b),
            _ => Some(left.as_f64()? == right.as_f64()?),
        };
    }
    if left.is_numeric() != right.is_numeric() {
        return None;
    }
    match (left.as_symbol(), right.as_symbol()) {
        (Some(a), Some(b)) => return Some(a == b),
        (None, None) => {}
        _ => return None,
    }
    if left.kind() == right.kind() {
        return Some(left == right);
    }
    None
}

/// Promoted numeric pair. Sub-64-bit integers widen to 32-bit lanes,
/// anything 64-bit is handled exactly, mixed int/float goes through f64.
enum Promoted {
    Bool(bool, bool),
    I32(i32, i32),
    U32(u32, u32),
    I64(i64, i64),
    U64(u64, u64),
    F32(f32, f32),
    F64(f64, f64),
}

fn promote(left: &Value, right: &Value) -> Option<Promoted> {
    use Value as V;
    Some(match (left, right) {
        (V::Bool(a), V::Bool(b)) => Promoted::Bool(*a, *b),
        (V::F64(_), _) | (_, V::F64(_)) => Promoted::F64(left.as_f64()?, right.as_f64()?),
        (V::F32(a), V::F32(b)) => Promoted::F32(*a, *b),
        (V::F32(_), _) | (_, V::F32(_)) => Promoted::F64(left.as_f64()?, right.as_f64()?),
        (V::U64(a), V::U64(b)) => Promoted::U64(*a, *b),
        (V::U64(_), _) | (_, V::U64(_)) | (V::I64(_), _) | (_, V::I64(_)) => {
            Promoted::I64(left.as_i64()?, right.as_i64()?)
        }
        (V::U32(a), V::U32(b)) => Promoted::U32(*a, *b),
        _ => Promoted::I32(
            i32::try_from(left.as_i64()?).ok()?,
            i32::try_from(right.as_i64()?).ok()?,
        ),
    })
}

macro_rules! int_arith {
    ($a:expr, $b:expr, $op:expr, $wrap:expr) => {
        match $op {
            Operator::Add => Some($wrap($a.wrapping_add($b))),
            Operator::Sub => Some($wrap($a.wrapping_sub($b))),
            Operator::Mul => Some($wrap($a.wrapping_mul($b))),
            Operator::Div => ($b != 0).then(|| $wrap($a.wrapping_div($b))),
            Operator::Mod => ($b != 0).then(|| $wrap($a.wrapping_rem($b))),
            Operator::BitAnd => Some($wrap($a & $b)),
            Operator::BitOr => Some($wrap($a | $b)),
            Operator::BitXor => Some($wrap($a ^ $b)),
            Operator::Shl => Some($wrap($a.wrapping_shl($b as u32))),
            Operator::Shr => Some($wrap($a.wrapping_shr($b as u32))),
            Operator::Equal => Some(Value::Bool($a == $b)),
            Operator::NotEqual => Some(Value::Bool($a != $b)),
            Operator::Less => Some(Value::Bool($a < $b)),
            Operator::Greater => Some(Value::Bool($a > $b)),
            Operator::LessOrEqual => Some(Value::Bool($a <= $b)),
            Operator::GreaterOrEqual => Some(Value::Bool($a >= $b)),
            _ => None,
        }
    };
}

macro_rules! float_arith {
    ($a:expr, $b:expr, $op:expr, $wrap:expr) => {
        match $op {
            Operator::Add => Some($wrap($a + $b)),
            Operator::Sub => Some($wrap($a - $b)),
            Operator::Mul => Some($wrap($a * $b)),
            Operator::Div => ($b != 0.0).then(|| $wrap($a / $b)),
            Operator::Mod => ($b != 0.0).then(|| $wrap($a % $b)),
            Operator::Equal => Some(Value::Bool($a == $b)),
            Operator::NotEqual => Some(Value::Bool($a != $b)),
            Operator::Less => Some(Value::Bool($a < $b)),
            Operator::Greater => Some(Value::Bool($a > $b)),
            Operator::LessOrEqual => Some(Value::Bool($a <= $b)),
            Operator::GreaterOrEqual => Some(Value::Bool($a >= $b)),
            _ => None,
        }
    };
}

fn numeric_op(left: &Value, right: &Value, op: Operator) -> Option<Value> {
    match promote(left, right)? {
        // Booleans get logical semantics for the bitwise operators
        // instead of bit math.
        Promoted::Bool(a, b) => match op {
            Operator::BitAnd => Some(Value::Bool(a && b)),
            Operator::BitOr => Some(Value::Bool(a || b)),
            Operator::BitXor => Some(Value::Bool(a != b)),
            Operator::Equal => Some(Value::Bool(a == b)),
            Operator::NotEqual => Some(Value::Bool(a != b)),
            // Arithmetic on booleans falls through to integer promotion.
            _ => numeric_op(&Value::I32(i32::from(a)), &Value::I32(i32::from(b)), op),
        },
        Promoted::I32(a, b) => int_arith!(a, b, op, Value::I32),
        Promoted::U32(a, b) => int_arith!(a, b, op, Value::U32),
        Promoted::I64(a, b) => int_arith!(a, b, op, Value::I64),
        Promoted::U64(a, b) => int_arith!(a, b, op, Value::U64),
        Promoted::F32(a, b) => float_arith!(a, b, op, Value::F32),
        Promoted::F64(a, b) => float_arith!(a, b, op, Value::F64),
    }
}

/// Step 6: look for a registered operator function, left type first.
fn dispatch(left: &Value, right: &Value, op: Operator, ctx: &mut EvalContext) -> Option<Value> {
    let name = op.function_name();
    for type_id in [left.type_id(), right.type_id()].into_iter().flatten() {
        let Some(func) = ctx.registry.get(type_id).and_then(|info| info.func(name)) else {
            continue;
        };
        if let Some(value) = func
            .overload_for(2)
            .and_then(|f| f.invoke(&[left.clone(), right.clone()]))
        {
            return Some(value);
        }
    }
    None
}

/// `Get` fallback: reflection-based member access.
fn member_access(left: &Value, right: &Value, ctx: &mut EvalContext) -> Option<Value> {
    let key = right.as_symbol()?;
    match left {
        Value::Object(obj) => match ctx.registry.get(obj.type_id) {
            Some(info) => info.get_field(obj, key),
            None => obj.field(key).cloned(),
        },
        // entity.Component yields the component instance.
        Value::Entity(entity) => ctx.store.try_get(*entity, key).cloned(),
        Value::Map(map) => map.get(&key).cloned(),
        _ => None,
    }
}

/// `Subscript` fallback: sequence index or associative key, with
/// implicit key conversion.
fn subscript(left: &Value, right: &Value) -> Option<Value> {
    match left {
        Value::List(list) => list.get(right.as_index()?).cloned(),
        Value::Map(map) => map.get(&right.as_symbol()?).cloned(),
        Value::Object(obj) => obj.field(right.as_symbol()?).cloned(),
        _ => None,
    }
}

/// `>=` / `<=` decompose to the strict comparison or equality.
fn decompose_ordered(
    left: &Value,
    right: &Value,
    strict: Operator,
    ctx: &mut EvalContext,
) -> Option<Value> {
    let gt = apply_operation(left, right, strict, ctx).and_then(|v| v.as_bool());
    if gt == Some(true) {
        return Some(Value::Bool(true));
    }
    let eq = apply_operation(left, right, Operator::Equal, ctx).and_then(|v| v.as_bool());
    match (gt, eq) {
        (None, None) => None,
        (_, eq) => Some(Value::Bool(eq.unwrap_or(false))),
    }
}
