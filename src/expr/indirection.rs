//! Indirection resolution.
//!
//! A value "has indirection" when it stands in for another value: a
//! reference into the shared pool, a member reference, a nested schema,
//! a deferred expression, or an object whose registered type exposes a
//! call or assignment operator. The `Indirection` trait is the single
//! protocol all of them implement.
//!
//! Call/assignment operators resolve with the context's trailing
//! argument list, most specific match first: the full list is tried,
//! then progressively fewer trailing arguments, down to the bare
//! instance. Only genuinely optional trailing context is ever dropped —
//! an overload that needs an argument simply never matches a shorter
//! call.

use crate::context::EvalContext;
use crate::registry::{TypeRegistry, ASSIGN_OPERATOR, CALL_OPERATOR};
use crate::schema::ComponentSchema;
use crate::value::{IndirectRef, MemberRef, Object, Value};

use super::Expression;

/// Whether a value is being read or written through.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResolveMode {
    /// The value is a source operand: produce its underlying value.
    Source,
    /// The value sits in a destination position.
    Destination,
}

/// Capability of resolving to an underlying concrete value.
pub trait Indirection {
    /// Resolve to the underlying value. `None` is a normal,
    /// non-exceptional "no value" outcome.
    fn resolve(&self, ctx: &mut EvalContext, mode: ResolveMode) -> Option<Value>;
}

impl Indirection for IndirectRef {
    fn resolve(&self, ctx: &mut EvalContext, _mode: ResolveMode) -> Option<Value> {
        ctx.pool.get(self).cloned()
    }
}

impl Indirection for MemberRef {
    fn resolve(&self, ctx: &mut EvalContext, _mode: ResolveMode) -> Option<Value> {
        let entity = self.entity.unwrap_or(ctx.entity);
        ctx.read_member(entity, self.component, self.field)
    }
}

impl Indirection for ComponentSchema {
    fn resolve(&self, ctx: &mut EvalContext, _mode: ResolveMode) -> Option<Value> {
        let instance = self.instance(ctx);
        (!instance.is_empty()).then_some(instance)
    }
}

impl Indirection for Expression {
    fn resolve(&self, ctx: &mut EvalContext, _mode: ResolveMode) -> Option<Value> {
        let value = self.get(ctx);
        (!value.is_empty()).then_some(value)
    }
}

/// Check whether a value stands in for another value.
#[must_use]
pub fn has_indirection(value: &Value, registry: &TypeRegistry) -> bool {
    match value {
        Value::Indirect(_) | Value::Member(_) | Value::Schema(_) | Value::Expr(_) => true,
        Value::Object(obj) => registry
            .get(obj.type_id)
            .is_some_and(|info| info.has_call_operator() || info.has_assign_operator()),
        _ => false,
    }
}

/// Resolve a value to its underlying concrete value.
///
/// Concrete values pass through unchanged; indirection-bearing values go
/// through their `Indirection` impl; objects with a call (or, in
/// destination position, assignment) operator are invoked with the
/// progressive trailing-context strategy.
#[must_use]
pub fn resolve_value(value: &Value, ctx: &mut EvalContext, mode: ResolveMode) -> Option<Value> {
    match value {
        Value::Indirect(reference) => reference.resolve(ctx, mode),
        Value::Member(member) => member.resolve(ctx, mode),
        Value::Schema(schema) => schema.resolve(ctx, mode),
        Value::Expr(expr) => expr.resolve(ctx, mode),
        Value::Object(obj) => resolve_object(obj, ctx, mode),
        concrete => Some(concrete.clone()),
    }
}

fn resolve_object(obj: &Object, ctx: &mut EvalContext, mode: ResolveMode) -> Option<Value> {
    let Some(info) = ctx.registry.get(obj.type_id) else {
        return Some(Value::Object(obj.clone()));
    };
    if mode == ResolveMode::Destination {
        if let Some(func) = info.func(ASSIGN_OPERATOR) {
            if let Some(value) = invoke_progressive(func, obj, &[], ctx) {
                return Some(value);
            }
        }
    }
    if let Some(func) = info.func(CALL_OPERATOR) {
        return invoke_progressive(func, obj, &[], ctx);
    }
    Some(Value::Object(obj.clone()))
}

/// Invoke an operator chain with `[instance, extra..., context-args...]`,
/// dropping trailing context arguments until an overload accepts.
fn invoke_progressive(
    func: &crate::registry::FunctionInfo,
    instance: &Object,
    extra: &[Value],
    ctx: &EvalContext,
) -> Option<Value> {
    let mut args: Vec<Value> = Vec::with_capacity(1 + extra.len() + ctx.args.len());
    args.push(Value::Object(instance.clone()));
    args.extend(extra.iter().cloned());
    args.extend(ctx.args.iter().cloned());

    let required = 1 + extra.len();
    let mut len = args.len();
    loop {
        if let Some(overload) = func.overload_for(len) {
            if let Some(value) = overload.invoke(&args[..len]) {
                return Some(value);
            }
        }
        if len == required {
            return None;
        }
        len -= 1;
    }
}

/// Write a value through a destination.
///
/// Member references write back into the store through the typed setter;
/// pool references overwrite their slot; objects with an assignment
/// operator are invoked with `[instance, source, context-args...]` under
/// the progressive strategy; a destination expression chains. Anything
/// else has no assignment machinery and reports `false`.
pub fn assign_value(destination: &Value, source: Value, ctx: &mut EvalContext) -> bool {
    match destination {
        Value::Member(member) => {
            let entity = member.entity.unwrap_or(ctx.entity);
            ctx.write_member(entity, member.component, member.field, source)
        }
        Value::Indirect(reference) => {
            // An unresolved source never lands in a pool slot raw; the
            // caller resolves and retries.
            if source.is_indirect_kind() {
                return false;
            }
            ctx.pool.set(reference, source)
        }
        Value::Object(obj) => {
            let Some(func) = ctx
                .registry
                .get(obj.type_id)
                .and_then(|info| info.func(ASSIGN_OPERATOR))
            else {
                return false;
            };
            invoke_progressive(func, obj, std::slice::from_ref(&source), ctx).is_some()
        }
        Value::Expr(expr) => !expr.set(source, ctx).is_empty(),
        _ => false,
    }
}
