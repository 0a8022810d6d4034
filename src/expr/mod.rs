//! Value expressions.
//!
//! An expression is an ordered chain of segments, each a value plus the
//! operator connecting it to the next segment. Evaluation is strictly
//! left-to-right — no precedence climbing, no parse tree — with a single
//! bounded lookahead repair: when an operator application fails, the next
//! pair is evaluated in isolation and the failed operator is retried
//! against that sub-result once.
//!
//! Operands may be concrete values or indirection-bearing values
//! (pool references, member references, nested schemas, sub-expressions);
//! [`apply_operation`] resolves indirection on demand through the
//! protocol in [`indirection`].

mod indirection;
mod ops;

pub use indirection::{assign_value, has_indirection, resolve_value, Indirection, ResolveMode};
pub use ops::{apply_operation, values_equal};

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::context::EvalContext;
use crate::core::Name;
use crate::value::Value;

/// Binary operator connecting two expression segments.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operator {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    BitAnd,
    BitOr,
    BitXor,
    Shl,
    Shr,
    Assign,
    AddAssign,
    SubAssign,
    MulAssign,
    DivAssign,
    ModAssign,
    Equal,
    NotEqual,
    Less,
    Greater,
    LessOrEqual,
    GreaterOrEqual,
    /// Member access (`a.b`).
    Get,
    /// Container element access (`a[b]`).
    Subscript,
    /// Container passthrough (`*a`); the right operand is ignored.
    Dereference,
}

impl Operator {
    /// Check for plain or compound assignment.
    #[must_use]
    pub fn is_assignment(self) -> bool {
        matches!(
            self,
            Operator::Assign
                | Operator::AddAssign
                | Operator::SubAssign
                | Operator::MulAssign
                | Operator::DivAssign
                | Operator::ModAssign
        )
    }

    /// The base operator a compound assignment decays to.
    #[must_use]
    pub fn base_op(self) -> Option<Operator> {
        match self {
            Operator::AddAssign => Some(Operator::Add),
            Operator::SubAssign => Some(Operator::Sub),
            Operator::MulAssign => Some(Operator::Mul),
            Operator::DivAssign => Some(Operator::Div),
            Operator::ModAssign => Some(Operator::Mod),
            _ => None,
        }
    }

    /// Check for a comparison operator (result is always `Bool`).
    #[must_use]
    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            Operator::Equal
                | Operator::NotEqual
                | Operator::Less
                | Operator::Greater
                | Operator::LessOrEqual
                | Operator::GreaterOrEqual
        )
    }

    /// Canonical function id types register to provide this operator.
    #[must_use]
    pub fn function_name(self) -> Name {
        match self {
            Operator::Add => Name::of("operator+"),
            Operator::Sub => Name::of("operator-"),
            Operator::Mul => Name::of("operator*"),
            Operator::Div => Name::of("operator/"),
            Operator::Mod => Name::of("operator%"),
            Operator::BitAnd => Name::of("operator&"),
            Operator::BitOr => Name::of("operator|"),
            Operator::BitXor => Name::of("operator^"),
            Operator::Shl => Name::of("operator<<"),
            Operator::Shr => Name::of("operator>>"),
            Operator::Assign => Name::of("operator="),
            Operator::AddAssign => Name::of("operator+="),
            Operator::SubAssign => Name::of("operator-="),
            Operator::MulAssign => Name::of("operator*="),
            Operator::DivAssign => Name::of("operator/="),
            Operator::ModAssign => Name::of("operator%="),
            Operator::Equal => Name::of("operator=="),
            Operator::NotEqual => Name::of("operator!="),
            Operator::Less => Name::of("operator<"),
            Operator::Greater => Name::of("operator>"),
            Operator::LessOrEqual => Name::of("operator<="),
            Operator::GreaterOrEqual => Name::of("operator>="),
            Operator::Get => Name::of("operator->"),
            Operator::Subscript => Name::of("operator[]"),
            Operator::Dereference => Name::of("operator@"),
        }
    }
}

/// One link of an expression chain: a value and the operator connecting
/// it to the following segment (`None` on the last segment).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub value: Value,
    pub operator: Option<Operator>,
}

/// A left-to-right chain of operator segments.
///
/// ## Example
///
/// ```
/// use statecraft::expr::{Expression, Operator};
/// use statecraft::registry::TypeRegistry;
/// use statecraft::store::ComponentStore;
/// use statecraft::value::ValuePool;
/// use statecraft::context::EvalContext;
/// use statecraft::value::Value;
///
/// let expr = Expression::value(5i64)
///     .then(Operator::Add, 3i64)
///     .then(Operator::Mul, 2i64);
///
/// let registry = TypeRegistry::new();
/// let mut store = ComponentStore::new();
/// let mut pool = ValuePool::new();
/// let mut ctx = EvalContext::new(&registry, &mut store, &mut pool);
///
/// // Strictly left-to-right: (5 + 3) * 2, not 5 + (3 * 2).
/// assert_eq!(expr.get(&mut ctx), Value::I64(16));
/// ```
#[derive(Clone, Debug, PartialEq, Default, Serialize, Deserialize)]
pub struct Expression {
    pub segments: SmallVec<[Segment; 4]>,
}

impl Expression {
    /// Create an empty expression.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a single-segment expression from a value.
    #[must_use]
    pub fn value(value: impl Into<Value>) -> Self {
        let mut expr = Self::new();
        expr.segments.push(Segment {
            value: value.into(),
            operator: None,
        });
        expr
    }

    /// Append an operator and the value it applies to (builder pattern).
    #[must_use]
    pub fn then(mut self, operator: Operator, value: impl Into<Value>) -> Self {
        if let Some(last) = self.segments.last_mut() {
            last.operator = Some(operator);
        }
        self.segments.push(Segment {
            value: value.into(),
            operator: None,
        });
        self
    }

    /// Number of segments.
    #[must_use]
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Check for an empty chain.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Evaluate the chain left-to-right.
    ///
    /// Returns the best result reached together with the number of
    /// segments actually claimed; callers use the count to know how much
    /// of the chain was consumed when evaluation halted early.
    pub fn evaluate(&self, ctx: &mut EvalContext) -> (Value, usize) {
        let Some(first) = self.segments.first() else {
            return (Value::Empty, 0);
        };
        let mut result = first.value.clone();
        let mut i = 0;

        while i + 1 < self.segments.len() {
            let Some(op) = self.segments[i].operator else {
                break;
            };
            let right = &self.segments[i + 1].value;

            if let Some(value) = apply_operation(&result, right, op, ctx) {
                result = value;
                i += 1;
                continue;
            }

            // Bounded lookahead repair: evaluate the next pair in
            // isolation, then retry the failed operator against the
            // sub-result.
            let repaired = self.segments[i + 1].operator.and_then(|next_op| {
                let after = &self.segments.get(i + 2)?.value;
                let sub = apply_operation(right, after, next_op, ctx)?;
                apply_operation(&result, &sub, op, ctx)
            });
            match repaired {
                Some(value) => {
                    result = value;
                    i += 2;
                }
                None => break,
            }
        }

        (result, i + 1)
    }

    /// Evaluate the chain and resolve the result to a concrete value.
    #[must_use]
    pub fn get(&self, ctx: &mut EvalContext) -> Value {
        let (result, _) = self.evaluate(ctx);
        if has_indirection(&result, ctx.registry) {
            resolve_value(&result, ctx, ResolveMode::Source).unwrap_or(Value::Empty)
        } else {
            result
        }
    }

    /// Evaluate the chain as a destination and assign `source` into it.
    ///
    /// Tries, in order: a destination-directed assignment through the
    /// terminal value's assignment machinery; resolving the source first
    /// and assigning the resolved value; and finally a raw copy, in which
    /// case the resolved source is simply handed back for the caller to
    /// place. Returns the value that ended up in the destination,
    /// `Value::Empty` when nothing could be produced.
    pub fn set(&self, source: Value, ctx: &mut EvalContext) -> Value {
        let (destination, _) = self.evaluate(ctx);

        if assign_value(&destination, source.clone(), ctx) {
            return source;
        }

        let resolved = if has_indirection(&source, ctx.registry) {
            resolve_value(&source, ctx, ResolveMode::Source).unwrap_or(Value::Empty)
        } else {
            source
        };
        if resolved.is_empty() {
            return Value::Empty;
        }
        if assign_value(&destination, resolved.clone(), ctx) {
            return resolved;
        }

        // No assignment machinery anywhere: raw copy semantics.
        resolved
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::TypeRegistry;
    use crate::store::ComponentStore;
    use crate::value::ValuePool;

    fn eval(expr: &Expression) -> Value {
        let registry = TypeRegistry::new();
        let mut store = ComponentStore::new();
        let mut pool = ValuePool::new();
        let mut ctx = EvalContext::new(&registry, &mut store, &mut pool);
        expr.get(&mut ctx)
    }

    #[test]
    fn test_left_to_right_no_precedence() {
        let expr = Expression::value(5i64)
            .then(Operator::Add, 3i64)
            .then(Operator::Mul, 2i64);
        assert_eq!(eval(&expr), Value::I64(16));
    }

    #[test]
    fn test_single_segment() {
        assert_eq!(eval(&Expression::value(7i64)), Value::I64(7));
        assert_eq!(eval(&Expression::new()), Value::Empty);
    }

    #[test]
    fn test_comparison_chain() {
        let expr = Expression::value(4i64)
            .then(Operator::Add, 1i64)
            .then(Operator::Equal, 5i64);
        assert_eq!(eval(&expr), Value::Bool(true));
    }

    #[test]
    fn test_consumed_count_on_halt() {
        // String minus int has no meaning anywhere; the chain halts after
        // claiming only the first segment.
        let expr = Expression::value("abc").then(Operator::Sub, 3i64);
        let registry = TypeRegistry::new();
        let mut store = ComponentStore::new();
        let mut pool = ValuePool::new();
        let mut ctx = EvalContext::new(&registry, &mut store, &mut pool);
        let (result, consumed) = expr.evaluate(&mut ctx);
        assert_eq!(result, Value::Str("abc".into()));
        assert_eq!(consumed, 1);
    }

    #[test]
    fn test_lookahead_repair() {
        // "a" + (3 * 2) fails directly ("a" + 3 has no meaning), the
        // repaired sub-result (6) still fails against "a" without a
        // registered string operator, so the chain halts; but
        // 1 + ("b" == "b") is repairable: 1 + true promotes numerically.
        let expr = Expression::value(1i64)
            .then(Operator::Add, "b")
            .then(Operator::Equal, "b");
        assert_eq!(eval(&expr), Value::I64(2));
    }

    #[test]
    fn test_operator_classification() {
        assert!(Operator::AddAssign.is_assignment());
        assert_eq!(Operator::AddAssign.base_op(), Some(Operator::Add));
        assert!(Operator::Less.is_comparison());
        assert!(!Operator::Add.is_assignment());
        assert_eq!(Operator::Add.base_op(), None);
    }
}
