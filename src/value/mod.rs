//! Type-erased values.
//!
//! Everything the runtime moves around — literals from documents,
//! constructed component instances, references into shared storage, whole
//! expressions waiting to be evaluated — is a `Value`. Concrete kinds
//! (scalars, strings, containers, objects) carry their data inline;
//! indirection-bearing kinds (`Indirect`, `Member`, `Schema`, `Expr`)
//! stand in for a value that is produced on demand through the
//! resolution protocol in [`crate::expr`].
//!
//! ## Value Kinds
//!
//! - scalars: `Bool`, `I32`, `U32`, `I64`, `U64`, `F32`, `F64`
//! - names and text: `Symbol` (hashed), `Str`
//! - handles: `Entity`
//! - containers: `List`, `Map`
//! - instances: `Object` (a constructed component)
//! - indirection: `Indirect`, `Member`, `Schema`, `Expr`

mod object;
mod pool;

pub use object::Object;
pub use pool::{IndirectRef, ValuePool};

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::core::{Entity, Name};
use crate::expr::Expression;
use crate::schema::ComponentSchema;

/// Reference to a field of a component on some entity.
///
/// Resolves against the explicitly named entity when set, otherwise
/// against whatever entity the evaluation context supplies.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct MemberRef {
    /// Component type the member lives on.
    pub component: Name,
    /// Field id within that component.
    pub field: Name,
    /// Explicit entity to read from; `None` means the context entity.
    pub entity: Option<Entity>,
}

impl MemberRef {
    /// Reference a member on the context entity.
    #[must_use]
    pub fn new(component: impl Into<Name>, field: impl Into<Name>) -> Self {
        Self {
            component: component.into(),
            field: field.into(),
            entity: None,
        }
    }

    /// Pin the reference to a specific entity (builder pattern).
    #[must_use]
    pub fn on(mut self, entity: Entity) -> Self {
        self.entity = Some(entity);
        self
    }
}

/// Discriminant of a [`Value`], used by typed field declarations and
/// coercion.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueKind {
    Empty,
    Bool,
    I32,
    U32,
    I64,
    U64,
    F32,
    F64,
    Symbol,
    Str,
    Entity,
    List,
    Map,
    Object,
    Indirect,
    Member,
    Schema,
    Expr,
}

/// A type-erased value.
#[derive(Clone, Debug, PartialEq, Default, Serialize, Deserialize)]
pub enum Value {
    /// No value. The result of failed resolution and the initial state of
    /// unset fields.
    #[default]
    Empty,
    Bool(bool),
    I32(i32),
    U32(u32),
    I64(i64),
    U64(u64),
    F32(f32),
    F64(f64),
    /// A hashed name (enumerator values, string ids).
    Symbol(Name),
    Str(String),
    Entity(Entity),
    List(Vec<Value>),
    Map(FxHashMap<Name, Value>),
    /// A constructed instance of a registered type.
    Object(Object),
    /// Reference into the shared value pool.
    Indirect(IndirectRef),
    /// Reference to a component field on an entity.
    Member(MemberRef),
    /// A nested component schema; instanced on resolution.
    Schema(Box<ComponentSchema>),
    /// A deferred expression; evaluated on resolution.
    Expr(Box<Expression>),
}

impl Value {
    /// Discriminant of this value.
    #[must_use]
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Empty => ValueKind::Empty,
            Value::Bool(_) => ValueKind::Bool,
            Value::I32(_) => ValueKind::I32,
            Value::U32(_) => ValueKind::U32,
            Value::I64(_) => ValueKind::I64,
            Value::U64(_) => ValueKind::U64,
            Value::F32(_) => ValueKind::F32,
            Value::F64(_) => ValueKind::F64,
            Value::Symbol(_) => ValueKind::Symbol,
            Value::Str(_) => ValueKind::Str,
            Value::Entity(_) => ValueKind::Entity,
            Value::List(_) => ValueKind::List,
            Value::Map(_) => ValueKind::Map,
            Value::Object(_) => ValueKind::Object,
            Value::Indirect(_) => ValueKind::Indirect,
            Value::Member(_) => ValueKind::Member,
            Value::Schema(_) => ValueKind::Schema,
            Value::Expr(_) => ValueKind::Expr,
        }
    }

    /// Check for `Value::Empty`.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        matches!(self, Value::Empty)
    }

    /// Check for the null entity or no value at all.
    #[must_use]
    pub fn is_null(&self) -> bool {
        match self {
            Value::Empty => true,
            Value::Entity(entity) => entity.is_null(),
            _ => false,
        }
    }

    /// Check whether this is one of the indirection-bearing kinds.
    ///
    /// Objects can also carry indirection when their registered type
    /// exposes a call operator; that probe needs the registry and lives in
    /// [`crate::expr::has_indirection`].
    #[must_use]
    pub fn is_indirect_kind(&self) -> bool {
        matches!(
            self,
            Value::Indirect(_) | Value::Member(_) | Value::Schema(_) | Value::Expr(_)
        )
    }

    /// Check whether this value participates in numeric promotion
    /// (arithmetic scalars and booleans).
    #[must_use]
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            Value::Bool(_)
                | Value::I32(_)
                | Value::U32(_)
                | Value::I64(_)
                | Value::U64(_)
                | Value::F32(_)
                | Value::F64(_)
        )
    }

    /// Truthiness used by falsy-comparison against null: zero, empty
    /// containers, empty strings, and null handles are falsy.
    #[must_use]
    pub fn is_falsy(&self) -> bool {
        match self {
            Value::Empty => true,
            Value::Bool(b) => !b,
            Value::I32(v) => *v == 0,
            Value::U32(v) => *v == 0,
            Value::I64(v) => *v == 0,
            Value::U64(v) => *v == 0,
            Value::F32(v) => *v == 0.0,
            Value::F64(v) => *v == 0.0,
            Value::Str(s) => s.is_empty(),
            Value::List(list) => list.is_empty(),
            Value::Map(map) => map.is_empty(),
            Value::Entity(entity) => entity.is_null(),
            _ => false,
        }
    }

    /// Get as bool if this is a `Bool`.
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Widen any integer or boolean value to `i64`.
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Bool(b) => Some(i64::from(*b)),
            Value::I32(v) => Some(i64::from(*v)),
            Value::U32(v) => Some(i64::from(*v)),
            Value::I64(v) => Some(*v),
            Value::U64(v) => i64::try_from(*v).ok(),
            _ => None,
        }
    }

    /// Widen any numeric value to `f64`.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::F32(v) => Some(f64::from(*v)),
            Value::F64(v) => Some(*v),
            other => other.as_i64().map(|v| v as f64),
        }
    }

    /// Get as a container index if this is a non-negative integer.
    #[must_use]
    pub fn as_index(&self) -> Option<usize> {
        self.as_i64().and_then(|v| usize::try_from(v).ok())
    }

    /// Get as a symbol, hashing string values on the fly.
    #[must_use]
    pub fn as_symbol(&self) -> Option<Name> {
        match self {
            Value::Symbol(name) => Some(*name),
            Value::Str(s) => Some(Name::of(s)),
            _ => None,
        }
    }

    /// Get as a string slice if this is a `Str`.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Get as an entity handle if this is an `Entity`.
    #[must_use]
    pub fn as_entity(&self) -> Option<Entity> {
        match self {
            Value::Entity(entity) => Some(*entity),
            _ => None,
        }
    }

    /// Get as an object reference if this is an `Object`.
    #[must_use]
    pub fn as_object(&self) -> Option<&Object> {
        match self {
            Value::Object(obj) => Some(obj),
            _ => None,
        }
    }

    /// Runtime type id of a concrete value: the registered type for
    /// objects, the slot type for indirect references, a well-known
    /// builtin name otherwise.
    #[must_use]
    pub fn type_id(&self) -> Option<Name> {
        match self {
            Value::Empty => None,
            Value::Bool(_) => Some(Name::of("bool")),
            Value::I32(_) => Some(Name::of("i32")),
            Value::U32(_) => Some(Name::of("u32")),
            Value::I64(_) => Some(Name::of("i64")),
            Value::U64(_) => Some(Name::of("u64")),
            Value::F32(_) => Some(Name::of("f32")),
            Value::F64(_) => Some(Name::of("f64")),
            Value::Symbol(_) => Some(Name::of("symbol")),
            Value::Str(_) => Some(Name::of("string")),
            Value::Entity(_) => Some(Name::of("entity")),
            Value::List(_) => Some(Name::of("list")),
            Value::Map(_) => Some(Name::of("map")),
            Value::Object(obj) => Some(obj.type_id),
            Value::Indirect(reference) => Some(reference.type_id),
            Value::Member(_) | Value::Schema(_) | Value::Expr(_) => None,
        }
    }

    /// Convert this value to a target kind, if a lossless-enough
    /// conversion exists.
    ///
    /// Numeric kinds convert between each other; strings hash into
    /// symbols; everything already of the target kind passes through.
    /// Returns `None` when no conversion applies.
    #[must_use]
    pub fn coerce_to(&self, kind: ValueKind) -> Option<Value> {
        if self.kind() == kind {
            return Some(self.clone());
        }
        match kind {
            ValueKind::Bool => match self {
                Value::I32(_) | Value::U32(_) | Value::I64(_) | Value::U64(_) => {
                    Some(Value::Bool(!self.is_falsy()))
                }
                _ => None,
            },
            ValueKind::I32 => self
                .as_i64()
                .and_then(|v| i32::try_from(v).ok())
                .map(Value::I32),
            ValueKind::U32 => self
                .as_i64()
                .and_then(|v| u32::try_from(v).ok())
                .map(Value::U32),
            ValueKind::I64 => self.as_i64().map(Value::I64),
            ValueKind::U64 => self
                .as_i64()
                .and_then(|v| u64::try_from(v).ok())
                .map(Value::U64),
            ValueKind::F32 => self.as_f64().map(|v| Value::F32(v as f32)),
            ValueKind::F64 => self.as_f64().map(Value::F64),
            ValueKind::Symbol => self.as_symbol().map(Value::Symbol),
            ValueKind::Str => match self {
                Value::Symbol(name) => Some(Value::Str(name.to_string())),
                _ => None,
            },
            _ => None,
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::I32(v)
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Value::U32(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::I64(v)
    }
}

impl From<u64> for Value {
    fn from(v: u64) -> Self {
        Value::U64(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::F32(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::F64(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(v)
    }
}

impl From<Name> for Value {
    fn from(v: Name) -> Self {
        Value::Symbol(v)
    }
}

impl From<Entity> for Value {
    fn from(v: Entity) -> Self {
        Value::Entity(v)
    }
}

impl From<Object> for Value {
    fn from(v: Object) -> Self {
        Value::Object(v)
    }
}

impl From<IndirectRef> for Value {
    fn from(v: IndirectRef) -> Self {
        Value::Indirect(v)
    }
}

impl From<MemberRef> for Value {
    fn from(v: MemberRef) -> Self {
        Value::Member(v)
    }
}

impl From<ComponentSchema> for Value {
    fn from(v: ComponentSchema) -> Self {
        Value::Schema(Box::new(v))
    }
}

impl From<Expression> for Value {
    fn from(v: Expression) -> Self {
        Value::Expr(Box::new(v))
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Value::List(v)
    }
}
