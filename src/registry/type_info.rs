//! Type descriptors.
//!
//! A `TypeInfo` is everything the runtime knows about one registered
//! type: its declared fields (with kinds and defaults), its constructor,
//! and its named functions. Functions double as operators — a type that
//! registers `"operator+"` participates in expression dispatch, and a
//! type that registers the call or assignment operator makes its
//! instances indirection-bearing.
//!
//! Capabilities are plain closures, the registry never downcasts.

use std::rc::Rc;

use rustc_hash::FxHashMap;

use crate::core::Name;
use crate::value::{Object, Value, ValueKind};

use super::TypeRegistry;

/// Canonical function id of the call operator.
pub const CALL_OPERATOR: Name = Name::of("operator()");
/// Canonical function id of the assignment operator.
pub const ASSIGN_OPERATOR: Name = Name::of("operator=");

/// Closure signature for constructors and function bodies.
pub type NativeFn = Rc<dyn Fn(&[Value]) -> Option<Value>>;

/// Declared field of a registered type.
#[derive(Clone)]
pub struct FieldInfo {
    /// Field id.
    pub name: Name,
    /// Declared value kind; assignments coerce toward this.
    pub kind: ValueKind,
    /// For `Object`-kind fields, the registered type of the nested object.
    pub object_type: Option<Name>,
    /// Default value used by default construction. `None` means the
    /// kind's zero value.
    pub default: Option<Value>,
}

impl FieldInfo {
    /// Value a default-constructed instance carries for this field.
    #[must_use]
    pub fn initial_value(&self) -> Value {
        match &self.default {
            Some(value) => value.clone(),
            None => kind_default(self.kind),
        }
    }
}

/// Zero value of a kind, used when a field declares no default.
#[must_use]
pub fn kind_default(kind: ValueKind) -> Value {
    match kind {
        ValueKind::Bool => Value::Bool(false),
        ValueKind::I32 => Value::I32(0),
        ValueKind::U32 => Value::U32(0),
        ValueKind::I64 => Value::I64(0),
        ValueKind::U64 => Value::U64(0),
        ValueKind::F32 => Value::F32(0.0),
        ValueKind::F64 => Value::F64(0.0),
        ValueKind::Str => Value::Str(String::new()),
        ValueKind::List => Value::List(Vec::new()),
        ValueKind::Map => Value::Map(FxHashMap::default()),
        ValueKind::Entity => Value::Entity(crate::core::Entity::NULL),
        _ => Value::Empty,
    }
}

/// A registered function, possibly the head of an overload chain.
#[derive(Clone)]
pub struct FunctionInfo {
    /// Function id (for operators, the canonical `"operator…"` name).
    pub name: Name,
    /// Declared parameter kinds. Arity is `params.len()`.
    pub params: Vec<ValueKind>,
    /// Static functions take no instance as their first argument.
    pub is_static: bool,
    body: NativeFn,
    next: Option<Box<FunctionInfo>>,
}

impl FunctionInfo {
    /// Create a function from its parameter kinds and body.
    pub fn new(
        name: impl Into<Name>,
        params: Vec<ValueKind>,
        is_static: bool,
        body: impl Fn(&[Value]) -> Option<Value> + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            params,
            is_static,
            body: Rc::new(body),
            next: None,
        }
    }

    /// Number of declared parameters.
    #[must_use]
    pub fn arity(&self) -> usize {
        self.params.len()
    }

    /// Declared kind of parameter `i`.
    #[must_use]
    pub fn arg(&self, i: usize) -> Option<ValueKind> {
        self.params.get(i).copied()
    }

    /// Next overload in the chain.
    #[must_use]
    pub fn next(&self) -> Option<&FunctionInfo> {
        self.next.as_deref()
    }

    /// Append an overload to the end of the chain.
    pub fn push_overload(&mut self, overload: FunctionInfo) {
        match &mut self.next {
            Some(next) => next.push_overload(overload),
            slot => *slot = Some(Box::new(overload)),
        }
    }

    /// Walk the chain for the first overload with the given arity.
    #[must_use]
    pub fn overload_for(&self, arity: usize) -> Option<&FunctionInfo> {
        let mut current = Some(self);
        while let Some(func) = current {
            if func.arity() == arity {
                return Some(func);
            }
            current = func.next();
        }
        None
    }

    /// Invoke this exact overload. `None` on arity mismatch or when the
    /// body declines the arguments.
    #[must_use]
    pub fn invoke(&self, args: &[Value]) -> Option<Value> {
        if args.len() != self.arity() {
            return None;
        }
        (self.body)(args)
    }
}

impl std::fmt::Debug for FunctionInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FunctionInfo")
            .field("name", &self.name)
            .field("params", &self.params)
            .field("is_static", &self.is_static)
            .field("overloads", &self.next.is_some())
            .finish()
    }
}

/// Everything known about one registered type.
#[derive(Clone)]
pub struct TypeInfo {
    /// Type id (hash of `name`).
    pub id: Name,
    /// Original type name, kept for diagnostics.
    pub name: String,
    /// Containers never take constructor-forwarded fields.
    pub container: bool,
    fields: Vec<FieldInfo>,
    functions: FxHashMap<Name, FunctionInfo>,
    constructor: Option<NativeFn>,
}

impl TypeInfo {
    /// Declare a new type.
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            id: Name::of(name),
            name: name.to_string(),
            container: false,
            fields: Vec::new(),
            functions: FxHashMap::default(),
            constructor: None,
        }
    }

    /// Mark this type as a container (builder pattern).
    #[must_use]
    pub fn container(mut self) -> Self {
        self.container = true;
        self
    }

    /// Declare a field (builder pattern).
    #[must_use]
    pub fn with_field(mut self, name: impl Into<Name>, kind: ValueKind) -> Self {
        self.fields.push(FieldInfo {
            name: name.into(),
            kind,
            object_type: None,
            default: None,
        });
        self
    }

    /// Declare a field with a default value (builder pattern).
    #[must_use]
    pub fn with_field_default(
        mut self,
        name: impl Into<Name>,
        kind: ValueKind,
        default: impl Into<Value>,
    ) -> Self {
        self.fields.push(FieldInfo {
            name: name.into(),
            kind,
            object_type: None,
            default: Some(default.into()),
        });
        self
    }

    /// Declare an `Object`-kind field of a specific registered type
    /// (builder pattern).
    #[must_use]
    pub fn with_object_field(mut self, name: impl Into<Name>, object_type: impl Into<Name>) -> Self {
        self.fields.push(FieldInfo {
            name: name.into(),
            kind: ValueKind::Object,
            object_type: Some(object_type.into()),
            default: None,
        });
        self
    }

    /// Install a custom constructor (builder pattern). Replaces positional
    /// field construction entirely.
    #[must_use]
    pub fn with_constructor(
        mut self,
        constructor: impl Fn(&[Value]) -> Option<Value> + 'static,
    ) -> Self {
        self.constructor = Some(Rc::new(constructor));
        self
    }

    /// Register a function or operator (builder pattern). Registering the
    /// same name twice chains an overload.
    #[must_use]
    pub fn with_function(
        mut self,
        name: impl Into<Name>,
        params: Vec<ValueKind>,
        is_static: bool,
        body: impl Fn(&[Value]) -> Option<Value> + 'static,
    ) -> Self {
        let func = FunctionInfo::new(name, params, is_static, body);
        match self.functions.get_mut(&func.name) {
            Some(head) => head.push_overload(func),
            None => {
                self.functions.insert(func.name, func);
            }
        }
        self
    }

    /// Look up a declared field.
    #[must_use]
    pub fn field(&self, name: Name) -> Option<&FieldInfo> {
        self.fields.iter().find(|field| field.name == name)
    }

    /// Declared fields in declaration order.
    #[must_use]
    pub fn fields(&self) -> &[FieldInfo] {
        &self.fields
    }

    /// Look up a function chain head.
    #[must_use]
    pub fn func(&self, name: Name) -> Option<&FunctionInfo> {
        self.functions.get(&name)
    }

    /// Check for a registered call operator.
    #[must_use]
    pub fn has_call_operator(&self) -> bool {
        self.functions.contains_key(&CALL_OPERATOR)
    }

    /// Check for a registered assignment operator.
    #[must_use]
    pub fn has_assign_operator(&self) -> bool {
        self.functions.contains_key(&ASSIGN_OPERATOR)
    }

    /// Default-construct an instance: every declared field at its default.
    #[must_use]
    pub fn default_instance(&self) -> Value {
        let mut obj = Object::new(self.id);
        for field in &self.fields {
            obj.set_field(field.name, field.initial_value());
        }
        Value::Object(obj)
    }

    /// Construct an instance from arguments.
    ///
    /// A custom constructor, if installed, decides everything. Otherwise
    /// no arguments default-constructs, and N arguments assign the first
    /// N declared fields positionally. Returns `None` when construction
    /// is not possible with these arguments.
    #[must_use]
    pub fn construct(&self, registry: &TypeRegistry, args: &[Value]) -> Option<Value> {
        if let Some(constructor) = &self.constructor {
            return constructor(args);
        }
        if args.is_empty() {
            return Some(self.default_instance());
        }
        if args.len() > self.fields.len() {
            return None;
        }
        let mut instance = self.default_instance();
        let Value::Object(obj) = &mut instance else {
            return None;
        };
        for (field, arg) in self.fields.iter().zip(args) {
            if !self.assign_field(registry, obj, field.name, arg.clone()) {
                return None;
            }
        }
        Some(instance)
    }

    /// Typed field read: the instance's value, or the declared default
    /// when the instance never set it. `None` for undeclared fields.
    #[must_use]
    pub fn get_field(&self, obj: &Object, name: Name) -> Option<Value> {
        let field = self.field(name)?;
        match obj.field(name) {
            Some(value) => Some(value.clone()),
            None => Some(field.initial_value()),
        }
    }

    /// Typed field write.
    ///
    /// Tries, in order: exact kind, kind coercion (which includes hashing
    /// string-like sources into symbol ids), and — for object fields —
    /// constructing the field's declared type from the value. Returns
    /// `false` for undeclared fields or when nothing applies.
    pub fn assign_field(
        &self,
        registry: &TypeRegistry,
        obj: &mut Object,
        name: Name,
        value: Value,
    ) -> bool {
        let Some(field) = self.field(name) else {
            return false;
        };
        if value.kind() == field.kind {
            obj.set_field(name, value);
            return true;
        }
        if let Some(coerced) = value.coerce_to(field.kind) {
            obj.set_field(name, coerced);
            return true;
        }
        if field.kind == ValueKind::Object {
            if let Some(nested) = field
                .object_type
                .and_then(|type_id| registry.get(type_id))
                .and_then(|info| info.construct(registry, std::slice::from_ref(&value)))
            {
                obj.set_field(name, nested);
                return true;
            }
        }
        false
    }
}

impl std::fmt::Debug for TypeInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TypeInfo")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("container", &self.container)
            .field("fields", &self.fields.len())
            .field("functions", &self.functions.len())
            .finish()
    }
}

impl std::fmt::Debug for FieldInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FieldInfo")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .finish()
    }
}
