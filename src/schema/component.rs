//! Component schemas.
//!
//! A `ComponentSchema` is a partially-specified, type-erased description
//! of a component: the type id plus an ordered list of `(field name,
//! value)` pairs. The same schema both constructs fresh instances and
//! patches existing ones; field values may be literals, pool references,
//! member references, nested schemas, or expressions, all resolved at
//! application time.
//!
//! Failure is always local: an unresolvable field is logged and skipped,
//! a failed construction yields `Value::Empty` for the caller to log —
//! one bad schema never aborts its siblings.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::context::EvalContext;
use crate::core::Name;
use crate::error::BehaviorError;
use crate::expr::{has_indirection, resolve_value, ResolveMode};
use crate::value::Value;

/// Construction behavior switches.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaFlags {
    /// Permit default construction when forwarding is off or fails.
    pub allow_default_construction: bool,
    /// Attempt to forward field values to the type's constructor.
    pub allow_forwarding_fields_to_constructor: bool,
    /// Apply every field even to a constructor-built instance. This is
    /// what makes re-entering a state idempotent.
    pub force_field_assignment: bool,
}

impl Default for SchemaFlags {
    fn default() -> Self {
        Self {
            allow_default_construction: true,
            allow_forwarding_fields_to_constructor: true,
            force_field_assignment: false,
        }
    }
}

/// Ordered, type-erased field description used for construction and
/// patching.
///
/// ## Example
///
/// ```
/// use statecraft::schema::ComponentSchema;
///
/// let schema = ComponentSchema::new("Health")
///     .with_field("hp", 100i64)
///     .with_field("regen", 0.5f64);
///
/// assert_eq!(schema.len(), 2);
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ComponentSchema {
    /// Registered type this schema describes.
    pub type_id: Name,
    field_names: SmallVec<[Name; 4]>,
    field_values: SmallVec<[Value; 4]>,
    /// Bound on how many leading values forward to the constructor.
    pub constructor_argc: Option<usize>,
    /// Construction behavior.
    pub flags: SchemaFlags,
}

impl ComponentSchema {
    /// Create an empty schema for a type.
    #[must_use]
    pub fn new(type_id: impl Into<Name>) -> Self {
        Self {
            type_id: type_id.into(),
            field_names: SmallVec::new(),
            field_values: SmallVec::new(),
            constructor_argc: None,
            flags: SchemaFlags::default(),
        }
    }

    /// Build a schema from parallel name/value lists.
    ///
    /// The lists must be the same length; documents with diverging lists
    /// are refused at load time.
    pub fn from_parts(
        type_id: impl Into<Name>,
        names: Vec<Name>,
        values: Vec<Value>,
    ) -> Result<Self, BehaviorError> {
        let type_id = type_id.into();
        if names.len() != values.len() {
            return Err(BehaviorError::MismatchedFields {
                type_id,
                names: names.len(),
                values: values.len(),
            });
        }
        Ok(Self {
            type_id,
            field_names: names.into(),
            field_values: values.into(),
            constructor_argc: None,
            flags: SchemaFlags::default(),
        })
    }

    /// Append a field (builder pattern).
    #[must_use]
    pub fn with_field(mut self, name: impl Into<Name>, value: impl Into<Value>) -> Self {
        self.field_names.push(name.into());
        self.field_values.push(value.into());
        self
    }

    /// Bound constructor forwarding to the first `count` values
    /// (builder pattern).
    #[must_use]
    pub fn with_constructor_argc(mut self, count: usize) -> Self {
        self.constructor_argc = Some(count);
        self
    }

    /// Replace the flags (builder pattern).
    #[must_use]
    pub fn with_flags(mut self, flags: SchemaFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Force field assignment on every application (builder pattern).
    #[must_use]
    pub fn force_fields(mut self) -> Self {
        self.flags.force_field_assignment = true;
        self
    }

    /// Number of described fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.field_names.len()
    }

    /// Check for a field-less schema.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.field_names.is_empty()
    }

    /// Iterate `(name, value)` pairs in declaration order.
    pub fn fields(&self) -> impl Iterator<Item = (Name, &Value)> {
        self.field_names
            .iter()
            .copied()
            .zip(self.field_values.iter())
    }

    /// Construct an instance of the schema's type.
    ///
    /// Strategy: at most one constructor-forwarding attempt (when allowed
    /// and the type is not a container), then default construction, then
    /// field patching when the instance was default-constructed or
    /// `force_field_assignment` is set. A single forwarded argument
    /// already of the schema's type collapses to a copy instead of a
    /// wrapping call.
    ///
    /// Returns `Value::Empty` when the type is unknown or no construction
    /// path is permitted.
    #[must_use]
    pub fn instance(&self, ctx: &mut EvalContext) -> Value {
        let Some(info) = ctx.registry.get(self.type_id) else {
            log::warn!("schema: unknown type {}", self.type_id);
            return Value::Empty;
        };

        let mut instance = Value::Empty;
        if self.flags.allow_forwarding_fields_to_constructor
            && !info.container
            && !self.field_values.is_empty()
        {
            if let Some(args) = self.forwarded_args(ctx) {
                if args.len() == 1 && args[0].type_id() == Some(self.type_id) {
                    instance = args[0].clone();
                } else if let Some(constructed) = info.construct(ctx.registry, &args) {
                    instance = constructed;
                }
            }
        }

        let mut default_constructed = false;
        if instance.is_empty() {
            if self.flags.allow_default_construction || self.flags.force_field_assignment {
                instance = info.default_instance();
                default_constructed = true;
            } else {
                log::warn!("schema: no construction path for {}", self.type_id);
                return Value::Empty;
            }
        }

        if default_constructed || self.flags.force_field_assignment {
            self.apply_fields(&mut instance, ctx);
        }
        instance
    }

    /// Resolve the values forwarded to the constructor, bounded by
    /// `constructor_argc`. `None` when any argument fails to resolve.
    fn forwarded_args(&self, ctx: &mut EvalContext) -> Option<Vec<Value>> {
        let count = self
            .constructor_argc
            .unwrap_or(self.field_values.len())
            .min(self.field_values.len());
        let mut args = Vec::with_capacity(count);
        for value in &self.field_values[..count] {
            if has_indirection(value, ctx.registry) {
                args.push(resolve_value(value, ctx, ResolveMode::Source)?);
            } else {
                args.push(value.clone());
            }
        }
        Some(args)
    }

    /// Patch an existing instance with every described field.
    ///
    /// Schema-side indirection resolves first (a nested schema value
    /// recurses into its own `instance()`); assignment goes through the
    /// registry's typed setter when the type is registered, raw field
    /// writes otherwise. Unresolvable fields are logged and skipped.
    ///
    /// Returns the number of fields actually applied.
    pub fn apply_fields(&self, instance: &mut Value, ctx: &mut EvalContext) -> usize {
        let Value::Object(obj) = instance else {
            log::warn!("schema: cannot patch a non-object value for {}", self.type_id);
            return 0;
        };
        let info = ctx.registry.get(self.type_id);

        let mut applied = 0;
        for (name, value) in self.field_names.iter().zip(&self.field_values) {
            let resolved = if has_indirection(value, ctx.registry) {
                match resolve_value(value, ctx, ResolveMode::Source) {
                    Some(resolved) => resolved,
                    None => {
                        log::warn!("schema {}: field {} did not resolve", self.type_id, name);
                        continue;
                    }
                }
            } else {
                value.clone()
            };

            let ok = match info {
                Some(info) => info.assign_field(ctx.registry, obj, *name, resolved),
                None => {
                    obj.set_field(*name, resolved);
                    true
                }
            };
            if ok {
                applied += 1;
            } else {
                log::warn!("schema {}: field {} refused, skipped", self.type_id, name);
            }
        }
        applied
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{TypeInfo, TypeRegistry};
    use crate::store::ComponentStore;
    use crate::value::{MemberRef, Object, ValueKind, ValuePool};

    const HEALTH: Name = Name::of("Health");
    const HP: Name = Name::of("hp");

    fn registry() -> TypeRegistry {
        let mut registry = TypeRegistry::new();
        registry.register(
            TypeInfo::new("Health")
                .with_field_default("hp", ValueKind::I64, 100i64)
                .with_field("regen", ValueKind::F64),
        );
        registry
    }

    fn instance_of(schema: &ComponentSchema, registry: &TypeRegistry) -> Value {
        let mut store = ComponentStore::new();
        let mut pool = ValuePool::new();
        let mut ctx = EvalContext::new(registry, &mut store, &mut pool);
        schema.instance(&mut ctx)
    }

    #[test]
    fn test_constructor_forwarding() {
        let registry = registry();
        let schema = ComponentSchema::new("Health").with_field("hp", 25i64);
        let instance = instance_of(&schema, &registry);
        let obj = instance.as_object().unwrap();
        assert_eq!(obj.field(HP), Some(&Value::I64(25)));
    }

    #[test]
    fn test_default_construct_then_patch() {
        let registry = registry();
        let schema = ComponentSchema::new("Health")
            .with_field("hp", 25i64)
            .with_flags(SchemaFlags {
                allow_forwarding_fields_to_constructor: false,
                ..SchemaFlags::default()
            });
        let instance = instance_of(&schema, &registry);
        let obj = instance.as_object().unwrap();
        assert_eq!(obj.field(HP), Some(&Value::I64(25)));
        // Untouched fields keep their declared defaults.
        assert_eq!(obj.field(Name::of("regen")), Some(&Value::F64(0.0)));
    }

    #[test]
    fn test_unknown_type_yields_empty() {
        let registry = TypeRegistry::new();
        let schema = ComponentSchema::new("Missing").with_field("x", 1i64);
        assert!(instance_of(&schema, &registry).is_empty());
    }

    #[test]
    fn test_no_construction_path() {
        let registry = registry();
        let schema = ComponentSchema::new("Health").with_flags(SchemaFlags {
            allow_default_construction: false,
            allow_forwarding_fields_to_constructor: false,
            force_field_assignment: false,
        });
        assert!(instance_of(&schema, &registry).is_empty());
    }

    #[test]
    fn test_bad_field_skipped_not_fatal() {
        let registry = registry();
        // "mana" is not declared on Health; "hp" still applies.
        let schema = ComponentSchema::new("Health")
            .with_field("mana", 1i64)
            .with_field("hp", 7i64)
            .with_flags(SchemaFlags {
                allow_forwarding_fields_to_constructor: false,
                ..SchemaFlags::default()
            });
        let mut store = ComponentStore::new();
        let mut pool = ValuePool::new();
        let mut ctx = EvalContext::new(&registry, &mut store, &mut pool);
        let mut instance = schema.instance(&mut ctx);
        assert_eq!(
            instance.as_object().unwrap().field(HP),
            Some(&Value::I64(7)),
        );
        // Re-applying reports one applied field out of two.
        assert_eq!(schema.apply_fields(&mut instance, &mut ctx), 1);
    }

    #[test]
    fn test_member_reference_field() {
        let registry = registry();
        let mut store = ComponentStore::new();
        let mut pool = ValuePool::new();
        let source = store.create();
        store.emplace_or_replace(
            source,
            HEALTH,
            Value::Object(Object::new(HEALTH).with_field("hp", 61i64)),
        );

        let schema =
            ComponentSchema::new("Health").with_field("hp", MemberRef::new("Health", "hp"));
        let mut ctx = EvalContext::new(&registry, &mut store, &mut pool).for_entity(source);
        let instance = schema.instance(&mut ctx);
        assert_eq!(
            instance.as_object().unwrap().field(HP),
            Some(&Value::I64(61)),
        );
    }

    #[test]
    fn test_nested_schema_field() {
        let mut registry = TypeRegistry::new();
        registry.register(TypeInfo::new("Inner").with_field("v", ValueKind::I64));
        registry.register(TypeInfo::new("Outer").with_object_field("inner", "Inner"));

        let schema = ComponentSchema::new("Outer")
            .with_field("inner", ComponentSchema::new("Inner").with_field("v", 5i64))
            .with_flags(SchemaFlags {
                allow_forwarding_fields_to_constructor: false,
                ..SchemaFlags::default()
            });
        let instance = instance_of(&schema, &registry);
        let outer = instance.as_object().unwrap();
        let inner = outer.field(Name::of("inner")).unwrap().as_object().unwrap();
        assert_eq!(inner.field(Name::of("v")), Some(&Value::I64(5)));
    }

    #[test]
    fn test_from_parts_validates_lengths() {
        let err = ComponentSchema::from_parts(
            "Health",
            vec![Name::of("hp")],
            vec![Value::I64(1), Value::I64(2)],
        );
        assert!(matches!(
            err,
            Err(BehaviorError::MismatchedFields { names: 1, values: 2, .. }),
        ));
    }

    #[test]
    fn test_single_same_type_argument_collapses_to_copy() {
        let registry = registry();
        let existing = Object::new(HEALTH).with_field("hp", 42i64);
        let schema = ComponentSchema::new("Health").with_field("copy_of", existing.clone());
        let instance = instance_of(&schema, &registry);
        // The forwarded Health object is taken as-is, not wrapped.
        assert_eq!(instance, Value::Object(existing));
    }
}
