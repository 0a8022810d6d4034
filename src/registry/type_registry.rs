//! The type registry.
//!
//! One `TypeRegistry` is built at startup from the loaded documents and
//! injected everywhere types are resolved — there is no process-wide
//! singleton. It is read-only for the whole lifetime of evaluation.

use rustc_hash::FxHashMap;

use crate::core::Name;
use crate::value::{Value, ValueKind};

use super::type_info::TypeInfo;

/// Registry of type descriptors, looked up by hashed name.
#[derive(Clone, Debug, Default)]
pub struct TypeRegistry {
    types: FxHashMap<Name, TypeInfo>,
}

impl TypeRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry preloaded with builtin value types.
    ///
    /// Currently that is `"string"` with a concatenating `operator+`,
    /// giving string values a dispatch target in expressions.
    #[must_use]
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(TypeInfo::new("string").with_function(
            "operator+",
            vec![ValueKind::Str, ValueKind::Str],
            true,
            |args| {
                let mut out = args[0].as_str()?.to_string();
                out.push_str(args[1].as_str()?);
                Some(Value::Str(out))
            },
        ));
        registry
    }

    /// Register a type. Re-registering an id replaces the previous
    /// descriptor (later documents override earlier ones).
    pub fn register(&mut self, info: TypeInfo) {
        if self.types.insert(info.id, info).is_some() {
            log::debug!("type registry: replaced existing type descriptor");
        }
    }

    /// Resolve a type by id.
    #[must_use]
    pub fn get(&self, id: Name) -> Option<&TypeInfo> {
        self.types.get(&id)
    }

    /// Resolve a type by name string.
    #[must_use]
    pub fn get_named(&self, name: &str) -> Option<&TypeInfo> {
        self.get(Name::of(name))
    }

    /// Check whether a type id is registered.
    #[must_use]
    pub fn contains(&self, id: Name) -> bool {
        self.types.contains_key(&id)
    }

    /// Number of registered types.
    #[must_use]
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Check if the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Iterate over all type descriptors.
    pub fn iter(&self) -> impl Iterator<Item = &TypeInfo> {
        self.types.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_and_resolve() {
        let mut registry = TypeRegistry::new();
        registry.register(TypeInfo::new("Health").with_field("hp", ValueKind::I64));

        assert!(registry.contains(Name::of("Health")));
        assert_eq!(registry.get_named("Health").unwrap().name, "Health");
        assert!(registry.get(Name::of("Mana")).is_none());
    }

    #[test]
    fn test_replacement_wins() {
        let mut registry = TypeRegistry::new();
        registry.register(TypeInfo::new("Health").with_field("hp", ValueKind::I64));
        registry.register(TypeInfo::new("Health").with_field("hp", ValueKind::F64));

        let info = registry.get_named("Health").unwrap();
        assert_eq!(info.field(Name::of("hp")).unwrap().kind, ValueKind::F64);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_builtin_string_concat() {
        let registry = TypeRegistry::with_builtins();
        let string_type = registry.get_named("string").unwrap();
        let concat = string_type.func(Name::of("operator+")).unwrap();
        assert_eq!(
            concat.invoke(&[Value::Str("ab".into()), Value::Str("cd".into())]),
            Some(Value::Str("abcd".into())),
        );
    }
}
