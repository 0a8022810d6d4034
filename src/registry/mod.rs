//! Reflection registry: type, field, and function lookup by hashed name.

mod type_info;
mod type_registry;

pub use type_info::{
    kind_default, FieldInfo, FunctionInfo, NativeFn, TypeInfo, ASSIGN_OPERATOR, CALL_OPERATOR,
};
pub use type_registry::TypeRegistry;
