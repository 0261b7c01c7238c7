use std::collections::HashMap;

use super::{TypeDescriptor, TypeIntrospector};

const SCALARS: &[&str] = &[
    "String", "boolean", "int", "long", "double", "float", "Integer", "Long", "Double", "Float",
    "Boolean", "BigDecimal", "Instant", "LocalDate", "Object",
];

/// In-memory type registry used by tests, code generators, or prototyping.
pub struct TypeRegistry {
    types: HashMap<String, TypeDescriptor>,
}

impl TypeRegistry {
    /// Creates a registry pre-populated with common scalar types.
    pub fn new() -> Self {
        let types = SCALARS
            .iter()
            .map(|name| (name.to_string(), TypeDescriptor::scalar(*name)))
            .collect();
        Self { types }
    }

    /// Registers (or replaces) a type description.
    pub fn with_type(mut self, descriptor: TypeDescriptor) -> Self {
        self.register(descriptor);
        self
    }

    /// Registers (or replaces) a type description in place.
    pub fn register(&mut self, descriptor: TypeDescriptor) {
        self.types.insert(descriptor.name().to_string(), descriptor);
    }

    /// Number of registered types, scalars included.
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Whether the registry holds no types.
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeIntrospector for TypeRegistry {
    fn describe(&self, type_name: &str) -> Option<&TypeDescriptor> {
        self.types.get(type_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{TypeKind, TypeRef};

    fn registry() -> TypeRegistry {
        TypeRegistry::new()
            .with_type(TypeDescriptor::class("Person").with_property("name", TypeRef::string()))
            .with_type(
                TypeDescriptor::class("User")
                    .with_supertype("Person")
                    .with_supertype("Named")
                    .with_property("age", TypeRef::named("int")),
            )
            .with_type(TypeDescriptor::interface("Named").with_property("name", TypeRef::string()))
    }

    #[test]
    fn inherited_properties_resolve_through_supertypes() {
        let types = registry();
        let prop = types.resolve_property("User", "name").unwrap();
        assert_eq!(prop.owner, "Person");
        assert_eq!(prop.ty, TypeRef::string());
        assert!(types.resolve_property("User", "missing").is_none());
    }

    #[test]
    fn assignability_walks_supertypes() {
        let types = registry();
        assert!(types.is_assignable("Person", "User"));
        assert!(types.is_assignable("Named", "User"));
        assert!(!types.is_assignable("User", "Person"));
        assert!(types.is_assignable("Object", "User"));
    }

    #[test]
    fn unknown_types_are_scalars() {
        let types = registry();
        assert_eq!(types.kind_of("Named"), TypeKind::Interface);
        assert_eq!(types.kind_of("UUID"), TypeKind::Scalar);
        assert_eq!(types.kind_of("long"), TypeKind::Scalar);
    }
}
