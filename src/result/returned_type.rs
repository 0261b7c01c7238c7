//! Description of the type a query method wants materialized.

use crate::types::{TypeIntrospector, TypeKind, TypeRef};
use crate::value::Value;

/// How the returned type relates to the domain type.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ReturnedKind {
    /// The domain type itself, a domain subtype, or an untyped return.
    Domain,
    /// Interface projection. `closed` interfaces declare every accessor.
    Interface {
        /// Whether the domain type does not implement the interface.
        projecting: bool,
        /// Whether every accessor maps to a declared property.
        closed: bool,
    },
    /// Concrete DTO class distinct from the domain type.
    Dto,
    /// Scalar (number, string, ...), never projected.
    Scalar,
}

/// The resolved target of result processing.
///
/// Immutable: a dynamic projection produces a new value instead of
/// mutating the method's static one.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ReturnedType {
    returned: String,
    domain: String,
    kind: ReturnedKind,
    input_properties: Vec<String>,
}

impl ReturnedType {
    /// Describes the component of `declared` against `domain`.
    pub fn of(declared: &TypeRef, domain: &str, types: &dyn TypeIntrospector) -> Self {
        match declared.component_type().as_named() {
            Some(name) => Self::for_name(name, domain, types),
            None => Self::domain(domain),
        }
    }

    /// Describes the named type `returned` against `domain`.
    pub fn for_name(returned: &str, domain: &str, types: &dyn TypeIntrospector) -> Self {
        if returned == domain || returned == "Object" {
            return Self::domain(domain);
        }
        let (kind, input_properties) = match types.kind_of(returned) {
            TypeKind::Interface => {
                let projecting = !types.is_assignable(returned, domain);
                let closed = types.describe(returned).is_some_and(|d| !d.is_open());
                let inputs = if closed {
                    types.input_properties(returned)
                } else {
                    Vec::new()
                };
                (ReturnedKind::Interface { projecting, closed }, inputs)
            }
            TypeKind::Class if types.is_assignable(domain, returned) => (ReturnedKind::Domain, Vec::new()),
            TypeKind::Class => (ReturnedKind::Dto, types.input_properties(returned)),
            TypeKind::Scalar => (ReturnedKind::Scalar, Vec::new()),
        };
        Self {
            returned: returned.to_string(),
            domain: domain.to_string(),
            kind,
            input_properties,
        }
    }

    fn domain(domain: &str) -> Self {
        Self {
            returned: domain.to_string(),
            domain: domain.to_string(),
            kind: ReturnedKind::Domain,
            input_properties: Vec::new(),
        }
    }

    /// Name of the returned type.
    pub fn returned_type(&self) -> &str {
        &self.returned
    }

    /// Name of the domain type.
    pub fn domain_type(&self) -> &str {
        &self.domain
    }

    /// Relationship to the domain type.
    pub fn kind(&self) -> ReturnedKind {
        self.kind
    }

    /// Whether results must be converted before reaching the caller.
    pub fn is_projecting(&self) -> bool {
        match self.kind {
            ReturnedKind::Interface { projecting, .. } => projecting,
            ReturnedKind::Dto => true,
            ReturnedKind::Domain | ReturnedKind::Scalar => false,
        }
    }

    /// Whether the target is an interface projection.
    pub fn is_interface(&self) -> bool {
        matches!(self.kind, ReturnedKind::Interface { .. })
    }

    /// Whether the store may return a tuple instead of the domain type.
    pub fn needs_custom_construction(&self) -> bool {
        match self.kind {
            ReturnedKind::Interface { projecting, closed } => projecting && closed,
            ReturnedKind::Dto => !self.input_properties.is_empty(),
            ReturnedKind::Domain | ReturnedKind::Scalar => false,
        }
    }

    /// Property names needed to populate the returned type, in order.
    pub fn input_properties(&self) -> &[String] {
        &self.input_properties
    }

    /// Type the store should materialize before projection; `None` when a
    /// tuple-like structure keyed by the input properties suffices.
    pub fn type_to_read(&self) -> Option<&str> {
        match self.kind {
            ReturnedKind::Interface {
                projecting: true,
                closed: true,
            } => None,
            ReturnedKind::Interface { .. } | ReturnedKind::Domain => Some(&self.domain),
            ReturnedKind::Dto | ReturnedKind::Scalar => Some(&self.returned),
        }
    }

    /// Whether `value` already is an instance of the returned type.
    pub fn is_instance(&self, value: &Value, types: &dyn TypeIntrospector) -> bool {
        value
            .type_name()
            .is_some_and(|actual| types.is_assignable(&self.returned, actual))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{TypeDescriptor, TypeRegistry, WrapperKind};

    fn types() -> TypeRegistry {
        TypeRegistry::new()
            .with_type(
                TypeDescriptor::class("User")
                    .with_property("firstname", TypeRef::string())
                    .with_property("lastname", TypeRef::string())
                    .with_supertype("Named"),
            )
            .with_type(TypeDescriptor::class("SpecialUser").with_supertype("User"))
            .with_type(TypeDescriptor::interface("Named").with_property("lastname", TypeRef::string()))
            .with_type(
                TypeDescriptor::interface("UserSummary")
                    .with_property("firstname", TypeRef::string())
                    .with_property("lastname", TypeRef::string()),
            )
            .with_type(TypeDescriptor::interface("OpenSummary").open())
            .with_type(
                TypeDescriptor::class("UserDto")
                    .with_property("lastname", TypeRef::string())
                    .with_constructor(["lastname"]),
            )
    }

    #[test]
    fn closed_interface_projects_from_tuples() {
        let types = types();
        let returned = ReturnedType::of(
            &TypeRef::wrap(WrapperKind::Page, TypeRef::named("UserSummary")),
            "User",
            &types,
        );
        assert!(returned.is_projecting());
        assert!(returned.needs_custom_construction());
        assert_eq!(returned.input_properties(), ["firstname", "lastname"]);
        assert_eq!(returned.type_to_read(), None);
    }

    #[test]
    fn implemented_interface_does_not_project() {
        let types = types();
        let returned = ReturnedType::for_name("Named", "User", &types);
        assert!(!returned.is_projecting());
        assert_eq!(returned.type_to_read(), Some("User"));
    }

    #[test]
    fn open_interface_reads_domain_type() {
        let types = types();
        let returned = ReturnedType::for_name("OpenSummary", "User", &types);
        assert!(returned.is_projecting());
        assert!(!returned.needs_custom_construction());
        assert!(returned.input_properties().is_empty());
        assert_eq!(returned.type_to_read(), Some("User"));
    }

    #[test]
    fn dto_reads_itself_and_subtypes_do_not_project() {
        let types = types();
        let dto = ReturnedType::for_name("UserDto", "User", &types);
        assert!(dto.is_projecting());
        assert_eq!(dto.type_to_read(), Some("UserDto"));
        assert_eq!(dto.input_properties(), ["lastname"]);

        assert!(!ReturnedType::for_name("SpecialUser", "User", &types).is_projecting());
        assert!(!ReturnedType::for_name("long", "User", &types).is_projecting());
        assert!(!ReturnedType::of(&TypeRef::variable("T"), "User", &types).is_projecting());
    }
}
