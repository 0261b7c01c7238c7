//! Static type model consumed by the parser, the parameter model and the
//! result processor.
//!
//! Rust has no runtime reflection, so declared types are described with
//! [`TypeRef`] and the domain type graph is exposed through the
//! [`TypeIntrospector`] capability.

use std::collections::HashSet;
use std::fmt;

mod registry;

pub use registry::TypeRegistry;

/// Wrapper types the framework knows how to unwrap or rewrap.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum WrapperKind {
    /// Optional single value.
    Optional,
    /// Deferred single value.
    Future,
    /// Ordered list.
    List,
    /// Set of unique elements.
    Set,
    /// Generic collection.
    Collection,
    /// Generic iterable.
    Iterable,
    /// Page with total count.
    Page,
    /// Slice with has-next flag.
    Slice,
    /// Window with scroll positions.
    Window,
    /// Lazy single-pass sequence.
    Stream,
    /// Reactive publisher of at most one element.
    Single,
    /// Reactive publisher of many elements.
    Multi,
}

impl WrapperKind {
    /// Wrapper name as rendered in signatures.
    pub fn name(self) -> &'static str {
        match self {
            WrapperKind::Optional => "Optional",
            WrapperKind::Future => "Future",
            WrapperKind::List => "List",
            WrapperKind::Set => "Set",
            WrapperKind::Collection => "Collection",
            WrapperKind::Iterable => "Iterable",
            WrapperKind::Page => "Page",
            WrapperKind::Slice => "Slice",
            WrapperKind::Window => "Window",
            WrapperKind::Stream => "Stream",
            WrapperKind::Single => "Single",
            WrapperKind::Multi => "Multi",
        }
    }

    /// Optional/deferred wrappers that hold at most one value and are
    /// stripped before shape classification.
    pub fn is_execution_wrapper(self) -> bool {
        matches!(self, WrapperKind::Optional | WrapperKind::Future)
    }

    /// Plain multi-element containers.
    pub fn is_collection_like(self) -> bool {
        matches!(
            self,
            WrapperKind::List | WrapperKind::Set | WrapperKind::Collection | WrapperKind::Iterable
        )
    }

    /// Reactive publishers.
    pub fn is_reactive(self) -> bool {
        matches!(self, WrapperKind::Single | WrapperKind::Multi)
    }

    /// Wrappers that carry at most one element.
    pub fn is_single_value(self) -> bool {
        matches!(
            self,
            WrapperKind::Optional | WrapperKind::Future | WrapperKind::Single
        )
    }
}

/// Framework types that mark a parameter as special (non-bindable).
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum SpecialType {
    /// Page request.
    Pageable,
    /// Sort specification.
    Sort,
    /// Result limit.
    Limit,
    /// Scroll position.
    ScrollPosition,
    /// Search vector.
    Vector,
    /// Score threshold.
    Score,
    /// Score range.
    ScoreRange,
}

impl SpecialType {
    /// Every special type, in declaration order.
    pub const ALL: [SpecialType; 7] = [
        SpecialType::Pageable,
        SpecialType::Sort,
        SpecialType::Limit,
        SpecialType::ScrollPosition,
        SpecialType::Vector,
        SpecialType::Score,
        SpecialType::ScoreRange,
    ];

    /// Simple type name.
    pub fn name(self) -> &'static str {
        match self {
            SpecialType::Pageable => "Pageable",
            SpecialType::Sort => "Sort",
            SpecialType::Limit => "Limit",
            SpecialType::ScrollPosition => "ScrollPosition",
            SpecialType::Vector => "Vector",
            SpecialType::Score => "Score",
            SpecialType::ScoreRange => "Range<Score>",
        }
    }
}

/// Declared type of a parameter, a property or a method return.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub enum TypeRef {
    /// Named type: entity, DTO, projection interface or scalar.
    Named(String),
    /// Unbound generic type variable.
    Variable(String),
    /// Array of the element type.
    Array(Box<TypeRef>),
    /// Type token (`Class<T>`), optionally with its captured argument.
    Class(Option<Box<TypeRef>>),
    /// Map from key type to value type.
    Map(Box<TypeRef>, Box<TypeRef>),
    /// Known wrapper around a component type.
    Wrapper(WrapperKind, Box<TypeRef>),
    /// Framework special type.
    Special(SpecialType),
    /// No value.
    Void,
}

impl TypeRef {
    /// Named type shorthand.
    pub fn named(name: impl Into<String>) -> Self {
        TypeRef::Named(name.into())
    }

    /// `String` shorthand.
    pub fn string() -> Self {
        TypeRef::named("String")
    }

    /// Generic type variable shorthand.
    pub fn variable(name: impl Into<String>) -> Self {
        TypeRef::Variable(name.into())
    }

    /// Wraps `inner` in `kind`.
    pub fn wrap(kind: WrapperKind, inner: TypeRef) -> Self {
        TypeRef::Wrapper(kind, Box::new(inner))
    }

    /// `List<inner>`.
    pub fn list(inner: TypeRef) -> Self {
        Self::wrap(WrapperKind::List, inner)
    }

    /// `Optional<inner>`.
    pub fn optional(inner: TypeRef) -> Self {
        Self::wrap(WrapperKind::Optional, inner)
    }

    /// `Page<inner>`.
    pub fn page(inner: TypeRef) -> Self {
        Self::wrap(WrapperKind::Page, inner)
    }

    /// `Class<inner>`.
    pub fn class_of(inner: TypeRef) -> Self {
        TypeRef::Class(Some(Box::new(inner)))
    }

    /// Array of `inner`.
    pub fn array(inner: TypeRef) -> Self {
        TypeRef::Array(Box::new(inner))
    }

    /// Name of a [`TypeRef::Named`] type.
    pub fn as_named(&self) -> Option<&str> {
        match self {
            TypeRef::Named(name) => Some(name),
            _ => None,
        }
    }

    /// Wrapper kind, if this is a wrapper.
    pub fn wrapper(&self) -> Option<WrapperKind> {
        match self {
            TypeRef::Wrapper(kind, _) => Some(*kind),
            _ => None,
        }
    }

    /// Special framework type, if any.
    pub fn special(&self) -> Option<SpecialType> {
        match self {
            TypeRef::Special(special) => Some(*special),
            _ => None,
        }
    }

    /// Removes exactly one level of wrapping (wrappers and arrays).
    pub fn unwrap_one_level(&self) -> Option<&TypeRef> {
        match self {
            TypeRef::Wrapper(_, inner) | TypeRef::Array(inner) => Some(inner),
            _ => None,
        }
    }

    /// Strips one optional/deferred/reactive-single wrapper, returning the
    /// type itself otherwise.
    pub fn unwrap_single_value(&self) -> &TypeRef {
        match self {
            TypeRef::Wrapper(kind, inner) if kind.is_single_value() => inner,
            other => other,
        }
    }

    /// Recursively strips every wrapper and array until the element type
    /// is reached. Maps yield their value type.
    pub fn component_type(&self) -> &TypeRef {
        match self {
            TypeRef::Wrapper(_, inner) | TypeRef::Array(inner) => inner.component_type(),
            TypeRef::Map(_, value) => value.component_type(),
            other => other,
        }
    }

    /// Element type for collection, array and map properties, the type
    /// itself otherwise. Used when navigating nested property paths.
    pub fn actual_type(&self) -> &TypeRef {
        match self {
            TypeRef::Wrapper(kind, inner) if kind.is_collection_like() || kind.is_execution_wrapper() => {
                inner.actual_type()
            }
            TypeRef::Array(inner) => inner.actual_type(),
            TypeRef::Map(_, value) => value.actual_type(),
            other => other,
        }
    }

    /// Whether the type denotes a multi-element container.
    pub fn is_collection_like(&self) -> bool {
        match self {
            TypeRef::Array(_) => true,
            TypeRef::Wrapper(kind, _) => kind.is_collection_like(),
            _ => false,
        }
    }

    /// Whether the type is a reactive publisher.
    pub fn is_reactive(&self) -> bool {
        matches!(self, TypeRef::Wrapper(kind, _) if kind.is_reactive())
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeRef::Named(name) | TypeRef::Variable(name) => f.write_str(name),
            TypeRef::Array(inner) => write!(f, "{inner}[]"),
            TypeRef::Class(Some(inner)) => write!(f, "Class<{inner}>"),
            TypeRef::Class(None) => f.write_str("Class<?>"),
            TypeRef::Map(key, value) => write!(f, "Map<{key}, {value}>"),
            TypeRef::Wrapper(kind, inner) => write!(f, "{}<{inner}>", kind.name()),
            TypeRef::Special(special) => f.write_str(special.name()),
            TypeRef::Void => f.write_str("void"),
        }
    }
}

/// Coarse classification of a named type.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TypeKind {
    /// Concrete class (entity or DTO).
    Class,
    /// Interface usable as a projection.
    Interface,
    /// Scalar or otherwise opaque type.
    Scalar,
}

/// One declared property of a type.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PropertyDescriptor {
    /// Property name.
    pub name: String,
    /// Declared property type.
    pub ty: TypeRef,
}

/// Description of a named type registered with an introspector.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TypeDescriptor {
    name: String,
    kind: TypeKind,
    properties: Vec<PropertyDescriptor>,
    supertypes: Vec<String>,
    constructor: Option<Vec<String>>,
    open: bool,
}

impl TypeDescriptor {
    fn new(name: impl Into<String>, kind: TypeKind) -> Self {
        Self {
            name: name.into(),
            kind,
            properties: Vec::new(),
            supertypes: Vec::new(),
            constructor: None,
            open: false,
        }
    }

    /// Describes a concrete class.
    pub fn class(name: impl Into<String>) -> Self {
        Self::new(name, TypeKind::Class)
    }

    /// Describes an interface.
    pub fn interface(name: impl Into<String>) -> Self {
        Self::new(name, TypeKind::Interface)
    }

    /// Describes a scalar.
    pub fn scalar(name: impl Into<String>) -> Self {
        Self::new(name, TypeKind::Scalar)
    }

    /// Adds a property.
    pub fn with_property(mut self, name: impl Into<String>, ty: TypeRef) -> Self {
        self.properties.push(PropertyDescriptor {
            name: name.into(),
            ty,
        });
        self
    }

    /// Declares a supertype (superclass or implemented interface).
    pub fn with_supertype(mut self, name: impl Into<String>) -> Self {
        self.supertypes.push(name.into());
        self
    }

    /// Declares the preferred constructor's parameter names.
    pub fn with_constructor<I, S>(mut self, params: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.constructor = Some(params.into_iter().map(Into::into).collect());
        self
    }

    /// Marks an interface as an open projection (computed accessors).
    pub fn open(mut self) -> Self {
        self.open = true;
        self
    }

    /// Type name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Type kind.
    pub fn kind(&self) -> TypeKind {
        self.kind
    }

    /// Declared properties in declaration order.
    pub fn properties(&self) -> &[PropertyDescriptor] {
        &self.properties
    }

    /// Looks up a declared property.
    pub fn property(&self, name: &str) -> Option<&PropertyDescriptor> {
        self.properties.iter().find(|p| p.name == name)
    }

    /// Direct supertypes.
    pub fn supertypes(&self) -> &[String] {
        &self.supertypes
    }

    /// Whether the interface is an open projection.
    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Names needed to populate an instance: constructor parameters when
    /// declared, property names otherwise.
    pub fn input_properties(&self) -> Vec<String> {
        match &self.constructor {
            Some(params) => params.clone(),
            None => self.properties.iter().map(|p| p.name.clone()).collect(),
        }
    }
}

/// A property resolved against its owning type.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PropertyRef {
    /// Owning type.
    pub owner: String,
    /// Property name.
    pub name: String,
    /// Declared property type.
    pub ty: TypeRef,
}

impl PropertyRef {
    /// Element type used to continue a nested path.
    pub fn actual_type(&self) -> &TypeRef {
        self.ty.actual_type()
    }
}

/// Capability interface standing in for runtime reflection.
pub trait TypeIntrospector: Send + Sync {
    /// Describes a named type, `None` if unknown.
    fn describe(&self, type_name: &str) -> Option<&TypeDescriptor>;

    /// Resolves a property on `owner`, including inherited properties.
    /// `None` means "not found".
    fn resolve_property(&self, owner: &str, name: &str) -> Option<PropertyRef> {
        let mut pending = vec![owner];
        let mut visited = HashSet::new();
        while let Some(current) = pending.pop() {
            if !visited.insert(current) {
                continue;
            }
            let Some(descriptor) = self.describe(current) else {
                continue;
            };
            if let Some(property) = descriptor.property(name) {
                return Some(PropertyRef {
                    owner: current.to_string(),
                    name: property.name.clone(),
                    ty: property.ty.clone(),
                });
            }
            pending.extend(descriptor.supertypes().iter().rev().map(String::as_str));
        }
        None
    }

    /// Kind of a named type. Unknown names are scalars.
    fn kind_of(&self, type_name: &str) -> TypeKind {
        self.describe(type_name)
            .map(TypeDescriptor::kind)
            .unwrap_or(TypeKind::Scalar)
    }

    /// Whether a value of `source` can be used where `target` is expected.
    fn is_assignable(&self, target: &str, source: &str) -> bool {
        if target == "Object" {
            return true;
        }
        let mut pending = vec![source];
        let mut visited = HashSet::new();
        while let Some(current) = pending.pop() {
            if current == target {
                return true;
            }
            if !visited.insert(current) {
                continue;
            }
            if let Some(descriptor) = self.describe(current) {
                pending.extend(descriptor.supertypes().iter().map(String::as_str));
            }
        }
        false
    }

    /// Names required to populate an instance of `type_name`.
    fn input_properties(&self, type_name: &str) -> Vec<String> {
        self.describe(type_name)
            .map(TypeDescriptor::input_properties)
            .unwrap_or_default()
    }
}
