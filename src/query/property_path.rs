//! Property path resolution against the domain type graph.
//!
//! A path source such as `AddressZipCode` is resolved by trying the whole
//! token first and then shrinking the head at camel-case boundaries
//! (longest head first), recursing into the head property's type and
//! backtracking when the remainder does not resolve. `_` and `.` act as
//! explicit separators.

use std::fmt;

use crate::error::{QueryError, Result};
use crate::types::{PropertyRef, TypeIntrospector, TypeRef};

/// Domain type plus the introspector used to resolve paths against it.
#[derive(Clone, Copy)]
pub struct DomainContext<'a> {
    /// Domain type name.
    pub domain: &'a str,
    /// Type graph.
    pub types: &'a dyn TypeIntrospector,
}

impl<'a> DomainContext<'a> {
    /// Creates a context for `domain`.
    pub fn new(domain: &'a str, types: &'a dyn TypeIntrospector) -> Self {
        Self { domain, types }
    }
}

impl fmt::Debug for DomainContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DomainContext")
            .field("domain", &self.domain)
            .finish_non_exhaustive()
    }
}

/// One step of a property path.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PathSegment {
    name: String,
    owner: Option<String>,
    ty: Option<TypeRef>,
}

impl PathSegment {
    fn resolved(property: PropertyRef) -> Self {
        Self {
            name: property.name,
            owner: Some(property.owner),
            ty: Some(property.ty),
        }
    }

    fn untyped(name: String) -> Self {
        Self {
            name,
            owner: None,
            ty: None,
        }
    }

    /// Property name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Owning type, when resolved against a domain type.
    pub fn owner(&self) -> Option<&str> {
        self.owner.as_deref()
    }

    /// Declared property type, when resolved against a domain type.
    pub fn ty(&self) -> Option<&TypeRef> {
        self.ty.as_ref()
    }
}

/// Resolved (or, in untyped mode, raw) property path.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PropertyPath {
    segments: Vec<PathSegment>,
}

impl PropertyPath {
    /// Resolves `source` against the domain type in `ctx`, or splits it
    /// verbatim when no domain type is supplied.
    pub fn parse(source: &str, ctx: Option<&DomainContext<'_>>) -> Result<Self> {
        let pieces: Vec<&str> = source
            .split(['_', '.'])
            .filter(|piece| !piece.is_empty())
            .collect();
        if pieces.is_empty() {
            return Err(QueryError::PropertyNotFound {
                segment: source.to_string(),
                type_name: ctx.map_or_else(|| "<untyped>".to_string(), |c| c.domain.to_string()),
            });
        }

        let Some(ctx) = ctx else {
            let segments = pieces
                .into_iter()
                .map(|piece| PathSegment::untyped(uncapitalize(piece)))
                .collect();
            return Ok(Self { segments });
        };

        let mut owner = ctx.domain.to_string();
        let mut segments: Vec<PathSegment> = Vec::new();
        for piece in pieces {
            if let Some(last) = segments.last() {
                let next = last.ty.as_ref().map(TypeRef::actual_type);
                match next.and_then(TypeRef::as_named) {
                    Some(name) => owner = name.to_string(),
                    None => {
                        return Err(QueryError::PropertyNotFound {
                            segment: uncapitalize(piece),
                            type_name: next.map_or_else(String::new, ToString::to_string),
                        })
                    }
                }
            }
            let resolved = resolve_camel(piece, &owner, ctx.types).map_err(|(segment, type_name)| {
                QueryError::PropertyNotFound { segment, type_name }
            })?;
            segments.extend(resolved);
        }
        Ok(Self { segments })
    }

    /// Path segments from the root.
    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    /// Dot-separated path, e.g. `address.zipCode`.
    pub fn dot_path(&self) -> String {
        self.segments
            .iter()
            .map(PathSegment::name)
            .collect::<Vec<_>>()
            .join(".")
    }

    /// Name of the last segment.
    pub fn leaf_name(&self) -> &str {
        self.segments.last().map_or("", PathSegment::name)
    }

    /// Declared type of the last segment, if resolved.
    pub fn leaf_type(&self) -> Option<&TypeRef> {
        self.segments.last().and_then(PathSegment::ty)
    }

    /// Whether the path traverses more than one property.
    pub fn is_nested(&self) -> bool {
        self.segments.len() > 1
    }

    /// Method-name rendering, nested segments separated by `_`.
    pub fn method_form(&self) -> String {
        method_form(&self.dot_path())
    }
}

impl fmt::Display for PropertyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.dot_path())
    }
}

/// Renders a dot path the way it appears in a method name.
pub(crate) fn method_form(dot_path: &str) -> String {
    dot_path
        .split('.')
        .map(capitalize)
        .collect::<Vec<_>>()
        .join("_")
}

fn resolve_camel(
    piece: &str,
    owner: &str,
    types: &dyn TypeIntrospector,
) -> std::result::Result<Vec<PathSegment>, (String, String)> {
    if let Some(property) = lookup(owner, piece, types) {
        return Ok(vec![PathSegment::resolved(property)]);
    }

    let mut deepest = None;
    for split in camel_boundaries(piece).into_iter().rev() {
        let (head, tail) = piece.split_at(split);
        let Some(property) = lookup(owner, head, types) else {
            continue;
        };
        match property.actual_type().as_named().map(str::to_string) {
            Some(next_owner) => match resolve_camel(tail, &next_owner, types) {
                Ok(rest) => {
                    let mut segments = vec![PathSegment::resolved(property)];
                    segments.extend(rest);
                    return Ok(segments);
                }
                Err(failure) => {
                    deepest.get_or_insert(failure);
                }
            },
            None => {
                deepest.get_or_insert((uncapitalize(tail), property.ty.to_string()));
            }
        }
    }
    Err(deepest.unwrap_or_else(|| (uncapitalize(piece), owner.to_string())))
}

fn lookup(owner: &str, name: &str, types: &dyn TypeIntrospector) -> Option<PropertyRef> {
    let uncapitalized = uncapitalize(name);
    types
        .resolve_property(owner, &uncapitalized)
        .or_else(|| (uncapitalized != name).then(|| types.resolve_property(owner, name)).flatten())
}

fn camel_boundaries(piece: &str) -> Vec<usize> {
    piece
        .char_indices()
        .skip(1)
        .filter(|(_, c)| c.is_uppercase())
        .map(|(idx, _)| idx)
        .collect()
}

pub(crate) fn uncapitalize(source: &str) -> String {
    let mut chars = source.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

pub(crate) fn capitalize(source: &str) -> String {
    let mut chars = source.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
