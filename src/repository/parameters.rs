//! One-time classification of a method's formal parameters.

use std::fmt;
use std::sync::OnceLock;

use tracing::debug;

use crate::error::{QueryError, Result};
use crate::repository::method::{MethodSignature, ParameterDecl};
use crate::types::{SpecialType, TypeIntrospector, TypeRef};

/// Role of a parameter within a query method.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum ParameterRole {
    /// Page request.
    Pageable,
    /// Sort.
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
    /// Caller-selected projection type.
    DynamicProjection,
    /// Value bound into the query.
    Bindable,
}

impl ParameterRole {
    const SPECIAL: [ParameterRole; 8] = [
        ParameterRole::Pageable,
        ParameterRole::Sort,
        ParameterRole::Limit,
        ParameterRole::ScrollPosition,
        ParameterRole::Vector,
        ParameterRole::Score,
        ParameterRole::ScoreRange,
        ParameterRole::DynamicProjection,
    ];

    fn from_special(special: SpecialType) -> Self {
        match special {
            SpecialType::Pageable => ParameterRole::Pageable,
            SpecialType::Sort => ParameterRole::Sort,
            SpecialType::Limit => ParameterRole::Limit,
            SpecialType::ScrollPosition => ParameterRole::ScrollPosition,
            SpecialType::Vector => ParameterRole::Vector,
            SpecialType::Score => ParameterRole::Score,
            SpecialType::ScoreRange => ParameterRole::ScoreRange,
        }
    }

    /// Whether the parameter is excluded from binding.
    pub fn is_special(self) -> bool {
        self != ParameterRole::Bindable
    }

    /// Type name used in diagnostics.
    pub fn name(self) -> &'static str {
        match self {
            ParameterRole::Pageable => "Pageable",
            ParameterRole::Sort => "Sort",
            ParameterRole::Limit => "Limit",
            ParameterRole::ScrollPosition => "ScrollPosition",
            ParameterRole::Vector => "Vector",
            ParameterRole::Score => "Score",
            ParameterRole::ScoreRange => "Range<Score>",
            ParameterRole::DynamicProjection => "Class",
            ParameterRole::Bindable => "Bindable",
        }
    }

    /// Variable under which a special argument is visible to embedded
    /// expressions, e.g. `#pageable`.
    pub fn variable_name(self) -> &'static str {
        match self {
            ParameterRole::Pageable => "pageable",
            ParameterRole::Sort => "sort",
            ParameterRole::Limit => "limit",
            ParameterRole::ScrollPosition => "scrollPosition",
            ParameterRole::Vector => "vector",
            ParameterRole::Score => "score",
            ParameterRole::ScoreRange => "range",
            ParameterRole::DynamicProjection => "class",
            ParameterRole::Bindable => "",
        }
    }

    fn slot(self) -> Option<usize> {
        Self::SPECIAL.iter().position(|role| *role == self)
    }
}

/// One classified formal parameter.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Parameter {
    index: usize,
    ty: TypeRef,
    name: Option<String>,
    explicitly_named: bool,
    role: ParameterRole,
}

impl Parameter {
    /// Zero-based position in the method signature.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Declared type with one single-value wrapper removed when the
    /// method returns a wrapper too.
    pub fn ty(&self) -> &TypeRef {
        &self.ty
    }

    /// Explicit or discovered name.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Whether the name comes from an explicit binding.
    pub fn is_explicitly_named(&self) -> bool {
        self.explicitly_named
    }

    /// Classified role.
    pub fn role(&self) -> ParameterRole {
        self.role
    }

    /// Whether the parameter is special (not bound into the query).
    pub fn is_special(&self) -> bool {
        self.role.is_special()
    }

    /// Whether the parameter is bound into the query.
    pub fn is_bindable(&self) -> bool {
        !self.is_special()
    }

    /// Whether the parameter selects the projection type.
    pub fn is_dynamic_projection(&self) -> bool {
        self.role == ParameterRole::DynamicProjection
    }

    /// Whether the parameter binds by name.
    pub fn is_named(&self) -> bool {
        self.is_bindable() && self.name.is_some()
    }

    /// Query placeholder: `:name` for named parameters, `?index` otherwise.
    pub fn placeholder(&self) -> String {
        match self.name.as_deref() {
            Some(name) if self.is_bindable() => format!(":{name}"),
            _ => format!("?{}", self.index),
        }
    }
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.ty, self.placeholder())
    }
}

/// Classified parameters of one method with cached special indices.
#[derive(Clone, Debug)]
pub struct Parameters {
    method: String,
    parameters: Vec<Parameter>,
    special: [Option<usize>; 8],
    bindable: OnceLock<Box<Parameters>>,
}

impl Parameters {
    /// Classifies the parameters of `method` for a repository managing
    /// `domain_type`.
    pub fn from_method(
        method: &MethodSignature,
        domain_type: &str,
        types: &dyn TypeIntrospector,
    ) -> Result<Self> {
        let return_type = method.return_type();
        let unwrap_wrappers = return_type
            .wrapper()
            .is_some_and(|kind| kind.is_execution_wrapper());
        let projection_target = return_type.component_type();

        let mut parameters = Vec::with_capacity(method.parameters().len());
        let mut special = [None; 8];
        for (index, decl) in method.parameters().iter().enumerate() {
            let ty = match decl.ty() {
                TypeRef::Wrapper(kind, inner) if unwrap_wrappers && kind.is_execution_wrapper() => {
                    inner.as_ref().clone()
                }
                other => other.clone(),
            };
            let role = classify(&ty, decl, projection_target, domain_type, types);
            if let Some(slot) = role.slot() {
                if special[slot].is_some() {
                    return Err(QueryError::DuplicateSpecialParameter {
                        method: method.name().to_string(),
                        kind: role.name(),
                    });
                }
                special[slot] = Some(index);
            }
            parameters.push(Parameter {
                index,
                ty,
                name: decl
                    .binding()
                    .or_else(|| decl.discovered_name())
                    .map(str::to_string),
                explicitly_named: decl.binding().is_some(),
                role,
            });
        }

        let parameters = Self {
            method: method.name().to_string(),
            parameters,
            special,
            bindable: OnceLock::new(),
        };
        parameters.assert_consistent_naming()?;
        debug!(
            method = method.name(),
            parameters = parameters.len(),
            bindable = parameters.number_of_bindable(),
            "repository.parameters.classified"
        );
        Ok(parameters)
    }

    fn assert_consistent_naming(&self) -> Result<()> {
        let mut named = None;
        for parameter in self.parameters.iter().filter(|p| p.is_bindable()) {
            match named {
                None => named = Some(parameter.explicitly_named),
                Some(expected) if expected != parameter.explicitly_named => {
                    return Err(QueryError::MixedParameterNaming {
                        method: self.method.clone(),
                    })
                }
                Some(_) => {}
            }
        }
        Ok(())
    }

    /// Owning method name.
    pub fn method_name(&self) -> &str {
        &self.method
    }

    /// Number of parameters.
    pub fn len(&self) -> usize {
        self.parameters.len()
    }

    /// Whether the method declares no parameters.
    pub fn is_empty(&self) -> bool {
        self.parameters.is_empty()
    }

    /// Parameters in declaration order.
    pub fn iter(&self) -> std::slice::Iter<'_, Parameter> {
        self.parameters.iter()
    }

    /// Parameter at position `index`.
    pub fn get(&self, index: usize) -> Result<&Parameter> {
        self.parameters
            .get(index)
            .ok_or(QueryError::ParameterIndexOutOfBounds {
                index,
                count: self.parameters.len(),
            })
    }

    /// Parameter bound under `name`.
    pub fn by_name(&self, name: &str) -> Option<&Parameter> {
        self.parameters
            .iter()
            .find(|p| p.is_bindable() && p.name() == Some(name))
    }

    /// Index of the parameter with `role`, for special roles.
    pub fn index_of(&self, role: ParameterRole) -> Option<usize> {
        role.slot().and_then(|slot| self.special[slot])
    }

    /// Index of the `Pageable` parameter.
    pub fn pageable_index(&self) -> Option<usize> {
        self.index_of(ParameterRole::Pageable)
    }

    /// Index of the `Sort` parameter.
    pub fn sort_index(&self) -> Option<usize> {
        self.index_of(ParameterRole::Sort)
    }

    /// Index of the `Limit` parameter.
    pub fn limit_index(&self) -> Option<usize> {
        self.index_of(ParameterRole::Limit)
    }

    /// Index of the `ScrollPosition` parameter.
    pub fn scroll_position_index(&self) -> Option<usize> {
        self.index_of(ParameterRole::ScrollPosition)
    }

    /// Index of the `Vector` parameter.
    pub fn vector_index(&self) -> Option<usize> {
        self.index_of(ParameterRole::Vector)
    }

    /// Index of the `Score` parameter.
    pub fn score_index(&self) -> Option<usize> {
        self.index_of(ParameterRole::Score)
    }

    /// Index of the `Range<Score>` parameter.
    pub fn score_range_index(&self) -> Option<usize> {
        self.index_of(ParameterRole::ScoreRange)
    }

    /// Index of the dynamic projection parameter.
    pub fn dynamic_projection_index(&self) -> Option<usize> {
        self.index_of(ParameterRole::DynamicProjection)
    }

    /// Whether a `Pageable` parameter is declared.
    pub fn has_pageable_parameter(&self) -> bool {
        self.pageable_index().is_some()
    }

    /// Whether a `Sort` parameter is declared.
    pub fn has_sort_parameter(&self) -> bool {
        self.sort_index().is_some()
    }

    /// Whether a `Limit` parameter is declared.
    pub fn has_limit_parameter(&self) -> bool {
        self.limit_index().is_some()
    }

    /// Whether a `ScrollPosition` parameter is declared.
    pub fn has_scroll_position_parameter(&self) -> bool {
        self.scroll_position_index().is_some()
    }

    /// Whether a dynamic projection parameter is declared.
    pub fn has_dynamic_projection(&self) -> bool {
        self.dynamic_projection_index().is_some()
    }

    /// Whether any special parameter is declared.
    pub fn has_special_parameter(&self) -> bool {
        self.special.iter().any(Option::is_some)
    }

    /// Whether sorting may change per invocation.
    pub fn potentially_sorts_dynamically(&self) -> bool {
        self.has_sort_parameter() || self.has_pageable_parameter()
    }

    /// Bindable parameters only, computed once.
    pub fn bindable(&self) -> &Parameters {
        self.bindable.get_or_init(|| {
            Box::new(Parameters {
                method: self.method.clone(),
                parameters: self
                    .parameters
                    .iter()
                    .filter(|p| p.is_bindable())
                    .cloned()
                    .collect(),
                special: [None; 8],
                bindable: OnceLock::new(),
            })
        })
    }

    /// Number of bindable parameters.
    pub fn number_of_bindable(&self) -> usize {
        self.bindable().len()
    }

    /// The `index`-th bindable parameter, skipping special ones.
    pub fn bindable_parameter(&self, index: usize) -> Result<&Parameter> {
        let bindable = self.bindable();
        bindable
            .parameters
            .get(index)
            .ok_or(QueryError::BindableIndexOutOfBounds {
                index,
                count: bindable.len(),
            })
    }
}

impl<'a> IntoIterator for &'a Parameters {
    type Item = &'a Parameter;
    type IntoIter = std::slice::Iter<'a, Parameter>;

    fn into_iter(self) -> Self::IntoIter {
        self.parameters.iter()
    }
}

fn classify(
    ty: &TypeRef,
    decl: &ParameterDecl,
    projection_target: &TypeRef,
    domain_type: &str,
    types: &dyn TypeIntrospector,
) -> ParameterRole {
    if let Some(special) = ty.special() {
        return ParameterRole::from_special(special);
    }
    if let TypeRef::Class(Some(captured)) = ty {
        let assignable_from_domain = captured
            .as_named()
            .is_some_and(|name| types.is_assignable(name, domain_type));
        if decl.binding().is_none() && **captured == *projection_target && !assignable_from_domain {
            return ParameterRole::DynamicProjection;
        }
    }
    ParameterRole::Bindable
}
