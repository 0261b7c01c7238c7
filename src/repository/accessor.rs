//! Per-invocation view over the arguments of a query method.

use std::collections::BTreeMap;

use crate::domain::{Limit, Pageable, Score, ScoreRange, ScrollPosition, Sort, Vector};
use crate::error::{QueryError, Result};
use crate::repository::parameters::{Parameter, ParameterRole, Parameters};
use crate::value::Value;

/// Arguments of one invocation paired with the method's parameters.
///
/// Typed getters fall back to defaults when the parameter is absent or
/// its value is null. Optional/deferred wrappers present at runtime are
/// unwrapped on access.
#[derive(Clone, Copy, Debug)]
pub struct ParameterAccessor<'a> {
    parameters: &'a Parameters,
    values: &'a [Value],
    unwrap: bool,
}

impl<'a> ParameterAccessor<'a> {
    /// Pairs `values` with `parameters`. The lengths must match.
    pub fn new(parameters: &'a Parameters, values: &'a [Value]) -> Result<Self> {
        if parameters.len() != values.len() {
            return Err(QueryError::ArgumentCountMismatch {
                expected: parameters.len(),
                actual: values.len(),
            });
        }
        Ok(Self {
            parameters,
            values,
            unwrap: values.iter().any(Value::is_runtime_wrapper),
        })
    }

    /// Parameter model.
    pub fn parameters(&self) -> &'a Parameters {
        self.parameters
    }

    /// Raw argument values.
    pub fn values(&self) -> &'a [Value] {
        self.values
    }

    /// Argument at absolute position `index`, unwrapped.
    pub fn value(&self, index: usize) -> Result<&'a Value> {
        let value = self
            .values
            .get(index)
            .ok_or(QueryError::ParameterIndexOutOfBounds {
                index,
                count: self.values.len(),
            })?;
        Ok(if self.unwrap { value.unwrapped() } else { value })
    }

    fn special(&self, role: ParameterRole) -> Option<&'a Value> {
        let index = self.parameters.index_of(role)?;
        self.value(index).ok().filter(|value| !value.is_null())
    }

    /// Page request, or unpaged.
    pub fn pageable(&self) -> Pageable {
        match self.special(ParameterRole::Pageable) {
            Some(Value::Pageable(pageable)) => pageable.clone(),
            _ => Pageable::unpaged(),
        }
    }

    /// Explicit sort, else the page request's sort, else unsorted.
    pub fn sort(&self) -> Sort {
        match self.special(ParameterRole::Sort) {
            Some(Value::Sort(sort)) => sort.clone(),
            _ if self.parameters.has_pageable_parameter() => self.pageable().sort().clone(),
            _ => Sort::unsorted(),
        }
    }

    /// Explicit limit, else the page size, else unlimited.
    pub fn limit(&self) -> Limit {
        match self.special(ParameterRole::Limit) {
            Some(Value::Limit(limit)) => *limit,
            _ => self.pageable().to_limit(),
        }
    }

    /// Explicit scroll position, else the offset of a paged request.
    pub fn scroll_position(&self) -> Option<ScrollPosition> {
        match self.special(ParameterRole::ScrollPosition) {
            Some(Value::ScrollPosition(position)) => Some(position.clone()),
            _ => {
                let pageable = self.pageable();
                pageable
                    .is_paged()
                    .then(|| ScrollPosition::offset(pageable.offset()))
            }
        }
    }

    /// Search vector, if supplied.
    pub fn vector(&self) -> Option<&'a Vector> {
        match self.special(ParameterRole::Vector) {
            Some(Value::Vector(vector)) => Some(vector),
            _ => None,
        }
    }

    /// Score threshold, if supplied.
    pub fn score(&self) -> Option<Score> {
        match self.special(ParameterRole::Score) {
            Some(Value::Score(score)) => Some(*score),
            _ => None,
        }
    }

    /// Score range, if supplied.
    pub fn score_range(&self) -> Option<ScoreRange> {
        match self.special(ParameterRole::ScoreRange) {
            Some(Value::ScoreRange(range)) => Some(*range),
            _ => None,
        }
    }

    /// Projection type selected by the caller, if any.
    pub fn dynamic_projection(&self) -> Option<&'a str> {
        match self.special(ParameterRole::DynamicProjection) {
            Some(Value::Class(name)) => Some(name),
            _ => None,
        }
    }

    /// Value of the `index`-th bindable parameter.
    pub fn bindable_value(&self, index: usize) -> Result<&'a Value> {
        let parameter = self.parameters.bindable_parameter(index)?;
        self.value(parameter.index())
    }

    /// Whether any bindable argument is null.
    pub fn has_bindable_null_value(&self) -> bool {
        self.bindable_values().any(Value::is_null)
    }

    /// Fresh iterator over the bindable values in declaration order.
    pub fn bindable_values(&self) -> BindableValues<'a> {
        BindableValues {
            accessor: *self,
            parameters: self.parameters.bindable().iter(),
        }
    }
}

/// Single-pass iterator over bindable argument values.
#[derive(Clone, Debug)]
pub struct BindableValues<'a> {
    accessor: ParameterAccessor<'a>,
    parameters: std::slice::Iter<'a, Parameter>,
}

impl<'a> BindableValues<'a> {
    /// Next value together with its parameter.
    pub fn next_with_parameter(&mut self) -> Option<(&'a Parameter, &'a Value)> {
        let parameter = self.parameters.next()?;
        let value = self.accessor.value(parameter.index()).ok()?;
        Some((parameter, value))
    }

    /// Number of values left.
    pub fn remaining(&self) -> usize {
        self.parameters.len()
    }
}

impl<'a> Iterator for BindableValues<'a> {
    type Item = &'a Value;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_with_parameter().map(|(_, value)| value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.parameters.len();
        (remaining, Some(remaining))
    }
}

/// Where expression evaluation reads invocation state from.
#[derive(Clone, Copy, Debug)]
pub enum ParameterSource<'a> {
    /// Plain positional arguments.
    Positional(ParameterAccessor<'a>),
    /// Arguments plus variables captured from a reactive subscriber
    /// context.
    ReactiveContextual {
        /// Invocation arguments.
        accessor: ParameterAccessor<'a>,
        /// Context variables, visible as `#name`.
        context: &'a BTreeMap<String, Value>,
    },
}

impl<'a> ParameterSource<'a> {
    /// Invocation arguments.
    pub fn accessor(&self) -> &ParameterAccessor<'a> {
        match self {
            ParameterSource::Positional(accessor)
            | ParameterSource::ReactiveContextual { accessor, .. } => accessor,
        }
    }

    /// Context variables, empty for positional sources.
    pub fn context_variables(&self) -> impl Iterator<Item = (&'a str, &'a Value)> {
        let context = match self {
            ParameterSource::Positional(_) => None,
            ParameterSource::ReactiveContextual { context, .. } => Some(*context),
        };
        context
            .into_iter()
            .flat_map(|variables| variables.iter().map(|(name, value)| (name.as_str(), value)))
    }
}

impl<'a> From<ParameterAccessor<'a>> for ParameterSource<'a> {
    fn from(accessor: ParameterAccessor<'a>) -> Self {
        ParameterSource::Positional(accessor)
    }
}
