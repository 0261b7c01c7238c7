#![forbid(unsafe_code)]

use std::fmt;

use thiserror::Error;

use crate::config::ConfigError;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, QueryError>;

/// Structured errors emitted while deriving queries, binding arguments, or
/// shaping results.
///
/// Bootstrap failures (method-name syntax, parameter declarations, quoted
/// ranges) are reported once when a repository method is registered.
/// Invocation-time failures (argument arity, index lookups, conversions,
/// expression evaluation) are reported on the offending call.
#[derive(Debug, Error)]
pub enum QueryError {
    /// Wraps a bootstrap failure with the method it was raised for.
    #[error("invalid query method '{method}': {source}")]
    InvalidQueryMethod {
        /// Offending method name.
        method: String,
        /// Underlying failure.
        #[source]
        source: Box<QueryError>,
    },
    /// A property path segment does not exist on the owning type.
    #[error("no property '{segment}' found for type '{type_name}'")]
    PropertyNotFound {
        /// Unresolved segment, uncapitalized.
        segment: String,
        /// Type the segment was resolved against.
        type_name: String,
    },
    /// Order clause element could not be parsed.
    #[error("invalid order syntax for part '{token}'")]
    InvalidOrderSyntax {
        /// Offending order element.
        token: String,
    },
    /// `OrderBy` appeared more than once.
    #[error("OrderBy must not be used more than once in '{method}'")]
    DuplicateOrderBy {
        /// Method name (or predicate) being parsed.
        method: String,
    },
    /// `IgnoreCase` requested for a property that is not a string.
    #[error("unable to ignore case of {type_name} types, the property '{property}' must reference a String")]
    IgnoreCaseNotSupported {
        /// Dot path of the property.
        property: String,
        /// Resolved property type.
        type_name: String,
    },
    /// More than one parameter of the same special kind.
    #[error("method '{method}' must have only one argument of type {kind}")]
    DuplicateSpecialParameter {
        /// Method name.
        method: String,
        /// Special parameter kind.
        kind: &'static str,
    },
    /// Some bindable parameters carry explicit names and others don't.
    #[error("method '{method}' must either name all bindable parameters explicitly or none at all")]
    MixedParameterNaming {
        /// Method name.
        method: String,
    },
    /// A page-returning method without a `Pageable` parameter.
    #[error("paging query method '{method}' needs a Pageable parameter")]
    PageQueryWithoutPageable {
        /// Method name.
        method: String,
    },
    /// `Pageable` and `Sort` declared together.
    #[error("method '{method}' must not have Pageable *and* Sort parameters, use sorting capabilities on Pageable instead")]
    PageableAndSort {
        /// Method name.
        method: String,
    },
    /// `Pageable` declared on a method whose return type cannot carry pages.
    #[error("method '{method}' declares a Pageable parameter but returns {return_type}; expected one of {allowed}")]
    PageableReturnType {
        /// Method name.
        method: String,
        /// Declared return type.
        return_type: String,
        /// Allowed return types.
        allowed: &'static str,
    },
    /// Query string opens a quoted range that never closes.
    #[error("query <{query}> starts a quoted range at {position}, but never ends it")]
    UnbalancedQuotes {
        /// Full query string.
        query: String,
        /// Byte offset of the opening quote.
        position: usize,
    },
    /// Argument array length differs from the parameter count.
    #[error("invalid number of method arguments: expected {expected}, got {actual}")]
    ArgumentCountMismatch {
        /// Declared parameter count.
        expected: usize,
        /// Supplied argument count.
        actual: usize,
    },
    /// Parameter index outside the declared parameters.
    #[error("parameter index {index} out of bounds ({count} parameters)")]
    ParameterIndexOutOfBounds {
        /// Requested index.
        index: usize,
        /// Parameter count.
        count: usize,
    },
    /// Bindable parameter index outside the bindable subsequence.
    #[error("bindable parameter index {index} out of bounds ({count} bindable parameters)")]
    BindableIndexOutOfBounds {
        /// Requested bindable index.
        index: usize,
        /// Bindable parameter count.
        count: usize,
    },
    /// Value could not be converted into the requested type.
    #[error("cannot convert {from} into {target}: {reason}")]
    Conversion {
        /// Source value description.
        from: String,
        /// Target type.
        target: String,
        /// Failure description.
        reason: String,
    },
    /// Projection accessor not declared on the projection interface.
    #[error("projection '{interface}' does not expose property '{property}'")]
    ProjectionPropertyMissing {
        /// Projection interface.
        interface: String,
        /// Requested property.
        property: String,
    },
    /// Embedded expression failed to evaluate.
    #[error("failed to evaluate expression '{expression}': {reason}")]
    ExpressionEvaluation {
        /// Original expression text.
        expression: String,
        /// Failure description.
        reason: String,
    },
    /// Result container does not match the method shape (strict mode only).
    #[error("result shape {shape} is not supported by query method '{method}'")]
    UnsupportedResultShape {
        /// Source container shape.
        shape: &'static str,
        /// Method name.
        method: String,
    },
    /// Invalid argument passed to a constructor or accessor.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    /// Configuration failure.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// Failure raised by a user-supplied collaborator, passed through as-is.
    #[error(transparent)]
    External(#[from] Box<dyn std::error::Error + Send + Sync>),
}

impl QueryError {
    /// Wraps a bootstrap failure with the method it was raised for.
    pub fn for_method(method: impl Into<String>, source: QueryError) -> Self {
        QueryError::InvalidQueryMethod {
            method: method.into(),
            source: Box::new(source),
        }
    }

    pub(crate) fn conversion(
        from: impl Into<String>,
        target: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        QueryError::Conversion {
            from: from.into(),
            target: target.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn evaluation(expression: impl Into<String>, reason: impl Into<String>) -> Self {
        QueryError::ExpressionEvaluation {
            expression: expression.into(),
            reason: reason.into(),
        }
    }

    /// Returns `true` for failures that are raised while registering a
    /// method rather than while invoking it.
    pub fn is_bootstrap(&self) -> bool {
        matches!(
            self,
            QueryError::InvalidQueryMethod { .. }
                | QueryError::PropertyNotFound { .. }
                | QueryError::InvalidOrderSyntax { .. }
                | QueryError::DuplicateOrderBy { .. }
                | QueryError::IgnoreCaseNotSupported { .. }
                | QueryError::DuplicateSpecialParameter { .. }
                | QueryError::MixedParameterNaming { .. }
                | QueryError::PageQueryWithoutPageable { .. }
                | QueryError::PageableAndSort { .. }
                | QueryError::PageableReturnType { .. }
                | QueryError::UnbalancedQuotes { .. }
        )
    }

    /// Returns a machine-readable code for the error variant.
    pub fn code(&self) -> &'static str {
        match self {
            QueryError::InvalidQueryMethod { source, .. } => source.code(),
            QueryError::PropertyNotFound { .. } => "PropertyNotFound",
            QueryError::InvalidOrderSyntax { .. } => "InvalidOrderSyntax",
            QueryError::DuplicateOrderBy { .. } => "InvalidOrderSyntax",
            QueryError::IgnoreCaseNotSupported { .. } => "IgnoreCaseNotSupported",
            QueryError::DuplicateSpecialParameter { .. } => "DuplicateSpecialParameter",
            QueryError::MixedParameterNaming { .. } => "MixedParameterNaming",
            QueryError::PageQueryWithoutPageable { .. } => "PageQueryWithoutPageable",
            QueryError::PageableAndSort { .. } => "PageableAndSort",
            QueryError::PageableReturnType { .. } => "PageableReturnType",
            QueryError::UnbalancedQuotes { .. } => "UnbalancedQuotes",
            QueryError::ArgumentCountMismatch { .. } => "ArgumentCountMismatch",
            QueryError::ParameterIndexOutOfBounds { .. } => "IndexOutOfBounds",
            QueryError::BindableIndexOutOfBounds { .. } => "IndexOutOfBounds",
            QueryError::Conversion { .. } => "Conversion",
            QueryError::ProjectionPropertyMissing { .. } => "ProjectionPropertyMissing",
            QueryError::ExpressionEvaluation { .. } => "ExpressionEvaluation",
            QueryError::UnsupportedResultShape { .. } => "UnsupportedResultShape",
            QueryError::InvalidArgument(_) => "InvalidArgument",
            QueryError::Config(_) => "Config",
            QueryError::External(_) => "External",
        }
    }
}

/// Convenience wrapper that formats errors with their codes.
pub struct QueryErrorWithCode<'a>(pub &'a QueryError);

impl fmt::Display for QueryErrorWithCode<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.0.code(), self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn method_wrapper_keeps_inner_code_and_message() {
        let err = QueryError::for_method(
            "findByFoo",
            QueryError::PropertyNotFound {
                segment: "foo".into(),
                type_name: "User".into(),
            },
        );
        assert_eq!(err.code(), "PropertyNotFound");
        assert!(err.is_bootstrap());
        let rendered = err.to_string();
        assert!(rendered.contains("findByFoo"));
        assert!(rendered.contains("'foo'"));
        assert!(rendered.contains("'User'"));
    }

    #[test]
    fn code_wrapper_prefixes_code() {
        let err = QueryError::ArgumentCountMismatch {
            expected: 2,
            actual: 1,
        };
        assert!(!err.is_bootstrap());
        assert_eq!(
            QueryErrorWithCode(&err).to_string(),
            "[ArgumentCountMismatch] invalid number of method arguments: expected 2, got 1"
        );
    }
}
