#![forbid(unsafe_code)]

//! Embedded expressions in declared query strings.
//!
//! [`ExpressionQueryContext::parse`] replaces every `:#{..}`/`?#{..}`
//! expression and `:${..}`/`?${..}` placeholder outside quoted regions
//! with a synthetic bind parameter. The resulting [`ParsedQuery`] is then
//! evaluated once per invocation.

mod evaluation;
mod quotation;
mod rewriter;

pub use evaluation::{
    DefaultEvaluationContextProvider, EvaluationContext, EvaluationContextProvider,
    ExpressionEvaluator, PropertyResolver, SimpleExpressionEvaluator, SystemEnvironment,
};
pub use quotation::QuotationMap;
pub use rewriter::{
    EvaluatedParameters, ExpressionQueryContext, NamingFn, ParsedQuery, ReplacementFn,
};
