use std::fmt;
use std::sync::Arc;

use tracing::{debug, trace};

use crate::config::ExpressionOptions;
use crate::error::{QueryError, Result};
use crate::expression::evaluation::{EvaluationContextProvider, ExpressionEvaluator};
use crate::expression::quotation::QuotationMap;
use crate::repository::ParameterSource;
use crate::value::Value;

/// Names the `counter`-th extracted expression.
pub type NamingFn = dyn Fn(usize, &str) -> String + Send + Sync;

/// Renders the placeholder for a synthetic parameter from the original
/// prefix character (`:` or `?`) and the synthetic name.
pub type ReplacementFn = dyn Fn(char, &str) -> String + Send + Sync;

/// Rewrites query strings, replacing embedded `:#{..}`, `?#{..}`,
/// `:${..}` and `?${..}` expressions with synthetic bind parameters.
#[derive(Clone)]
pub struct ExpressionQueryContext {
    naming: Arc<NamingFn>,
    replacement: Arc<ReplacementFn>,
}

impl ExpressionQueryContext {
    /// Context with caller-supplied naming and replacement functions.
    pub fn new<N, R>(naming: N, replacement: R) -> Self
    where
        N: Fn(usize, &str) -> String + Send + Sync + 'static,
        R: Fn(char, &str) -> String + Send + Sync + 'static,
    {
        Self {
            naming: Arc::new(naming),
            replacement: Arc::new(replacement),
        }
    }

    /// Names parameters `<synthetic_prefix><counter>` and renders them as
    /// `<prefix><name>`.
    pub fn from_options(options: &ExpressionOptions) -> Self {
        let prefix = options.synthetic_prefix.clone();
        Self::new(
            move |counter, _| format!("{prefix}{counter}"),
            |prefix, name| format!("{prefix}{name}"),
        )
    }

    /// Extracts the expressions of `query`. Expressions inside quoted
    /// regions are copied verbatim.
    pub fn parse(&self, query: &str) -> Result<ParsedQuery> {
        let quotation = QuotationMap::scan(query)?;
        let bytes = query.as_bytes();
        let mut rewritten = String::with_capacity(query.len());
        let mut expressions = Vec::new();
        let mut copied = 0;
        let mut index = 0;

        while index < bytes.len() {
            let Some(marker) = match_marker(bytes, index) else {
                index += 1;
                continue;
            };
            if quotation.is_quoted(index) {
                trace!(position = index, "expression.query.quoted_skipped");
                index = marker.end;
                continue;
            }
            rewritten.push_str(&query[copied..index]);
            let body = &query[marker.body.clone()];
            let expression = match marker.kind {
                b'$' => format!("${{{body}}}"),
                _ => body.to_string(),
            };
            let name = (self.naming)(expressions.len(), &expression);
            rewritten.push_str(&(self.replacement)(char::from(bytes[index]), &name));
            expressions.push((name, expression));
            copied = marker.end;
            index = marker.end;
        }
        rewritten.push_str(&query[copied..]);

        let quotation = QuotationMap::scan(&rewritten)?;
        debug!(expressions = expressions.len(), "expression.query.rewritten");
        Ok(ParsedQuery {
            original: query.to_string(),
            query: rewritten,
            expressions,
            quotation,
        })
    }
}

impl Default for ExpressionQueryContext {
    fn default() -> Self {
        Self::from_options(&ExpressionOptions::default())
    }
}

impl fmt::Debug for ExpressionQueryContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExpressionQueryContext").finish_non_exhaustive()
    }
}

struct Marker {
    kind: u8,
    body: std::ops::Range<usize>,
    end: usize,
}

/// Matches `[:?][#$]{body}` at `start`, balancing nested braces.
fn match_marker(bytes: &[u8], start: usize) -> Option<Marker> {
    if !matches!(bytes.get(start), Some(b':' | b'?')) {
        return None;
    }
    let kind = *bytes.get(start + 1).filter(|b| matches!(**b, b'#' | b'$'))?;
    if bytes.get(start + 2) != Some(&b'{') {
        return None;
    }
    let body_start = start + 3;
    let mut depth = 1usize;
    for (offset, byte) in bytes[body_start..].iter().enumerate() {
        match byte {
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    let body_end = body_start + offset;
                    if body_end == body_start {
                        return None;
                    }
                    return Some(Marker {
                        kind,
                        body: body_start..body_end,
                        end: body_end + 1,
                    });
                }
            }
            _ => {}
        }
    }
    None
}

/// Outcome of rewriting a query string.
#[derive(Clone, Debug, PartialEq)]
pub struct ParsedQuery {
    original: String,
    query: String,
    expressions: Vec<(String, String)>,
    quotation: QuotationMap,
}

impl ParsedQuery {
    /// Query string as declared.
    pub fn original(&self) -> &str {
        &self.original
    }

    /// Rewritten query string.
    pub fn query(&self) -> &str {
        &self.query
    }

    /// Synthetic name and expression text pairs in extraction order.
    pub fn expressions(&self) -> impl Iterator<Item = (&str, &str)> {
        self.expressions
            .iter()
            .map(|(name, expression)| (name.as_str(), expression.as_str()))
    }

    /// Expression text extracted under `name`.
    pub fn expression(&self, name: &str) -> Option<&str> {
        self.expressions
            .iter()
            .find(|(candidate, _)| candidate == name)
            .map(|(_, expression)| expression.as_str())
    }

    /// Number of extracted expressions.
    pub fn len(&self) -> usize {
        self.expressions.len()
    }

    /// Whether no expression was extracted.
    pub fn is_empty(&self) -> bool {
        self.expressions.is_empty()
    }

    /// Whether `index` of the rewritten query lies inside quotes.
    pub fn is_quoted(&self, index: usize) -> bool {
        self.quotation.is_quoted(index)
    }

    /// Quoted regions of the rewritten query.
    pub fn quotation(&self) -> &QuotationMap {
        &self.quotation
    }

    /// Evaluates every extracted expression against one invocation.
    ///
    /// The evaluation context is built once per call. Failures carry the
    /// expression text.
    pub fn evaluate(
        &self,
        provider: &dyn EvaluationContextProvider,
        evaluator: &dyn ExpressionEvaluator,
        source: &ParameterSource<'_>,
    ) -> Result<EvaluatedParameters> {
        let context = provider.context(source)?;
        let mut values = Vec::with_capacity(self.expressions.len());
        for (name, expression) in &self.expressions {
            let value = evaluator
                .evaluate(expression, &context)
                .map_err(|err| match err {
                    err @ QueryError::ExpressionEvaluation { .. } => err,
                    other => QueryError::evaluation(expression.as_str(), other.to_string()),
                })?;
            values.push((name.clone(), value));
        }
        Ok(EvaluatedParameters { values })
    }
}

/// Values of evaluated expressions keyed by synthetic name, in extraction
/// order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EvaluatedParameters {
    values: Vec<(String, Value)>,
}

impl EvaluatedParameters {
    /// Value bound to `name`.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values
            .iter()
            .find(|(candidate, _)| candidate == name)
            .map(|(_, value)| value)
    }

    /// Name and value pairs in extraction order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(name, value)| (name.as_str(), value))
    }

    /// Number of values.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether there are no values.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Consumes into name and value pairs.
    pub fn into_vec(self) -> Vec<(String, Value)> {
        self.values
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context() -> ExpressionQueryContext {
        ExpressionQueryContext::new(
            |counter, _| format!("__$synthetic$__{counter}"),
            |prefix, name| format!("{prefix}{name}"),
        )
    }

    #[test]
    fn replaces_expression_with_synthetic_parameter() {
        let parsed = context()
            .parse("select u from User u where u.name = :#{#name}")
            .unwrap();
        assert_eq!(parsed.query(), "select u from User u where u.name = :__$synthetic$__0");
        assert_eq!(parsed.expressions().collect::<Vec<_>>(), [("__$synthetic$__0", "#name")]);
    }

    #[test]
    fn quoted_markers_are_copied_verbatim() {
        let query = "select u from User u where u.note = ':#{#skip}' and u.age > ?#{[0]}";
        let parsed = context().parse(query).unwrap();
        assert_eq!(
            parsed.query(),
            "select u from User u where u.note = ':#{#skip}' and u.age > ?__$synthetic$__0"
        );
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed.expression("__$synthetic$__0"), Some("[0]"));
        assert_eq!(parsed.original(), query);
    }

    #[test]
    fn property_placeholders_keep_their_marker() {
        let parsed = context()
            .parse("where a = :${tenant.id:none} and b = :#{#map[{1}]}")
            .unwrap();
        let expressions: Vec<_> = parsed.expressions().collect();
        assert_eq!(
            expressions,
            [("__$synthetic$__0", "${tenant.id:none}"), ("__$synthetic$__1", "#map[{1}]")]
        );
    }

    #[test]
    fn incomplete_markers_are_left_alone() {
        let parsed = context().parse("where a = :name and b = :#{} and c = ?#{open").unwrap();
        assert!(parsed.is_empty());
        assert_eq!(parsed.query(), "where a = :name and b = :#{} and c = ?#{open");
    }

    #[test]
    fn unbalanced_quote_fails_parsing() {
        let err = context().parse("where a = 'x and b = :#{#b}").unwrap_err();
        assert_eq!(err.code(), "UnbalancedQuotes");
    }

    #[test]
    fn default_context_uses_configured_prefix() {
        let options = ExpressionOptions {
            synthetic_prefix: "expr".to_string(),
        };
        let parsed = ExpressionQueryContext::from_options(&options)
            .parse("a = ?#{#x} or b = :#{#y}")
            .unwrap();
        assert_eq!(parsed.query(), "a = ?expr0 or b = :expr1");
    }
}
