//! Evaluation of extracted expressions against invocation arguments.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

use tracing::trace;

use crate::error::{QueryError, Result};
use crate::repository::ParameterSource;
use crate::value::Value;

/// Source of `${key}` property placeholders.
pub trait PropertyResolver: Send + Sync {
    /// Value of `key`, if defined.
    fn property(&self, key: &str) -> Option<String>;
}

impl PropertyResolver for BTreeMap<String, String> {
    fn property(&self, key: &str) -> Option<String> {
        self.get(key).cloned()
    }
}

impl PropertyResolver for HashMap<String, String> {
    fn property(&self, key: &str) -> Option<String> {
        self.get(key).cloned()
    }
}

/// Resolves properties from process environment variables.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemEnvironment;

impl PropertyResolver for SystemEnvironment {
    fn property(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

/// Variables, positional arguments and property source visible to an
/// expression.
#[derive(Clone)]
pub struct EvaluationContext {
    variables: BTreeMap<String, Value>,
    arguments: Vec<Value>,
    properties: Arc<dyn PropertyResolver>,
}

impl EvaluationContext {
    /// Empty context reading placeholders from `properties`.
    pub fn new(properties: Arc<dyn PropertyResolver>) -> Self {
        Self {
            variables: BTreeMap::new(),
            arguments: Vec::new(),
            properties,
        }
    }

    /// Adds a variable, visible as `#name`.
    pub fn with_variable(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set_variable(name, value);
        self
    }

    /// Sets a variable, replacing any previous value.
    pub fn set_variable(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.variables.insert(name.into(), value.into());
    }

    /// Replaces the positional arguments, visible as `[index]`.
    pub fn with_arguments(mut self, arguments: Vec<Value>) -> Self {
        self.arguments = arguments;
        self
    }

    /// Variable `name`.
    pub fn variable(&self, name: &str) -> Option<&Value> {
        self.variables.get(name)
    }

    /// All variables.
    pub fn variables(&self) -> &BTreeMap<String, Value> {
        &self.variables
    }

    /// Positional arguments.
    pub fn arguments(&self) -> &[Value] {
        &self.arguments
    }

    /// Property placeholder lookup.
    pub fn property(&self, key: &str) -> Option<String> {
        self.properties.property(key)
    }
}

impl fmt::Debug for EvaluationContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EvaluationContext")
            .field("variables", &self.variables)
            .field("arguments", &self.arguments)
            .finish_non_exhaustive()
    }
}

/// Builds the context an expression is evaluated in.
pub trait EvaluationContextProvider: Send + Sync {
    /// Context for one invocation.
    fn context(&self, source: &ParameterSource<'_>) -> Result<EvaluationContext>;
}

/// Exposes named parameters by name, special parameters by role
/// (`#pageable`, `#sort`, ...), every argument by position and, for
/// reactive sources, the subscriber context variables.
#[derive(Clone)]
pub struct DefaultEvaluationContextProvider {
    properties: Arc<dyn PropertyResolver>,
}

impl DefaultEvaluationContextProvider {
    /// Provider resolving placeholders from the process environment.
    pub fn new() -> Self {
        Self::with_properties(Arc::new(SystemEnvironment))
    }

    /// Provider resolving placeholders from `properties`.
    pub fn with_properties(properties: Arc<dyn PropertyResolver>) -> Self {
        Self { properties }
    }
}

impl Default for DefaultEvaluationContextProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for DefaultEvaluationContextProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DefaultEvaluationContextProvider").finish_non_exhaustive()
    }
}

impl EvaluationContextProvider for DefaultEvaluationContextProvider {
    fn context(&self, source: &ParameterSource<'_>) -> Result<EvaluationContext> {
        let accessor = source.accessor();
        let parameters = accessor.parameters();
        let mut context = EvaluationContext::new(Arc::clone(&self.properties));
        let mut arguments = Vec::with_capacity(parameters.len());
        for parameter in parameters {
            let value = accessor.value(parameter.index())?;
            if parameter.is_special() {
                context.set_variable(parameter.role().variable_name(), value.clone());
            }
            if let Some(name) = parameter.name() {
                context.set_variable(name, value.clone());
            }
            arguments.push(value.clone());
        }
        for (name, value) in source.context_variables() {
            context.set_variable(name, value.clone());
        }
        trace!(
            method = parameters.method_name(),
            variables = context.variables().len(),
            "expression.context.built"
        );
        Ok(context.with_arguments(arguments))
    }
}

/// Evaluates one expression.
pub trait ExpressionEvaluator: Send + Sync {
    /// Value of `expression` in `context`.
    fn evaluate(&self, expression: &str, context: &EvaluationContext) -> Result<Value>;
}

/// Small evaluator covering variable and argument references.
///
/// Supported forms:
///
/// * `#var`, `#var.path`, `#var?.path`, `#var[0]`, `#var['key']`
/// * `[index]` for positional arguments
/// * `${key}` and `${key:default}` property placeholders
/// * `'text'`, integers, `true`, `false` and `null` literals
#[derive(Clone, Copy, Debug, Default)]
pub struct SimpleExpressionEvaluator;

impl ExpressionEvaluator for SimpleExpressionEvaluator {
    fn evaluate(&self, expression: &str, context: &EvaluationContext) -> Result<Value> {
        let text = expression.trim();
        if let Some(placeholder) = text.strip_prefix("${").and_then(|rest| rest.strip_suffix('}')) {
            return resolve_placeholder(expression, placeholder, context);
        }
        Cursor::new(expression, text).evaluate(context)
    }
}

fn resolve_placeholder(expression: &str, placeholder: &str, context: &EvaluationContext) -> Result<Value> {
    let (key, default) = match placeholder.split_once(':') {
        Some((key, default)) => (key.trim(), Some(default)),
        None => (placeholder.trim(), None),
    };
    context
        .property(key)
        .or_else(|| default.map(str::to_string))
        .map(Value::String)
        .ok_or_else(|| QueryError::evaluation(expression, format!("property '{key}' is not defined")))
}

struct Cursor<'e> {
    expression: &'e str,
    rest: &'e str,
}

impl<'e> Cursor<'e> {
    fn new(expression: &'e str, text: &'e str) -> Self {
        Self { expression, rest: text }
    }

    fn fail(&self, reason: impl Into<String>) -> QueryError {
        QueryError::evaluation(self.expression, reason)
    }

    fn evaluate(mut self, context: &EvaluationContext) -> Result<Value> {
        let mut current = self.root(context)?;
        loop {
            self.rest = self.rest.trim_start();
            if self.rest.is_empty() {
                return Ok(current);
            }
            if let Some(rest) = self.rest.strip_prefix("?.") {
                self.rest = rest;
                let name = self.identifier()?;
                if !current.is_null() {
                    current = self.property(&current, name)?;
                }
            } else if let Some(rest) = self.rest.strip_prefix('.') {
                self.rest = rest;
                let name = self.identifier()?;
                current = self.property(&current, name)?;
            } else if self.rest.starts_with('[') {
                let key = self.index()?;
                current = self.element(&current, key)?;
            } else {
                return Err(self.fail(format!("unexpected input '{}'", self.rest)));
            }
        }
    }

    fn root(&mut self, context: &EvaluationContext) -> Result<Value> {
        if let Some(rest) = self.rest.strip_prefix('#') {
            self.rest = rest;
            let name = self.identifier()?;
            return context
                .variable(name)
                .cloned()
                .ok_or_else(|| self.fail(format!("unknown variable '#{name}'")));
        }
        if self.rest.starts_with('[') {
            return match self.index()? {
                Key::Position(position) => context
                    .arguments()
                    .get(position)
                    .cloned()
                    .ok_or_else(|| self.fail(format!("no argument at index {position}"))),
                Key::Name(name) => Err(self.fail(format!("arguments are positional, got '{name}'"))),
            };
        }
        if self.rest.starts_with('\'') {
            return self.string().map(Value::String);
        }
        let word = self.word();
        match word {
            "null" => Ok(Value::Null),
            "true" => Ok(Value::Bool(true)),
            "false" => Ok(Value::Bool(false)),
            _ => word
                .parse::<i64>()
                .map(Value::Int)
                .map_err(|_| self.fail(format!("unsupported expression '{word}'"))),
        }
    }

    fn word(&mut self) -> &'e str {
        let end = self
            .rest
            .find(|c: char| !(c.is_alphanumeric() || c == '_' || c == '-'))
            .unwrap_or(self.rest.len());
        let (word, rest) = self.rest.split_at(end);
        self.rest = rest;
        word
    }

    fn identifier(&mut self) -> Result<&'e str> {
        let end = self
            .rest
            .find(|c: char| !(c.is_alphanumeric() || c == '_' || c == '$'))
            .unwrap_or(self.rest.len());
        if end == 0 {
            return Err(self.fail("expected identifier"));
        }
        let (name, rest) = self.rest.split_at(end);
        self.rest = rest;
        Ok(name)
    }

    fn string(&mut self) -> Result<String> {
        let body = &self.rest[1..];
        let end = body.find('\'').ok_or_else(|| self.fail("unterminated string literal"))?;
        let literal = body[..end].to_string();
        self.rest = &body[end + 1..];
        Ok(literal)
    }

    fn index(&mut self) -> Result<Key> {
        self.rest = self.rest[1..].trim_start();
        let key = if self.rest.starts_with('\'') {
            Key::Name(self.string()?)
        } else {
            let digits = self.word();
            let position = digits
                .parse::<usize>()
                .map_err(|_| self.fail(format!("invalid index '{digits}'")))?;
            Key::Position(position)
        };
        self.rest = self.rest.trim_start();
        self.rest = self.rest.strip_prefix(']').ok_or_else(|| self.fail("expected ']'"))?;
        Ok(key)
    }

    fn property(&self, target: &Value, name: &str) -> Result<Value> {
        let target = target.unwrapped();
        if target.is_null() {
            return Err(self.fail(format!("cannot read '{name}' of null")));
        }
        target
            .property(name)
            .cloned()
            .ok_or_else(|| self.fail(format!("no property '{name}' on {}", target.describe())))
    }

    fn element(&self, target: &Value, key: Key) -> Result<Value> {
        match (target.unwrapped(), key) {
            (Value::List(items), Key::Position(position)) => items
                .get(position)
                .cloned()
                .ok_or_else(|| self.fail(format!("index {position} out of bounds for {} items", items.len()))),
            (other, Key::Name(name)) => self.property(other, &name),
            (other, Key::Position(position)) => {
                Err(self.fail(format!("cannot index {} with {position}", other.describe())))
            }
        }
    }
}

enum Key {
    Position(usize),
    Name(String),
}
