//! Canonical runtime value representation shared by argument binding,
//! expression evaluation and result processing.

use std::collections::BTreeMap;

use crate::domain::{Limit, Pageable, Score, ScoreRange, ScrollPosition, Sort, Vector};
use crate::result::Projection;

static NULL: Value = Value::Null;

/// Instance of a named class (entity or DTO) with its property values.
#[derive(Clone, Debug, PartialEq)]
pub struct Record {
    type_name: String,
    fields: BTreeMap<String, Value>,
}

impl Record {
    /// Creates an empty record of `type_name`.
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            fields: BTreeMap::new(),
        }
    }

    /// Sets a field, builder style.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    /// Sets a field in place.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.fields.insert(name.into(), value.into());
    }

    /// Runtime type name.
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Field value, if present.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// All fields.
    pub fn fields(&self) -> &BTreeMap<String, Value> {
        &self.fields
    }

    /// Consumes the record, returning its fields.
    pub fn into_fields(self) -> BTreeMap<String, Value> {
        self.fields
    }
}

/// Runtime value tagged with its shape.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    /// Null literal.
    Null,
    /// Boolean literal.
    Bool(bool),
    /// Signed 64-bit integer literal.
    Int(i64),
    /// 64-bit floating point literal.
    Float(f64),
    /// UTF-8 string literal.
    String(String),
    /// Arbitrary binary payload.
    Bytes(Vec<u8>),
    /// Nanoseconds since Unix epoch in UTC.
    DateTime(i128),
    /// Positional tuple or array.
    List(Vec<Value>),
    /// Property-name keyed tuple.
    Map(BTreeMap<String, Value>),
    /// Entity or DTO instance.
    Record(Record),
    /// Interface projection view.
    Projection(Projection),
    /// Optional/deferred wrapper still present at runtime.
    Optional(Option<Box<Value>>),
    /// Type token naming a projection target.
    Class(String),
    /// Page request argument.
    Pageable(Pageable),
    /// Sort argument.
    Sort(Sort),
    /// Limit argument.
    Limit(Limit),
    /// Scroll position argument.
    ScrollPosition(ScrollPosition),
    /// Vector argument.
    Vector(Vector),
    /// Score argument.
    Score(Score),
    /// Score range argument.
    ScoreRange(ScoreRange),
}

impl Value {
    /// Whether this is [`Value::Null`].
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Whether this value is an optional/deferred wrapper that must be
    /// unwrapped before binding.
    pub fn is_runtime_wrapper(&self) -> bool {
        matches!(self, Value::Optional(_))
    }

    /// Strips runtime wrappers; an empty wrapper yields `Null`.
    pub fn unwrapped(&self) -> &Value {
        match self {
            Value::Optional(Some(inner)) => inner.unwrapped(),
            Value::Optional(None) => &NULL,
            other => other,
        }
    }

    /// Runtime type name used for instance checks, if the value has one.
    pub fn type_name(&self) -> Option<&str> {
        match self {
            Value::Null | Value::List(_) | Value::Map(_) | Value::Optional(_) => None,
            Value::Bool(_) => Some("boolean"),
            Value::Int(_) => Some("long"),
            Value::Float(_) => Some("double"),
            Value::String(_) => Some("String"),
            Value::Bytes(_) => Some("byte[]"),
            Value::DateTime(_) => Some("Instant"),
            Value::Record(record) => Some(record.type_name()),
            Value::Projection(projection) => Some(projection.interface()),
            Value::Class(_) => Some("Class"),
            Value::Pageable(_) => Some("Pageable"),
            Value::Sort(_) => Some("Sort"),
            Value::Limit(_) => Some("Limit"),
            Value::ScrollPosition(_) => Some("ScrollPosition"),
            Value::Vector(_) => Some("Vector"),
            Value::Score(_) => Some("Score"),
            Value::ScoreRange(_) => Some("Range<Score>"),
        }
    }

    /// Short description of the value's shape for diagnostics.
    pub fn describe(&self) -> String {
        match self {
            Value::Null => "null".to_string(),
            Value::List(items) => format!("tuple of {}", items.len()),
            Value::Map(entries) => format!("map of {}", entries.len()),
            Value::Optional(_) => "Optional".to_string(),
            other => other.type_name().unwrap_or("value").to_string(),
        }
    }

    /// Named property of a record, map or projection.
    pub fn property(&self, name: &str) -> Option<&Value> {
        match self {
            Value::Record(record) => record.get(name),
            Value::Map(entries) => entries.get(name),
            Value::Projection(projection) => projection.get(name).ok(),
            _ => None,
        }
    }

    /// String contents, if this is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(value) => Some(value),
            _ => None,
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_owned())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Int(i64::from(value))
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<Vec<u8>> for Value {
    fn from(value: Vec<u8>) -> Self {
        Value::Bytes(value)
    }
}

impl From<Record> for Value {
    fn from(value: Record) -> Self {
        Value::Record(value)
    }
}

impl From<Pageable> for Value {
    fn from(value: Pageable) -> Self {
        Value::Pageable(value)
    }
}

impl From<Sort> for Value {
    fn from(value: Sort) -> Self {
        Value::Sort(value)
    }
}

impl From<Limit> for Value {
    fn from(value: Limit) -> Self {
        Value::Limit(value)
    }
}

impl From<ScrollPosition> for Value {
    fn from(value: ScrollPosition) -> Self {
        Value::ScrollPosition(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        Value::Optional(value.map(|v| Box::new(v.into())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn optional_wrappers_unwrap_to_inner_or_null() {
        let present = Value::from(Some("x"));
        assert!(present.is_runtime_wrapper());
        assert_eq!(present.unwrapped(), &Value::from("x"));
        assert!(Value::from(None::<i64>).unwrapped().is_null());
        assert_eq!(Value::Int(3).unwrapped(), &Value::Int(3));
    }

    #[test]
    fn record_properties_are_addressable() {
        let user = Value::from(Record::new("User").with("lastname", "Matthews").with("age", 42));
        assert_eq!(user.type_name(), Some("User"));
        assert_eq!(user.property("age"), Some(&Value::Int(42)));
        assert!(user.property("missing").is_none());
    }
}
