use std::collections::BTreeMap;
use std::sync::Arc;

use crate::error::{QueryError, Result};
use crate::result::projection::ProjectionFactory;
use crate::result::returned_type::ReturnedType;
use crate::types::TypeIntrospector;
use crate::value::{Record, Value};

/// Converts one result element.
pub trait Converter: Send + Sync {
    /// Converts `source`.
    fn convert(&self, source: Value) -> Result<Value>;
}

impl<F> Converter for F
where
    F: Fn(Value) -> Result<Value> + Send + Sync,
{
    fn convert(&self, source: Value) -> Result<Value> {
        self(source)
    }
}

/// Identity conversion used when no preparing converter is supplied.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoOpConverter;

impl Converter for NoOpConverter {
    fn convert(&self, source: Value) -> Result<Value> {
        Ok(source)
    }
}

/// Generic conversion into DTO classes. Failures are returned unchanged
/// to the caller of the result processor.
pub trait ConversionService: Send + Sync {
    /// Converts `source` into the returned type.
    fn convert(&self, source: Value, target: &ReturnedType) -> Result<Value>;
}

/// Builds DTO records from the returned type's input properties.
///
/// Records and maps are read by property name, tuples are zipped
/// positionally. A DTO with a single input property also accepts a bare
/// scalar.
#[derive(Clone, Copy, Debug, Default)]
pub struct DtoInstantiatingConversion;

impl ConversionService for DtoInstantiatingConversion {
    fn convert(&self, source: Value, target: &ReturnedType) -> Result<Value> {
        let type_name = target.returned_type();
        let inputs = target.input_properties();
        let mut dto = Record::new(type_name);
        match source {
            Value::Record(_) | Value::Map(_) | Value::Projection(_) => {
                for name in inputs {
                    let value = source.property(name).ok_or_else(|| {
                        QueryError::conversion(
                            source.describe(),
                            type_name,
                            format!("missing constructor argument '{name}'"),
                        )
                    })?;
                    dto.set(name.clone(), value.clone());
                }
            }
            Value::List(items) => {
                if items.len() != inputs.len() {
                    return Err(QueryError::conversion(
                        format!("tuple of {}", items.len()),
                        type_name,
                        format!("expected {} constructor arguments", inputs.len()),
                    ));
                }
                for (name, value) in inputs.iter().zip(items) {
                    dto.set(name.clone(), value);
                }
            }
            Value::Null => return Ok(Value::Null),
            scalar if inputs.len() == 1 => dto.set(inputs[0].clone(), scalar),
            other => {
                return Err(QueryError::conversion(
                    other.describe(),
                    type_name,
                    "no constructor accepts a single value",
                ))
            }
        }
        Ok(Value::Record(dto))
    }
}

/// Converts elements into the returned type: interfaces through the
/// projection factory, classes through the conversion service.
pub struct ProjectingConverter {
    returned: ReturnedType,
    factory: Arc<ProjectionFactory>,
    conversions: Arc<dyn ConversionService>,
}

impl ProjectingConverter {
    /// Creates a converter into `returned`.
    pub fn new(
        returned: ReturnedType,
        factory: Arc<ProjectionFactory>,
        conversions: Arc<dyn ConversionService>,
    ) -> Self {
        Self {
            returned,
            factory,
            conversions,
        }
    }

    fn projection_target(&self, source: Value) -> Value {
        match source {
            Value::List(items) => {
                let entries: BTreeMap<String, Value> = self
                    .returned
                    .input_properties()
                    .iter()
                    .cloned()
                    .zip(items)
                    .collect();
                Value::Map(entries)
            }
            other => other,
        }
    }
}

impl Converter for ProjectingConverter {
    fn convert(&self, source: Value) -> Result<Value> {
        if self.returned.is_interface() {
            let target = self.projection_target(source);
            return self.factory.project(self.returned.returned_type(), target);
        }
        self.conversions.convert(source, &self.returned)
    }
}

/// Preparing converter followed by the projecting converter. The second
/// step is skipped for nulls and values already of the returned type.
pub struct ChainingConverter {
    first: Arc<dyn Converter>,
    then: ProjectingConverter,
    types: Arc<dyn TypeIntrospector>,
}

impl ChainingConverter {
    /// Chains `first` and `then`.
    pub fn new(first: Arc<dyn Converter>, then: ProjectingConverter, types: Arc<dyn TypeIntrospector>) -> Self {
        Self { first, then, types }
    }

    /// Whether `value` needs no projecting step.
    pub fn is_done(&self, value: &Value) -> bool {
        value.is_null() || self.then.returned.is_instance(value, self.types.as_ref())
    }
}

impl Converter for ChainingConverter {
    fn convert(&self, source: Value) -> Result<Value> {
        let intermediate = self.first.convert(source)?;
        if self.is_done(&intermediate) {
            return Ok(intermediate);
        }
        self.then.convert(intermediate)
    }
}
