use std::borrow::Cow;
use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use futures::{FutureExt, StreamExt};
use tracing::{debug, warn};

use crate::config::ResultOptions;
use crate::error::{QueryError, Result};
use crate::repository::ParameterAccessor;
use crate::result::converter::{
    ChainingConverter, ConversionService, Converter, DtoInstantiatingConversion, NoOpConverter,
    ProjectingConverter,
};
use crate::result::projection::ProjectionFactory;
use crate::result::returned_type::ReturnedType;
use crate::result::shape::{
    CollectionKind, QueryResult, Reactive, ResultCollection, ResultStream, QueryShape,
};
use crate::value::Value;

/// Converts raw query results into the shape and type a method returns.
///
/// The container of the source is preserved: pages keep their totals,
/// slices and windows their navigation data, streams and reactive
/// publishers stay lazy. Sources whose container does not match the
/// method shape are converted element-wise (or directly, for tuples)
/// unless [`ResultOptions::strict_shapes`] is set.
#[derive(Clone)]
pub struct ResultProcessor {
    method: String,
    shape: QueryShape,
    returned: ReturnedType,
    factory: Arc<ProjectionFactory>,
    conversions: Arc<dyn ConversionService>,
    options: ResultOptions,
}

impl ResultProcessor {
    /// Creates a processor for `method` converting into `returned`.
    pub fn new(
        method: impl Into<String>,
        shape: QueryShape,
        returned: ReturnedType,
        factory: Arc<ProjectionFactory>,
    ) -> Self {
        Self {
            method: method.into(),
            shape,
            returned,
            factory,
            conversions: Arc::new(DtoInstantiatingConversion),
            options: ResultOptions::default(),
        }
    }

    /// Replaces the service used for DTO construction.
    pub fn with_conversion_service(mut self, conversions: Arc<dyn ConversionService>) -> Self {
        self.conversions = conversions;
        self
    }

    /// Replaces the processing options.
    pub fn with_options(mut self, options: ResultOptions) -> Self {
        self.options = options;
        self
    }

    /// Type results are converted into.
    pub fn returned_type(&self) -> &ReturnedType {
        &self.returned
    }

    /// Shape of the owning method.
    pub fn shape(&self) -> QueryShape {
        self.shape
    }

    /// Processing options.
    pub fn options(&self) -> &ResultOptions {
        &self.options
    }

    /// Processor bound to the projection type supplied with the invocation,
    /// or `self` when the call carries none.
    pub fn with_dynamic_projection(&self, accessor: &ParameterAccessor<'_>) -> Cow<'_, Self> {
        let Some(target) = accessor.dynamic_projection() else {
            return Cow::Borrowed(self);
        };
        let returned = ReturnedType::for_name(
            target,
            self.returned.domain_type(),
            self.factory.types().as_ref(),
        );
        debug!(
            method = %self.method,
            projection = target,
            projecting = returned.is_projecting(),
            "result.processor.dynamic_projection"
        );
        Cow::Owned(Self {
            returned,
            ..self.clone()
        })
    }

    /// Converts `source` into the returned type.
    pub fn process_result(&self, source: QueryResult) -> Result<QueryResult> {
        self.process_result_with(source, Arc::new(NoOpConverter))
    }

    /// Converts `source`, running `preparing` on each element before the
    /// projecting conversion.
    pub fn process_result_with(
        &self,
        source: QueryResult,
        preparing: Arc<dyn Converter>,
    ) -> Result<QueryResult> {
        if !self.returned.is_projecting() {
            return Ok(source);
        }
        if let QueryResult::Value(value) = &source {
            if value.is_null() || self.returned.is_instance(value, self.factory.types().as_ref()) {
                return Ok(source);
            }
        }

        let converter = Arc::new(ChainingConverter::new(
            preparing,
            ProjectingConverter::new(
                self.returned.clone(),
                Arc::clone(&self.factory),
                Arc::clone(&self.conversions),
            ),
            Arc::clone(self.factory.types()),
        ));
        debug!(
            method = %self.method,
            source = source.shape_name(),
            shape = %self.shape,
            returned = self.returned.returned_type(),
            "result.processor.dispatch"
        );

        match source {
            QueryResult::Window(window) if self.shape == QueryShape::Window => {
                Ok(QueryResult::Window(window.try_map(|v| converter.convert(v))?))
            }
            QueryResult::Page(page) if self.is_paging() => {
                Ok(QueryResult::Page(page.try_map(|v| converter.convert(v))?))
            }
            QueryResult::Slice(slice) if self.is_paging() => {
                Ok(QueryResult::Slice(slice.try_map(|v| converter.convert(v))?))
            }
            QueryResult::Collection(collection) if self.shape == QueryShape::Collection => {
                self.convert_collection(collection, converter.as_ref())
                    .map(QueryResult::Collection)
            }
            QueryResult::Stream(stream) if self.shape == QueryShape::Stream => {
                Ok(QueryResult::Stream(map_stream(stream, converter)))
            }
            QueryResult::Reactive(reactive) => Ok(QueryResult::Reactive(map_reactive(reactive, converter))),
            QueryResult::Value(value) => convert_value(value, converter.as_ref()).map(QueryResult::Value),
            mismatched => self.fall_through(mismatched, converter),
        }
    }

    fn is_paging(&self) -> bool {
        matches!(self.shape, QueryShape::Page | QueryShape::Slice)
    }

    fn convert_collection(
        &self,
        collection: ResultCollection,
        converter: &dyn Converter,
    ) -> Result<ResultCollection> {
        let (kind, items) = collection.into_parts();
        let target = kind.approximate();
        if target != kind {
            debug!(
                method = %self.method,
                source = ?kind,
                approximation = ?target,
                "result.collection.approximated"
            );
        }
        let mut converted: Vec<Value> = Vec::with_capacity(items.len());
        let mut seen: HashMap<u64, Vec<usize>> = HashMap::new();
        for item in items {
            let value = converter.convert(item)?;
            if target == CollectionKind::Set {
                let bucket = seen.entry(fingerprint(&value)).or_default();
                if bucket.iter().any(|&at| converted[at] == value) {
                    continue;
                }
                bucket.push(converted.len());
            }
            converted.push(value);
        }
        Ok(ResultCollection::new(target, converted))
    }

    fn fall_through(
        &self,
        source: QueryResult,
        converter: Arc<ChainingConverter>,
    ) -> Result<QueryResult> {
        if self.options.strict_shapes {
            return Err(QueryError::UnsupportedResultShape {
                shape: source.shape_name(),
                method: self.method.clone(),
            });
        }
        warn!(
            method = %self.method,
            source = source.shape_name(),
            shape = %self.shape,
            "result.processor.shape_fallthrough"
        );
        match source {
            QueryResult::Collection(collection) => {
                let (_, items) = collection.into_parts();
                converter.convert(Value::List(items)).map(QueryResult::Value)
            }
            QueryResult::Page(page) => Ok(QueryResult::Page(page.try_map(|v| converter.convert(v))?)),
            QueryResult::Slice(slice) => Ok(QueryResult::Slice(slice.try_map(|v| converter.convert(v))?)),
            QueryResult::Window(window) => {
                Ok(QueryResult::Window(window.try_map(|v| converter.convert(v))?))
            }
            QueryResult::Stream(stream) => Ok(QueryResult::Stream(map_stream(stream, converter))),
            QueryResult::Reactive(reactive) => Ok(QueryResult::Reactive(map_reactive(reactive, converter))),
            QueryResult::Value(value) => convert_value(value, converter.as_ref()).map(QueryResult::Value),
        }
    }
}

impl std::fmt::Debug for ResultProcessor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResultProcessor")
            .field("method", &self.method)
            .field("shape", &self.shape)
            .field("returned", &self.returned)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

fn convert_value(value: Value, converter: &ChainingConverter) -> Result<Value> {
    match value {
        Value::Optional(Some(inner)) => {
            let converted = convert_value(*inner, converter)?;
            Ok(Value::Optional(Some(Box::new(converted))))
        }
        Value::Optional(None) => Ok(Value::Optional(None)),
        other if converter.is_done(&other) => Ok(other),
        other => converter.convert(other),
    }
}

fn map_stream(stream: ResultStream, converter: Arc<ChainingConverter>) -> ResultStream {
    ResultStream::new(stream.map(move |item| item.and_then(|v| converter.convert(v))))
}

fn map_reactive(reactive: Reactive, converter: Arc<ChainingConverter>) -> Reactive {
    match reactive {
        Reactive::Single(future) => Reactive::Single(
            future
                .map(move |item| item.and_then(|v| convert_value(v, &converter)))
                .boxed(),
        ),
        Reactive::Multi(stream) => Reactive::Multi(
            stream
                .map(move |item| item.and_then(|v| converter.convert(v)))
                .boxed(),
        ),
    }
}

/// Hash consistent with `Value`'s equality. Floats and argument values
/// only contribute their variant, so equal values always collide.
fn fingerprint(value: &Value) -> u64 {
    let mut state = DefaultHasher::new();
    hash_value(value, &mut state);
    state.finish()
}

fn hash_value(value: &Value, state: &mut DefaultHasher) {
    std::mem::discriminant(value).hash(state);
    match value {
        Value::Bool(b) => b.hash(state),
        Value::Int(i) => i.hash(state),
        Value::String(s) | Value::Class(s) => s.hash(state),
        Value::Bytes(bytes) => bytes.hash(state),
        Value::DateTime(nanos) => nanos.hash(state),
        Value::List(items) => items.iter().for_each(|item| hash_value(item, state)),
        Value::Map(entries) => hash_entries(entries.iter(), state),
        Value::Record(record) => {
            record.type_name().hash(state);
            hash_entries(record.fields().iter(), state);
        }
        Value::Projection(projection) => {
            projection.interface().hash(state);
            hash_entries(projection.backing().iter(), state);
        }
        Value::Optional(Some(inner)) => hash_value(inner, state),
        _ => {}
    }
}

fn hash_entries<'a>(entries: impl Iterator<Item = (&'a String, &'a Value)>, state: &mut DefaultHasher) {
    for (name, value) in entries {
        name.hash(state);
        hash_value(value, state);
    }
}
