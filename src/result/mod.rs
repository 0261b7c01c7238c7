//! Result shaping: returned-type resolution, interface and DTO
//! projection, and container-preserving conversion of raw results.

mod converter;
mod processor;
mod projection;
mod returned_type;
mod shape;

pub use converter::{
    ChainingConverter, ConversionService, Converter, DtoInstantiatingConversion, NoOpConverter,
    ProjectingConverter,
};
pub use processor::ResultProcessor;
pub use projection::{Projection, ProjectionAdapter, ProjectionFactory};
pub use returned_type::{ReturnedKind, ReturnedType};
pub use shape::{CollectionKind, QueryResult, QueryShape, Reactive, ResultCollection, ResultStream};
