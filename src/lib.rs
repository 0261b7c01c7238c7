//! Query derivation and result shaping for repository methods.
//!
//! Quarry turns declared repository methods into store-independent query
//! descriptions and shapes raw store results into the declared return
//! types:
//!
//! * [`query`] parses method names such as `findByLastnameOrderByAgeDesc`
//!   into a [`PartTree`].
//! * [`repository`] classifies method parameters, gives typed access to
//!   invocation arguments and validates method declarations.
//! * [`result`] projects and converts raw results while preserving their
//!   container (page, slice, window, collection, stream, reactive).
//! * [`expression`] extracts `:#{..}` expressions from declared query
//!   strings and evaluates them per invocation.
//!
//! Declared types are described with [`types::TypeRef`] and resolved
//! through a [`types::TypeIntrospector`].

#![warn(missing_docs)]

pub mod config;
pub mod domain;
pub mod error;
pub mod expression;
pub mod geo;
pub mod query;
pub mod repository;
pub mod result;
pub mod types;
pub mod value;

pub use config::QuarryConfig;
pub use error::{QueryError, Result};
pub use query::{Part, PartKind, PartTree};
pub use repository::{MethodSignature, ParameterAccessor, Parameters, QueryMethod, RepositoryMetadata};
pub use result::{QueryResult, QueryShape, ResultProcessor, ReturnedType};
pub use types::{TypeIntrospector, TypeRef, TypeRegistry};
pub use value::{Record, Value};
