//! Repository method model: declared signatures, parameter classification,
//! per-invocation argument access and the query method descriptor.

mod accessor;
mod method;
mod parameters;
mod query_method;

pub use accessor::{BindableValues, ParameterAccessor, ParameterSource};
pub use method::{MethodSignature, ParameterDecl, RepositoryMetadata};
pub use parameters::{Parameter, ParameterRole, Parameters};
pub use query_method::QueryMethod;
