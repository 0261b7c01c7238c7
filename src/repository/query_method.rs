use std::sync::Arc;

use tracing::debug;

use crate::config::ResultOptions;
use crate::error::{QueryError, Result};
use crate::query::{DomainContext, PartTree};
use crate::repository::method::{MethodSignature, RepositoryMetadata};
use crate::repository::parameters::Parameters;
use crate::result::{ProjectionFactory, QueryShape, ResultProcessor, ReturnedType};
use crate::types::{TypeIntrospector, TypeRef, WrapperKind};

const PAGEABLE_RETURN_TYPES: &str = "List, Collection, Iterable, Page, Slice, Window, Stream, Multi";

/// A repository method with its classified parameters and return shape.
///
/// Validation, shape classification, domain type resolution and, for
/// derived queries, part tree parsing run once at construction.
pub struct QueryMethod {
    signature: MethodSignature,
    metadata: RepositoryMetadata,
    parameters: Parameters,
    unwrapped_return: TypeRef,
    shape: QueryShape,
    domain_type: String,
    processor: ResultProcessor,
    part_tree: Option<PartTree>,
}

impl QueryMethod {
    /// Validates and classifies `signature` declared on a repository.
    pub fn new(
        signature: MethodSignature,
        metadata: RepositoryMetadata,
        factory: Arc<ProjectionFactory>,
    ) -> Result<Self> {
        let name = signature.name().to_string();
        Self::build(signature, metadata, factory).map_err(|err| QueryError::for_method(name, err))
    }

    fn build(
        signature: MethodSignature,
        metadata: RepositoryMetadata,
        factory: Arc<ProjectionFactory>,
    ) -> Result<Self> {
        let types = Arc::clone(factory.types());
        let parameters = Parameters::from_method(&signature, metadata.domain_type(), types.as_ref())?;
        let unwrapped_return = unwrap_return_type(signature.return_type()).clone();
        let shape = classify_shape(signature.return_type(), &unwrapped_return);
        let reactive = signature.return_type().is_reactive();

        if parameters.has_pageable_parameter() {
            if parameters.has_sort_parameter() {
                return Err(QueryError::PageableAndSort {
                    method: signature.name().to_string(),
                });
            }
            if !accepts_pageable(signature.return_type(), &unwrapped_return) {
                return Err(QueryError::PageableReturnType {
                    method: signature.name().to_string(),
                    return_type: signature.return_type().to_string(),
                    allowed: PAGEABLE_RETURN_TYPES,
                });
            }
        }
        if shape == QueryShape::Page && !parameters.has_pageable_parameter() {
            return Err(QueryError::PageQueryWithoutPageable {
                method: signature.name().to_string(),
            });
        }

        let part_tree = match signature.declared_query() {
            Some(_) => None,
            None => {
                let ctx = DomainContext::new(metadata.domain_type(), types.as_ref());
                Some(PartTree::parse(signature.name(), Some(&ctx))?)
            }
        };

        let domain = resolve_domain_type(&signature, &metadata, types.as_ref());
        let returned = ReturnedType::of(signature.return_type(), &domain, types.as_ref());
        let processor = ResultProcessor::new(signature.name(), shape, returned, factory);

        debug!(
            method = signature.name(),
            repository = metadata.repository(),
            shape = %shape,
            reactive,
            derived = part_tree.is_some(),
            "repository.query_method.registered"
        );
        Ok(Self {
            signature,
            metadata,
            parameters,
            unwrapped_return,
            shape,
            domain_type: domain,
            processor,
            part_tree,
        })
    }

    /// Replaces the result processing options.
    pub fn with_result_options(mut self, options: ResultOptions) -> Self {
        self.processor = self.processor.with_options(options);
        self
    }

    /// Method name.
    pub fn name(&self) -> &str {
        self.signature.name()
    }

    /// Declared signature.
    pub fn signature(&self) -> &MethodSignature {
        &self.signature
    }

    /// Owning repository metadata.
    pub fn metadata(&self) -> &RepositoryMetadata {
        &self.metadata
    }

    /// Classified parameters.
    pub fn parameters(&self) -> &Parameters {
        &self.parameters
    }

    /// Effective domain type: the method's returned domain class when it
    /// is a subtype of the repository's domain type, the repository's
    /// domain type otherwise.
    pub fn domain_type(&self) -> &str {
        &self.domain_type
    }

    /// Return type with reactive and optional/deferred wrappers removed.
    pub fn unwrapped_return_type(&self) -> &TypeRef {
        &self.unwrapped_return
    }

    /// Return shape.
    pub fn shape(&self) -> QueryShape {
        self.shape
    }

    /// Whether the method returns a page.
    pub fn is_page_query(&self) -> bool {
        self.shape == QueryShape::Page
    }

    /// Whether the method returns a slice.
    pub fn is_slice_query(&self) -> bool {
        self.shape == QueryShape::Slice
    }

    /// Whether the method returns a scroll window.
    pub fn is_scroll_query(&self) -> bool {
        self.shape == QueryShape::Window
    }

    /// Whether the method returns a collection.
    pub fn is_collection_query(&self) -> bool {
        self.shape == QueryShape::Collection
    }

    /// Whether the method returns a lazy stream.
    pub fn is_stream_query(&self) -> bool {
        self.shape == QueryShape::Stream
    }

    /// Whether the method returns a reactive publisher.
    pub fn is_reactive(&self) -> bool {
        self.signature.return_type().is_reactive()
    }

    /// Whether the method returns a single-element wrapper such as
    /// `Optional`.
    pub fn is_optional(&self) -> bool {
        self.signature
            .return_type()
            .wrapper()
            .is_some_and(|kind| kind.is_execution_wrapper())
    }

    /// Name under which a declared query would be looked up.
    pub fn named_query_name(&self) -> String {
        format!("{}.{}", self.domain_type(), self.signature.name())
    }

    /// Static result processor.
    pub fn result_processor(&self) -> &ResultProcessor {
        &self.processor
    }

    /// Returned type of the static result processor.
    pub fn returned_type(&self) -> &ReturnedType {
        self.processor.returned_type()
    }

    /// Part tree parsed from the method name against the repository's
    /// domain type. `None` when the method declares its query.
    pub fn part_tree(&self) -> Option<&PartTree> {
        self.part_tree.as_ref()
    }

    /// Explicitly declared query, if any.
    pub fn declared_query(&self) -> Option<&str> {
        self.signature.declared_query()
    }
}

impl std::fmt::Debug for QueryMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryMethod")
            .field("signature", &self.signature)
            .field("metadata", &self.metadata)
            .field("shape", &self.shape)
            .finish_non_exhaustive()
    }
}

/// Strips reactive publishers and optional/deferred wrappers.
fn unwrap_return_type(declared: &TypeRef) -> &TypeRef {
    match declared {
        TypeRef::Wrapper(kind, inner) if kind.is_reactive() || kind.is_execution_wrapper() => {
            unwrap_return_type(inner)
        }
        other => other,
    }
}

/// Return types a `Pageable` parameter may page: list-like collections,
/// paging containers, streams and multi-value publishers.
fn accepts_pageable(declared: &TypeRef, unwrapped: &TypeRef) -> bool {
    let paged = matches!(
        unwrapped.wrapper(),
        Some(
            WrapperKind::List
                | WrapperKind::Collection
                | WrapperKind::Iterable
                | WrapperKind::Page
                | WrapperKind::Slice
                | WrapperKind::Window
                | WrapperKind::Stream
        )
    );
    paged || declared.wrapper() == Some(WrapperKind::Multi)
}

fn classify_shape(declared: &TypeRef, unwrapped: &TypeRef) -> QueryShape {
    match unwrapped.wrapper() {
        Some(WrapperKind::Page) => QueryShape::Page,
        Some(WrapperKind::Slice) => QueryShape::Slice,
        Some(WrapperKind::Window) => QueryShape::Window,
        Some(kind) if kind.is_collection_like() => QueryShape::Collection,
        Some(WrapperKind::Stream) => QueryShape::Stream,
        _ if matches!(unwrapped, TypeRef::Array(_)) => QueryShape::Collection,
        _ if declared.wrapper() == Some(WrapperKind::Multi) => QueryShape::Collection,
        _ => QueryShape::Single,
    }
}

fn resolve_domain_type(
    signature: &MethodSignature,
    metadata: &RepositoryMetadata,
    types: &dyn TypeIntrospector,
) -> String {
    let repository_domain = metadata.domain_type();
    match metadata.returned_domain_type(signature).as_named() {
        Some(returned) if types.is_assignable(repository_domain, returned) => returned.to_string(),
        _ => repository_domain.to_string(),
    }
}
