#![forbid(unsafe_code)]

//! Derivation of queries from repository method names.
//!
//! A method name such as `findDistinctTop3ByLastnameAndAgeGreaterThanOrderByAgeDesc`
//! is parsed into a [`PartTree`]: a subject (verb, distinct flag, result
//! limit), an OR-of-ANDs predicate made of [`Part`]s and a static sort.
//! Stores translate the tree through a [`QueryCreator`].

/// Visitor contract for store-specific query translation.
pub mod creator;

/// `OrderBy` clause parsing.
pub mod order_by;

/// Predicate parts and their operator keywords.
pub mod part;

/// Property paths resolved against a domain type.
pub mod property_path;

/// Subject and predicate tree of a method name.
pub mod tree;

pub use creator::QueryCreator;
pub use order_by::parse_order_by;
pub use part::{IgnoreCase, Part, PartKind};
pub use property_path::{DomainContext, PathSegment, PropertyPath};
pub use tree::{OrPart, PartTree, Subject};
