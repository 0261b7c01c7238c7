use std::fmt;

use futures::future::BoxFuture;
use futures::stream::BoxStream;

use crate::domain::{Page, Slice, Window};
use crate::error::Result;
use crate::value::Value;

/// Return-shape classification of a query method.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum QueryShape {
    /// Returns a page with a total count.
    Page,
    /// Returns a slice with a has-next flag.
    Slice,
    /// Returns a scroll window.
    Window,
    /// Returns a collection (or array, or reactive multi publisher).
    Collection,
    /// Returns a lazy single-pass stream.
    Stream,
    /// Returns a single value (possibly optional or deferred).
    Single,
}

impl QueryShape {
    /// Lower-case shape name used in diagnostics.
    pub fn name(self) -> &'static str {
        match self {
            QueryShape::Page => "page",
            QueryShape::Slice => "slice",
            QueryShape::Window => "window",
            QueryShape::Collection => "collection",
            QueryShape::Stream => "stream",
            QueryShape::Single => "single",
        }
    }
}

impl fmt::Display for QueryShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Runtime kind of a collection returned by the execution layer.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum CollectionKind {
    /// Ordered list.
    List,
    /// Set of unique elements.
    Set,
    /// Double-ended queue.
    Deque,
    /// Store-specific collection that cannot be rebuilt directly.
    Other {
        /// Runtime collection name.
        name: String,
        /// Whether the collection enforces uniqueness.
        unique: bool,
    },
}

impl CollectionKind {
    /// Kind that can be rebuilt after conversion: known kinds mirror
    /// themselves, unknown ones approximate to a set or a list.
    pub fn approximate(&self) -> CollectionKind {
        match self {
            CollectionKind::Other { unique: true, .. } => CollectionKind::Set,
            CollectionKind::Other { unique: false, .. } => CollectionKind::List,
            known => known.clone(),
        }
    }
}

/// Collection result tagged with its runtime kind.
#[derive(Clone, Debug, PartialEq)]
pub struct ResultCollection {
    kind: CollectionKind,
    items: Vec<Value>,
}

impl ResultCollection {
    /// Creates a collection of `kind`.
    pub fn new(kind: CollectionKind, items: Vec<Value>) -> Self {
        Self { kind, items }
    }

    /// List collection.
    pub fn list(items: Vec<Value>) -> Self {
        Self::new(CollectionKind::List, items)
    }

    /// Runtime kind.
    pub fn kind(&self) -> &CollectionKind {
        &self.kind
    }

    /// Elements.
    pub fn items(&self) -> &[Value] {
        &self.items
    }

    /// Consumes the collection.
    pub fn into_parts(self) -> (CollectionKind, Vec<Value>) {
        (self.kind, self.items)
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the collection is empty.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Lazy single-pass sequence of results.
pub struct ResultStream {
    inner: Box<dyn Iterator<Item = Result<Value>> + Send>,
}

impl ResultStream {
    /// Wraps a fallible iterator.
    pub fn new<I>(iter: I) -> Self
    where
        I: IntoIterator<Item = Result<Value>>,
        I::IntoIter: Send + 'static,
    {
        Self {
            inner: Box::new(iter.into_iter()),
        }
    }

    /// Wraps an infallible iterator of values.
    pub fn from_values<I>(values: I) -> Self
    where
        I: IntoIterator<Item = Value>,
        I::IntoIter: Send + 'static,
    {
        Self::new(values.into_iter().map(Ok))
    }
}

impl Iterator for ResultStream {
    type Item = Result<Value>;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }
}

impl fmt::Debug for ResultStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ResultStream(..)")
    }
}

/// Reactive publisher result.
pub enum Reactive {
    /// Publisher of at most one element.
    Single(BoxFuture<'static, Result<Value>>),
    /// Publisher of many elements.
    Multi(BoxStream<'static, Result<Value>>),
}

impl fmt::Debug for Reactive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reactive::Single(_) => f.write_str("Reactive::Single(..)"),
            Reactive::Multi(_) => f.write_str("Reactive::Multi(..)"),
        }
    }
}

/// Raw result handed over by the execution layer, or a processed one.
#[derive(Debug)]
pub enum QueryResult {
    /// Single value (scalar, record, tuple, optional wrapper, or null).
    Value(Value),
    /// Materialized collection.
    Collection(ResultCollection),
    /// Page of values.
    Page(Page<Value>),
    /// Slice of values.
    Slice(Slice<Value>),
    /// Scroll window of values.
    Window(Window<Value>),
    /// Lazy stream of values.
    Stream(ResultStream),
    /// Reactive publisher.
    Reactive(Reactive),
}

impl QueryResult {
    /// Container shape name used in diagnostics.
    pub fn shape_name(&self) -> &'static str {
        match self {
            QueryResult::Value(_) => "value",
            QueryResult::Collection(_) => "collection",
            QueryResult::Page(_) => "page",
            QueryResult::Slice(_) => "slice",
            QueryResult::Window(_) => "window",
            QueryResult::Stream(_) => "stream",
            QueryResult::Reactive(_) => "reactive",
        }
    }

    /// The single value, if this is [`QueryResult::Value`].
    pub fn into_value(self) -> Option<Value> {
        match self {
            QueryResult::Value(value) => Some(value),
            _ => None,
        }
    }

    /// The collection, if this is [`QueryResult::Collection`].
    pub fn into_collection(self) -> Option<ResultCollection> {
        match self {
            QueryResult::Collection(collection) => Some(collection),
            _ => None,
        }
    }

    /// The page, if this is [`QueryResult::Page`].
    pub fn into_page(self) -> Option<Page<Value>> {
        match self {
            QueryResult::Page(page) => Some(page),
            _ => None,
        }
    }

    /// The slice, if this is [`QueryResult::Slice`].
    pub fn into_slice(self) -> Option<Slice<Value>> {
        match self {
            QueryResult::Slice(slice) => Some(slice),
            _ => None,
        }
    }

    /// The window, if this is [`QueryResult::Window`].
    pub fn into_window(self) -> Option<Window<Value>> {
        match self {
            QueryResult::Window(window) => Some(window),
            _ => None,
        }
    }

    /// The stream, if this is [`QueryResult::Stream`].
    pub fn into_stream(self) -> Option<ResultStream> {
        match self {
            QueryResult::Stream(stream) => Some(stream),
            _ => None,
        }
    }

    /// The publisher, if this is [`QueryResult::Reactive`].
    pub fn into_reactive(self) -> Option<Reactive> {
        match self {
            QueryResult::Reactive(reactive) => Some(reactive),
            _ => None,
        }
    }
}

impl From<Value> for QueryResult {
    fn from(value: Value) -> Self {
        QueryResult::Value(value)
    }
}

impl From<ResultCollection> for QueryResult {
    fn from(collection: ResultCollection) -> Self {
        QueryResult::Collection(collection)
    }
}

impl From<Page<Value>> for QueryResult {
    fn from(page: Page<Value>) -> Self {
        QueryResult::Page(page)
    }
}

impl From<Slice<Value>> for QueryResult {
    fn from(slice: Slice<Value>) -> Self {
        QueryResult::Slice(slice)
    }
}

impl From<Window<Value>> for QueryResult {
    fn from(window: Window<Value>) -> Self {
        QueryResult::Window(window)
    }
}
