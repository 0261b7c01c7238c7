use std::fmt;

use crate::domain::sort::Sort;
use crate::error::{QueryError, Result};

/// Maximum number of results a query may return.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash)]
pub enum Limit {
    /// No limit.
    #[default]
    Unlimited,
    /// At most this many results.
    Limited(usize),
}

impl Limit {
    /// Limit of `max` results.
    pub fn of(max: usize) -> Self {
        Limit::Limited(max)
    }

    /// The absent limit.
    pub fn unlimited() -> Self {
        Limit::Unlimited
    }

    /// Whether a limit applies.
    pub fn is_limited(self) -> bool {
        matches!(self, Limit::Limited(_))
    }

    /// Maximum result count, if limited.
    pub fn max(self) -> Option<usize> {
        match self {
            Limit::Limited(max) => Some(max),
            Limit::Unlimited => None,
        }
    }
}

/// Page request: zero-based page number, page size and sort.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct PageRequest {
    page: usize,
    size: usize,
    sort: Sort,
}

/// Pagination information supplied by the caller.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub enum Pageable {
    /// No pagination; may still carry a sort.
    Unpaged {
        /// Sort applied without paging.
        sort: Sort,
    },
    /// Concrete page request.
    Paged(PageRequest),
}

impl Default for Pageable {
    fn default() -> Self {
        Pageable::unpaged()
    }
}

impl Pageable {
    /// The absent page request.
    pub fn unpaged() -> Self {
        Pageable::Unpaged {
            sort: Sort::unsorted(),
        }
    }

    /// Unpaged request carrying `sort`.
    pub fn unpaged_sorted(sort: Sort) -> Self {
        Pageable::Unpaged { sort }
    }

    /// Unsorted page request. `size` must be at least one.
    pub fn of(page: usize, size: usize) -> Result<Self> {
        Self::of_sorted(page, size, Sort::unsorted())
    }

    /// Sorted page request. `size` must be at least one.
    pub fn of_sorted(page: usize, size: usize, sort: Sort) -> Result<Self> {
        if size == 0 {
            return Err(QueryError::InvalidArgument(
                "page size must not be less than one".into(),
            ));
        }
        Ok(Pageable::Paged(PageRequest { page, size, sort }))
    }

    /// Whether this is a concrete page request.
    pub fn is_paged(&self) -> bool {
        matches!(self, Pageable::Paged(_))
    }

    /// Zero-based page number (0 when unpaged).
    pub fn page_number(&self) -> usize {
        match self {
            Pageable::Paged(request) => request.page,
            Pageable::Unpaged { .. } => 0,
        }
    }

    /// Page size, if paged.
    pub fn page_size(&self) -> Option<usize> {
        match self {
            Pageable::Paged(request) => Some(request.size),
            Pageable::Unpaged { .. } => None,
        }
    }

    /// Offset of the first element of the page.
    pub fn offset(&self) -> u64 {
        match self {
            Pageable::Paged(request) => (request.page as u64).saturating_mul(request.size as u64),
            Pageable::Unpaged { .. } => 0,
        }
    }

    /// Sort attached to the request.
    pub fn sort(&self) -> &Sort {
        match self {
            Pageable::Paged(request) => &request.sort,
            Pageable::Unpaged { sort } => sort,
        }
    }

    /// Limit implied by the page size.
    pub fn to_limit(&self) -> Limit {
        self.page_size().map(Limit::of).unwrap_or(Limit::Unlimited)
    }

    /// Request for the following page; unpaged requests are returned as-is.
    pub fn next(&self) -> Self {
        match self {
            Pageable::Paged(request) => Pageable::Paged(PageRequest {
                page: request.page.saturating_add(1),
                size: request.size,
                sort: request.sort.clone(),
            }),
            unpaged => unpaged.clone(),
        }
    }
}

impl fmt::Display for Pageable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Pageable::Paged(request) => write!(
                f,
                "Page request [number: {}, size {}, sort: {}]",
                request.page, request.size, request.sort
            ),
            Pageable::Unpaged { .. } => f.write_str("UNPAGED"),
        }
    }
}
