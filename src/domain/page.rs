use crate::domain::pageable::Pageable;

/// A chunk of results that knows whether more data follows.
#[derive(Clone, Debug, PartialEq)]
pub struct Slice<T> {
    content: Vec<T>,
    pageable: Pageable,
    has_next: bool,
}

impl<T> Slice<T> {
    /// Creates a slice.
    pub fn new(content: Vec<T>, pageable: Pageable, has_next: bool) -> Self {
        Self {
            content,
            pageable,
            has_next,
        }
    }

    /// Elements of the slice.
    pub fn content(&self) -> &[T] {
        &self.content
    }

    /// Consumes the slice, returning its elements.
    pub fn into_content(self) -> Vec<T> {
        self.content
    }

    /// Request that produced the slice.
    pub fn pageable(&self) -> &Pageable {
        &self.pageable
    }

    /// Number of elements in this slice.
    pub fn number_of_elements(&self) -> usize {
        self.content.len()
    }

    /// Whether another slice follows.
    pub fn has_next(&self) -> bool {
        self.has_next
    }

    /// Maps each element, keeping the request and the has-next flag.
    pub fn try_map<U, E, F>(self, f: F) -> Result<Slice<U>, E>
    where
        F: FnMut(T) -> Result<U, E>,
    {
        let content = self.content.into_iter().map(f).collect::<Result<Vec<_>, _>>()?;
        Ok(Slice {
            content,
            pageable: self.pageable,
            has_next: self.has_next,
        })
    }
}

/// A slice that also knows the total number of elements.
#[derive(Clone, Debug, PartialEq)]
pub struct Page<T> {
    content: Vec<T>,
    pageable: Pageable,
    total: u64,
}

impl<T> Page<T> {
    /// Creates a page. The total is raised when the content proves that
    /// more elements exist than reported.
    pub fn new(content: Vec<T>, pageable: Pageable, total: u64) -> Self {
        let total = match pageable.page_size() {
            Some(size) if !content.is_empty() && pageable.offset().saturating_add(size as u64) > total => {
                pageable.offset().saturating_add(content.len() as u64)
            }
            Some(_) => total,
            None => total.max(content.len() as u64),
        };
        Self {
            content,
            pageable,
            total,
        }
    }

    /// Elements of the page.
    pub fn content(&self) -> &[T] {
        &self.content
    }

    /// Consumes the page, returning its elements.
    pub fn into_content(self) -> Vec<T> {
        self.content
    }

    /// Request that produced the page.
    pub fn pageable(&self) -> &Pageable {
        &self.pageable
    }

    /// Total number of elements across all pages.
    pub fn total_elements(&self) -> u64 {
        self.total
    }

    /// Total number of pages.
    pub fn total_pages(&self) -> u64 {
        match self.pageable.page_size() {
            Some(size) => self.total.div_ceil(size as u64),
            None => 1,
        }
    }

    /// Number of elements in this page.
    pub fn number_of_elements(&self) -> usize {
        self.content.len()
    }

    /// Whether another page follows.
    pub fn has_next(&self) -> bool {
        (self.pageable.page_number() as u64).saturating_add(1) < self.total_pages()
    }

    /// Maps each element, keeping the request and the total.
    pub fn try_map<U, E, F>(self, f: F) -> Result<Page<U>, E>
    where
        F: FnMut(T) -> Result<U, E>,
    {
        let content = self.content.into_iter().map(f).collect::<Result<Vec<_>, _>>()?;
        Ok(Page {
            content,
            pageable: self.pageable,
            total: self.total,
        })
    }
}
