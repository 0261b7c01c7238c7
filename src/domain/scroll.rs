use std::collections::BTreeMap;

use crate::domain::sort::Direction;
use crate::value::Value;

/// Position to resume scrolling from.
#[derive(Clone, Debug, PartialEq)]
pub enum ScrollPosition {
    /// Offset-based position. `None` is the initial position.
    Offset(Option<u64>),
    /// Keyset-based position over the sort keys of the last element.
    Keyset {
        /// Key values of the boundary element.
        keys: BTreeMap<String, Value>,
        /// Scroll direction.
        direction: Direction,
    },
}

impl ScrollPosition {
    /// Initial offset position.
    pub fn initial() -> Self {
        ScrollPosition::Offset(None)
    }

    /// Offset position past `offset` elements.
    pub fn offset(offset: u64) -> Self {
        ScrollPosition::Offset(Some(offset))
    }

    /// Forward keyset position.
    pub fn forward(keys: BTreeMap<String, Value>) -> Self {
        ScrollPosition::Keyset {
            keys,
            direction: Direction::Asc,
        }
    }

    /// Whether this position starts at the beginning.
    pub fn is_initial(&self) -> bool {
        match self {
            ScrollPosition::Offset(offset) => offset.is_none(),
            ScrollPosition::Keyset { keys, .. } => keys.is_empty(),
        }
    }
}

impl Default for ScrollPosition {
    fn default() -> Self {
        Self::initial()
    }
}

/// A chunk of scroll results with one resume position per element.
#[derive(Clone, Debug, PartialEq)]
pub struct Window<T> {
    content: Vec<T>,
    positions: Vec<ScrollPosition>,
    has_next: bool,
}

impl<T> Window<T> {
    /// Builds a window, computing each element's position with `position`.
    pub fn from<F>(content: Vec<T>, mut position: F, has_next: bool) -> Self
    where
        F: FnMut(usize) -> ScrollPosition,
    {
        let positions = (0..content.len()).map(&mut position).collect();
        Self {
            content,
            positions,
            has_next,
        }
    }

    /// Elements of the window.
    pub fn content(&self) -> &[T] {
        &self.content
    }

    /// Consumes the window, returning its elements.
    pub fn into_content(self) -> Vec<T> {
        self.content
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.content.len()
    }

    /// Whether the window is empty.
    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    /// Whether more elements follow.
    pub fn has_next(&self) -> bool {
        self.has_next
    }

    /// Whether this is the last window.
    pub fn is_last(&self) -> bool {
        !self.has_next
    }

    /// Resume position after the element at `index`.
    pub fn position_at(&self, index: usize) -> Option<&ScrollPosition> {
        self.positions.get(index)
    }

    /// Maps each element, keeping positions and the has-next flag.
    pub fn try_map<U, E, F>(self, f: F) -> Result<Window<U>, E>
    where
        F: FnMut(T) -> Result<U, E>,
    {
        let content = self.content.into_iter().map(f).collect::<Result<Vec<_>, _>>()?;
        Ok(Window {
            content,
            positions: self.positions,
            has_next: self.has_next,
        })
    }
}
