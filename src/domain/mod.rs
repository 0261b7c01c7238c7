//! Paging, sorting, scrolling and scoring value types exchanged between
//! callers, the parameter accessor and the result processor.

mod page;
mod pageable;
mod score;
mod scroll;
mod sort;

pub use page::{Page, Slice};
pub use pageable::{Limit, PageRequest, Pageable};
pub use score::{Score, ScoreRange, Vector};
pub use scroll::{ScrollPosition, Window};
pub use sort::{Direction, NullHandling, Order, Sort};
