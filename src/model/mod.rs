//! Page view types.
//!
//! A [`Page`] is built from an analyzed [`crate::Image`] datapoint and
//! exposes its annotation graph as nested layouts, tables, cells and words.

mod page;
mod table;
mod word;

pub use page::{Block, Layout, Page};
pub use table::{Cell, Table};
pub use word::Word;

pub(crate) use word::reading_cmp;
