//! Table storage backends.
//!
//! The engine writes through the [`TableStore`] and [`StoreTable`] traits so
//! that the relational backend stays swappable. [`MemoryTableStore`] is the
//! bundled in-memory implementation.

mod base;
mod memory;

pub use base::*;
pub use memory::*;
