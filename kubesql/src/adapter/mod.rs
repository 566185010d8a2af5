//! Adapters between projected rows and store tables.
//!
//! [`SyncTableAdapter`] applies watch events as row deltas to a live table,
//! [`SnapshotTableAdapter`] rebuilds a poll-driven table wholesale and swaps
//! it in atomically.

mod snapshot;
mod sync_table;

pub use snapshot::*;
pub use sync_table::*;
