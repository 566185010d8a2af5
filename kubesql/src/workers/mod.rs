//! Long-running sync loops.
//!
//! A [`WatchWorker`](crate::workers::WatchWorker) drives one watch-sourced
//! table, a [`PollWorker`](crate::workers::PollWorker) drives one poll-driven
//! table. Both implement the [`Worker`]/[`WorkerHandle`] pattern and stop on
//! the shared shutdown signal.

mod base;
mod poll;
mod watch;

pub use base::*;
pub use poll::*;
pub use watch::*;
