//! Pull-side metrics input.
//!
//! The poll loop runs a configurable set of [`MetricQuery`]s through a
//! [`MetricsClient`] and feeds the decoded [`PromQueryResponse`]s to the
//! traffic mapper.

mod client;
mod prom;
mod queries;

pub use client::*;
pub use prom::*;
pub use queries::*;
