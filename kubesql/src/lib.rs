//! Mirrors live cluster state into queryable in-memory relational tables.
//!
//! Watch-sourced resource objects (pods, nodes, endpoints, usage samples) are
//! projected into per-kind tables as they change, and traffic metrics are
//! polled on an interval into a snapshot table. See
//! [`ClusterPipeline`](pipeline::ClusterPipeline) for the entry point.

pub mod adapter;
pub mod concurrency;
pub mod error;
mod macros;
pub mod mapper;
pub mod metrics;
pub mod pipeline;
pub mod registry;
pub mod source;
pub mod store;
pub mod types;
pub mod workers;
