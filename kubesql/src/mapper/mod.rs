//! Projection of cluster objects into table rows.
//!
//! Each resource kind has a [`RowMapper`] that turns one source object into
//! the rows it contributes to its table. One-to-one kinds yield a single row,
//! fan-out kinds (containers, endpoints, affinity terms) yield several, and
//! the cross-reference mappers resolve selector terms through a
//! [`ClusterClient`](crate::source::ClusterClient) while projecting.

mod affinity;
mod base;
mod container;
mod endpoint;
mod node;
mod node_affinity;
mod node_metrics;
mod pod;
mod pod_metrics;
mod traffic;

pub use affinity::*;
pub use base::*;
pub use container::*;
pub use endpoint::*;
pub use node::*;
pub use node_affinity::*;
pub use node_metrics::*;
pub use pod::*;
pub use pod_metrics::*;
pub use traffic::*;
