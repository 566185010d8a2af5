//! Cluster-facing inputs of the sync engine.
//!
//! A [`WatchSource`] pushes typed [`ResourceEvent`]s for one resource kind,
//! and a [`ClusterClient`] answers the ad-hoc listing queries some mappers
//! need. The resource structs mirror the subset of the cluster API the
//! mappers project into tables.

mod base;
mod channel;
mod cluster;
mod resources;
mod selector;

pub use base::*;
pub use channel::*;
pub use cluster::*;
pub use resources::*;
pub use selector::*;
