use chrono::{DateTime, Utc};
use std::future::Future;

use crate::error::SyncResult;
use crate::types::{Cell, TableRow};

/// Projects one source object into the rows it contributes to a table.
///
/// Projection must be deterministic for a given source object and cluster
/// state. Mappers that resolve cross-references are the only ones performing
/// I/O; the rest compute rows purely from the object.
pub trait RowMapper: Send + Sync {
    type Source: Send + Sync;

    fn project(
        &self,
        source: &Self::Source,
    ) -> impl Future<Output = SyncResult<Vec<TableRow>>> + Send;
}

/// Converts an optional creation timestamp into a cell, null when absent.
pub(crate) fn timestamp_cell(ts: Option<DateTime<Utc>>) -> Cell {
    ts.map(Cell::TimestampTz).unwrap_or(Cell::Null)
}

/// Derives the deployment name from a pod name.
///
/// Pod names minted by a deployment end in a replica-set hash and a pod hash,
/// so the deployment is the name minus its trailing two dash-separated
/// tokens. Names with fewer than three tokens yield an empty string.
pub(crate) fn deployment_from_pod_name(name: &str) -> String {
    let tokens = name.split('-').collect::<Vec<_>>();
    if tokens.len() < 3 {
        return String::new();
    }

    tokens[..tokens.len() - 2].join("-")
}
