use tracing::warn;

use crate::error::SyncResult;
use crate::mapper::base::{RowMapper, timestamp_cell};
use crate::source::{ClusterClient, Pod};
use crate::types::{Cell, ColumnSchema, ColumnType, TableName, TableRow, TableSchema};

/// Schema of the `affinity` table.
pub fn affinity_table_schema() -> TableSchema {
    TableSchema::new(
        TableName::from("affinity"),
        vec![
            ColumnSchema::new("uid", ColumnType::Text, false, true),
            ColumnSchema::new("name", ColumnType::Text, false, true),
            ColumnSchema::new("namespace", ColumnType::Text, false, false),
            ColumnSchema::new("weight", ColumnType::I32, false, false),
            ColumnSchema::new("affinity", ColumnType::Text, false, true),
            ColumnSchema::new("created_at", ColumnType::TimestampTz, true, false),
        ],
    )
}

/// One row per preferred pod-affinity term and matched pod.
///
/// Each term's label selector is resolved through the cluster client. A pod
/// without affinity projects zero rows. A lookup failure for one term is
/// logged and skipped so the remaining terms still project.
#[derive(Debug, Clone)]
pub struct AffinityMapper<C: ClusterClient> {
    cluster: C,
}

impl<C: ClusterClient> AffinityMapper<C> {
    pub fn new(cluster: C) -> Self {
        Self { cluster }
    }
}

impl<C: ClusterClient> RowMapper for AffinityMapper<C> {
    type Source = Pod;

    async fn project(&self, pod: &Pod) -> SyncResult<Vec<TableRow>> {
        let Some(pod_affinity) = pod
            .spec
            .affinity
            .as_ref()
            .and_then(|a| a.pod_affinity.as_ref())
        else {
            return Ok(Vec::new());
        };

        let mut rows = Vec::new();
        for term in &pod_affinity.preferred {
            let matched = match self.cluster.list_pods(&term.label_selector).await {
                Ok(matched) => matched,
                Err(err) => {
                    warn!(
                        pod = %pod.meta.name,
                        error = %err,
                        "pod lookup for affinity term failed, skipping term"
                    );
                    continue;
                }
            };

            for matched_pod in matched {
                rows.push(TableRow::new(vec![
                    Cell::from(pod.meta.uid.as_str()),
                    Cell::from(pod.meta.name.as_str()),
                    Cell::from(pod.meta.namespace.as_str()),
                    Cell::from(term.weight),
                    Cell::from(matched_pod.meta.name.as_str()),
                    timestamp_cell(pod.meta.created_at),
                ]));
            }
        }

        Ok(rows)
    }
}
