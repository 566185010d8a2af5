use crate::error::SyncResult;
use crate::mapper::base::{RowMapper, timestamp_cell};
use crate::source::NodeMetrics;
use crate::types::{Cell, ColumnSchema, ColumnType, TableName, TableRow, TableSchema};

/// Schema of the `node_metrics` table.
pub fn node_metrics_table_schema() -> TableSchema {
    TableSchema::new(
        TableName::from("node_metrics"),
        vec![
            ColumnSchema::new("name", ColumnType::Text, false, true),
            ColumnSchema::new("namespace", ColumnType::Text, true, false),
            ColumnSchema::new("window", ColumnType::I64, false, false),
            ColumnSchema::new("usage_memory", ColumnType::I64, false, false),
            ColumnSchema::new("usage_cpu", ColumnType::I64, false, false),
            ColumnSchema::new("usage_disk", ColumnType::I64, false, false),
            ColumnSchema::new("created_at", ColumnType::TimestampTz, true, false),
        ],
    )
}

/// One row per node usage sample.
#[derive(Debug, Clone, Copy, Default)]
pub struct NodeMetricsMapper;

impl RowMapper for NodeMetricsMapper {
    type Source = NodeMetrics;

    async fn project(&self, metrics: &NodeMetrics) -> SyncResult<Vec<TableRow>> {
        Ok(vec![TableRow::new(vec![
            Cell::from(metrics.name.as_str()),
            // Node metrics are cluster scoped.
            Cell::from(""),
            Cell::from(metrics.window_ms),
            Cell::from(metrics.usage.memory),
            Cell::from(metrics.usage.cpu_millis),
            Cell::from(metrics.usage.ephemeral_storage),
            timestamp_cell(metrics.created_at),
        ])])
    }
}
