use crate::error::SyncResult;
use crate::mapper::base::{RowMapper, timestamp_cell};
use crate::source::PodMetrics;
use crate::types::{Cell, ColumnSchema, ColumnType, TableName, TableRow, TableSchema};

/// Schema of the `pod_metrics` table.
pub fn pod_metrics_table_schema() -> TableSchema {
    TableSchema::new(
        TableName::from("pod_metrics"),
        vec![
            ColumnSchema::new("pod", ColumnType::Text, false, true),
            ColumnSchema::new("container", ColumnType::Text, false, true),
            ColumnSchema::new("namespace", ColumnType::Text, false, false),
            ColumnSchema::new("window", ColumnType::I64, false, false),
            ColumnSchema::new("usage_memory", ColumnType::I64, false, false),
            ColumnSchema::new("usage_cpu", ColumnType::I64, false, false),
            ColumnSchema::new("usage_disk", ColumnType::I64, false, false),
            ColumnSchema::new("created_at", ColumnType::TimestampTz, true, false),
        ],
    )
}

/// One row per container usage sample of a pod metrics object.
#[derive(Debug, Clone, Copy, Default)]
pub struct PodMetricsMapper;

impl RowMapper for PodMetricsMapper {
    type Source = PodMetrics;

    async fn project(&self, metrics: &PodMetrics) -> SyncResult<Vec<TableRow>> {
        Ok(metrics
            .containers
            .iter()
            .map(|container| {
                TableRow::new(vec![
                    Cell::from(metrics.name.as_str()),
                    Cell::from(container.name.as_str()),
                    Cell::from(metrics.namespace.as_str()),
                    Cell::from(metrics.window_ms),
                    Cell::from(container.usage.memory),
                    Cell::from(container.usage.cpu_millis),
                    Cell::from(container.usage.ephemeral_storage),
                    timestamp_cell(metrics.created_at),
                ])
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{ContainerMetrics, ResourceQuantities};

    #[tokio::test]
    async fn one_row_per_container_sample() {
        let metrics = PodMetrics {
            name: "web-1".into(),
            namespace: "prod".into(),
            window_ms: 30_000,
            created_at: None,
            containers: vec![
                ContainerMetrics {
                    name: "c1".into(),
                    usage: ResourceQuantities {
                        memory: 100,
                        cpu_millis: 10,
                        ephemeral_storage: 0,
                    },
                },
                ContainerMetrics {
                    name: "c2".into(),
                    ..Default::default()
                },
            ],
        };

        let rows = PodMetricsMapper.project(&metrics).await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].values[0], Cell::from("web-1"));
        assert_eq!(rows[0].values[3], Cell::from(30_000_i64));
        assert_eq!(rows[0].values[4], Cell::from(100_i64));
        assert_eq!(rows[1].values[4], Cell::from(0_i64));
    }
}
