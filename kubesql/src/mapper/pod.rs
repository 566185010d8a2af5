use crate::error::SyncResult;
use crate::mapper::base::{RowMapper, deployment_from_pod_name, timestamp_cell};
use crate::source::Pod;
use crate::types::{Cell, ColumnSchema, ColumnType, TableName, TableRow, TableSchema};

/// Schema of the `pod` table.
pub fn pod_table_schema() -> TableSchema {
    TableSchema::new(
        TableName::from("pod"),
        vec![
            ColumnSchema::new("uid", ColumnType::Text, false, true),
            ColumnSchema::new("name", ColumnType::Text, false, true),
            ColumnSchema::new("namespace", ColumnType::Text, false, false),
            ColumnSchema::new("application", ColumnType::Text, true, false),
            ColumnSchema::new("deployment", ColumnType::Text, true, false),
            ColumnSchema::new("node", ColumnType::Text, true, false),
            ColumnSchema::new("ip", ColumnType::Text, true, false),
            ColumnSchema::new("created_at", ColumnType::TimestampTz, true, false),
        ],
    )
}

/// One row per pod.
#[derive(Debug, Clone, Copy, Default)]
pub struct PodMapper;

impl RowMapper for PodMapper {
    type Source = Pod;

    async fn project(&self, pod: &Pod) -> SyncResult<Vec<TableRow>> {
        Ok(vec![pod_row(pod)])
    }
}

fn pod_row(pod: &Pod) -> TableRow {
    TableRow::new(vec![
        Cell::from(pod.meta.uid.as_str()),
        Cell::from(pod.meta.name.as_str()),
        Cell::from(pod.meta.namespace.as_str()),
        Cell::from(pod.meta.label("app")),
        Cell::from(deployment_from_pod_name(&pod.meta.name)),
        Cell::from(pod.spec.node_name.as_str()),
        Cell::from(pod.status.pod_ip.as_str()),
        timestamp_cell(pod.meta.created_at),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{ObjectMeta, PodSpec, PodStatus};
    use chrono::{TimeZone, Utc};
    use std::collections::BTreeMap;

    #[test]
    fn schema_keys_on_uid_and_name() {
        let schema = pod_table_schema();
        assert!(schema.has_primary_keys());
        let keys = schema
            .columns
            .iter()
            .filter(|c| c.primary)
            .map(|c| c.name.as_str())
            .collect::<Vec<_>>();
        assert_eq!(keys, vec!["uid", "name"]);
    }

    #[tokio::test]
    async fn projects_one_row_per_pod() {
        let mut labels = BTreeMap::new();
        labels.insert("app".to_string(), "web".to_string());

        let pod = Pod {
            meta: ObjectMeta {
                uid: "u1".into(),
                name: "web-frontend-7d9c5b-x2ftq".into(),
                namespace: "prod".into(),
                labels,
                created_at: Some(Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()),
            },
            spec: PodSpec {
                node_name: "node-a".into(),
                ..Default::default()
            },
            status: PodStatus {
                pod_ip: "10.0.0.7".into(),
            },
        };

        let rows = PodMapper.project(&pod).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].values[0], Cell::from("u1"));
        assert_eq!(rows[0].values[3], Cell::from("web"));
        assert_eq!(rows[0].values[4], Cell::from("web-frontend"));
        assert_eq!(rows[0].values[5], Cell::from("node-a"));
    }

    #[tokio::test]
    async fn missing_label_projects_as_empty() {
        let pod = Pod {
            meta: ObjectMeta {
                uid: "u2".into(),
                name: "solo".into(),
                ..Default::default()
            },
            ..Default::default()
        };

        let rows = PodMapper.project(&pod).await.unwrap();
        assert_eq!(rows[0].values[3], Cell::from(""));
        assert_eq!(rows[0].values[4], Cell::from(""));
        assert_eq!(rows[0].values[7], Cell::Null);
    }
}
