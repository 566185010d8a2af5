use crate::error::SyncResult;
use crate::mapper::base::{RowMapper, timestamp_cell};
use crate::source::Pod;
use crate::types::{Cell, ColumnSchema, ColumnType, TableName, TableRow, TableSchema};

/// Schema of the `container` table.
pub fn container_table_schema() -> TableSchema {
    TableSchema::new(
        TableName::from("container"),
        vec![
            ColumnSchema::new("pod_uid", ColumnType::Text, false, true),
            ColumnSchema::new("pod", ColumnType::Text, false, true),
            ColumnSchema::new("namespace", ColumnType::Text, false, false),
            ColumnSchema::new("container", ColumnType::Text, false, true),
            ColumnSchema::new("limit_memory", ColumnType::I64, false, false),
            ColumnSchema::new("limit_cpu", ColumnType::I64, false, false),
            ColumnSchema::new("limit_disk", ColumnType::I64, false, false),
            ColumnSchema::new("request_memory", ColumnType::I64, false, false),
            ColumnSchema::new("request_cpu", ColumnType::I64, false, false),
            ColumnSchema::new("request_disk", ColumnType::I64, false, false),
            ColumnSchema::new("created_at", ColumnType::TimestampTz, true, false),
        ],
    )
}

/// One row per container of a pod.
///
/// Absent resource limits and requests project as zero.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContainerMapper;

impl RowMapper for ContainerMapper {
    type Source = Pod;

    async fn project(&self, pod: &Pod) -> SyncResult<Vec<TableRow>> {
        Ok(pod
            .spec
            .containers
            .iter()
            .map(|container| {
                TableRow::new(vec![
                    Cell::from(pod.meta.uid.as_str()),
                    Cell::from(pod.meta.name.as_str()),
                    Cell::from(pod.meta.namespace.as_str()),
                    Cell::from(container.name.as_str()),
                    Cell::from(container.resources.limits.memory),
                    Cell::from(container.resources.limits.cpu_millis),
                    Cell::from(container.resources.limits.ephemeral_storage),
                    Cell::from(container.resources.requests.memory),
                    Cell::from(container.resources.requests.cpu_millis),
                    Cell::from(container.resources.requests.ephemeral_storage),
                    timestamp_cell(pod.meta.created_at),
                ])
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{Container, ObjectMeta, PodSpec, ResourceQuantities, ResourceRequirements};

    fn pod_with_containers(containers: Vec<Container>) -> Pod {
        Pod {
            meta: ObjectMeta {
                uid: "u1".into(),
                name: "web-1".into(),
                namespace: "prod".into(),
                ..Default::default()
            },
            spec: PodSpec {
                containers,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn one_row_per_container_sharing_pod_identity() {
        let pod = pod_with_containers(vec![
            Container {
                name: "c1".into(),
                resources: ResourceRequirements {
                    limits: ResourceQuantities {
                        memory: 100,
                        cpu_millis: 50,
                        ephemeral_storage: 0,
                    },
                    ..Default::default()
                },
            },
            Container {
                name: "c2".into(),
                ..Default::default()
            },
        ]);

        let rows = ContainerMapper.project(&pod).await.unwrap();
        assert_eq!(rows.len(), 2);
        for row in &rows {
            assert_eq!(row.values[0], Cell::from("u1"));
            assert_eq!(row.values[1], Cell::from("web-1"));
        }
        assert_eq!(rows[0].values[4], Cell::from(100_i64));
        assert_eq!(rows[0].values[5], Cell::from(50_i64));
        // Absent resources default to zero.
        assert_eq!(rows[1].values[4], Cell::from(0_i64));
        assert_eq!(rows[1].values[7], Cell::from(0_i64));
    }

    #[tokio::test]
    async fn pod_without_containers_projects_zero_rows() {
        let pod = pod_with_containers(vec![]);
        let rows = ContainerMapper.project(&pod).await.unwrap();
        assert!(rows.is_empty());
    }
}
