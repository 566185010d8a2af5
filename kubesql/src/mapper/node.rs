use crate::error::SyncResult;
use crate::mapper::base::{RowMapper, timestamp_cell};
use crate::source::Node;
use crate::types::{Cell, ColumnSchema, ColumnType, TableName, TableRow, TableSchema};

/// Schema of the `node` table.
pub fn node_table_schema() -> TableSchema {
    TableSchema::new(
        TableName::from("node"),
        vec![
            ColumnSchema::new("uid", ColumnType::Text, false, true),
            ColumnSchema::new("name", ColumnType::Text, false, true),
            ColumnSchema::new("namespace", ColumnType::Text, true, false),
            ColumnSchema::new("free_memory", ColumnType::I64, false, false),
            ColumnSchema::new("free_cpu", ColumnType::I64, false, false),
            ColumnSchema::new("free_disk", ColumnType::I64, false, false),
            ColumnSchema::new("capacity_memory", ColumnType::I64, false, false),
            ColumnSchema::new("capacity_cpu", ColumnType::I64, false, false),
            ColumnSchema::new("capacity_disk", ColumnType::I64, false, false),
            ColumnSchema::new("created_at", ColumnType::TimestampTz, true, false),
        ],
    )
}

/// One row per node, carrying allocatable and capacity amounts.
#[derive(Debug, Clone, Copy, Default)]
pub struct NodeMapper;

impl RowMapper for NodeMapper {
    type Source = Node;

    async fn project(&self, node: &Node) -> SyncResult<Vec<TableRow>> {
        Ok(vec![TableRow::new(vec![
            Cell::from(node.meta.uid.as_str()),
            Cell::from(node.meta.name.as_str()),
            Cell::from(node.meta.namespace.as_str()),
            Cell::from(node.status.allocatable.memory),
            Cell::from(node.status.allocatable.cpu_millis),
            Cell::from(node.status.allocatable.ephemeral_storage),
            Cell::from(node.status.capacity.memory),
            Cell::from(node.status.capacity.cpu_millis),
            Cell::from(node.status.capacity.ephemeral_storage),
            timestamp_cell(node.meta.created_at),
        ])])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{NodeStatus, ObjectMeta, ResourceQuantities};

    #[tokio::test]
    async fn projects_allocatable_and_capacity() {
        let node = Node {
            meta: ObjectMeta {
                uid: "n1".into(),
                name: "node-a".into(),
                ..Default::default()
            },
            status: NodeStatus {
                allocatable: ResourceQuantities {
                    memory: 1024,
                    cpu_millis: 2000,
                    ephemeral_storage: 4096,
                },
                capacity: ResourceQuantities {
                    memory: 2048,
                    cpu_millis: 4000,
                    ephemeral_storage: 8192,
                },
            },
        };

        let rows = NodeMapper.project(&node).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].values[3], Cell::from(1024_i64));
        assert_eq!(rows[0].values[6], Cell::from(2048_i64));
    }
}
