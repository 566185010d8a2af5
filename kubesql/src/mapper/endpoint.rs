use crate::error::SyncResult;
use crate::mapper::base::{RowMapper, timestamp_cell};
use crate::source::Endpoints;
use crate::types::{Cell, ColumnSchema, ColumnType, TableName, TableRow, TableSchema};

/// Schema of the `endpoint` table.
pub fn endpoint_table_schema() -> TableSchema {
    TableSchema::new(
        TableName::from("endpoint"),
        vec![
            ColumnSchema::new("uid", ColumnType::Text, false, true),
            ColumnSchema::new("name", ColumnType::Text, false, true),
            ColumnSchema::new("namespace", ColumnType::Text, false, false),
            ColumnSchema::new("hostname", ColumnType::Text, true, false),
            ColumnSchema::new("ip", ColumnType::Text, false, false),
            ColumnSchema::new("portname", ColumnType::Text, true, false),
            ColumnSchema::new("port", ColumnType::I32, false, false),
            ColumnSchema::new("created_at", ColumnType::TimestampTz, true, false),
        ],
    )
}

/// One row per address and port combination within each subset.
#[derive(Debug, Clone, Copy, Default)]
pub struct EndpointMapper;

impl RowMapper for EndpointMapper {
    type Source = Endpoints;

    async fn project(&self, endpoints: &Endpoints) -> SyncResult<Vec<TableRow>> {
        let mut rows = Vec::new();
        for subset in &endpoints.subsets {
            for address in &subset.addresses {
                for port in &subset.ports {
                    rows.push(TableRow::new(vec![
                        Cell::from(endpoints.meta.uid.as_str()),
                        Cell::from(endpoints.meta.name.as_str()),
                        Cell::from(endpoints.meta.namespace.as_str()),
                        Cell::from(address.hostname.as_str()),
                        Cell::from(address.ip.as_str()),
                        Cell::from(port.name.as_str()),
                        Cell::from(port.port),
                        timestamp_cell(endpoints.meta.created_at),
                    ]));
                }
            }
        }

        Ok(rows)
    }
}
