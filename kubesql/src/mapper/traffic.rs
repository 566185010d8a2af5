use crate::metrics::PromQueryResponse;
use crate::types::{Cell, ColumnSchema, ColumnType, TableName, TableRow, TableSchema};

/// Schema of the `traffic` table.
///
/// Unlike the watch-driven tables, traffic rows are samples without a stable
/// identity, so the table carries no primary keys and is rebuilt wholesale on
/// every poll cycle.
pub fn traffic_table_schema() -> TableSchema {
    TableSchema::new(
        TableName::from("traffic"),
        vec![
            ColumnSchema::new("src_deployment", ColumnType::Text, false, false),
            ColumnSchema::new("src_namespace", ColumnType::Text, false, false),
            ColumnSchema::new("dst_deployment", ColumnType::Text, false, false),
            ColumnSchema::new("dst_pod", ColumnType::Text, false, false),
            ColumnSchema::new("dst_instance", ColumnType::Text, false, false),
            ColumnSchema::new("dst_service", ColumnType::Text, false, false),
            ColumnSchema::new("dst_namespace", ColumnType::Text, false, false),
            ColumnSchema::new("protocol", ColumnType::Text, false, false),
            ColumnSchema::new("http_status_code", ColumnType::I32, false, false),
            ColumnSchema::new("grpc_status_code", ColumnType::I32, false, false),
            ColumnSchema::new("metric", ColumnType::Text, false, false),
            ColumnSchema::new("value", ColumnType::F64, false, false),
        ],
    )
}

/// Projects a decoded query response into traffic rows, one per series.
pub fn traffic_rows(response: &PromQueryResponse) -> Vec<TableRow> {
    response
        .data
        .result
        .iter()
        .map(|result| {
            TableRow::new(vec![
                Cell::from(result.metric.source_workload.as_str()),
                Cell::from(result.metric.source_workload_namespace.as_str()),
                Cell::from(result.metric.destination_workload.as_str()),
                Cell::from(result.metric.pod.as_str()),
                Cell::from(result.metric.instance.as_str()),
                Cell::from(result.metric.destination_service_name.as_str()),
                Cell::from(result.metric.destination_workload_namespace.as_str()),
                Cell::from(result.metric.request_protocol.as_str()),
                Cell::from(result.metric.http_status_code()),
                Cell::from(result.metric.grpc_status_code()),
                Cell::from(response.metric_name.as_str()),
                Cell::from(result.value_as_f64()),
            ])
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::{PromLabels, PromQueryData, PromQueryResult};

    fn response_with(results: Vec<PromQueryResult>) -> PromQueryResponse {
        PromQueryResponse {
            metric_name: "http_request".into(),
            status: "success".into(),
            data: PromQueryData {
                result_type: "vector".into(),
                result: results,
            },
        }
    }

    #[test]
    fn one_row_per_series_with_casts() {
        let response = response_with(vec![PromQueryResult {
            metric: PromLabels {
                source_workload: "web".into(),
                source_workload_namespace: "prod".into(),
                destination_workload: "api".into(),
                pod: "api-6f7d9c-x2ftq".into(),
                request_protocol: "http".into(),
                response_code: "200".into(),
                ..Default::default()
            },
            value: vec![serde_json::json!(1714567890.0), serde_json::json!("3.5")],
        }]);

        let rows = traffic_rows(&response);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].values[0], Cell::from("web"));
        assert_eq!(rows[0].values[8], Cell::from(200_i32));
        // No gRPC status label on an HTTP series.
        assert_eq!(rows[0].values[9], Cell::from(-1_i32));
        assert_eq!(rows[0].values[10], Cell::from("http_request"));
        assert_eq!(rows[0].values[11], Cell::from(3.5_f64));
    }

    #[test]
    fn empty_result_projects_zero_rows() {
        let rows = traffic_rows(&response_with(vec![]));
        assert!(rows.is_empty());
    }
}
