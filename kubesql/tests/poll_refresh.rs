use std::time::Duration;
use tokio::time::sleep;

use kubesql::metrics::{
    MetricQuery, MetricsClient, PromLabels, PromQueryData, PromQueryResponse, PromQueryResult,
};
use kubesql::pipeline::ClusterPipeline;
use kubesql::store::{MemoryTableStore, TableStore};
use kubesql::types::{Cell, TableName};
use kubesql_telemetry::init_test_tracing;

/// A metrics endpoint returning one series per query, tagged with the query
/// name so rows can be traced back to their origin.
#[derive(Clone)]
struct OneSeriesClient;

impl MetricsClient for OneSeriesClient {
    async fn query(&self, query: &MetricQuery) -> kubesql::error::SyncResult<PromQueryResponse> {
        Ok(PromQueryResponse {
            metric_name: query.name.clone(),
            status: "success".into(),
            data: PromQueryData {
                result_type: "vector".into(),
                result: vec![PromQueryResult {
                    metric: PromLabels {
                        source_workload: "web".into(),
                        destination_workload: "api".into(),
                        response_code: "200".into(),
                        ..Default::default()
                    },
                    value: vec![serde_json::json!(0.0), serde_json::json!("2.5")],
                }],
            },
        })
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn traffic_table_is_rebuilt_every_cycle() {
    init_test_tracing();

    let store = MemoryTableStore::new();
    let mut pipeline = ClusterPipeline::new(store.clone());

    let queries = vec![
        MetricQuery::new("http_request", "rate(istio_requests_total[5m])"),
        MetricQuery::new("duration", "histogram_quantile(.50, x)"),
    ];
    let adapter = pipeline
        .add_traffic_table(OneSeriesClient, queries, Duration::from_millis(50))
        .await
        .unwrap();

    let traffic = TableName::from("traffic");
    assert!(pipeline.registry().contains(&traffic).await);

    // Let at least two full cycles complete.
    while adapter.generation() < 2 {
        sleep(Duration::from_millis(10)).await;
    }

    let table = store.table(&traffic).await.unwrap();
    let rows = table.rows().await;
    // Each cycle fully replaces the snapshot, so the row count stays at one
    // row per query regardless of how many cycles ran.
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].values[8], Cell::from(200_i32));
    assert_eq!(rows[0].values[9], Cell::from(-1_i32));

    let generation_before_shutdown = adapter.generation();
    pipeline.shutdown_and_wait().await.unwrap();
    assert!(adapter.generation() >= generation_before_shutdown);
}
