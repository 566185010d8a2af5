/*

Cluster Sync Example

This example wires scripted watch sources and a canned metrics client into
the in-memory store and prints the resulting tables. It exercises the full
pipeline: initial sync, event application, a traffic poll cycle, and
shutdown.

Usage:
    cargo run --example cluster_sync

*/

use std::time::Duration;
use tokio::time::sleep;

use kubesql::error::SyncResult;
use kubesql::mapper::{
    ContainerMapper, NodeMapper, PodMapper, container_table_schema, node_table_schema,
    pod_table_schema,
};
use kubesql::metrics::{
    MetricQuery, MetricsClient, PromLabels, PromQueryData, PromQueryResponse, PromQueryResult,
    default_queries,
};
use kubesql::pipeline::ClusterPipeline;
use kubesql::source::{
    Container, Node, NodeStatus, ObjectMeta, Pod, PodSpec, PodStatus, ResourceQuantities,
    ResourceRequirements,
};
use kubesql::store::{MemoryTableStore, TableStore};
use kubesql::types::TableName;
use tracing::info;

/// A metrics endpoint that answers every query with a single canned series.
#[derive(Clone)]
struct CannedMetrics;

impl MetricsClient for CannedMetrics {
    async fn query(&self, query: &MetricQuery) -> SyncResult<PromQueryResponse> {
        Ok(PromQueryResponse {
            metric_name: query.name.clone(),
            status: "success".into(),
            data: PromQueryData {
                result_type: "vector".into(),
                result: vec![PromQueryResult {
                    metric: PromLabels {
                        source_workload: "web-frontend".into(),
                        source_workload_namespace: "prod".into(),
                        destination_workload: "api-server".into(),
                        request_protocol: "http".into(),
                        response_code: "200".into(),
                        ..Default::default()
                    },
                    value: vec![serde_json::json!(0.0), serde_json::json!("12.5")],
                }],
            },
        })
    }
}

fn sample_pod() -> Pod {
    Pod {
        meta: ObjectMeta {
            uid: "pod-uid-1".into(),
            name: "web-frontend-7d9c5b-x2ftq".into(),
            namespace: "prod".into(),
            labels: [("app".to_string(), "web".to_string())].into_iter().collect(),
            created_at: None,
        },
        spec: PodSpec {
            node_name: "node-a".into(),
            containers: vec![
                Container {
                    name: "app".into(),
                    resources: ResourceRequirements {
                        limits: ResourceQuantities {
                            memory: 512 * 1024 * 1024,
                            cpu_millis: 500,
                            ephemeral_storage: 0,
                        },
                        requests: ResourceQuantities {
                            memory: 256 * 1024 * 1024,
                            cpu_millis: 250,
                            ephemeral_storage: 0,
                        },
                    },
                },
                Container {
                    name: "sidecar".into(),
                    ..Default::default()
                },
            ],
            affinity: None,
        },
        status: PodStatus {
            pod_ip: "10.0.0.7".into(),
        },
    }
}

fn sample_node() -> Node {
    Node {
        meta: ObjectMeta {
            uid: "node-uid-a".into(),
            name: "node-a".into(),
            ..Default::default()
        },
        status: NodeStatus {
            allocatable: ResourceQuantities {
                memory: 14 * 1024 * 1024 * 1024,
                cpu_millis: 7_500,
                ephemeral_storage: 90 * 1024 * 1024 * 1024,
            },
            capacity: ResourceQuantities {
                memory: 16 * 1024 * 1024 * 1024,
                cpu_millis: 8_000,
                ephemeral_storage: 100 * 1024 * 1024 * 1024,
            },
        },
    }
}

async fn print_table(store: &MemoryTableStore, name: &str) {
    let name = TableName::from(name);
    let Some(table) = store.table(&name).await else {
        println!("table [{name}] does not exist");
        return;
    };

    println!("table [{name}]:");
    for row in table.rows().await {
        println!("  {row}");
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _log_flusher = kubesql_telemetry::init_tracing("cluster_sync")?;

    let store = MemoryTableStore::new();
    let mut pipeline = ClusterPipeline::new(store.clone());

    let (pod_publisher, pod_source) = pipeline.subscription::<Pod>();
    let (container_publisher, container_source) = pipeline.subscription::<Pod>();
    let (node_publisher, node_source) = pipeline.subscription::<Node>();

    pipeline
        .add_watch_table(pod_source, PodMapper, pod_table_schema())
        .await?;
    pipeline
        .add_watch_table(container_source, ContainerMapper, container_table_schema())
        .await?;
    pipeline
        .add_watch_table(node_source, NodeMapper, node_table_schema())
        .await?;

    let traffic_adapter = pipeline
        .add_traffic_table(CannedMetrics, default_queries(), Duration::from_secs(300))
        .await?;

    // Deliver the initial state and mark the sources as synced.
    let pod = sample_pod();
    pod_publisher.added(pod.clone()).await;
    container_publisher.added(pod).await;
    node_publisher.added(sample_node()).await;
    pod_publisher.mark_synced();
    container_publisher.mark_synced();
    node_publisher.mark_synced();

    // Wait for the first traffic poll cycle and the watch tables to settle.
    while traffic_adapter.generation() < 1 {
        sleep(Duration::from_millis(20)).await;
    }
    sleep(Duration::from_millis(200)).await;

    info!(tables = ?pipeline.registry().table_names().await, "registered tables");

    print_table(&store, "pod").await;
    print_table(&store, "container").await;
    print_table(&store, "node").await;
    print_table(&store, "traffic").await;

    pipeline.shutdown_and_wait().await?;

    Ok(())
}
