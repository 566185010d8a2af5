use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{Instrument, debug, info, warn};

use crate::adapter::SnapshotTableAdapter;
use crate::concurrency::shutdown::ShutdownRx;
use crate::error::{ErrorKind, SyncResult};
use crate::metrics::{MetricQuery, MetricsClient, PromQueryResponse};
use crate::registry::TableRegistry;
use crate::store::TableStore;
use crate::sync_error;
use crate::workers::base::{Worker, WorkerHandle};

#[derive(Debug)]
pub struct PollWorkerHandle {
    handle: Option<JoinHandle<SyncResult<()>>>,
}

impl WorkerHandle<()> for PollWorkerHandle {
    fn state(&self) {}

    async fn wait(mut self) -> SyncResult<()> {
        let Some(handle) = self.handle.take() else {
            return Ok(());
        };

        match handle.await {
            Ok(result) => result,
            Err(err) => Err(sync_error!(
                ErrorKind::WorkerPanic,
                "poll worker task terminated abnormally",
                err
            )),
        }
    }
}

/// Drives one poll-driven table.
///
/// Every interval the worker runs its queries concurrently, skips the ones
/// that failed, and hands the remaining responses to the snapshot adapter.
/// The first cycle runs immediately at startup. On shutdown the in-flight
/// cycle completes before the worker stops.
pub struct PollWorker<S, C>
where
    S: TableStore,
    C: MetricsClient + Clone,
{
    adapter: Arc<SnapshotTableAdapter<S>>,
    client: C,
    queries: Vec<MetricQuery>,
    poll_interval: Duration,
    registry: TableRegistry,
    shutdown_rx: ShutdownRx,
}

impl<S, C> PollWorker<S, C>
where
    S: TableStore,
    C: MetricsClient + Clone,
{
    pub fn new(
        adapter: Arc<SnapshotTableAdapter<S>>,
        client: C,
        queries: Vec<MetricQuery>,
        poll_interval: Duration,
        registry: TableRegistry,
        shutdown_rx: ShutdownRx,
    ) -> Self {
        Self {
            adapter,
            client,
            queries,
            poll_interval,
            registry,
            shutdown_rx,
        }
    }
}

impl<S, C> Worker<PollWorkerHandle, ()> for PollWorker<S, C>
where
    S: TableStore,
    C: MetricsClient + Clone,
{
    async fn start(mut self) -> SyncResult<PollWorkerHandle> {
        let table_name = self.adapter.table_name().clone();
        info!(table = %table_name, "starting poll worker");

        self.registry.register(self.adapter.clone()).await;

        let span = tracing::info_span!("poll_worker", table = %table_name);
        let worker = async move {
            let mut ticker = interval(self.poll_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = self.shutdown_rx.changed() => break,
                    // The cycle runs inside the select arm, so a shutdown
                    // signal arriving mid-cycle is observed only after the
                    // refresh has completed.
                    _ = ticker.tick() => {
                        run_cycle(&self.client, &self.queries, &self.adapter).await;
                    }
                }
            }

            info!(table = %table_name, "poll worker stopped");

            Ok(())
        }
        .instrument(span);

        let handle = tokio::spawn(worker);

        Ok(PollWorkerHandle {
            handle: Some(handle),
        })
    }
}

async fn run_cycle<S, C>(client: &C, queries: &[MetricQuery], adapter: &SnapshotTableAdapter<S>)
where
    S: TableStore,
    C: MetricsClient + Clone,
{
    let tasks = queries
        .iter()
        .cloned()
        .map(|query| {
            let client = client.clone();
            tokio::spawn(async move {
                let result = client.query(&query).await;
                (query, result)
            })
        })
        .collect::<Vec<_>>();

    let mut responses: Vec<PromQueryResponse> = Vec::with_capacity(queries.len());
    for joined in futures::future::join_all(tasks).await {
        match joined {
            Ok((_, Ok(response))) => responses.push(response),
            Ok((query, Err(err))) => {
                warn!(metric = %query.name, error = %err, "metrics query failed, skipping it");
            }
            Err(err) => {
                warn!(error = %err, "metrics query task failed, skipping it");
            }
        }
    }

    match adapter.refresh(&responses).await {
        Ok(generation) => {
            debug!(generation, responses = responses.len(), "poll cycle complete");
        }
        Err(err) => {
            warn!(error = %err, "poll cycle published with errors");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bail;
    use crate::concurrency::shutdown::create_shutdown_channel;
    use crate::mapper::traffic_table_schema;
    use crate::metrics::{PromLabels, PromQueryData, PromQueryResult};
    use crate::store::MemoryTableStore;
    use crate::types::{Cell, TableName};
    use std::collections::HashSet;
    use tokio::time::sleep;

    #[derive(Clone)]
    struct ScriptedClient {
        failing: HashSet<String>,
    }

    impl ScriptedClient {
        fn failing(names: &[&str]) -> Self {
            Self {
                failing: names.iter().map(|n| n.to_string()).collect(),
            }
        }
    }

    impl MetricsClient for ScriptedClient {
        async fn query(&self, query: &MetricQuery) -> SyncResult<PromQueryResponse> {
            if self.failing.contains(&query.name) {
                bail!(
                    ErrorKind::SourceQueryFailed,
                    "metrics query failed",
                    format!("metric '{}'", query.name)
                );
            }

            Ok(PromQueryResponse {
                metric_name: query.name.clone(),
                status: "success".into(),
                data: PromQueryData {
                    result_type: "vector".into(),
                    result: vec![PromQueryResult {
                        metric: PromLabels {
                            source_workload: "web".into(),
                            ..Default::default()
                        },
                        value: vec![serde_json::json!(0.0), serde_json::json!("1.0")],
                    }],
                },
            })
        }
    }

    #[tokio::test]
    async fn failed_query_is_skipped_and_the_cycle_survives() {
        let store = MemoryTableStore::new();
        let registry = TableRegistry::new();
        let (shutdown_tx, shutdown_rx) = create_shutdown_channel();

        let adapter = Arc::new(
            SnapshotTableAdapter::create(store.clone(), traffic_table_schema())
                .await
                .unwrap(),
        );
        let queries = vec![
            MetricQuery::new("q1", "up"),
            MetricQuery::new("q2", "up"),
            MetricQuery::new("q3", "up"),
        ];

        let worker = PollWorker::new(
            adapter.clone(),
            ScriptedClient::failing(&["q2"]),
            queries,
            Duration::from_secs(300),
            registry.clone(),
            shutdown_rx,
        );
        let handle = worker.start().await.unwrap();

        assert!(registry.contains(&TableName::from("traffic")).await);

        // The first cycle runs immediately.
        while adapter.generation() < 1 {
            sleep(Duration::from_millis(10)).await;
        }

        shutdown_tx.shutdown().unwrap();
        handle.wait().await.unwrap();

        let table = store.table(&TableName::from("traffic")).await.unwrap();
        let rows = table.rows().await;
        assert_eq!(rows.len(), 2);

        let metrics = rows
            .iter()
            .map(|row| row.values[10].clone())
            .collect::<Vec<_>>();
        assert!(metrics.contains(&Cell::from("q1")));
        assert!(metrics.contains(&Cell::from("q3")));
    }
}
