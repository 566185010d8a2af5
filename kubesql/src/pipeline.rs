use kubesql_config::shared::{MetricsConfig, SyncConfig};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use crate::adapter::SnapshotTableAdapter;
use crate::concurrency::shutdown::{ShutdownTx, create_shutdown_channel};
use crate::error::{SyncError, SyncResult};
use crate::mapper::{RowMapper, traffic_table_schema};
use crate::metrics::{MetricQuery, MetricsClient, PromClient, queries_from_config};
use crate::registry::TableRegistry;
use crate::source::{
    ChannelWatchSource, SourceObject, WatchPublisher, WatchSource, channel_watch_source,
};
use crate::store::TableStore;
use crate::types::TableSchema;
use crate::workers::{
    PollWorker, PollWorkerHandle, WatchWorker, WatchWorkerHandle, Worker, WorkerHandle,
};

/// Default time a watch table may take to deliver its initial state.
pub const DEFAULT_SYNC_TIMEOUT: Duration = Duration::from_secs(60);

/// Default capacity of the event channel behind [`subscription`](ClusterPipeline::subscription).
pub const DEFAULT_EVENT_BUFFER_SIZE: usize = 1024;

enum PipelineWorker {
    Watch(WatchWorkerHandle),
    Poll(PollWorkerHandle),
}

/// Owns the sync engine: the store, the table registry, the shutdown channel,
/// and every running worker.
///
/// Tables are added one by one; each spawns its own worker.
/// [`wait`](ClusterPipeline::wait) joins them all and aggregates their
/// failures.
pub struct ClusterPipeline<S: TableStore> {
    store: S,
    registry: TableRegistry,
    shutdown_tx: ShutdownTx,
    sync_timeout: Duration,
    event_buffer_size: usize,
    workers: Vec<PipelineWorker>,
}

impl<S: TableStore> ClusterPipeline<S> {
    pub fn new(store: S) -> Self {
        let (shutdown_tx, _) = create_shutdown_channel();

        Self {
            store,
            registry: TableRegistry::new(),
            shutdown_tx,
            sync_timeout: DEFAULT_SYNC_TIMEOUT,
            event_buffer_size: DEFAULT_EVENT_BUFFER_SIZE,
            workers: Vec::new(),
        }
    }

    /// Creates a pipeline with the sync tunables taken from configuration.
    pub fn from_config(store: S, sync: &SyncConfig) -> Self {
        let mut pipeline =
            Self::new(store).with_sync_timeout(Duration::from_secs(sync.initial_sync_timeout_secs));
        pipeline.event_buffer_size = sync.event_buffer_size;
        pipeline
    }

    /// Overrides the initial-sync timeout applied to watch tables added after
    /// this call.
    pub fn with_sync_timeout(mut self, sync_timeout: Duration) -> Self {
        self.sync_timeout = sync_timeout;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn registry(&self) -> &TableRegistry {
        &self.registry
    }

    /// Returns the sender half of the shutdown channel shared by every
    /// worker.
    pub fn shutdown_tx(&self) -> ShutdownTx {
        self.shutdown_tx.clone()
    }

    /// Creates a publisher/source pair with the configured event buffer
    /// capacity, ready to be handed to [`add_watch_table`](Self::add_watch_table).
    pub fn subscription<T>(&self) -> (WatchPublisher<T>, ChannelWatchSource<T>) {
        channel_watch_source(self.event_buffer_size)
    }

    /// Adds a watch-driven table and starts its worker.
    pub async fn add_watch_table<W, M>(
        &mut self,
        source: W,
        mapper: M,
        schema: TableSchema,
    ) -> SyncResult<()>
    where
        W: WatchSource,
        W::Resource: SourceObject,
        M: RowMapper<Source = W::Resource> + Send + Sync + 'static,
    {
        let worker = WatchWorker::new(
            source,
            mapper,
            schema,
            self.store.clone(),
            self.registry.clone(),
            self.shutdown_tx.subscribe(),
            self.sync_timeout,
        );
        let handle = worker.start().await?;
        self.workers.push(PipelineWorker::Watch(handle));

        Ok(())
    }

    /// Adds the poll-driven traffic table and starts its worker.
    ///
    /// Returns the snapshot adapter so callers can observe the refresh
    /// generation.
    pub async fn add_traffic_table<C>(
        &mut self,
        client: C,
        queries: Vec<MetricQuery>,
        poll_interval: Duration,
    ) -> SyncResult<Arc<SnapshotTableAdapter<S>>>
    where
        C: MetricsClient + Clone,
    {
        let adapter = Arc::new(
            SnapshotTableAdapter::create(self.store.clone(), traffic_table_schema()).await?,
        );

        let worker = PollWorker::new(
            adapter.clone(),
            client,
            queries,
            poll_interval,
            self.registry.clone(),
            self.shutdown_tx.subscribe(),
        );
        let handle = worker.start().await?;
        self.workers.push(PipelineWorker::Poll(handle));

        Ok(adapter)
    }

    /// Adds the traffic table against the configured metrics endpoint.
    pub async fn add_traffic_table_from_config(
        &mut self,
        config: &MetricsConfig,
    ) -> SyncResult<Arc<SnapshotTableAdapter<S>>> {
        let client = PromClient::new(config.prometheus_url.clone());
        let queries = queries_from_config(&config.queries);

        self.add_traffic_table(client, queries, Duration::from_secs(config.poll_interval_secs))
            .await
    }

    /// Waits for every worker to complete, aggregating their failures.
    pub async fn wait(self) -> SyncResult<()> {
        let mut errors = Vec::new();
        for worker in self.workers {
            let result = match worker {
                PipelineWorker::Watch(handle) => handle.wait().await,
                PipelineWorker::Poll(handle) => handle.wait().await,
            };
            if let Err(err) = result {
                errors.push(err);
            }
        }

        info!("all pipeline workers completed");

        if !errors.is_empty() {
            return Err(SyncError::many(errors));
        }

        Ok(())
    }

    /// Signals shutdown and waits for every worker to finish.
    pub async fn shutdown_and_wait(self) -> SyncResult<()> {
        // A send error means every worker already stopped.
        let _ = self.shutdown_tx.shutdown();
        self.wait().await
    }
}
