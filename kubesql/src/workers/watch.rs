use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, sleep, sleep_until};
use tracing::{Instrument, debug, error, info, warn};

use crate::adapter::SyncTableAdapter;
use crate::concurrency::shutdown::ShutdownRx;
use crate::error::{ErrorKind, SyncResult};
use crate::mapper::RowMapper;
use crate::registry::TableRegistry;
use crate::source::{ResourceEvent, SourceObject, WatchSource};
use crate::store::TableStore;
use crate::sync_error;
use crate::types::TableSchema;
use crate::workers::base::{Worker, WorkerHandle};

/// Cadence at which the initial-sync flag is polled.
const SYNC_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Lifecycle of a watch worker, observable through its handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchPhase {
    Starting,
    WaitingForInitialSync,
    Active,
    Draining,
    Stopped,
}

#[derive(Debug)]
pub struct WatchWorkerHandle {
    handle: Option<JoinHandle<SyncResult<()>>>,
    phase_rx: watch::Receiver<WatchPhase>,
}

impl WorkerHandle<watch::Receiver<WatchPhase>> for WatchWorkerHandle {
    fn state(&self) -> watch::Receiver<WatchPhase> {
        self.phase_rx.clone()
    }

    async fn wait(mut self) -> SyncResult<()> {
        let Some(handle) = self.handle.take() else {
            return Ok(());
        };

        match handle.await {
            Ok(result) => result,
            Err(err) => Err(sync_error!(
                ErrorKind::WorkerPanic,
                "watch worker task terminated abnormally",
                err
            )),
        }
    }
}

/// Drives one watch-sourced table.
///
/// The worker starts its source, waits for the initial sync under a timeout,
/// creates and registers the table, and then applies each event until the
/// shutdown signal fires. A table whose source never syncs is never
/// registered.
pub struct WatchWorker<W, M, S>
where
    W: WatchSource,
    M: RowMapper<Source = W::Resource>,
    S: TableStore,
{
    source: W,
    mapper: M,
    schema: TableSchema,
    store: S,
    registry: TableRegistry,
    shutdown_rx: ShutdownRx,
    sync_timeout: Duration,
}

impl<W, M, S> WatchWorker<W, M, S>
where
    W: WatchSource,
    M: RowMapper<Source = W::Resource>,
    S: TableStore,
{
    pub fn new(
        source: W,
        mapper: M,
        schema: TableSchema,
        store: S,
        registry: TableRegistry,
        shutdown_rx: ShutdownRx,
        sync_timeout: Duration,
    ) -> Self {
        Self {
            source,
            mapper,
            schema,
            store,
            registry,
            shutdown_rx,
            sync_timeout,
        }
    }
}

impl<W, M, S> Worker<WatchWorkerHandle, watch::Receiver<WatchPhase>> for WatchWorker<W, M, S>
where
    W: WatchSource,
    W::Resource: SourceObject,
    M: RowMapper<Source = W::Resource> + Send + Sync + 'static,
    S: TableStore,
{
    async fn start(mut self) -> SyncResult<WatchWorkerHandle> {
        let table_name = self.schema.name.clone();
        info!(table = %table_name, "starting watch worker");

        let (phase_tx, phase_rx) = watch::channel(WatchPhase::Starting);

        let span = tracing::info_span!("watch_worker", table = %table_name);
        let worker = async move {
            let mut events = self.source.start(self.shutdown_rx.clone())?;

            let _ = phase_tx.send(WatchPhase::WaitingForInitialSync);
            match wait_for_initial_sync(&self.source, &mut self.shutdown_rx, self.sync_timeout)
                .await
            {
                SyncWait::Synced => {}
                SyncWait::ShutdownRequested => {
                    info!(table = %table_name, "shutdown before initial sync, table stays unavailable");
                    let _ = phase_tx.send(WatchPhase::Stopped);
                    return Ok(());
                }
                SyncWait::TimedOut => {
                    error!(
                        table = %table_name,
                        timeout_secs = self.sync_timeout.as_secs(),
                        "initial sync timed out, table stays unavailable"
                    );
                    let _ = phase_tx.send(WatchPhase::Stopped);
                    return Err(sync_error!(
                        ErrorKind::SourceSyncTimeout,
                        "watch source did not complete its initial sync in time",
                        format!("table '{table_name}'")
                    ));
                }
            }

            let table = match self.store.create_table(self.schema.clone()).await {
                Ok(table) => table,
                Err(err) if err.kind() == ErrorKind::TableAlreadyExists => {
                    warn!(table = %table_name, "table already exists, reusing it");
                    self.store.table(&table_name).await.ok_or_else(|| {
                        sync_error!(
                            ErrorKind::InvalidState,
                            "existing table disappeared during worker startup",
                            format!("table '{table_name}'")
                        )
                    })?
                }
                Err(err) => return Err(err),
            };

            let adapter = Arc::new(SyncTableAdapter::new(
                self.store.clone(),
                table,
                self.mapper,
            ));
            self.registry.register(adapter.clone()).await;

            let _ = phase_tx.send(WatchPhase::Active);
            info!(table = %table_name, "initial sync complete, applying events");

            loop {
                tokio::select! {
                    _ = self.shutdown_rx.changed() => {
                        let _ = phase_tx.send(WatchPhase::Draining);
                        break;
                    }
                    event = events.recv() => {
                        let Some(event) = event else {
                            debug!(table = %table_name, "event stream closed");
                            let _ = phase_tx.send(WatchPhase::Draining);
                            break;
                        };
                        apply_event(&adapter, event).await;
                    }
                }
            }

            let _ = phase_tx.send(WatchPhase::Stopped);
            info!(table = %table_name, "watch worker stopped");

            Ok(())
        }
        .instrument(span);

        let handle = tokio::spawn(worker);

        Ok(WatchWorkerHandle {
            handle: Some(handle),
            phase_rx,
        })
    }
}

enum SyncWait {
    Synced,
    ShutdownRequested,
    TimedOut,
}

async fn wait_for_initial_sync<W: WatchSource>(
    source: &W,
    shutdown_rx: &mut ShutdownRx,
    timeout: Duration,
) -> SyncWait {
    let deadline = Instant::now() + timeout;

    loop {
        if source.has_synced() {
            return SyncWait::Synced;
        }

        tokio::select! {
            _ = shutdown_rx.changed() => return SyncWait::ShutdownRequested,
            _ = sleep_until(deadline) => return SyncWait::TimedOut,
            _ = sleep(SYNC_POLL_INTERVAL) => {}
        }
    }
}

/// Applies one event to the table, logging and dropping failures so the loop
/// survives bad events.
async fn apply_event<M, S>(adapter: &SyncTableAdapter<M, S>, event: ResourceEvent<M::Source>)
where
    M: RowMapper,
    M::Source: SourceObject,
    S: TableStore,
{
    let result = match &event {
        ResourceEvent::Added(resource) => adapter.insert(resource).await,
        ResourceEvent::Updated { old, new } => adapter.update(old, new).await,
        ResourceEvent::Deleted(resource) => adapter.delete(resource).await,
    };

    if let Err(err) = result {
        let (kind, identity) = match &event {
            ResourceEvent::Added(r)
            | ResourceEvent::Deleted(r)
            | ResourceEvent::Updated { new: r, .. } => (r.kind(), r.identity()),
        };
        warn!(kind, identity = %identity, error = %err, "failed to apply event, dropping it");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::concurrency::shutdown::create_shutdown_channel;
    use crate::mapper::{PodMapper, pod_table_schema};
    use crate::source::{ObjectMeta, Pod, channel_watch_source};
    use crate::store::MemoryTableStore;
    use crate::types::TableName;

    fn pod(uid: &str, name: &str) -> Pod {
        Pod {
            meta: ObjectMeta {
                uid: uid.into(),
                name: name.into(),
                namespace: "prod".into(),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn applies_events_after_initial_sync() {
        let store = MemoryTableStore::new();
        let registry = TableRegistry::new();
        let (shutdown_tx, shutdown_rx) = create_shutdown_channel();
        let (publisher, source) = channel_watch_source::<Pod>(16);

        let worker = WatchWorker::new(
            source,
            PodMapper,
            pod_table_schema(),
            store.clone(),
            registry.clone(),
            shutdown_rx,
            Duration::from_secs(5),
        );
        let handle = worker.start().await.unwrap();

        publisher.added(pod("u1", "web-1")).await;
        publisher.mark_synced();
        publisher.added(pod("u2", "web-2")).await;
        publisher.deleted(pod("u1", "web-1")).await;

        let table_name = TableName::from("pod");
        let mut phase_rx = handle.state();
        while *phase_rx.borrow() != WatchPhase::Active {
            phase_rx.changed().await.unwrap();
        }

        // Wait until every queued event has been applied before signalling.
        let table = loop {
            match store.table(&table_name).await {
                Some(table) => break table,
                None => sleep(Duration::from_millis(10)).await,
            }
        };
        loop {
            let rows = table.rows().await;
            if rows.len() == 1 && rows[0].values[1] == crate::types::Cell::from("web-2") {
                break;
            }
            sleep(Duration::from_millis(10)).await;
        }

        shutdown_tx.shutdown().unwrap();
        handle.wait().await.unwrap();

        assert!(registry.contains(&table_name).await);
        assert_eq!(table.row_count().await, 1);
    }

    #[tokio::test]
    async fn sync_timeout_never_registers_the_table() {
        let store = MemoryTableStore::new();
        let registry = TableRegistry::new();
        let (_shutdown_tx, shutdown_rx) = create_shutdown_channel();
        let (_publisher, source) = channel_watch_source::<Pod>(16);

        let worker = WatchWorker::new(
            source,
            PodMapper,
            pod_table_schema(),
            store.clone(),
            registry.clone(),
            shutdown_rx,
            Duration::from_millis(200),
        );
        let handle = worker.start().await.unwrap();

        let err = handle.wait().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::SourceSyncTimeout);
        assert!(!registry.contains(&TableName::from("pod")).await);
        assert!(store.table(&TableName::from("pod")).await.is_none());
    }

    #[tokio::test]
    async fn shutdown_before_sync_stops_cleanly() {
        let store = MemoryTableStore::new();
        let registry = TableRegistry::new();
        let (shutdown_tx, shutdown_rx) = create_shutdown_channel();
        let (_publisher, source) = channel_watch_source::<Pod>(16);

        let worker = WatchWorker::new(
            source,
            PodMapper,
            pod_table_schema(),
            store.clone(),
            registry.clone(),
            shutdown_rx,
            Duration::from_secs(60),
        );
        let handle = worker.start().await.unwrap();

        shutdown_tx.shutdown().unwrap();
        handle.wait().await.unwrap();

        assert!(!registry.contains(&TableName::from("pod")).await);
    }
}
