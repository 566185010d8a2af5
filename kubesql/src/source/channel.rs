use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::mpsc;
use tracing::warn;

use crate::concurrency::shutdown::ShutdownRx;
use crate::error::{ErrorKind, SyncResult};
use crate::source::base::{ResourceEvent, SourceObject, WatchSource};
use crate::sync_error;

/// A [`WatchSource`] fed through an in-process channel.
///
/// The paired [`WatchPublisher`] pushes events and flips the synced flag once
/// the initial state has been delivered. Used by tests and by embedders that
/// bridge their own watch machinery into the engine.
pub struct ChannelWatchSource<T> {
    rx: Option<mpsc::Receiver<ResourceEvent<T>>>,
    synced: Arc<AtomicBool>,
}

/// The sending half of a [`ChannelWatchSource`].
#[derive(Clone)]
pub struct WatchPublisher<T> {
    tx: mpsc::Sender<ResourceEvent<T>>,
    synced: Arc<AtomicBool>,
}

/// Creates a connected publisher/source pair with the given channel capacity.
pub fn channel_watch_source<T>(capacity: usize) -> (WatchPublisher<T>, ChannelWatchSource<T>) {
    let (tx, rx) = mpsc::channel(capacity);
    let synced = Arc::new(AtomicBool::new(false));

    let publisher = WatchPublisher {
        tx,
        synced: synced.clone(),
    };
    let source = ChannelWatchSource {
        rx: Some(rx),
        synced,
    };

    (publisher, source)
}

impl<T: SourceObject> WatchPublisher<T> {
    pub async fn added(&self, resource: T) {
        self.send(ResourceEvent::Added(resource)).await;
    }

    pub async fn updated(&self, old: T, new: T) {
        self.send(ResourceEvent::Updated { old, new }).await;
    }

    pub async fn deleted(&self, resource: T) {
        self.send(ResourceEvent::Deleted(resource)).await;
    }

    /// Marks the initial state as fully delivered.
    pub fn mark_synced(&self) {
        self.synced.store(true, Ordering::SeqCst);
    }

    async fn send(&self, event: ResourceEvent<T>) {
        if let Err(err) = self.tx.send(event).await {
            let (kind, identity) = match &err.0 {
                ResourceEvent::Added(r)
                | ResourceEvent::Deleted(r)
                | ResourceEvent::Updated { new: r, .. } => (r.kind(), r.identity()),
            };
            warn!(kind, identity = %identity, "dropping event, watch consumer is gone");
        }
    }
}

impl<T> WatchSource for ChannelWatchSource<T>
where
    T: SourceObject + Clone + Send + Sync + 'static,
{
    type Resource = T;

    fn start(
        &mut self,
        _shutdown_rx: ShutdownRx,
    ) -> SyncResult<mpsc::Receiver<ResourceEvent<T>>> {
        self.rx.take().ok_or_else(|| {
            sync_error!(
                ErrorKind::InvalidState,
                "watch source already started",
                "the event receiver was handed out by a previous start call"
            )
        })
    }

    fn has_synced(&self) -> bool {
        self.synced.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;
    use tokio::task::JoinHandle;
    use tokio::time::sleep;

    use super::*;
    use crate::source::resources::Pod;

    async fn wait_for_sync<W: WatchSource>(source: &W) {
        while !source.has_synced() {
            sleep(Duration::from_millis(5)).await;
        }
    }

    // Mirrors how the watch worker polls the source: a shared borrow held
    // across await points inside a spawned task.
    fn spawn_sync_poller<W: WatchSource>(source: W) -> JoinHandle<()> {
        tokio::spawn(async move { wait_for_sync(&source).await })
    }

    #[tokio::test]
    async fn source_can_be_polled_through_a_borrow_in_a_spawned_task() {
        let (publisher, source) = channel_watch_source::<Pod>(4);

        let poller = spawn_sync_poller(source);
        publisher.mark_synced();

        poller.await.unwrap();
    }

    #[tokio::test]
    async fn second_start_is_rejected() {
        let (_publisher, mut source) = channel_watch_source::<Pod>(4);
        let (_shutdown_tx, shutdown_rx) = crate::concurrency::shutdown::create_shutdown_channel();

        assert!(source.start(shutdown_rx.clone()).is_ok());
        assert!(source.start(shutdown_rx).is_err());
    }
}
