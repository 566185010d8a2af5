use tokio::sync::mpsc;

use crate::concurrency::shutdown::ShutdownRx;
use crate::error::SyncResult;

/// A typed change notification for one cluster object.
///
/// Update events carry both the previous and the current state of the object
/// so consumers can compute exact row deltas without keeping their own cache.
#[derive(Debug, Clone)]
pub enum ResourceEvent<T> {
    Added(T),
    Updated { old: T, new: T },
    Deleted(T),
}

/// Minimal identification surface every watched resource exposes.
///
/// Used only for log tagging, never for row projection.
pub trait SourceObject {
    /// The resource kind, e.g. `"pod"`.
    fn kind(&self) -> &'static str;

    /// A human-readable identity such as `namespace/name`.
    fn identity(&self) -> String;
}

/// A push source of [`ResourceEvent`]s for one resource kind.
///
/// `Sync` is required because the watch worker polls [`has_synced`](Self::has_synced)
/// through a shared reference held across await points inside its spawned task.
pub trait WatchSource: Send + Sync + 'static {
    type Resource: SourceObject + Clone + Send + Sync + 'static;

    /// Starts the source and returns the channel its events arrive on.
    ///
    /// The source stops producing when the shutdown signal fires.
    fn start(
        &mut self,
        shutdown_rx: ShutdownRx,
    ) -> SyncResult<mpsc::Receiver<ResourceEvent<Self::Resource>>>;

    /// Returns whether the source has delivered its full initial state.
    ///
    /// Until this turns `true`, the events received so far may be an
    /// incomplete prefix of the cluster's current objects.
    fn has_synced(&self) -> bool;
}
