use tokio::sync::watch;

/// Sending half of the shutdown channel shared by all sync workers.
#[derive(Debug, Clone)]
pub struct ShutdownTx(watch::Sender<()>);

impl ShutdownTx {
    pub fn shutdown(&self) -> Result<(), watch::error::SendError<()>> {
        self.0.send(())
    }

    pub fn subscribe(&self) -> ShutdownRx {
        self.0.subscribe()
    }
}

/// Receiving half held by each worker loop.
pub type ShutdownRx = watch::Receiver<()>;

/// Creates a new shutdown channel.
///
/// Workers subscribe via [`ShutdownTx::subscribe`] and treat both a signal and
/// a dropped sender as a request to stop.
pub fn create_shutdown_channel() -> (ShutdownTx, ShutdownRx) {
    let (tx, rx) = watch::channel(());
    (ShutdownTx(tx), rx)
}
