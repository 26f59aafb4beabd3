use tokio::sync::watch;

/// Flips to `true` once the process has been asked to stop.
pub type ShutdownReceiver = watch::Receiver<bool>;

pub fn shutdown_channel() -> (watch::Sender<bool>, ShutdownReceiver) {
    watch::channel(false)
}

/// Resolves once shutdown is requested. Never resolves without a receiver or after the sender
/// is gone without having requested shutdown.
pub async fn wait_for_shutdown(receiver: Option<ShutdownReceiver>) {
    if let Some(mut receiver) = receiver {
        if receiver.wait_for(|stop| *stop).await.is_ok() {
            return;
        }
    }
    std::future::pending::<()>().await
}
