use tokio::sync::watch;

/// Creates the run-level cancellation channel. Send `true` to stop.
#[must_use]
pub fn shutdown_channel() -> (watch::Sender<bool>, watch::Receiver<bool>) {
    watch::channel(false)
}

/// Resolves once shutdown has been requested.
///
/// A dropped sender never resolves: nobody is left to request shutdown.
pub async fn cancelled(rx: &mut watch::Receiver<bool>) {
    loop {
        if *rx.borrow_and_update() {
            return;
        }
        if rx.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

#[must_use]
pub fn is_cancelled(rx: &watch::Receiver<bool>) -> bool {
    *rx.borrow()
}
