// ABOUTME: Cancellation for background tasks built on a tokio watch channel.
// ABOUTME: Dropping the token cancels too, so a forgotten task never outlives its owner.

use tokio::sync::watch;

/// Owner side; cancels its paired signal on `cancel()` or drop
#[derive(Debug)]
pub struct CancelToken {
    tx: watch::Sender<bool>,
}

/// Task side; cloneable
#[derive(Debug, Clone)]
pub struct CancelSignal {
    rx: watch::Receiver<bool>,
}

pub fn cancel_pair() -> (CancelToken, CancelSignal) {
    let (tx, rx) = watch::channel(false);
    (CancelToken { tx }, CancelSignal { rx })
}

impl CancelToken {
    pub fn cancel(&self) {
        let _ = self.tx.send(true);
    }
}

impl Drop for CancelToken {
    fn drop(&mut self) {
        self.cancel();
    }
}

impl CancelSignal {
    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow() || self.rx.has_changed().is_err()
    }

    /// Resolves once cancelled; use as a `tokio::select!` branch
    pub async fn cancelled(&mut self) {
        loop {
            if *self.rx.borrow_and_update() {
                return;
            }
            if self.rx.changed().await.is_err() {
                return;
            }
        }
    }
}
