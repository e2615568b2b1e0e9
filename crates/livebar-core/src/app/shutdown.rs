//! ShutdownSignal - watch チャネルによる停止通知
//!
//! Dropping the sender counts as a shutdown request too.

use std::time::Duration;

use tokio::sync::watch;

#[derive(Debug, Clone)]
pub struct ShutdownSignal {
    rx: watch::Receiver<bool>,
}

impl ShutdownSignal {
    pub fn new(rx: watch::Receiver<bool>) -> Self {
        Self { rx }
    }

    /// A fresh sender / signal pair. Send `true` to stop.
    pub fn channel() -> (watch::Sender<bool>, Self) {
        let (tx, rx) = watch::channel(false);
        (tx, Self::new(rx))
    }

    pub fn is_requested(&self) -> bool {
        *self.rx.borrow() || self.rx.has_changed().is_err()
    }

    /// Resolves once shutdown has been requested.
    pub async fn wait(&mut self) {
        loop {
            if *self.rx.borrow_and_update() {
                return;
            }
            if self.rx.changed().await.is_err() {
                return;
            }
        }
    }

    /// Sleeps for `duration`. Returns `false` if shutdown came first.
    pub async fn sleep(&mut self, duration: Duration) -> bool {
        if self.is_requested() {
            return false;
        }
        tokio::select! {
            _ = tokio::time::sleep(duration) => true,
            _ = self.wait() => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::Instant;

    #[tokio::test(start_paused = true)]
    async fn sleep_runs_to_completion_without_shutdown() {
        let (_tx, mut signal) = ShutdownSignal::channel();
        let start = Instant::now();
        assert!(signal.sleep(Duration::from_secs(60)).await);
        assert_eq!(start.elapsed(), Duration::from_secs(60));
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_interrupts_sleep() {
        let (tx, mut signal) = ShutdownSignal::channel();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(5)).await;
            tx.send(true).unwrap();
        });

        let start = Instant::now();
        assert!(!signal.sleep(Duration::from_secs(3600)).await);
        assert!(start.elapsed() < Duration::from_secs(6));
        assert!(signal.is_requested());
    }

    #[tokio::test]
    async fn dropped_sender_counts_as_shutdown() {
        let (tx, mut signal) = ShutdownSignal::channel();
        drop(tx);
        assert!(signal.is_requested());
        assert!(!signal.sleep(Duration::from_secs(1)).await);
    }
}
