//! Cosmetic delay before the local seat plays.
//!
//! The timer only signals that the driver may play now; turn order comes
//! from the session state alone.

use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

#[derive(Default)]
pub struct TurnPacer {
    pending: Option<JoinHandle<()>>,
}

impl TurnPacer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Signal `ready` after `delay`, replacing any armed timer
    pub fn schedule(&mut self, delay: Duration, ready: mpsc::UnboundedSender<()>) {
        self.cancel();
        self.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = ready.send(());
        }));
    }

    /// Disarm. Also called once a signal has been consumed.
    pub fn cancel(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }

    pub fn is_armed(&self) -> bool {
        self.pending.is_some()
    }
}

impl Drop for TurnPacer {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::timeout;

    #[tokio::test]
    async fn test_fires_after_delay() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut pacer = TurnPacer::new();
        pacer.schedule(Duration::from_millis(10), tx);
        assert!(pacer.is_armed());

        let fired = timeout(Duration::from_secs(1), rx.recv()).await;
        assert_eq!(fired.ok().flatten(), Some(()));
    }

    #[tokio::test]
    async fn test_cancel_suppresses_signal() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut pacer = TurnPacer::new();
        pacer.schedule(Duration::from_millis(50), tx);
        pacer.cancel();
        assert!(!pacer.is_armed());

        // The aborted task drops the only sender
        let fired = timeout(Duration::from_secs(1), rx.recv()).await;
        assert_eq!(fired.ok().flatten(), None);
    }

    #[tokio::test]
    async fn test_reschedule_replaces_timer() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut pacer = TurnPacer::new();
        pacer.schedule(Duration::from_millis(20), tx.clone());
        pacer.schedule(Duration::from_millis(20), tx);

        let first = timeout(Duration::from_secs(1), rx.recv()).await;
        assert_eq!(first.ok().flatten(), Some(()));
        let second = timeout(Duration::from_millis(100), rx.recv()).await;
        assert!(second.ok().flatten().is_none());
    }
}
