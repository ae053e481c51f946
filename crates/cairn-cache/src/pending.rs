use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, watch};

/// How an announced operation ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Settled {
    Resolved,
    Failed,
    /// A newer computation for the same cell started before this one finished.
    Superseded,
    /// The operation was dropped without reporting an outcome.
    Abandoned,
}

/// An asynchronous operation that has started, with a token that completes
/// when it settles.
#[derive(Debug)]
pub struct PendingOperation {
    label: String,
    done: oneshot::Receiver<Settled>,
}

impl PendingOperation {
    pub fn new(label: impl Into<String>, done: oneshot::Receiver<Settled>) -> Self {
        Self {
            label: label.into(),
            done,
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub async fn settled(self) -> Settled {
        self.done.await.unwrap_or(Settled::Abandoned)
    }
}

/// Handle for announcing started operations to a [`PendingTracker`].
#[derive(Debug, Clone)]
pub struct PendingSender {
    tx: mpsc::UnboundedSender<PendingOperation>,
}

impl PendingSender {
    pub fn send(&self, operation: PendingOperation) {
        if let Err(err) = self.tx.send(operation) {
            tracing::debug!(label = err.0.label(), "pending tracker has shut down");
        }
    }
}

/// Counts announced operations until each one settles.
pub struct PendingTracker {
    rx: mpsc::UnboundedReceiver<PendingOperation>,
    outstanding: Arc<watch::Sender<usize>>,
}

impl PendingTracker {
    /// Create a tracker and the sender used to feed it.
    pub fn new() -> (Self, PendingSender) {
        let (tx, rx) = mpsc::unbounded_channel();
        let (outstanding, _) = watch::channel(0);
        let tracker = Self {
            rx,
            outstanding: Arc::new(outstanding),
        };
        (tracker, PendingSender { tx })
    }

    /// Number of operations announced but not yet settled.
    pub fn subscribe(&self) -> watch::Receiver<usize> {
        self.outstanding.subscribe()
    }

    /// Run until every sender is dropped. This should be spawned as a background task.
    pub async fn run(mut self) {
        while let Some(operation) = self.rx.recv().await {
            self.outstanding.send_modify(|count| *count += 1);
            let outstanding = Arc::clone(&self.outstanding);
            tokio::spawn(async move {
                let label = operation.label().to_string();
                let settled = operation.settled().await;
                tracing::debug!(%label, ?settled, "operation settled");
                outstanding.send_modify(|count| *count = count.saturating_sub(1));
            });
        }
        tracing::debug!("pending tracker shutting down");
    }
}
