use crate::{PendingOperation, PendingSender};
use tokio::sync::watch;

/// The owner of a set of cells: told when cached values change and when
/// new work starts.
pub trait Host: Send + Sync + 'static {
    /// A cell settled; anything rendered from it may be out of date.
    fn request_update(&self);

    /// A cell started computing.
    fn pending(&self, operation: PendingOperation);
}

/// Host that forwards operations to a [`crate::PendingTracker`] and bumps a
/// revision counter on every update request.
#[derive(Debug)]
pub struct ViewHost {
    pending: PendingSender,
    updates: watch::Sender<u64>,
}

impl ViewHost {
    pub fn new(pending: PendingSender) -> Self {
        let (updates, _) = watch::channel(0);
        Self { pending, updates }
    }

    pub fn updates(&self) -> watch::Receiver<u64> {
        self.updates.subscribe()
    }

    pub fn revision(&self) -> u64 {
        *self.updates.borrow()
    }
}

impl Host for ViewHost {
    fn request_update(&self) {
        self.updates.send_modify(|revision| *revision = revision.wrapping_add(1));
    }

    fn pending(&self, operation: PendingOperation) {
        self.pending.send(operation);
    }
}
