use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::watch;

type Listener = Arc<dyn Fn(bool) + Send + Sync>;

/// Signed-in state of a mail service plus change notification.
///
/// Listeners and watchers only hear about transitions; setting the state to
/// its current value is a no-op.
pub struct SessionNotifier {
    state: watch::Sender<bool>,
    listeners: Mutex<Vec<Listener>>,
}

impl SessionNotifier {
    pub fn new(signed_in: bool) -> Self {
        let (state, _) = watch::channel(signed_in);
        Self {
            state,
            listeners: Mutex::new(Vec::new()),
        }
    }

    pub fn is_signed_in(&self) -> bool {
        *self.state.borrow()
    }

    pub fn on_signed_in_change<F>(&self, listener: F)
    where
        F: Fn(bool) + Send + Sync + 'static,
    {
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Arc::new(listener));
    }

    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.state.subscribe()
    }

    /// Returns whether the state actually changed.
    pub fn set_signed_in(&self, signed_in: bool) -> bool {
        let changed = self.state.send_if_modified(|current| {
            if *current == signed_in {
                return false;
            }
            *current = signed_in;
            true
        });
        if !changed {
            return false;
        }

        tracing::info!(signed_in, "session state changed");
        // Listeners run outside the lock so they may register further listeners.
        let listeners = self
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        for listener in listeners {
            listener(signed_in);
        }
        true
    }
}

impl Default for SessionNotifier {
    fn default() -> Self {
        Self::new(false)
    }
}

impl std::fmt::Debug for SessionNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionNotifier")
            .field("signed_in", &self.is_signed_in())
            .finish()
    }
}
