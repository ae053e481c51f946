use crate::{Host, PendingOperation, Settled};
use futures::future::BoxFuture;
use futures::FutureExt;
use std::fmt::Display;
use std::future::Future;
use std::ops::Deref;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::oneshot;

type ComputeFn<T, K> = Box<dyn Fn(Vec<K>) -> BoxFuture<'static, Result<T, String>> + Send + Sync>;
type DepsFn<K> = Box<dyn Fn() -> Option<Vec<K>> + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellState {
    Uninitialized,
    Computing,
    Resolved,
    Failed,
}

/// Whether a failed cell computes again on a later `get`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RetryPolicy {
    /// Stay failed until the dependencies change.
    #[default]
    Never,
    /// Retry on the next `get`, up to `max_attempts` consecutive failures.
    OnNextGet { max_attempts: u32 },
}

impl RetryPolicy {
    fn allows(self, failures: u32) -> bool {
        match self {
            Self::Never => false,
            Self::OnNextGet { max_attempts } => failures < max_attempts,
        }
    }
}

/// Compares by pointer rather than by value.
///
/// Wrap shared handles in this to use them as cell dependencies: two
/// `Identity` values are equal only when they point at the same allocation.
pub struct Identity<T: ?Sized>(Arc<T>);

impl<T: ?Sized> Identity<T> {
    pub fn new(inner: Arc<T>) -> Self {
        Self(inner)
    }

    pub fn arc(&self) -> &Arc<T> {
        &self.0
    }
}

impl<T: ?Sized> From<Arc<T>> for Identity<T> {
    fn from(inner: Arc<T>) -> Self {
        Self(inner)
    }
}

impl<T: ?Sized> Clone for Identity<T> {
    fn clone(&self) -> Self {
        Self(Arc::clone(&self.0))
    }
}

impl<T: ?Sized> PartialEq for Identity<T> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::addr_eq(Arc::as_ptr(&self.0), Arc::as_ptr(&other.0))
    }
}

impl<T: ?Sized> Eq for Identity<T> {}

impl<T: ?Sized> Deref for Identity<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.0
    }
}

impl<T: ?Sized> std::fmt::Debug for Identity<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Identity({:p})", Arc::as_ptr(&self.0))
    }
}

struct Slot<T> {
    generation: u64,
    state: CellState,
    value: Option<T>,
    last_error: Option<String>,
    failures: u32,
}

fn lock<T>(slot: &Mutex<Slot<T>>) -> MutexGuard<'_, Slot<T>> {
    slot.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A memoized asynchronous value that recomputes when its dependencies change.
///
/// `get` never blocks. The first call starts the computation; later calls
/// start it again only when the dependency function returns a sequence that
/// differs from the previous one, or when a failed cell is allowed to retry.
/// While a computation is running `get` returns `None`, even if an older
/// value had resolved. Results of superseded computations are dropped.
///
/// Computations run on the ambient tokio runtime. Each start is announced to
/// the [`Host`] as a [`PendingOperation`] before `get` returns, and each
/// settled result triggers [`Host::request_update`].
pub struct CachedTask<T, K> {
    label: String,
    host: Arc<dyn Host>,
    compute: ComputeFn<T, K>,
    deps: Option<DepsFn<K>>,
    retry: RetryPolicy,
    started: bool,
    last_deps: Option<Vec<K>>,
    slot: Arc<Mutex<Slot<T>>>,
}

impl<T, K> CachedTask<T, K>
where
    T: Clone + Send + 'static,
    K: Clone + PartialEq + Send + 'static,
{
    pub fn new<F, Fut, E>(label: impl Into<String>, host: Arc<dyn Host>, compute: F) -> Self
    where
        F: Fn(Vec<K>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
        E: Display + 'static,
    {
        let compute: ComputeFn<T, K> = Box::new(move |deps| {
            compute(deps)
                .map(|result| result.map_err(|err| err.to_string()))
                .boxed()
        });
        Self {
            label: label.into(),
            host,
            compute,
            deps: None,
            retry: RetryPolicy::default(),
            started: false,
            last_deps: None,
            slot: Arc::new(Mutex::new(Slot {
                generation: 0,
                state: CellState::Uninitialized,
                value: None,
                last_error: None,
                failures: 0,
            })),
        }
    }

    /// Recompute whenever `deps` returns a different sequence.
    pub fn with_deps<D>(mut self, deps: D) -> Self
    where
        D: Fn() -> Option<Vec<K>> + Send + Sync + 'static,
    {
        self.deps = Some(Box::new(deps));
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn get(&mut self) -> Option<T> {
        let next = self.deps.as_ref().and_then(|deps| deps());
        if self.needs_compute(next.as_deref()) {
            self.start(next);
        }

        let slot = lock(&self.slot);
        match slot.state {
            CellState::Resolved => slot.value.clone(),
            _ => None,
        }
    }

    pub fn state(&self) -> CellState {
        lock(&self.slot).state
    }

    pub fn is_resolved(&self) -> bool {
        self.state() == CellState::Resolved
    }

    /// Give a failed cell a fresh set of retry attempts on the next `get`.
    pub fn reset_failures(&mut self) {
        lock(&self.slot).failures = 0;
    }

    /// The error from the most recent failed computation, if the cell is failed.
    pub fn last_error(&self) -> Option<String> {
        lock(&self.slot).last_error.clone()
    }

    fn needs_compute(&mut self, next: Option<&[K]>) -> bool {
        if !self.started {
            return true;
        }
        if self.deps.is_some() && self.last_deps.as_deref() != next {
            lock(&self.slot).failures = 0;
            return true;
        }
        let slot = lock(&self.slot);
        slot.state == CellState::Failed && self.retry.allows(slot.failures)
    }

    fn start(&mut self, deps: Option<Vec<K>>) {
        self.started = true;
        self.last_deps = deps.clone();

        let generation = {
            let mut slot = lock(&self.slot);
            slot.generation += 1;
            slot.state = CellState::Computing;
            slot.value = None;
            slot.last_error = None;
            slot.generation
        };

        let runtime = match tokio::runtime::Handle::try_current() {
            Ok(runtime) => runtime,
            Err(err) => {
                tracing::warn!(label = %self.label, %err, "no async runtime to compute on");
                let mut slot = lock(&self.slot);
                slot.state = CellState::Failed;
                slot.last_error = Some(err.to_string());
                slot.failures += 1;
                return;
            }
        };

        tracing::debug!(label = %self.label, generation, "computing cached value");
        let (done_tx, done_rx) = oneshot::channel();
        let computation = (self.compute)(deps.unwrap_or_default());
        let slot = Arc::clone(&self.slot);
        let host = Arc::clone(&self.host);
        let label = self.label.clone();

        // Announce before spawning so the host never sees the settle first.
        self.host.pending(PendingOperation::new(label.clone(), done_rx));

        runtime.spawn(async move {
            let result = computation.await;
            let settled = {
                let mut slot = lock(&slot);
                if slot.generation != generation {
                    Settled::Superseded
                } else {
                    match result {
                        Ok(value) => {
                            slot.value = Some(value);
                            slot.state = CellState::Resolved;
                            slot.failures = 0;
                            Settled::Resolved
                        }
                        Err(err) => {
                            tracing::warn!(%label, error = %err, "cached computation failed");
                            slot.state = CellState::Failed;
                            slot.last_error = Some(err);
                            slot.failures += 1;
                            Settled::Failed
                        }
                    }
                }
            };
            if settled != Settled::Superseded {
                host.request_update();
            }
            let _ = done_tx.send(settled);
        });
    }
}

impl<T, K> Drop for CachedTask<T, K> {
    fn drop(&mut self) {
        // Anything still running now settles as superseded.
        lock(&self.slot).generation += 1;
    }
}

impl<T, K> std::fmt::Debug for CachedTask<T, K> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let slot = lock(&self.slot);
        f.debug_struct("CachedTask")
            .field("label", &self.label)
            .field("state", &slot.state)
            .field("generation", &slot.generation)
            .field("retry", &self.retry)
            .finish()
    }
}
