mod host;
mod pending;
mod task;

pub use host::{Host, ViewHost};
pub use pending::{PendingOperation, PendingSender, PendingTracker, Settled};
pub use task::{CachedTask, CellState, Identity, RetryPolicy};
