//! Cooperative cancellation (§5: "the executor checks a cancellation
//! token between batches and on every row yield"). Grounded on the
//! teacher's `run::execute`, which tracks a cancelled/stopped run the
//! same way: a cloneable `Arc<AtomicBool>` flag checked at each
//! suspension point rather than a dedicated cancellation crate.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// A handle a caller holds to cancel an in-flight query. Cloning shares
/// the same underlying flag, so the caller's handle and the `Cursor`'s
/// handle observe the same cancellation.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        CancellationToken { cancelled: Arc::new(AtomicBool::new(false)) }
    }

    /// Request cancellation. Idempotent.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}
