//! In-flight request tracking.
//!
//! # Responsibilities
//! - Count requests currently being handled
//! - Report the count when a shutdown deadline expires
//!
//! # Design Decisions
//! - A guard per request; the count drops when the handler future ends,
//!   whether it completed or was cancelled

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Process-wide sequence for request log correlation.
static REQUEST_SEQ: AtomicU64 = AtomicU64::new(1);

/// Counts in-flight requests.
#[derive(Debug, Clone, Default)]
pub struct RequestTracker {
    active: Arc<AtomicU64>,
}

impl RequestTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a new in-flight request. The guard decrements on drop.
    pub fn track(&self) -> RequestGuard {
        self.active.fetch_add(1, Ordering::SeqCst);
        RequestGuard {
            active: Arc::clone(&self.active),
            seq: REQUEST_SEQ.fetch_add(1, Ordering::Relaxed),
        }
    }

    pub fn active_count(&self) -> u64 {
        self.active.load(Ordering::SeqCst)
    }
}

/// Lifetime of one tracked request.
#[derive(Debug)]
pub struct RequestGuard {
    active: Arc<AtomicU64>,
    seq: u64,
}

impl RequestGuard {
    pub fn seq(&self) -> u64 {
        self.seq
    }
}

impl Drop for RequestGuard {
    fn drop(&mut self) {
        self.active.fetch_sub(1, Ordering::SeqCst);
        tracing::trace!(seq = self.seq, "Request finished");
    }
}
