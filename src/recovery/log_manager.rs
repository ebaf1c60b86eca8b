//! Log manager handle.

use std::sync::atomic::{AtomicU64, Ordering};

/// Hands out monotonically increasing log sequence numbers.
///
/// The buffer pool accepts one at construction so the wiring exists for
/// a write-ahead log; no logging or recovery happens at this layer.
#[derive(Debug, Default)]
pub struct LogManager {
    next_lsn: AtomicU64,
}

impl LogManager {
    /// Create a log manager starting at LSN 0.
    pub fn new() -> Self {
        Self {
            next_lsn: AtomicU64::new(0),
        }
    }

    /// Reserve and return the next log sequence number.
    pub fn next_lsn(&self) -> u64 {
        self.next_lsn.fetch_add(1, Ordering::Relaxed)
    }

    /// The LSN the next call to [`next_lsn`](Self::next_lsn) will return.
    pub fn current_lsn(&self) -> u64 {
        self.next_lsn.load(Ordering::Relaxed)
    }
}
