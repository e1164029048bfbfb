use std::sync::atomic::{AtomicU64, Ordering};

/// Live counters for a running message service. Shared with every worker
/// slot through an `Arc`; updates are atomic so slots never contend on a
/// lock.
#[derive(Debug, Default)]
pub struct ServiceStats {
    received: AtomicU64,
    succeeded: AtomicU64,
    retried: AtomicU64,
    dead_lettered: AtomicU64,
}

impl ServiceStats {
    pub(crate) fn record_received(&self) {
        self.received.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_succeeded(&self) {
        self.succeeded.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_retried(&self) {
        self.retried.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_dead_lettered(&self) {
        self.dead_lettered.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            received: self.received.load(Ordering::Relaxed),
            succeeded: self.succeeded.load(Ordering::Relaxed),
            retried: self.retried.load(Ordering::Relaxed),
            dead_lettered: self.dead_lettered.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time view of the service counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatsSnapshot {
    /// Messages pulled off In/priority queues.
    pub received: u64,
    /// Handler invocations that returned a response (or completed one-way).
    pub succeeded: u64,
    /// Failed attempts republished for retry.
    pub retried: u64,
    /// Messages routed to a dead-letter queue.
    pub dead_lettered: u64,
}
