//! Session statistics

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters updated as a session works.
#[derive(Debug, Default)]
pub(crate) struct SessionCounters {
    requests: AtomicU64,
    sends: AtomicU64,
    retries: AtomicU64,
    redirects: AtomicU64,
    failures: AtomicU64,
}

impl SessionCounters {
    pub(crate) fn record_request(&self) {
        self.requests.fetch_add(1, Ordering::Relaxed);
    }

    /// One attempt on the wire (or at connecting).
    pub(crate) fn record_send(&self) {
        self.sends.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_retry(&self) {
        self.retries.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_redirect(&self) {
        self.redirects.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_failure(&self) {
        self.failures.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> SessionStats {
        SessionStats {
            requests: self.requests.load(Ordering::Relaxed),
            sends: self.sends.load(Ordering::Relaxed),
            retries: self.retries.load(Ordering::Relaxed),
            redirects: self.redirects.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of a session's counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionStats {
    /// Logical requests started.
    pub requests: u64,
    /// Attempts, each redirect hop and each retry counted.
    pub sends: u64,
    pub retries: u64,
    pub redirects: u64,
    /// Requests that ended in an error.
    pub failures: u64,
}
