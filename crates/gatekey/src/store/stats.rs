//! Operation counters shared by both store variants.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Runtime statistics
#[derive(Debug, Default)]
pub struct StoreStats {
    /// Successful inserts
    pub pushed: AtomicU64,
    /// Pushes rejected because the id was live
    pub collisions: AtomicU64,
    /// Pops that returned a value
    pub popped: AtomicU64,
    /// Pops that found nothing (unknown, expired, or consumed)
    pub misses: AtomicU64,
    /// Entries removed by the sweeper
    pub evicted: AtomicU64,
    /// Expired ids already gone when the sweeper tried to delete them
    pub sweep_anomalies: AtomicU64,
    /// Transport or decode failures talking to the backing service
    pub backend_errors: AtomicU64,
}

impl StoreStats {
    pub fn record_push(&self, inserted: bool) {
        if inserted {
            self.pushed.fetch_add(1, Ordering::Relaxed);
        } else {
            self.collisions.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_pop(&self, found: bool) {
        if found {
            self.popped.fetch_add(1, Ordering::Relaxed);
        } else {
            self.misses.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_sweep(&self, evicted: usize, anomalies: usize) {
        self.evicted.fetch_add(evicted as u64, Ordering::Relaxed);
        self.sweep_anomalies.fetch_add(anomalies as u64, Ordering::Relaxed);
    }

    pub fn record_backend_error(&self) {
        self.backend_errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Get statistics snapshot
    pub fn snapshot(&self) -> StoreStatsSnapshot {
        StoreStatsSnapshot {
            pushed: self.pushed.load(Ordering::Relaxed),
            collisions: self.collisions.load(Ordering::Relaxed),
            popped: self.popped.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            evicted: self.evicted.load(Ordering::Relaxed),
            sweep_anomalies: self.sweep_anomalies.load(Ordering::Relaxed),
            backend_errors: self.backend_errors.load(Ordering::Relaxed),
        }
    }
}

/// Snapshot of store statistics
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct StoreStatsSnapshot {
    pub pushed: u64,
    pub collisions: u64,
    pub popped: u64,
    pub misses: u64,
    pub evicted: u64,
    pub sweep_anomalies: u64,
    pub backend_errors: u64,
}
