//! In-process challenge store with TTL eviction.
//!
//! A single mutex guards the whole id -> entry map. `push`, `pop` and the
//! sweep all run under that lock and never await while holding it, so every
//! state transition of an id (absent -> live -> absent) is atomic.
//!
//! Entries are not checked for age on `pop`: they stay redeemable until the
//! background sweeper observes `age >= ttl` and removes them. Timestamps come
//! from `tokio::time::Instant`, so a paused runtime clock drives eviction
//! deterministically in tests.

use parking_lot::Mutex;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use super::StoreError;
use super::stats::{StoreStats, StoreStatsSnapshot};

/// Configuration for the in-process store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryStoreConfig {
    /// Age at which an entry becomes eligible for eviction
    pub ttl: Duration,
    /// Cadence of the background sweep (zero disables it)
    pub sweep_interval: Duration,
}

impl MemoryStoreConfig {
    pub fn from_secs(ttl_secs: u64, sweep_interval_secs: u64) -> Self {
        Self {
            ttl: Duration::from_secs(ttl_secs),
            sweep_interval: Duration::from_secs(sweep_interval_secs),
        }
    }
}

#[derive(Debug, Clone)]
struct Entry {
    value: String,
    inserted_at: Instant,
}

/// Summary of one sweep pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    /// Entries younger than the TTL
    pub kept: usize,
    /// Entries old enough to evict
    pub expired: usize,
    /// Expired ids that were already gone at deletion time
    pub anomalies: usize,
}

impl SweepReport {
    /// Entry count at the start of the pass
    pub fn original(&self) -> usize {
        self.kept + self.expired
    }
}

struct Inner {
    entries: Mutex<HashMap<String, Entry>>,
    ttl: Duration,
    stats: StoreStats,
}

impl Inner {
    fn push(&self, id: &str, value: &str) -> bool {
        let inserted = {
            let mut entries = self.entries.lock();
            if entries.contains_key(id) {
                false
            } else {
                entries.insert(
                    id.to_string(),
                    Entry {
                        value: value.to_string(),
                        inserted_at: Instant::now(),
                    },
                );
                true
            }
        };

        self.stats.record_push(inserted);
        if inserted {
            tracing::debug!(challenge_id = %id, "Stored challenge");
        } else {
            tracing::debug!(challenge_id = %id, "Challenge id already live");
        }
        inserted
    }

    fn pop(&self, id: &str) -> Option<String> {
        let value = self.entries.lock().remove(id).map(|entry| entry.value);

        self.stats.record_pop(value.is_some());
        if value.is_some() {
            tracing::debug!(challenge_id = %id, "Consumed challenge");
        }
        value
    }

    fn sweep(&self) -> SweepReport {
        let report = {
            let mut entries = self.entries.lock();
            let now = Instant::now();

            let expired: Vec<String> = entries
                .iter()
                .filter(|(_, entry)| now.saturating_duration_since(entry.inserted_at) >= self.ttl)
                .map(|(id, _)| id.clone())
                .collect();
            let kept = entries.len() - expired.len();
            let anomalies = remove_expired(&mut entries, &expired);

            SweepReport {
                kept,
                expired: expired.len(),
                anomalies,
            }
        };

        self.stats
            .record_sweep(report.expired - report.anomalies, report.anomalies);
        report
    }
}

/// Delete each expired id, counting the ones that had already disappeared.
fn remove_expired(entries: &mut HashMap<String, Entry>, expired: &[String]) -> usize {
    expired
        .iter()
        .filter(|id| entries.remove(id.as_str()).is_none())
        .count()
}

/// Handle on the background sweep task
struct Sweeper {
    shutdown_tx: watch::Sender<bool>,
    task: JoinHandle<()>,
}

/// In-process TTL store
pub struct MemoryStore {
    inner: Arc<Inner>,
    sweeper: Mutex<Option<Sweeper>>,
}

impl MemoryStore {
    /// Create the store and, unless the sweep interval is zero, spawn its
    /// sweeper on the current Tokio runtime.
    pub fn new(config: MemoryStoreConfig) -> Result<Self, StoreError> {
        let inner = Arc::new(Inner {
            entries: Mutex::new(HashMap::new()),
            ttl: config.ttl,
            stats: StoreStats::default(),
        });

        let sweeper = if config.sweep_interval.is_zero() {
            tracing::warn!("Sweep interval is zero, expired challenges are only removed by manual sweeps");
            None
        } else {
            let runtime = tokio::runtime::Handle::try_current().map_err(|_| {
                StoreError::Unconfigured(
                    "in-process store needs a Tokio runtime for its sweeper".to_string(),
                )
            })?;
            let (shutdown_tx, shutdown_rx) = watch::channel(false);
            let task = runtime.spawn(sweep_worker(
                Arc::clone(&inner),
                config.sweep_interval,
                shutdown_rx,
            ));
            Some(Sweeper { shutdown_tx, task })
        };

        tracing::info!(
            ttl_secs = config.ttl.as_secs(),
            sweep_interval_secs = config.sweep_interval.as_secs(),
            "In-process challenge store initialised"
        );

        Ok(Self {
            inner,
            sweeper: Mutex::new(sweeper),
        })
    }

    /// Insert `value` under `id` unless the id is already live
    pub fn push(&self, id: &str, value: &str) -> bool {
        self.inner.push(id, value)
    }

    /// Remove and return the value stored under `id`
    pub fn pop(&self, id: &str) -> Option<String> {
        self.inner.pop(id)
    }

    /// Evict every entry whose age has reached the TTL
    pub fn sweep(&self) -> SweepReport {
        self.inner.sweep()
    }

    /// Number of live entries
    pub fn len(&self) -> usize {
        self.inner.entries.lock().len()
    }

    pub fn stats(&self) -> StoreStatsSnapshot {
        self.inner.stats.snapshot()
    }

    /// Whether the background sweeper is still attached
    pub fn is_sweeping(&self) -> bool {
        self.sweeper.lock().is_some()
    }

    /// Stop the sweeper and wait for it to exit. Safe to call repeatedly.
    pub async fn shutdown(&self) {
        let sweeper = self.sweeper.lock().take();
        let Some(sweeper) = sweeper else {
            return;
        };

        let _ = sweeper.shutdown_tx.send(true);
        if let Err(e) = sweeper.task.await {
            tracing::error!(error = %e, "Sweeper task ended abnormally");
        }
        tracing::debug!("Sweeper stopped");
    }
}

/// Background task evicting expired entries on a fixed cadence.
///
/// Exits when shutdown is signalled or the sender is dropped with the store.
async fn sweep_worker(inner: Arc<Inner>, period: Duration, mut shutdown: watch::Receiver<bool>) {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    // First tick completes immediately
    ticker.tick().await;

    tracing::debug!(period_secs = period.as_secs(), "Sweeper started");

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let report = inner.sweep();
                tracing::debug!(
                    original = report.original(),
                    kept = report.kept,
                    expired = report.expired,
                    anomalies = report.anomalies,
                    "Sweep report"
                );
                if report.anomalies > 0 {
                    tracing::warn!(
                        anomalies = report.anomalies,
                        "Expired challenges vanished before eviction"
                    );
                }
            }
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    break;
                }
            }
        }
    }
}
