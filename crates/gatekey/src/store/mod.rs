//! Challenge persistence.
//!
//! Two interchangeable backends behind one contract:
//! - `push(id, value)` inserts only if `id` has no live entry
//! - `pop(id)` atomically removes and returns the value, or reports absence
//!
//! Unknown, expired and already-consumed ids all look the same to `pop`.
//! Transport failures of the backing service are reported as errors, never
//! as a miss.

mod factory;
mod memory;
mod redis_store;
mod stats;

pub use factory::{StoreParams, build, resolve};
pub use memory::{MemoryStore, MemoryStoreConfig, SweepReport};
pub use redis_store::{RedisStore, RedisStoreConfig};
pub use stats::StoreStatsSnapshot;

use gatekey_common::{GatekeyError, StoreKind};
use thiserror::Error;

/// Store-level errors
#[derive(Debug, Error)]
pub enum StoreError {
    /// Unknown store type or a required parameter is missing/invalid
    #[error("store is not configured: {0}")]
    Unconfigured(String),

    /// The backing service could not be reached or rejected the command
    #[error("backing service error: {0}")]
    Backend(#[from] redis::RedisError),

    /// A stored value could not be decoded
    #[error("stored value is not valid UTF-8: {0}")]
    Decode(String),
}

impl From<StoreError> for GatekeyError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Unconfigured(msg) => GatekeyError::Config(msg),
            other => GatekeyError::StoreUnavailable(other.to_string()),
        }
    }
}

/// The challenge store shared by every request handler
pub enum Store {
    Memory(MemoryStore),
    Redis(RedisStore),
}

impl Store {
    /// Backend tag, for diagnostics
    pub fn kind(&self) -> StoreKind {
        match self {
            Self::Memory(_) => StoreKind::Cache,
            Self::Redis(_) => StoreKind::Redis,
        }
    }

    /// Insert `value` under `id`. `Ok(false)` means the id is already live.
    pub async fn push(&self, id: &str, value: &str) -> Result<bool, StoreError> {
        match self {
            Self::Memory(store) => Ok(store.push(id, value)),
            Self::Redis(store) => store.push(id, value).await,
        }
    }

    /// Remove and return the value under `id`. `Ok(None)` means no live entry.
    pub async fn pop(&self, id: &str) -> Result<Option<String>, StoreError> {
        match self {
            Self::Memory(store) => Ok(store.pop(id)),
            Self::Redis(store) => store.pop(id).await,
        }
    }

    /// Readiness probe
    pub async fn ping(&self) -> Result<(), StoreError> {
        match self {
            Self::Memory(_) => Ok(()),
            Self::Redis(store) => store.ping().await,
        }
    }

    /// Live entry count, when the backend can tell cheaply
    pub fn live_entries(&self) -> Option<usize> {
        match self {
            Self::Memory(store) => Some(store.len()),
            Self::Redis(_) => None,
        }
    }

    /// Run one eviction pass now. `None` when the backend expires keys itself.
    pub fn sweep(&self) -> Option<SweepReport> {
        match self {
            Self::Memory(store) => Some(store.sweep()),
            Self::Redis(_) => None,
        }
    }

    /// Whether a background sweeper is attached. `None` for Redis.
    pub fn is_sweeping(&self) -> Option<bool> {
        match self {
            Self::Memory(store) => Some(store.is_sweeping()),
            Self::Redis(_) => None,
        }
    }

    pub fn stats(&self) -> StoreStatsSnapshot {
        match self {
            Self::Memory(store) => store.stats(),
            Self::Redis(store) => store.stats(),
        }
    }

    /// Release background resources (joins the in-process sweeper)
    pub async fn shutdown(&self) {
        match self {
            Self::Memory(store) => store.shutdown().await,
            Self::Redis(_) => {}
        }
    }
}

impl From<MemoryStore> for Store {
    fn from(store: MemoryStore) -> Self {
        Self::Memory(store)
    }
}

impl From<RedisStore> for Store {
    fn from(store: RedisStore) -> Self {
        Self::Redis(store)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn memory_store() -> Store {
        MemoryStore::new(MemoryStoreConfig::from_secs(90, 0)).unwrap().into()
    }

    #[tokio::test]
    async fn test_store_contract_through_enum() {
        let store = memory_store();
        assert_eq!(store.kind(), StoreKind::Cache);
        tokio_test::assert_ok!(store.ping().await);

        assert!(store.push("u1", "AA").await.unwrap());
        assert!(!store.push("u1", "BB").await.unwrap());
        assert_eq!(store.live_entries(), Some(1));
        assert_eq!(store.pop("u1").await.unwrap().as_deref(), Some("AA"));
        assert_eq!(store.pop("u1").await.unwrap(), None);

        assert_eq!(store.is_sweeping(), Some(false));
        assert_eq!(store.sweep(), Some(SweepReport::default()));

        let stats = store.stats();
        assert_eq!((stats.pushed, stats.collisions), (1, 1));
        assert_eq!((stats.popped, stats.misses), (1, 1));
        store.shutdown().await;
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_tasks_share_one_store() {
        let store = Arc::new(memory_store());

        let tasks: Vec<_> = (0..8)
            .map(|t| {
                let store = Arc::clone(&store);
                tokio::spawn(async move {
                    for i in 0..50 {
                        let id = format!("t{t}-{i}");
                        assert!(store.push(&id, &id).await.unwrap());
                    }
                })
            })
            .collect();
        for task in tasks {
            task.await.unwrap();
        }

        assert_eq!(store.live_entries(), Some(400));
        for t in 0..8 {
            for i in 0..50 {
                let id = format!("t{t}-{i}");
                assert_eq!(store.pop(&id).await.unwrap(), Some(id));
            }
        }
    }

    #[test]
    fn test_error_mapping() {
        let err: GatekeyError = StoreError::Unconfigured("missing ttl_secs".to_string()).into();
        assert_eq!(err.status_code(), 500);

        let err: GatekeyError = StoreError::Decode("bad byte".to_string()).into();
        assert_eq!(err.status_code(), 503);
    }
}
