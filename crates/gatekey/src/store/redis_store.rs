//! Challenge store delegated to Redis.
//!
//! Redis owns both the data and the expiry clock: `push` is a conditional
//! `SET .. NX EX` and `pop` is an atomic `GETDEL` (Redis 6.2+). No local
//! timers or locks are involved; concurrent callers share one
//! auto-reconnecting connection manager.

use redis::aio::{ConnectionManager, ConnectionManagerConfig};

use super::StoreError;
use super::stats::{StoreStats, StoreStatsSnapshot};

/// Configuration for the Redis-backed store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedisStoreConfig {
    pub host: String,
    pub port: u16,
    /// Expiry applied to every key, in seconds (must be at least 1)
    pub ttl_secs: u64,
    /// Require replies to be valid UTF-8 instead of decoding lossily
    pub decode_responses: bool,
    /// Namespace prepended to every challenge id
    pub key_prefix: String,
    /// Reconnect attempts, including the initial connection
    pub connect_retries: usize,
}

impl RedisStoreConfig {
    /// Connection URL for the configured host and port
    pub fn url(&self) -> String {
        if self.host.contains(':') {
            format!("redis://[{}]:{}/", self.host, self.port)
        } else {
            format!("redis://{}:{}/", self.host, self.port)
        }
    }

    fn key(&self, id: &str) -> String {
        format!("{}{}", self.key_prefix, id)
    }
}

/// Redis-backed store
pub struct RedisStore {
    conn: ConnectionManager,
    config: RedisStoreConfig,
    stats: StoreStats,
}

impl RedisStore {
    /// Connect to Redis. Fails if the server cannot be reached.
    pub async fn connect(config: RedisStoreConfig) -> Result<Self, StoreError> {
        let client = redis::Client::open(config.url().as_str())?;
        let manager_config = ConnectionManagerConfig::new().set_number_of_retries(config.connect_retries);
        let conn = ConnectionManager::new_with_config(client, manager_config).await?;

        tracing::info!(
            host = %config.host,
            port = config.port,
            ttl_secs = config.ttl_secs,
            decode_responses = config.decode_responses,
            key_prefix = %config.key_prefix,
            "Redis challenge store initialised"
        );

        Ok(Self {
            conn,
            config,
            stats: StoreStats::default(),
        })
    }

    /// Insert `value` under `id` with the configured expiry, unless the key exists
    pub async fn push(&self, id: &str, value: &str) -> Result<bool, StoreError> {
        let mut conn = self.conn.clone();
        let reply: Option<String> = redis::cmd("SET")
            .arg(self.config.key(id))
            .arg(value)
            .arg("NX")
            .arg("EX")
            .arg(self.config.ttl_secs)
            .query_async(&mut conn)
            .await
            .map_err(|e| self.backend_error("push", id, e))?;

        let inserted = reply.is_some();
        self.stats.record_push(inserted);
        if inserted {
            tracing::debug!(challenge_id = %id, "Stored challenge");
        } else {
            tracing::debug!(challenge_id = %id, "Challenge id already live");
        }
        Ok(inserted)
    }

    /// Atomically fetch and delete the value stored under `id`
    pub async fn pop(&self, id: &str) -> Result<Option<String>, StoreError> {
        let mut conn = self.conn.clone();
        let reply: Option<Vec<u8>> = redis::cmd("GETDEL")
            .arg(self.config.key(id))
            .query_async(&mut conn)
            .await
            .map_err(|e| self.backend_error("pop", id, e))?;

        let value = match reply {
            Some(bytes) => match decode_reply(bytes, self.config.decode_responses) {
                Ok(value) => Some(value),
                Err(e) => {
                    self.stats.record_backend_error();
                    return Err(e);
                }
            },
            None => None,
        };

        self.stats.record_pop(value.is_some());
        if value.is_some() {
            tracing::debug!(challenge_id = %id, "Consumed challenge");
        }
        Ok(value)
    }

    /// Round-trip a PING to check the connection
    pub async fn ping(&self) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        let _: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(())
    }

    pub fn stats(&self) -> StoreStatsSnapshot {
        self.stats.snapshot()
    }

    fn backend_error(&self, op: &'static str, id: &str, err: redis::RedisError) -> StoreError {
        self.stats.record_backend_error();
        tracing::warn!(op, challenge_id = %id, error = %err, "Redis operation failed");
        StoreError::Backend(err)
    }
}

fn decode_reply(bytes: Vec<u8>, strict: bool) -> Result<String, StoreError> {
    if strict {
        String::from_utf8(bytes).map_err(|e| StoreError::Decode(e.to_string()))
    } else {
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}
