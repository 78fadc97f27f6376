//! Store construction from configuration.
//!
//! `resolve` is a pure function from a type tag plus parameters to a fully
//! validated `StoreSpec`; `build` turns that spec into a running store. An
//! unknown tag or a missing required parameter is an `Unconfigured` error,
//! never a silent fallback. Instances are not cached.

use gatekey_common::StoreKind;
use gatekey_common::constants::{DEFAULT_CONNECT_RETRIES, DEFAULT_KEY_PREFIX};
use serde::Deserialize;

use super::{MemoryStore, MemoryStoreConfig, RedisStore, RedisStoreConfig, Store, StoreError};

/// Constructor parameters for either backend.
///
/// cache: `ttl_secs`, `sweep_interval_secs`
/// redis: `host`, `port`, `ttl_secs`, optional `decode_responses` (true),
/// `key_prefix` (`captcha:`) and `connect_retries` (6)
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct StoreParams {
    pub ttl_secs: Option<u64>,
    pub sweep_interval_secs: Option<u64>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub decode_responses: Option<bool>,
    pub key_prefix: Option<String>,
    pub connect_retries: Option<usize>,
}

/// Fully validated construction recipe
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreSpec {
    Memory(MemoryStoreConfig),
    Redis(RedisStoreConfig),
}

impl StoreSpec {
    pub fn kind(&self) -> StoreKind {
        match self {
            Self::Memory(_) => StoreKind::Cache,
            Self::Redis(_) => StoreKind::Redis,
        }
    }
}

fn required<T: Clone>(value: &Option<T>, kind: StoreKind, field: &str) -> Result<T, StoreError> {
    value
        .clone()
        .ok_or_else(|| StoreError::Unconfigured(format!("{kind} store requires '{field}'")))
}

/// Validate a type tag and its parameters
pub fn resolve(kind: &str, params: &StoreParams) -> Result<StoreSpec, StoreError> {
    let kind = kind
        .parse::<StoreKind>()
        .map_err(|e| StoreError::Unconfigured(e.to_string()))?;

    match kind {
        StoreKind::Cache => {
            let ttl_secs = required(&params.ttl_secs, kind, "ttl_secs")?;
            let sweep_interval_secs = required(&params.sweep_interval_secs, kind, "sweep_interval_secs")?;
            Ok(StoreSpec::Memory(MemoryStoreConfig::from_secs(
                ttl_secs,
                sweep_interval_secs,
            )))
        }
        StoreKind::Redis => {
            let host = required(&params.host, kind, "host")?;
            if host.trim().is_empty() {
                return Err(StoreError::Unconfigured("redis store requires a non-empty 'host'".to_string()));
            }
            let port = required(&params.port, kind, "port")?;
            let ttl_secs = required(&params.ttl_secs, kind, "ttl_secs")?;
            // Redis rejects `SET .. EX 0`
            if ttl_secs == 0 {
                return Err(StoreError::Unconfigured("redis store requires 'ttl_secs' >= 1".to_string()));
            }
            Ok(StoreSpec::Redis(RedisStoreConfig {
                host,
                port,
                ttl_secs,
                decode_responses: params.decode_responses.unwrap_or(true),
                key_prefix: params
                    .key_prefix
                    .clone()
                    .unwrap_or_else(|| DEFAULT_KEY_PREFIX.to_string()),
                connect_retries: params.connect_retries.unwrap_or(DEFAULT_CONNECT_RETRIES),
            }))
        }
    }
}

/// Construct a store from a validated spec
async fn build_from_spec(spec: StoreSpec) -> Result<Store, StoreError> {
    match spec {
        StoreSpec::Memory(config) => Ok(Store::Memory(MemoryStore::new(config)?)),
        StoreSpec::Redis(config) => Ok(Store::Redis(RedisStore::connect(config).await?)),
    }
}

/// Validate and construct in one step
pub async fn build(kind: &str, params: &StoreParams) -> Result<Store, StoreError> {
    let spec = resolve(kind, params)?;
    tracing::debug!(kind = %spec.kind(), "Building challenge store");
    build_from_spec(spec).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn cache_params() -> StoreParams {
        StoreParams {
            ttl_secs: Some(3),
            sweep_interval_secs: Some(2),
            ..Default::default()
        }
    }

    fn redis_params() -> StoreParams {
        StoreParams {
            ttl_secs: Some(90),
            host: Some("10.0.0.5".to_string()),
            port: Some(6380),
            ..Default::default()
        }
    }

    #[test]
    fn test_resolve_cache() {
        let spec = resolve("cache", &cache_params()).unwrap();
        assert_eq!(
            spec,
            StoreSpec::Memory(MemoryStoreConfig {
                ttl: Duration::from_secs(3),
                sweep_interval: Duration::from_secs(2),
            })
        );
        assert_eq!(spec.kind(), StoreKind::Cache);
    }

    #[test]
    fn test_resolve_redis_applies_optional_defaults() {
        let spec = resolve("redis", &redis_params()).unwrap();
        let StoreSpec::Redis(config) = spec else {
            panic!("expected redis spec");
        };
        assert_eq!(config.host, "10.0.0.5");
        assert_eq!(config.port, 6380);
        assert_eq!(config.ttl_secs, 90);
        assert!(config.decode_responses);
        assert_eq!(config.key_prefix, "captcha:");
        assert_eq!(config.connect_retries, 6);
    }

    #[test]
    fn test_unknown_kind_is_unconfigured() {
        let err = resolve("memcached", &cache_params()).unwrap_err();
        assert!(matches!(err, StoreError::Unconfigured(ref msg) if msg.contains("memcached")));
    }

    #[test]
    fn test_missing_field_names_it() {
        let params = StoreParams {
            sweep_interval_secs: None,
            ..cache_params()
        };
        let err = resolve("cache", &params).unwrap_err();
        assert!(matches!(err, StoreError::Unconfigured(ref msg) if msg.contains("sweep_interval_secs")));

        let params = StoreParams {
            host: None,
            ..redis_params()
        };
        let err = resolve("redis", &params).unwrap_err();
        assert!(matches!(err, StoreError::Unconfigured(ref msg) if msg.contains("host")));
    }

    #[test]
    fn test_redis_rejects_zero_ttl() {
        let params = StoreParams {
            ttl_secs: Some(0),
            ..redis_params()
        };
        assert!(matches!(resolve("redis", &params), Err(StoreError::Unconfigured(_))));
    }

    #[tokio::test]
    async fn test_build_cache_store() {
        let store = build("cache", &cache_params()).await.unwrap();
        assert_eq!(store.kind(), StoreKind::Cache);
        assert!(store.push("u1", "AA").await.unwrap());
        store.shutdown().await;
    }

    #[tokio::test]
    async fn test_build_does_not_cache_instances() {
        let first = build("cache", &cache_params()).await.unwrap();
        let second = build("cache", &cache_params()).await.unwrap();

        assert!(first.push("u1", "AA").await.unwrap());
        assert_eq!(second.pop("u1").await.unwrap(), None);

        first.shutdown().await;
        second.shutdown().await;
    }
}
