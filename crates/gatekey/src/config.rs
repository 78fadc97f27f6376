//! Configuration management for Gatekey.
//!
//! Layers, lowest to highest priority: built-in defaults, optional TOML
//! file, `GATEKEY__*` environment variables, CLI flags.

use anyhow::{Context, Result, bail};
use serde::Deserialize;
use std::path::Path;

use gatekey_common::constants::{
    DEFAULT_ALLOWED_CHARS, DEFAULT_CONNECT_RETRIES, DEFAULT_IMAGE_HEIGHT, DEFAULT_IMAGE_WIDTH, DEFAULT_KEY_PREFIX,
    DEFAULT_LISTEN_ADDR, DEFAULT_MAX_PUSH_ATTEMPTS, DEFAULT_REDIS_HOST, DEFAULT_REDIS_PORT,
    DEFAULT_SWEEP_INTERVAL_SECS, DEFAULT_TEXT_LENGTH, DEFAULT_TTL_SECS, ENV_PREFIX,
};
use gatekey_common::StoreKind;

use crate::store::{self, StoreParams};

/// Application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// HTTP listen address
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    /// Challenge store configuration
    #[serde(default)]
    pub store: StoreConfig,

    /// CAPTCHA configuration
    #[serde(default)]
    pub captcha: CaptchaConfig,
}

/// Store selection plus backend parameters.
///
/// Missing keys in a `[store]` table fall back to the defaults below; the
/// store factory still checks that every field its backend needs is set.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Backend tag: `cache` or `redis`
    #[serde(rename = "type")]
    pub kind: String,

    /// Entry lifetime in seconds (both backends)
    pub ttl_secs: Option<u64>,

    /// In-process sweep cadence in seconds
    pub sweep_interval_secs: Option<u64>,

    /// Redis host
    pub host: Option<String>,

    /// Redis port
    pub port: Option<u16>,

    /// Require UTF-8 replies from Redis
    pub decode_responses: Option<bool>,

    /// Redis key namespace
    pub key_prefix: Option<String>,

    /// Redis reconnect attempts
    pub connect_retries: Option<usize>,
}

impl StoreConfig {
    pub fn params(&self) -> StoreParams {
        StoreParams {
            ttl_secs: self.ttl_secs,
            sweep_interval_secs: self.sweep_interval_secs,
            host: self.host.clone(),
            port: self.port,
            decode_responses: self.decode_responses,
            key_prefix: self.key_prefix.clone(),
            connect_retries: self.connect_retries,
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            kind: StoreKind::Cache.to_string(),
            ttl_secs: Some(DEFAULT_TTL_SECS),
            sweep_interval_secs: Some(DEFAULT_SWEEP_INTERVAL_SECS),
            host: Some(DEFAULT_REDIS_HOST.to_string()),
            port: Some(DEFAULT_REDIS_PORT),
            decode_responses: Some(true),
            key_prefix: Some(DEFAULT_KEY_PREFIX.to_string()),
            connect_retries: Some(DEFAULT_CONNECT_RETRIES),
        }
    }
}

/// CAPTCHA-specific configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CaptchaConfig {
    /// Image width in pixels
    #[serde(default = "default_width")]
    pub width: u32,

    /// Image height in pixels
    #[serde(default = "default_height")]
    pub height: u32,

    /// Length of the generated answer
    #[serde(default = "default_text_length")]
    pub text_length: usize,

    /// Characters the answer is drawn from
    #[serde(default = "default_allowed_chars")]
    pub allowed_chars: String,

    /// Id regenerations before issuing gives up
    #[serde(default = "default_max_push_attempts")]
    pub max_push_attempts: u32,
}

impl Default for CaptchaConfig {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
            text_length: default_text_length(),
            allowed_chars: default_allowed_chars(),
            max_push_attempts: default_max_push_attempts(),
        }
    }
}

// Default value functions
fn default_listen_addr() -> String { DEFAULT_LISTEN_ADDR.to_string() }
fn default_width() -> u32 { DEFAULT_IMAGE_WIDTH }
fn default_height() -> u32 { DEFAULT_IMAGE_HEIGHT }
fn default_text_length() -> usize { DEFAULT_TEXT_LENGTH }
fn default_allowed_chars() -> String { DEFAULT_ALLOWED_CHARS.to_string() }
fn default_max_push_attempts() -> u32 { DEFAULT_MAX_PUSH_ATTEMPTS }

/// `GATEKEY__SECTION__KEY` overrides.
///
/// Values stay strings here; numeric and boolean fields are converted during
/// deserialization, so string fields like `allowed_chars` keep leading zeros.
fn environment() -> config::Environment {
    config::Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("__")
        .separator("__")
}

/// Smallest image edge the renderer accepts
const MIN_IMAGE_EDGE: u32 = 16;

impl AppConfig {
    /// Load configuration from file and environment, with CLI overrides
    pub fn load(config_path: &str, args: &super::Args) -> Result<Self> {
        let mut builder = config::Config::builder();

        if Path::new(config_path).exists() {
            builder = builder.add_source(config::File::with_name(config_path));
        } else {
            tracing::warn!(path = %config_path, "Config file not found, using defaults");
        }

        let settings = builder
            .add_source(environment())
            .build()
            .context("Failed to load configuration")?;

        let mut config: Self = settings
            .try_deserialize()
            .context("Failed to parse config")?;

        // Apply CLI overrides
        if let Some(ref kind) = args.store {
            config.store.kind = kind.clone();
        }
        if let Some(ref listen) = args.listen {
            config.listen_addr = listen.clone();
        }
        if let Some(ref host) = args.redis_host {
            config.store.host = Some(host.clone());
        }
        if let Some(port) = args.redis_port {
            config.store.port = Some(port);
        }

        config.validate()?;
        Ok(config)
    }

    /// Reject settings the service cannot run with
    pub fn validate(&self) -> Result<()> {
        store::resolve(&self.store.kind, &self.store.params())
            .context("Invalid store configuration")?;

        let captcha = &self.captcha;
        if captcha.text_length == 0 {
            bail!("captcha.text_length must be at least 1");
        }
        if captcha.allowed_chars.is_empty() {
            bail!("captcha.allowed_chars must not be empty");
        }
        if captcha.width < MIN_IMAGE_EDGE || captcha.height < MIN_IMAGE_EDGE {
            bail!(
                "captcha image must be at least {MIN_IMAGE_EDGE}x{MIN_IMAGE_EDGE} (got {}x{})",
                captcha.width,
                captcha.height
            );
        }
        if captcha.max_push_attempts == 0 {
            bail!("captcha.max_push_attempts must be at least 1");
        }

        Ok(())
    }

    /// Seconds a freshly issued challenge stays redeemable
    pub fn challenge_ttl_secs(&self) -> u64 {
        self.store.ttl_secs.unwrap_or(DEFAULT_TTL_SECS)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            store: StoreConfig::default(),
            captcha: CaptchaConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn from_toml(toml: &str) -> AppConfig {
        config::Config::builder()
            .add_source(config::File::from_str(toml, config::FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }

    #[test]
    fn test_defaults_are_valid() {
        let config = AppConfig::default();
        assert_eq!(config.store.kind, "cache");
        assert_eq!(config.store.ttl_secs, Some(90));
        assert_eq!(config.store.sweep_interval_secs, Some(10));
        assert_eq!(config.captcha.width, 280);
        assert_eq!(config.captcha.height, 100);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_store_table_keeps_defaults() {
        let config = from_toml(
            r#"
            [store]
            type = "redis"
            port = 6380
            "#,
        );

        assert_eq!(config.store.kind, "redis");
        assert_eq!(config.store.port, Some(6380));
        assert_eq!(config.store.host.as_deref(), Some("127.0.0.1"));
        assert_eq!(config.captcha.text_length, 10);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_unknown_store_type_rejected() {
        let config = from_toml(
            r#"
            [store]
            type = "sqlite"
            "#,
        );
        assert!(config.validate().is_err());
    }

    fn from_env(vars: &[(&str, &str)]) -> AppConfig {
        let vars = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        config::Config::builder()
            .add_source(environment().source(Some(vars)))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }

    #[test]
    fn test_env_strings_kept_verbatim() {
        let config = from_env(&[
            ("GATEKEY__CAPTCHA__ALLOWED_CHARS", "0123456789"),
            ("GATEKEY__STORE__KEY_PREFIX", "007"),
        ]);

        assert_eq!(config.captcha.allowed_chars, "0123456789");
        assert_eq!(config.store.key_prefix.as_deref(), Some("007"));
    }

    #[test]
    fn test_env_numbers_and_flags_still_parse() {
        let config = from_env(&[
            ("GATEKEY__STORE__TYPE", "redis"),
            ("GATEKEY__STORE__PORT", "6380"),
            ("GATEKEY__STORE__DECODE_RESPONSES", "false"),
            ("GATEKEY__CAPTCHA__TEXT_LENGTH", "6"),
        ]);

        assert_eq!(config.store.kind, "redis");
        assert_eq!(config.store.port, Some(6380));
        assert_eq!(config.store.decode_responses, Some(false));
        assert_eq!(config.captcha.text_length, 6);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_charset_rejected() {
        let mut config = AppConfig::default();
        config.captcha.allowed_chars.clear();
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.captcha.text_length = 0;
        assert!(config.validate().is_err());
    }
}
