//! Application state and shared resources.

use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Instant;

use crate::captcha::CaptchaGenerator;
use crate::config::AppConfig;
use crate::store::{self, Store};

/// Shared application state, cloned into every handler
#[derive(Clone)]
pub struct AppState {
    /// Application configuration
    pub config: AppConfig,

    /// The single challenge store for this process
    pub store: Arc<Store>,

    /// CAPTCHA generator
    pub captcha_generator: Arc<CaptchaGenerator>,

    /// Process start, for uptime reporting
    pub started_at: Instant,
}

impl AppState {
    /// Create new application state, constructing the configured store
    pub async fn new(config: AppConfig) -> Result<Self> {
        let store = store::build(&config.store.kind, &config.store.params())
            .await
            .with_context(|| format!("Failed to construct '{}' challenge store", config.store.kind))?;

        Ok(Self::with_store(config, store))
    }

    /// Assemble state around an already constructed store
    pub fn with_store(config: AppConfig, store: Store) -> Self {
        let captcha_generator = Arc::new(CaptchaGenerator::new(&config.captcha));

        Self {
            config,
            store: Arc::new(store),
            captcha_generator,
            started_at: Instant::now(),
        }
    }

    pub fn uptime_secs(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }
}
