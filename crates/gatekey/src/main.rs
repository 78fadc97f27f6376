//! # Gatekey - one-shot CAPTCHA service
//!
//! Issues short-lived challenges (opaque id + secret answer) and redeems
//! each of them at most once.
//!
//! ## Architecture
//! ```text
//! Client → Gatekey (axum) → Store ─┬─ in-process map + sweeper
//!                                  └─ Redis (SET NX EX / GETDEL)
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

mod captcha;
mod config;
mod routes;
mod state;
mod store;

use config::AppConfig;
use state::AppState;

/// Gatekey - one-shot CAPTCHA service
#[derive(Parser, Debug)]
#[command(name = "gatekey")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short, long, default_value = "config/gatekey.toml")]
    config: String,

    /// Store backend: cache or redis (overrides config)
    #[arg(long, env = "GATEKEY_STORE")]
    store: Option<String>,

    /// Redis host (overrides config)
    #[arg(long, env = "GATEKEY_REDIS_HOST")]
    redis_host: Option<String>,

    /// Redis port (overrides config)
    #[arg(long, env = "GATEKEY_REDIS_PORT")]
    redis_port: Option<u16>,

    /// Listen address (overrides config)
    #[arg(short, long, env = "LISTEN_ADDR")]
    listen: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", env = "LOG_LEVEL")]
    log_level: String,

    /// Enable JSON logging output
    #[arg(long, default_value = "false")]
    json_logs: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Pick up a local .env before clap reads its env fallbacks
    let dotenv = dotenvy::dotenv();

    // Parse CLI arguments
    let args = Args::parse();

    // Initialize logging
    init_logging(&args.log_level, args.json_logs)?;

    info!("Starting Gatekey v{}", env!("CARGO_PKG_VERSION"));
    if let Ok(path) = dotenv {
        info!(path = %path.display(), "Loaded environment file");
    }

    // Load configuration
    let config = AppConfig::load(&args.config, &args)?;
    info!(store = %config.store.kind, "Configuration loaded");

    // One store for the whole process, handed to every handler
    let state = AppState::new(config.clone()).await?;
    let store = state.store.clone();
    info!(store = %store.kind(), "Challenge store ready");

    // Build router
    let app = routes::create_router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&config.listen_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.listen_addr))?;
    info!("Gatekey listening on {}", config.listen_addr);

    // Handle graceful shutdown
    let shutdown_signal = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
        info!("Shutdown signal received");
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal)
        .await
        .context("Server error")?;

    store.shutdown().await;

    info!("Gatekey shutdown complete");
    Ok(())
}

/// Initialize structured logging with tracing
fn init_logging(level: &str, json: bool) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true).with_thread_ids(true))
            .init();
    }

    Ok(())
}
