//! Shared constants for Gatekey components.

/// Default HTTP listen address
pub const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:8000";

/// Default challenge lifetime in seconds, for both store variants
pub const DEFAULT_TTL_SECS: u64 = 90;

/// Default sweep cadence of the in-process store
pub const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 10;

/// Default Redis host
pub const DEFAULT_REDIS_HOST: &str = "127.0.0.1";

/// Default Redis port
pub const DEFAULT_REDIS_PORT: u16 = 6379;

/// Reconnect attempts before a Redis connection is reported as failed
pub const DEFAULT_CONNECT_RETRIES: usize = 6;

/// Key namespace for challenges stored in Redis: captcha:{challenge_id}
pub const DEFAULT_KEY_PREFIX: &str = "captcha:";

/// Default CAPTCHA image size in pixels
pub const DEFAULT_IMAGE_WIDTH: u32 = 280;
pub const DEFAULT_IMAGE_HEIGHT: u32 = 100;

/// Default length of generated challenge text
pub const DEFAULT_TEXT_LENGTH: usize = 10;

/// Default charset for generated challenge text
pub const DEFAULT_ALLOWED_CHARS: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Id regenerations allowed before issuing a challenge gives up
pub const DEFAULT_MAX_PUSH_ATTEMPTS: u32 = 16;

/// Environment variable prefix for configuration overrides
pub const ENV_PREFIX: &str = "GATEKEY";

/// HTTP header names
pub mod headers {
    /// Challenge id returned alongside the rendered image
    pub const CAPTCHA_UUID: &str = "captcha-uuid";
}
