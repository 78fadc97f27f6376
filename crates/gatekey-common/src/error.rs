//! Common error types for Gatekey components.

use thiserror::Error;

/// Service-level errors surfaced to HTTP callers
#[derive(Debug, Error)]
pub enum GatekeyError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Challenge store unreachable or misbehaving
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    /// Could not mint a fresh challenge id
    #[error("Challenge error: {0}")]
    Challenge(String),
}

impl GatekeyError {
    /// Returns the HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Config(_) => 500,
            Self::StoreUnavailable(_) => 503,
            Self::Challenge(_) => 500,
        }
    }

    /// Returns true if this error should be retried
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::StoreUnavailable(_) | Self::Challenge(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_unavailable_is_retryable_503() {
        let err = GatekeyError::StoreUnavailable("connection refused".to_string());
        assert_eq!(err.status_code(), 503);
        assert!(err.is_retryable());
        assert_eq!(err.to_string(), "Store unavailable: connection refused");
    }

    #[test]
    fn test_config_error_not_retryable() {
        let err = GatekeyError::Config("cache store requires 'ttl_secs'".to_string());
        assert_eq!(err.status_code(), 500);
        assert!(!err.is_retryable());
    }
}
