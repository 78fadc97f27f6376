//! Core types shared across Gatekey components.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which persistence backend holds the challenges.
///
/// The textual tags (`cache`, `redis`) are what configuration files and
/// environment variables use to select a backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    /// In-process map with a background sweeper
    Cache,
    /// Remote Redis with native key expiry
    Redis,
}

impl StoreKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cache => "cache",
            Self::Redis => "redis",
        }
    }
}

impl fmt::Display for StoreKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a store tag is not one of the recognized values
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownStoreKind(pub String);

impl fmt::Display for UnknownStoreKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown store type '{}' (expected 'cache' or 'redis')", self.0)
    }
}

impl std::error::Error for UnknownStoreKind {}

impl FromStr for StoreKind {
    type Err = UnknownStoreKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cache" => Ok(Self::Cache),
            "redis" => Ok(Self::Redis),
            _ => Err(UnknownStoreKind(s.to_string())),
        }
    }
}

/// Outcome of a validation request.
///
/// A single boolean: unknown, expired, consumed and mismatched
/// challenges all look the same to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub validation: bool,
}

/// Challenge data sent to JSON clients
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChallengePayload {
    /// Unique challenge id, to be echoed back on verification
    pub challenge_id: String,

    /// Base64-encoded SVG as a data URL
    pub image_data: String,

    /// Image dimensions in pixels
    pub width: u32,
    pub height: u32,

    /// Seconds until the challenge stops being accepted
    pub expires_in_secs: u64,

    /// Expiry as Unix epoch seconds
    pub expires_at: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_kind_parse() {
        assert_eq!("cache".parse::<StoreKind>().unwrap(), StoreKind::Cache);
        assert_eq!(" Redis ".parse::<StoreKind>().unwrap(), StoreKind::Redis);
        let err = "memcached".parse::<StoreKind>().unwrap_err();
        assert_eq!(err, UnknownStoreKind("memcached".to_string()));
    }

    #[test]
    fn test_store_kind_serde_tag() {
        let json = serde_json::to_string(&StoreKind::Cache).unwrap();
        assert_eq!(json, "\"cache\"");
        let parsed: StoreKind = serde_json::from_str("\"redis\"").unwrap();
        assert_eq!(parsed, StoreKind::Redis);
        assert_eq!(StoreKind::Redis.to_string(), "redis");
    }

    #[test]
    fn test_validation_result_shape() {
        let json = serde_json::to_value(ValidationResult { validation: false }).unwrap();
        assert_eq!(json, serde_json::json!({ "validation": false }));
    }
}
