//! # Gatekey Common
//!
//! Shared types, constants, and errors used across Gatekey components.
//!
//! ## Modules
//! - `types` - Wire types (StoreKind, ValidationResult, ChallengePayload)
//! - `error` - Service-level error type
//! - `constants` - Shared configuration defaults

pub mod constants;
pub mod error;
pub mod types;

pub use error::GatekeyError;
pub use types::*;
