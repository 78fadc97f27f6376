//! CAPTCHA generation and verification.
//!
//! The answer text is stored under a fresh id; verification pops it once.

mod generator;
mod render;
mod textgen;
mod verifier;

pub use generator::CaptchaGenerator;
pub use render::to_data_url;
pub use verifier::verify;
