//! Challenge issuing.
//!
//! Draws the answer text, reserves a fresh id for it in the store, and
//! renders the image. Id collisions are routine: a new UUID is minted until
//! the store accepts one or the attempt budget runs out.

use gatekey_common::GatekeyError;
use uuid::Uuid;

use super::{render, textgen};
use crate::config::CaptchaConfig;
use crate::store::Store;

/// A challenge that has been stored and is ready to hand out
#[derive(Debug, Clone)]
pub struct IssuedChallenge {
    /// Store id, echoed back by the client on verification
    pub id: String,
    /// Rendered SVG document
    pub svg: String,
}

/// CAPTCHA generator service
pub struct CaptchaGenerator {
    width: u32,
    height: u32,
    text_length: usize,
    allowed_chars: String,
    max_push_attempts: u32,
}

impl CaptchaGenerator {
    pub fn new(config: &CaptchaConfig) -> Self {
        Self {
            width: config.width,
            height: config.height,
            text_length: config.text_length,
            allowed_chars: config.allowed_chars.clone(),
            max_push_attempts: config.max_push_attempts,
        }
    }

    /// Image size in pixels
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Generate, store, and render a new challenge
    pub async fn issue(&self, store: &Store) -> Result<IssuedChallenge, GatekeyError> {
        let answer = textgen::random_text(&mut rand::rng(), self.text_length, &self.allowed_chars);
        let id = self
            .reserve_id(store, &answer, || Uuid::new_v4().to_string())
            .await?;
        let svg = render::render_svg(&answer, self.width, self.height, &mut rand::rng());

        tracing::debug!(challenge_id = %id, "Issued CAPTCHA challenge");

        Ok(IssuedChallenge { id, svg })
    }

    /// Push `answer` under ids from `next_id` until one is accepted
    async fn reserve_id(
        &self,
        store: &Store,
        answer: &str,
        mut next_id: impl FnMut() -> String,
    ) -> Result<String, GatekeyError> {
        for attempt in 1..=self.max_push_attempts {
            let id = next_id();
            if store.push(&id, answer).await? {
                return Ok(id);
            }
            tracing::debug!(challenge_id = %id, attempt, "Challenge id collision, regenerating");
        }

        Err(GatekeyError::Challenge(format!(
            "no free challenge id after {} attempts",
            self.max_push_attempts
        )))
    }
}
