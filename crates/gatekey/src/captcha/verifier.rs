//! CAPTCHA verification logic.

use gatekey_common::GatekeyError;

use crate::store::Store;

/// Consume the challenge `challenge_id` and compare it against `guess`.
///
/// The challenge is removed whether or not the guess matches, so every id
/// can be checked at most once. Unknown, expired, consumed and mismatched
/// challenges all return `Ok(false)`; only store failures are errors.
pub async fn verify(store: &Store, challenge_id: &str, guess: &str) -> Result<bool, GatekeyError> {
    let stored = store.pop(challenge_id).await?;
    let success = stored.as_deref() == Some(guess);

    if success {
        tracing::info!(challenge_id = %challenge_id, "CAPTCHA verified successfully");
    } else {
        tracing::debug!(challenge_id = %challenge_id, "CAPTCHA verification failed");
    }

    Ok(success)
}
