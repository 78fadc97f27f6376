//! CAPTCHA generation and verification endpoints.

use axum::{
    Json,
    extract::{Path, State},
    http::{HeaderName, header},
    response::{IntoResponse, Response},
};
use serde::Deserialize;

use gatekey_common::constants::headers::CAPTCHA_UUID;
use gatekey_common::{ChallengePayload, ValidationResult};

use super::ApiError;
use crate::captcha;
use crate::state::AppState;

/// Issue a challenge and return the raw SVG, id in the `captcha-uuid` header
pub async fn get_image(State(state): State<AppState>) -> Result<Response, ApiError> {
    let challenge = state.captcha_generator.issue(&state.store).await?;

    Ok((
        [
            (header::CONTENT_TYPE, "image/svg+xml".to_string()),
            (header::CACHE_CONTROL, "no-store".to_string()),
            (HeaderName::from_static(CAPTCHA_UUID), challenge.id),
        ],
        challenge.svg,
    )
        .into_response())
}

/// Validate a guess supplied in the path
pub async fn validate(
    State(state): State<AppState>,
    Path((captcha_uuid, captcha_text)): Path<(String, String)>,
) -> Result<Json<ValidationResult>, ApiError> {
    let validation = captcha::verify(&state.store, &captcha_uuid, &captcha_text).await?;
    Ok(Json(ValidationResult { validation }))
}

/// Issue a challenge as JSON with an inline image
pub async fn get_challenge(State(state): State<AppState>) -> Result<Json<ChallengePayload>, ApiError> {
    let challenge = state.captcha_generator.issue(&state.store).await?;
    let (width, height) = state.captcha_generator.dimensions();
    let expires_in_secs = state.config.challenge_ttl_secs();

    Ok(Json(ChallengePayload {
        challenge_id: challenge.id,
        image_data: captcha::to_data_url(&challenge.svg),
        width,
        height,
        expires_in_secs,
        expires_at: chrono::Utc::now().timestamp() + expires_in_secs as i64,
    }))
}

#[derive(Deserialize)]
pub struct VerifyRequest {
    challenge_id: String,
    answer: String,
}

/// Verify a CAPTCHA response
pub async fn verify_challenge(
    State(state): State<AppState>,
    Json(payload): Json<VerifyRequest>,
) -> Result<Json<ValidationResult>, ApiError> {
    let validation = captcha::verify(&state.store, &payload.challenge_id, &payload.answer).await?;
    Ok(Json(ValidationResult { validation }))
}
