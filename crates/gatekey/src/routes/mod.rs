//! HTTP route handlers for Gatekey.

use axum::{
    Json, Router,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use gatekey_common::GatekeyError;
use tower_http::trace::TraceLayer;

use crate::state::AppState;
use crate::store::StoreError;

mod captcha;
mod health;

/// Create the main application router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health & Status
        .route("/health", get(health::health_check))
        .route("/ready", get(health::ready_check))
        .route("/stats", get(health::stats))

        // Image + path-based validation
        .route("/", get(captcha::get_image))
        .route("/{captcha_uuid}/{captcha_text}", get(captcha::validate))

        // JSON challenge flow
        .route("/challenge", get(captcha::get_challenge))
        .route("/verify", post(captcha::verify_challenge))

        // Admin endpoints (protected by randomized path in production)
        .nest("/admin", admin_routes())

        .layer(TraceLayer::new_for_http())

        // Add shared state
        .with_state(state)
}

/// Admin routes (store maintenance)
fn admin_routes() -> Router<AppState> {
    Router::new().route("/sweep", post(health::sweep))
}

/// Error response wrapper: maps service errors to status + JSON body
pub struct ApiError(GatekeyError);

impl From<GatekeyError> for ApiError {
    fn from(err: GatekeyError) -> Self {
        Self(err)
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        Self(err.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.0.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        if status.is_server_error() {
            tracing::error!(error = %self.0, retryable = self.0.is_retryable(), "Request failed");
        } else {
            tracing::debug!(error = %self.0, "Request rejected");
        }

        let body = Json(serde_json::json!({
            "error": self.0.to_string(),
            "retryable": self.0.is_retryable(),
        }));
        (status, body).into_response()
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use axum::body::Body;
    use axum::http::{Request, Response};
    use tower::ServiceExt;

    use crate::config::AppConfig;
    use crate::state::AppState;
    use crate::store::{MemoryStore, MemoryStoreConfig};

    /// State with an unswept in-memory store and 2x"A" answers
    pub fn state() -> AppState {
        let mut config = AppConfig::default();
        config.captcha.text_length = 2;
        config.captcha.allowed_chars = "A".to_string();
        let store = MemoryStore::new(MemoryStoreConfig::from_secs(90, 0)).unwrap();
        AppState::with_store(config, store.into())
    }

    pub async fn send(state: &AppState, request: Request<Body>) -> Response<Body> {
        super::create_router(state.clone()).oneshot(request).await.unwrap()
    }

    pub async fn get(state: &AppState, uri: &str) -> Response<Body> {
        send(state, Request::get(uri).body(Body::empty()).unwrap()).await
    }

    pub async fn json(response: Response<Body>) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_store_error_maps_to_503_json() {
        let response =
            ApiError(GatekeyError::StoreUnavailable("connection refused".to_string())).into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

        let body = test_support::json(response).await;
        assert_eq!(body["error"], "Store unavailable: connection refused");
        assert_eq!(body["retryable"], true);
    }
}
