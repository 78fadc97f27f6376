//! Health check endpoints.

use axum::{Json, extract::State, http::StatusCode};
use serde::Serialize;

use gatekey_common::StoreKind;

use crate::state::AppState;
use crate::store::{StoreStatsSnapshot, SweepReport};

#[derive(Serialize)]
pub struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

/// Basic health check (is the server running?)
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

#[derive(Serialize)]
pub struct ReadyResponse {
    status: &'static str,
    store: StoreKind,
}

/// Readiness check (can the store be reached?)
pub async fn ready_check(
    State(state): State<AppState>,
) -> Result<Json<ReadyResponse>, StatusCode> {
    match state.store.ping().await {
        Ok(()) => Ok(Json(ReadyResponse {
            status: "ready",
            store: state.store.kind(),
        })),
        Err(e) => {
            tracing::warn!(error = %e, "Readiness check failed");
            Err(StatusCode::SERVICE_UNAVAILABLE)
        }
    }
}

#[derive(Serialize)]
pub struct StatsResponse {
    store: StoreKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    live_entries: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    sweeper_running: Option<bool>,
    counters: StoreStatsSnapshot,
    uptime_secs: u64,
}

/// Store statistics (for monitoring)
pub async fn stats(State(state): State<AppState>) -> Json<StatsResponse> {
    Json(StatsResponse {
        store: state.store.kind(),
        live_entries: state.store.live_entries(),
        sweeper_running: state.store.is_sweeping(),
        counters: state.store.stats(),
        uptime_secs: state.uptime_secs(),
    })
}

/// Force an eviction pass on the in-process store
pub async fn sweep(State(state): State<AppState>) -> Result<Json<SweepReport>, StatusCode> {
    match state.store.sweep() {
        Some(report) => {
            tracing::info!(
                kept = report.kept,
                expired = report.expired,
                anomalies = report.anomalies,
                "Manual sweep finished"
            );
            Ok(Json(report))
        }
        // Redis expires keys on its own
        None => Err(StatusCode::NOT_IMPLEMENTED),
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{get, json, send, state};
    use axum::body::Body;
    use axum::http::{Request, StatusCode};

    #[tokio::test]
    async fn test_health_and_ready() {
        let state = state();

        let health = get(&state, "/health").await;
        assert_eq!(health.status(), StatusCode::OK);
        assert_eq!(json(health).await["status"], "ok");

        let ready = json(get(&state, "/ready").await).await;
        assert_eq!(ready, serde_json::json!({ "status": "ready", "store": "cache" }));
    }

    #[tokio::test]
    async fn test_stats_track_store_traffic() {
        let state = state();
        state.store.push("u1", "AA").await.unwrap();
        state.store.pop("missing").await.unwrap();

        let stats = json(get(&state, "/stats").await).await;
        assert_eq!(stats["store"], "cache");
        assert_eq!(stats["live_entries"], 1);
        assert_eq!(stats["counters"]["pushed"], 1);
        assert_eq!(stats["counters"]["misses"], 1);
        assert_eq!(stats["sweeper_running"], false);
    }

    #[tokio::test]
    async fn test_manual_sweep_reports_counts() {
        let state = state();
        state.store.push("u1", "AA").await.unwrap();

        let request = Request::post("/admin/sweep").body(Body::empty()).unwrap();
        let report = json(send(&state, request).await).await;
        assert_eq!(report, serde_json::json!({ "kept": 1, "expired": 0, "anomalies": 0 }));
    }
}
