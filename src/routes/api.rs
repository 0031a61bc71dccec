//! Core plant data endpoints: health, readiness, status, history, metrics.

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Serialize;

use crate::error::ApiError;
use crate::plant::{HistorySnapshot, KpiSample, PlantStatus};
use crate::state::AppState;

/// Route group for core plant data.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/ready", get(ready))
        .route("/status", get(status))
        .route("/history", get(history))
        .route("/kpi/latest", get(latest_kpi))
        .route("/metrics", get(metrics))
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Status: "ok".
    pub status: &'static str,
}

/// Readiness check response.
#[derive(Debug, Serialize)]
pub struct ReadyResponse {
    /// Whether the live feed has produced data.
    pub ready: bool,
    /// Samples currently held.
    pub samples: usize,
}

/// Status response.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    /// Plant operating status.
    pub plant_status: PlantStatus,
    /// Seconds since startup.
    pub uptime_secs: u64,
    /// Samples currently held.
    pub samples: usize,
    /// Connected live subscribers.
    pub subscribers: usize,
    /// Latest sample, if any.
    pub latest: Option<KpiSample>,
}

/// `GET /health` - always returns 200.
pub async fn health() -> impl IntoResponse {
    Json(HealthResponse { status: "ok" })
}

/// `GET /ready` - returns 200 once the feed has produced a sample, 503 otherwise.
pub async fn ready(State(state): State<AppState>) -> impl IntoResponse {
    let is_ready = state.is_ready();
    let samples = state.history.read().await.len();

    let response = ReadyResponse {
        ready: is_ready,
        samples,
    };

    if is_ready {
        (StatusCode::OK, Json(response))
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, Json(response))
    }
}

/// `GET /status` - plant status and feed statistics.
pub async fn status(State(state): State<AppState>) -> impl IntoResponse {
    let history = state.history.read().await;

    Json(StatusResponse {
        plant_status: PlantStatus::from_ready(state.is_ready()),
        uptime_secs: state.uptime().as_secs(),
        samples: history.len(),
        subscribers: state.subscriber_count(),
        latest: history.latest().copied(),
    })
}

/// `GET /history` - recent KPI series and log entries.
pub async fn history(State(state): State<AppState>) -> Json<HistorySnapshot> {
    Json(state.history.read().await.snapshot())
}

/// `GET /kpi/latest` - most recent KPI sample.
///
/// # Errors
/// Returns [`ApiError::NotFound`] when no sample has been recorded yet.
pub async fn latest_kpi(State(state): State<AppState>) -> Result<Json<KpiSample>, ApiError> {
    state
        .history
        .read()
        .await
        .latest()
        .copied()
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("no KPI samples recorded yet".to_string()))
}

/// `GET /metrics` - Prometheus exposition.
///
/// # Errors
/// Returns [`ApiError::Unavailable`] when no recorder is installed.
pub async fn metrics(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let handle = state
        .metrics
        .as_ref()
        .ok_or_else(|| ApiError::Unavailable("metrics recorder not installed".to_string()))?;
    Ok((
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        handle.render(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plant::KpiValues;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    fn sample() -> KpiSample {
        KpiSample::new(
            42,
            KpiValues {
                spc: 60.0,
                tsr: 55.0,
                clinker_quality: 90.0,
                co2: 12.0,
            },
        )
    }

    async fn get_json(state: AppState, uri: &str) -> (StatusCode, serde_json::Value) {
        let app = router().with_state(state);
        let req = Request::builder().uri(uri).body(Body::empty()).unwrap();
        let resp = app.oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), 1 << 20).await.unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
        (status, body)
    }

    #[tokio::test]
    async fn health_endpoint_returns_ok() {
        let (status, body) = get_json(AppState::default(), "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn ready_endpoint_returns_503_when_not_ready() {
        let (status, body) = get_json(AppState::default(), "/ready").await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["ready"], false);
    }

    #[tokio::test]
    async fn ready_endpoint_returns_200_when_ready() {
        let state = AppState::default();
        state.set_ready(true);
        let (status, _) = get_json(state, "/ready").await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn latest_kpi_is_404_until_first_sample() {
        let state = AppState::default();
        let (status, _) = get_json(state.clone(), "/kpi/latest").await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        state.history.write().await.push_sample(sample());
        let (status, body) = get_json(state, "/kpi/latest").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["timestamp_ms"], 42);
        assert_eq!(body["spc"], 60.0);
    }

    #[tokio::test]
    async fn history_has_dashboard_shape() {
        let state = AppState::default();
        state.history.write().await.push_sample(sample());
        let (status, body) = get_json(state, "/history").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["spc"][0]["x"], 42);
        assert_eq!(body["clinker_quality"][0]["y"], 90.0);
        assert!(body["logs"].is_array());
    }

    #[tokio::test]
    async fn status_is_stopped_until_feed_is_ready() {
        let (status, body) = get_json(AppState::default(), "/status").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["plant_status"], "Stopped");
        assert!(body["latest"].is_null());
    }

    #[tokio::test]
    async fn status_reports_counts() {
        let state = AppState::default();
        state.set_ready(true);
        state.history.write().await.push_sample(sample());
        let _rx = state.live.subscribe();
        let (status, body) = get_json(state, "/status").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["plant_status"], "Running");
        assert_eq!(body["samples"], 1);
        assert_eq!(body["subscribers"], 1);
    }

    #[tokio::test]
    async fn metrics_unavailable_without_recorder() {
        let (status, _) = get_json(AppState::default(), "/metrics").await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    }
}
