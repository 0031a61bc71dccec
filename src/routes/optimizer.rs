//! Kiln setpoint optimization endpoints.

use axum::{
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::ApiError;
use crate::metrics;
use crate::optimizer::{
    optimize, Bounds, OptimizationResult, SearchOptions, Setpoints, DEFAULT_MAX_ITERATIONS,
    DEFAULT_MIN_CLINKER_QUALITY,
};
use crate::state::AppState;

/// Route group for the optimizer.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/optimize/defaults", get(defaults))
        .route("/optimize", post(run_optimizer))
}

/// Defaults used when a request leaves fields out.
#[derive(Debug, Serialize)]
pub struct OptimizerDefaults {
    /// Starting setpoints.
    pub setpoints: Setpoints,
    /// Operating envelope.
    pub bounds: Bounds,
    /// Minimum clinker quality (%).
    pub min_clinker_quality: f64,
    /// Maximum search sweeps.
    pub max_iterations: u32,
}

/// Optimization request. Every field is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OptimizeRequest {
    /// Starting setpoints.
    #[serde(default)]
    pub setpoints: Option<Setpoints>,
    /// Minimum clinker quality (%).
    #[serde(default)]
    pub min_clinker_quality: Option<f64>,
    /// Maximum search sweeps.
    #[serde(default)]
    pub max_iterations: Option<u32>,
}

impl OptimizeRequest {
    fn options(&self) -> SearchOptions {
        let defaults = SearchOptions::default();
        SearchOptions {
            min_clinker_quality: self
                .min_clinker_quality
                .unwrap_or(defaults.min_clinker_quality),
            max_iterations: self.max_iterations.unwrap_or(defaults.max_iterations),
            ..defaults
        }
    }
}

/// `GET /optimize/defaults` - starting point and envelope.
pub async fn defaults() -> Json<OptimizerDefaults> {
    Json(OptimizerDefaults {
        setpoints: Setpoints::default(),
        bounds: Bounds::default(),
        min_clinker_quality: DEFAULT_MIN_CLINKER_QUALITY,
        max_iterations: DEFAULT_MAX_ITERATIONS,
    })
}

/// `POST /optimize` - recommend setpoints.
///
/// # Errors
/// Returns [`ApiError::InvalidRequest`] for non-finite or out-of-range
/// setpoints and invalid search options.
pub async fn run_optimizer(
    Json(request): Json<OptimizeRequest>,
) -> Result<Json<OptimizationResult>, ApiError> {
    let start = request.setpoints.unwrap_or_default();
    let options = request.options();

    let result = {
        let _timer = metrics::timer_optimizer();
        optimize(start, &options)?
    };

    info!(
        iterations = result.iterations,
        converged = result.converged,
        objective = result.recommended.objective,
        "Optimization finished"
    );
    Ok(Json(result))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{header, Method, Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    async fn send(method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let app = router().with_state(AppState::default());
        let builder = Request::builder().method(method).uri(uri);
        let req = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), 1 << 20).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    #[tokio::test]
    async fn defaults_describe_envelope() {
        let (status, body) = send(Method::GET, "/optimize/defaults", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["setpoints"]["kiln_feed_tph"], 220.0);
        assert_eq!(body["bounds"]["fuel_tph"]["min"], 14.0);
        assert_eq!(body["min_clinker_quality"], 90.0);
        assert_eq!(body["max_iterations"], 200);
    }

    #[tokio::test]
    async fn empty_request_uses_defaults() {
        let (status, body) = send(Method::POST, "/optimize", Some(json!({}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["baseline"]["setpoints"]["fuel_tph"], 18.0);

        let baseline = body["baseline"]["objective"].as_f64().unwrap_or(f64::NAN);
        let recommended = body["recommended"]["objective"].as_f64().unwrap_or(f64::NAN);
        assert!(recommended <= baseline, "{recommended} > {baseline}");
    }

    #[tokio::test]
    async fn out_of_bounds_setpoint_is_rejected() {
        let (status, body) = send(
            Method::POST,
            "/optimize",
            Some(json!({
                "setpoints": {
                    "kiln_feed_tph": 500.0,
                    "fuel_tph": 18.0,
                    "alt_fuel_pct": 25.0,
                    "kiln_speed_rpm": 3.6
                }
            })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("kiln_feed_tph"));
    }

    #[tokio::test]
    async fn invalid_options_are_rejected() {
        let (status, _) = send(Method::POST, "/optimize", Some(json!({"max_iterations": 0}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send(
            Method::POST,
            "/optimize",
            Some(json!({"min_clinker_quality": 150.0})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[test]
    fn request_overrides_only_given_options() {
        let request = OptimizeRequest {
            max_iterations: Some(5),
            ..OptimizeRequest::default()
        };
        let options = request.options();
        assert_eq!(options.max_iterations, 5);
        assert_eq!(options.min_clinker_quality, DEFAULT_MIN_CLINKER_QUALITY);
    }
}
