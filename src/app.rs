//! Application assembly: CORS policy, route groups under `/api`, welcome route.

use std::time::Instant;

use axum::{
    extract::{MatchedPath, Request},
    http::HeaderValue,
    middleware::{self, Next},
    response::Response,
    routing::get,
    Json, Router,
};
use serde::Serialize;
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::config::Config;
use crate::metrics;
use crate::routes::{route_groups, RouteGroup};
use crate::state::AppState;

/// Prefix every route group is mounted under.
pub const API_PREFIX: &str = "/api";

/// Body of `GET /api`.
pub const WELCOME_MESSAGE: &str = "Welcome to the Cement-AI Backend!";

/// Welcome response.
#[derive(Debug, Serialize)]
pub struct Welcome {
    /// Greeting text.
    pub message: &'static str,
}

/// `GET /api` - fixed greeting.
pub async fn welcome() -> Json<Welcome> {
    Json(Welcome {
        message: WELCOME_MESSAGE,
    })
}

/// Build the CORS layer from configuration.
///
/// Wildcard mode allows any origin, method and header. Browsers refuse
/// credentials alongside a `*` origin, so the credentials flag is only
/// honoured with an explicit origin allow-list.
pub fn cors_layer(config: &Config) -> CorsLayer {
    if config.cors_is_wildcard() {
        if config.cors_allow_credentials {
            warn!("CORS credentials are ignored while all origins are allowed");
        }
        return CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
    }

    let origins: Vec<HeaderValue> = config
        .cors_allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin.trim()) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(%origin, "Skipping invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(config.cors_allow_credentials)
}

/// Merge route groups and the welcome route under [`API_PREFIX`].
///
/// # Panics
/// Panics if two groups define the same path and method.
pub fn mount(groups: Vec<RouteGroup>) -> Router<AppState> {
    let mut api = Router::new().route("/", get(welcome));
    for group in groups {
        info!(group = group.name, prefix = API_PREFIX, "Mounting route group");
        api = api.merge(group.router);
    }
    Router::new().nest(API_PREFIX, api)
}

/// Build the full application router.
pub fn create_app(state: AppState, config: &Config) -> Router {
    mount(route_groups())
        .layer(middleware::from_fn(track_http))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(config))
        .with_state(state)
}

/// Record latency and status per matched route.
async fn track_http(request: Request, next: Next) -> Response {
    let start = Instant::now();
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string());

    let response = next.run(request).await;
    metrics::record_http_request(start, &route, response.status().as_u16());
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{header, Method, StatusCode};
    use axum::routing::post;
    use serde_json::Value;
    use tower::ServiceExt;

    fn get_req(uri: &str, origin: Option<&str>) -> Request {
        let mut builder = Request::builder().uri(uri);
        if let Some(origin) = origin {
            builder = builder.header(header::ORIGIN, origin);
        }
        builder.body(Body::empty()).unwrap()
    }

    async fn body_json(resp: Response) -> Value {
        let bytes = axum::body::to_bytes(resp.into_body(), 1 << 20).await.unwrap();
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    }

    fn allow_origin(resp: &Response) -> Option<&str> {
        resp.headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .and_then(|v| v.to_str().ok())
    }

    fn app() -> Router {
        create_app(AppState::default(), &Config::default())
    }

    /// A path from each group with a body field only that group's handler returns.
    const GROUP_MARKERS: [(&str, &str); 4] = [
        ("/api/health", "status"),
        ("/api/stream/info", "interval_ms"),
        ("/api/reports/summary", "generated_at_ms"),
        ("/api/optimize/defaults", "bounds"),
    ];

    async fn assert_group_handlers(app: Router) {
        for (uri, field) in GROUP_MARKERS {
            let resp = app.clone().oneshot(get_req(uri, None)).await.unwrap();
            assert_eq!(resp.status(), StatusCode::OK, "{uri}");
            let body = body_json(resp).await;
            assert!(!body[field].is_null(), "{uri} missing {field}: {body}");
            assert!(body.get("message").is_none(), "{uri} hit the welcome handler");
        }

        let resp = app.oneshot(get_req("/api/chat/unknown", None)).await.unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        assert!(body_json(resp).await["error"].is_string());
    }

    #[tokio::test]
    async fn welcome_body_is_exact() {
        let resp = app().oneshot(get_req("/api", None)).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            body_json(resp).await,
            serde_json::json!({"message": "Welcome to the Cement-AI Backend!"})
        );
    }

    #[tokio::test]
    async fn welcome_ignores_query_and_origin() {
        let resp = app()
            .oneshot(get_req("/api?foo=bar", Some("http://evil.example")))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_json(resp).await["message"], WELCOME_MESSAGE);
    }

    #[tokio::test]
    async fn routes_outside_prefix_are_not_found() {
        let resp = app().oneshot(get_req("/health", None)).await.unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn wildcard_cors_on_welcome_and_group_routes() {
        for uri in ["/api", "/api/history", "/api/health"] {
            let resp = app()
                .oneshot(get_req(uri, Some("http://localhost:5173")))
                .await
                .unwrap();
            assert_eq!(allow_origin(&resp), Some("*"), "{uri}");
            assert!(resp
                .headers()
                .get(header::ACCESS_CONTROL_ALLOW_CREDENTIALS)
                .is_none());
        }
    }

    #[tokio::test]
    async fn wildcard_cors_without_origin_header() {
        for uri in ["/api", "/api/health", "/api/optimize/defaults"] {
            let resp = app().oneshot(get_req(uri, None)).await.unwrap();
            assert_eq!(resp.status(), StatusCode::OK, "{uri}");
            assert_eq!(allow_origin(&resp), Some("*"), "{uri}");
        }
    }

    #[tokio::test]
    async fn wildcard_cors_on_unmatched_paths() {
        for (uri, origin) in [
            ("/api/does-not-exist", None),
            ("/api/does-not-exist", Some("http://localhost:5173")),
            ("/elsewhere", None),
        ] {
            let resp = app().oneshot(get_req(uri, origin)).await.unwrap();
            assert_eq!(resp.status(), StatusCode::NOT_FOUND, "{uri}");
            assert_eq!(allow_origin(&resp), Some("*"), "{uri}");
        }
    }

    #[tokio::test]
    async fn wildcard_cors_answers_preflight() {
        let req = Request::builder()
            .method(Method::OPTIONS)
            .uri("/api/chat")
            .header(header::ORIGIN, "https://plant.example")
            .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
            .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "content-type,x-custom")
            .body(Body::empty())
            .unwrap();
        let resp = app().oneshot(req).await.unwrap();
        assert!(resp.status().is_success());
        assert_eq!(allow_origin(&resp), Some("*"));
        assert!(resp
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_METHODS)
            .is_some());
    }

    #[tokio::test]
    async fn allow_list_echoes_listed_origin_with_credentials() {
        let config = Config {
            cors_allowed_origins: vec!["http://localhost:5173".to_string()],
            cors_allow_credentials: true,
            ..Config::default()
        };
        let app = create_app(AppState::default(), &config);

        let resp = app
            .clone()
            .oneshot(get_req("/api", Some("http://localhost:5173")))
            .await
            .unwrap();
        assert_eq!(allow_origin(&resp), Some("http://localhost:5173"));
        assert_eq!(
            resp.headers()
                .get(header::ACCESS_CONTROL_ALLOW_CREDENTIALS)
                .and_then(|v| v.to_str().ok()),
            Some("true")
        );

        let resp = app
            .oneshot(get_req("/api", Some("http://elsewhere.example")))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(allow_origin(&resp).is_none());
    }

    #[tokio::test]
    async fn every_group_dispatches_to_its_own_handler() {
        assert_group_handlers(app()).await;
    }

    #[tokio::test]
    async fn mount_order_does_not_change_dispatch() {
        let mut groups = route_groups();
        groups.reverse();
        let app = mount(groups).with_state(AppState::default());

        let resp = app.clone().oneshot(get_req("/api", None)).await.unwrap();
        assert_eq!(body_json(resp).await["message"], WELCOME_MESSAGE);
        assert_group_handlers(app).await;
    }

    #[test]
    #[should_panic]
    fn overlapping_group_routes_panic() {
        let first = RouteGroup::new("first", Router::new().route("/dup", get(|| async { "a" })));
        let second = RouteGroup::new("second", Router::new().route("/dup", get(|| async { "b" })));
        let _ = mount(vec![first, second]);
    }

    #[tokio::test]
    async fn same_path_with_different_methods_merges() {
        let reader = RouteGroup::new("reader", Router::new().route("/item", get(|| async { "read" })));
        let writer = RouteGroup::new("writer", Router::new().route("/item", post(|| async { "write" })));
        let app = mount(vec![reader, writer]).with_state(AppState::default());

        let resp = app.clone().oneshot(get_req("/api/item", None)).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let req = Request::builder()
            .method(Method::POST)
            .uri("/api/item")
            .body(Body::empty())
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }
}
