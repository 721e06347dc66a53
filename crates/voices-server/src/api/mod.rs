mod commentators;
mod content;
mod key_issues;
mod rss;


use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::Request,
    http::{header, HeaderName, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use voices_content::LatestContentService;
use voices_core::Commentator;
use voices_feeds::FeedLocator;
use voices_issues::KeyIssuesJob;

use crate::middleware::{
    enforce_rate_limit, request_id, require_cron_secret, CronAuth, RateLimitState, RequestId,
};

#[derive(Clone)]
pub struct AppState {
    pub commentators: Arc<Vec<Commentator>>,
    pub locator: FeedLocator,
    pub content: Arc<LatestContentService>,
    pub issues: Arc<KeyIssuesJob>,
}

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ResponseMeta {
    pub request_id: String,
    pub timestamp: DateTime<Utc>,
}

impl ResponseMeta {
    pub(super) fn new(request_id: String) -> Self {
        Self {
            request_id,
            timestamp: Utc::now(),
        }
    }
}

/// `{"error": message}` with a status code.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: &'static str,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: &'static str,
}

impl ApiError {
    pub fn new(status: StatusCode, message: &'static str) -> Self {
        Self { status, message }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ErrorBody {
                error: self.message,
            }),
        )
            .into_response()
    }
}

#[derive(Debug, Serialize, PartialEq, Eq)]
struct HealthData {
    status: &'static str,
}

fn build_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static("x-request-id"),
        ])
}

pub fn build_app(state: AppState, auth: CronAuth, rate_limit: RateLimitState) -> Router {
    let feed_proxy = Router::new()
        .route("/api/rss", get(rss::proxy_feed))
        .layer(axum::middleware::from_fn_with_state(
            rate_limit,
            enforce_rate_limit,
        ));

    let generation = Router::new()
        .route(
            "/api/generate-key-issues",
            get(key_issues::generate_key_issues).post(key_issues::generate_key_issues),
        )
        .layer(axum::middleware::from_fn_with_state(
            auth,
            require_cron_secret,
        ));

    let public_routes = Router::new()
        .route("/api/health", get(health))
        .route(
            "/api/key-issues",
            get(key_issues::get_key_issues).fallback(method_not_allowed),
        )
        .route("/api/latest-content", get(content::latest_content))
        .route("/api/commentators", get(commentators::list_commentators));

    Router::new()
        .merge(public_routes)
        .merge(feed_proxy)
        .merge(generation)
        .layer(
            ServiceBuilder::new()
                .layer(build_cors())
                .layer(axum::middleware::from_fn(request_id)),
        )
        .with_state(state)
}

async fn health(Extension(req_id): Extension<RequestId>) -> Json<ApiResponse<HealthData>> {
    Json(ApiResponse {
        data: HealthData { status: "ok" },
        meta: ResponseMeta::new(req_id.0),
    })
}

async fn method_not_allowed(req: Request) -> ApiError {
    tracing::debug!(method = %req.method(), uri = %req.uri(), "method not allowed");
    ApiError::new(StatusCode::METHOD_NOT_ALLOWED, "Method not allowed")
}

pub fn default_rate_limit_state() -> RateLimitState {
    RateLimitState::new(120, Duration::from_secs(60))
}
