use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use voices_feeds::parse_http_url;

use super::{ApiError, AppState};

pub(super) const FEED_CACHE_CONTROL: &str = "public, max-age=3600, stale-while-revalidate=86400";

#[derive(Debug, Deserialize)]
pub(super) struct FeedQuery {
    pub url: Option<String>,
}

/// Raw XML of the first working feed for `url`.
pub(super) async fn proxy_feed(
    State(state): State<AppState>,
    Query(query): Query<FeedQuery>,
) -> Result<Response, ApiError> {
    let Some(url) = query.url.filter(|u| !u.trim().is_empty()) else {
        return Err(ApiError::new(StatusCode::BAD_REQUEST, "Missing url parameter"));
    };

    if let Err(e) = parse_http_url(&url) {
        tracing::debug!(url = %url, error = %e, "rejected feed proxy url");
        return Err(ApiError::new(StatusCode::BAD_REQUEST, "Invalid URL"));
    }

    match state.locator.locate(&url).await {
        Ok(feed) => {
            tracing::debug!(url = %url, feed = %feed.url, "feed proxied");
            Ok((
                [
                    (header::CONTENT_TYPE, "application/xml; charset=utf-8"),
                    (header::CACHE_CONTROL, FEED_CACHE_CONTROL),
                ],
                feed.value,
            )
                .into_response())
        }
        Err(e) => {
            tracing::info!(url = %url, error = %e, "no feed found");
            Err(ApiError::new(StatusCode::NOT_FOUND, "No RSS feed found"))
        }
    }
}
