use axum::{extract::State, Json};
use voices_content::ContentView;

use super::AppState;

/// Cached content now; a background refresh fills in the rest.
pub(super) async fn latest_content(State(state): State<AppState>) -> Json<ContentView> {
    let view = state.content.read(&state.commentators).await;
    tracing::debug!(
        cached = view.content.len(),
        refreshing = view.refreshing,
        "latest content served"
    );
    Json(view)
}
