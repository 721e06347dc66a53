use axum::{
    extract::State,
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use voices_issues::{GenerationOutcome, KeyIssues};

use super::AppState;

pub(super) const KEY_ISSUES_CACHE_CONTROL: &str = "s-maxage=300, stale-while-revalidate=600";
pub(super) const NOT_GENERATED_MESSAGE: &str =
    "No key issues generated yet. Data will be available after the next scheduled generation.";
pub(super) const STORE_ERROR_MESSAGE: &str = "Error accessing cache. Using static fallback.";

/// Stored document, or the empty placeholder. Never an error status.
pub(super) async fn get_key_issues(State(state): State<AppState>) -> Response {
    match state.issues.store().get().await {
        Ok(Some(issues)) => (
            [(header::CACHE_CONTROL, KEY_ISSUES_CACHE_CONTROL)],
            Json(issues),
        )
            .into_response(),
        Ok(None) => Json(KeyIssues::placeholder(NOT_GENERATED_MESSAGE)).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "key issues store read failed");
            Json(KeyIssues::placeholder(STORE_ERROR_MESSAGE)).into_response()
        }
    }
}

#[derive(Debug, Serialize, PartialEq, Eq)]
#[serde(untagged)]
pub(super) enum GenerationResponse {
    #[serde(rename_all = "camelCase")]
    Generated {
        success: bool,
        topics_generated: usize,
        generated_at: DateTime<Utc>,
    },
    #[serde(rename_all = "camelCase")]
    NotEnoughContent {
        success: bool,
        message: &'static str,
        articles_found: usize,
    },
    Failed {
        success: bool,
        message: &'static str,
        details: String,
    },
}

impl From<GenerationOutcome> for GenerationResponse {
    fn from(outcome: GenerationOutcome) -> Self {
        match outcome {
            GenerationOutcome::Generated {
                topics_generated,
                generated_at,
            } => Self::Generated {
                success: true,
                topics_generated,
                generated_at,
            },
            GenerationOutcome::NotEnoughContent { articles_found } => Self::NotEnoughContent {
                success: false,
                message: "Not enough recent content",
                articles_found,
            },
        }
    }
}

/// Runs the generation job against the loaded snapshot.
pub(super) async fn generate_key_issues(
    State(state): State<AppState>,
) -> Json<GenerationResponse> {
    let response = match state.issues.run(&state.commentators).await {
        Ok(outcome) => outcome.into(),
        Err(e) => {
            tracing::error!(error = %e, "key issues generation failed");
            GenerationResponse::Failed {
                success: false,
                message: "Failed to generate key issues",
                details: e.to_string(),
            }
        }
    };
    Json(response)
}
