use axum::{extract::State, Extension, Json};
use serde::Serialize;
use voices_core::{Bucket, Commentator, Direction};

use crate::middleware::RequestId;

use super::{ApiResponse, AppState, ResponseMeta};

#[derive(Debug, Serialize)]
pub(super) struct LeanView {
    pub direction: Direction,
    pub magnitude: u32,
    pub bucket: Bucket,
    pub position: i64,
    pub label: &'static str,
}

/// A snapshot entry with its lean classification alongside.
#[derive(Debug, Serialize)]
pub(super) struct CommentatorItem {
    #[serde(flatten)]
    pub commentator: Commentator,
    pub lean: LeanView,
}

impl From<&Commentator> for CommentatorItem {
    fn from(commentator: &Commentator) -> Self {
        let score = commentator.lean();
        Self {
            commentator: commentator.clone(),
            lean: LeanView {
                direction: score.direction,
                magnitude: score.magnitude,
                bucket: score.bucket(),
                position: score.position(),
                label: score.label(),
            },
        }
    }
}

pub(super) async fn list_commentators(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Json<ApiResponse<Vec<CommentatorItem>>> {
    let data = state.commentators.iter().map(CommentatorItem::from).collect();
    Json(ApiResponse {
        data,
        meta: ResponseMeta::new(req_id.0),
    })
}
