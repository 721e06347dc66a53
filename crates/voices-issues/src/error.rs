use thiserror::Error;

#[derive(Debug, Error)]
pub enum IssuesError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("text generation API returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("missing credential: {0}")]
    MissingCredential(&'static str),

    /// No JSON object with a `topics` array could be recovered.
    #[error("model output is not a key-issues document: {0}")]
    MalformedOutput(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("store error: {0}")]
    Store(#[from] voices_db::DbError),
}
