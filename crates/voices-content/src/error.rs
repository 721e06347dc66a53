use thiserror::Error;

#[derive(Debug, Error)]
pub enum ContentError {
    #[error("storage I/O error at {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize cache slot: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("storage task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    #[error(transparent)]
    Feed(#[from] voices_feeds::FeedError),
}
