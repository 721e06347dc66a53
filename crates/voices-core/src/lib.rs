//! Shared configuration, commentator snapshot model, and lean classification.

pub mod app_config;
pub mod commentators;
pub mod config;
pub mod lean;

pub use app_config::{AppConfig, Environment};
pub use commentators::{
    load_commentators, parse_commentators, save_commentators, Commentator, CommentatorId,
};
pub use config::{load_app_config, load_app_config_from_env};
pub use lean::{lean_label, parse_score, spectrum_position, Bucket, Direction, LeanScore};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read commentator snapshot {path}: {source}")]
    SnapshotIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse commentator snapshot: {0}")]
    SnapshotParse(#[source] serde_json::Error),

    #[error("commentator snapshot validation failed: {0}")]
    Validation(String),
}
