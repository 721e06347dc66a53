use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Document served by the key-issues endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyIssues {
    pub generated_at: Option<DateTime<Utc>>,
    pub topics: Vec<Topic>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl KeyIssues {
    /// Empty document returned while nothing has been generated.
    #[must_use]
    pub fn placeholder(message: &str) -> Self {
        Self {
            generated_at: None,
            topics: Vec::new(),
            message: Some(message.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Topic {
    pub id: String,
    pub title: String,
    pub description: String,
    pub perspectives: Perspectives,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Perspectives {
    #[serde(default)]
    pub left: Perspective,
    #[serde(default)]
    pub center: Perspective,
    #[serde(default)]
    pub right: Perspective,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Perspective {
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub key_voices: Vec<String>,
}
