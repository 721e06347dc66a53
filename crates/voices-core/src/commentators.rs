use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Deserializer, Serialize};

use crate::lean::{parse_score, LeanScore};
use crate::ConfigError;

/// Snapshot identifier. Historic snapshots use numbers, hand-edited ones
/// sometimes use strings; both round-trip unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CommentatorId {
    Number(u64),
    Text(String),
}

impl std::fmt::Display for CommentatorId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CommentatorId::Number(n) => write!(f, "{n}"),
            CommentatorId::Text(s) => f.write_str(s),
        }
    }
}

impl From<u64> for CommentatorId {
    fn from(value: u64) -> Self {
        CommentatorId::Number(value)
    }
}

impl From<&str> for CommentatorId {
    fn from(value: &str) -> Self {
        CommentatorId::Text(value.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Commentator {
    pub id: CommentatorId,
    pub name: String,
    #[serde(default, deserialize_with = "score_as_string")]
    pub score: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub youtube_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub substack_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instagram_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tiktok_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub youtube_channel_id: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient_count",
        skip_serializing_if = "Option::is_none"
    )]
    pub x_followers: Option<u64>,
    #[serde(
        default,
        deserialize_with = "lenient_count",
        skip_serializing_if = "Option::is_none"
    )]
    pub youtube_subscribers: Option<u64>,
    #[serde(
        default,
        deserialize_with = "lenient_count",
        skip_serializing_if = "Option::is_none"
    )]
    pub substack_subscribers: Option<u64>,
    #[serde(
        default,
        deserialize_with = "lenient_count",
        skip_serializing_if = "Option::is_none"
    )]
    pub instagram_followers: Option<u64>,
    #[serde(
        default,
        deserialize_with = "lenient_count",
        skip_serializing_if = "Option::is_none"
    )]
    pub tiktok_followers: Option<u64>,
    /// Fields this model does not know about, kept so a rewrite of the
    /// snapshot does not lose them.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

fn non_empty(value: Option<&String>) -> Option<&str> {
    value.map(|s| s.trim()).filter(|s| !s.is_empty())
}

impl Commentator {
    /// Minimal entry with only the required fields set.
    #[must_use]
    pub fn new(id: impl Into<CommentatorId>, name: &str, score: &str) -> Self {
        Self {
            id: id.into(),
            name: name.to_string(),
            score: score.to_string(),
            youtube_url: None,
            substack_url: None,
            x_url: None,
            instagram_url: None,
            tiktok_url: None,
            youtube_channel_id: None,
            x_followers: None,
            youtube_subscribers: None,
            substack_subscribers: None,
            instagram_followers: None,
            tiktok_followers: None,
            extra: serde_json::Map::new(),
        }
    }

    #[must_use]
    pub fn lean(&self) -> LeanScore {
        parse_score(&self.score)
    }

    /// Blog / newsletter URL, ignoring blank values.
    #[must_use]
    pub fn blog_url(&self) -> Option<&str> {
        non_empty(self.substack_url.as_ref())
    }

    #[must_use]
    pub fn video_url(&self) -> Option<&str> {
        non_empty(self.youtube_url.as_ref())
    }

    #[must_use]
    pub fn channel_id(&self) -> Option<&str> {
        non_empty(self.youtube_channel_id.as_ref())
    }

    #[must_use]
    pub fn x_profile(&self) -> Option<&str> {
        non_empty(self.x_url.as_ref())
    }

    #[must_use]
    pub fn instagram_profile(&self) -> Option<&str> {
        non_empty(self.instagram_url.as_ref())
    }

    #[must_use]
    pub fn tiktok_profile(&self) -> Option<&str> {
        non_empty(self.tiktok_url.as_ref())
    }

    /// True when there is anything for the content fetcher to look at.
    #[must_use]
    pub fn has_content_source(&self) -> bool {
        self.blog_url().is_some() || self.video_url().is_some()
    }
}

fn score_as_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) => s,
        Some(serde_json::Value::Number(n)) => n.to_string(),
        _ => String::new(),
    })
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn lenient_count<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::Number(n)) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f.round() as u64)),
        Some(serde_json::Value::String(s)) => s.trim().replace(',', "").parse().ok(),
        _ => None,
    })
}

/// Load and validate the commentator snapshot.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_commentators(path: &Path) -> Result<Vec<Commentator>, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::SnapshotIo {
        path: path.display().to_string(),
        source: e,
    })?;

    let commentators = parse_commentators(&content)?;
    validate_commentators(&commentators)?;

    Ok(commentators)
}

/// Parse snapshot JSON without touching the filesystem.
///
/// # Errors
///
/// Returns `ConfigError::SnapshotParse` on malformed JSON.
pub fn parse_commentators(content: &str) -> Result<Vec<Commentator>, ConfigError> {
    serde_json::from_str(content).map_err(ConfigError::SnapshotParse)
}

/// Write the snapshot back as pretty JSON with a trailing newline.
///
/// # Errors
///
/// Returns `ConfigError` if serialization or the write fails.
pub fn save_commentators(path: &Path, commentators: &[Commentator]) -> Result<(), ConfigError> {
    let mut body =
        serde_json::to_string_pretty(commentators).map_err(ConfigError::SnapshotParse)?;
    body.push('\n');
    std::fs::write(path, body).map_err(|e| ConfigError::SnapshotIo {
        path: path.display().to_string(),
        source: e,
    })
}

fn validate_commentators(commentators: &[Commentator]) -> Result<(), ConfigError> {
    let mut seen_ids = HashSet::new();

    for commentator in commentators {
        if commentator.name.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "commentator {} has an empty name",
                commentator.id
            )));
        }

        if !seen_ids.insert(&commentator.id) {
            return Err(ConfigError::Validation(format!(
                "duplicate commentator id: {} ('{}')",
                commentator.id, commentator.name
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
#[path = "commentators_test.rs"]
mod tests;
