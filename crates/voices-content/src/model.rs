use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Most recent upload of a commentator's channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LatestVideo {
    pub title: String,
    pub video_id: String,
    pub thumbnail_url: String,
    pub published_at: Option<DateTime<Utc>>,
    pub url: String,
}

/// Most recent post on a commentator's blog or newsletter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LatestArticle {
    pub title: String,
    pub url: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
}

/// Per-commentator result of one fetch cycle. Both halves may be `None`;
/// such a record is still cached, just for less time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LatestContent {
    #[serde(default, alias = "youtubeVideo")]
    pub video: Option<LatestVideo>,
    #[serde(default, alias = "substackArticle")]
    pub article: Option<LatestArticle>,
}

impl LatestContent {
    #[must_use]
    pub fn has_content(&self) -> bool {
        self.video.is_some() || self.article.is_some()
    }
}
