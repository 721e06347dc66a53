//! Follower counts for X, Instagram and `TikTok` through a `RapidAPI`
//! social-stats endpoint.

use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;
use reqwest::{Client, Url};

use crate::error::FeedError;

/// Response fields that may carry the count, in order of preference.
pub const FOLLOWER_COUNT_ALIASES: [&str; 3] = ["followers", "followerCount", "subscriber_count"];

static USERNAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\.com/@?([A-Za-z0-9_.]+)").expect("valid regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SocialPlatform {
    X,
    Instagram,
    Tiktok,
}

impl SocialPlatform {
    /// Path segment the stats API uses for this platform.
    #[must_use]
    pub fn api_name(self) -> &'static str {
        match self {
            SocialPlatform::X => "twitter",
            SocialPlatform::Instagram => "instagram",
            SocialPlatform::Tiktok => "tiktok",
        }
    }
}

impl std::fmt::Display for SocialPlatform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.api_name())
    }
}

/// Username from a profile URL such as `https://x.com/name` or
/// `https://www.tiktok.com/@name`.
#[must_use]
pub fn extract_username(profile_url: &str) -> Option<String> {
    USERNAME_RE
        .captures(profile_url)
        .map(|caps| caps[1].to_string())
        .filter(|name| !name.is_empty())
}

/// Read the count through [`FOLLOWER_COUNT_ALIASES`]. Numbers and numeric
/// strings are accepted; the first alias present and non-null wins.
#[must_use]
pub fn extract_follower_count(body: &serde_json::Value) -> Option<u64> {
    let value = FOLLOWER_COUNT_ALIASES
        .iter()
        .filter_map(|alias| body.get(*alias))
        .find(|v| !v.is_null())?;
    match value {
        serde_json::Value::Number(n) => n.as_u64(),
        serde_json::Value::String(s) => s.trim().replace(',', "").parse().ok(),
        _ => None,
    }
}

pub struct SocialClient {
    client: Client,
    api_key: String,
    api_host: String,
    base_url: Url,
}

impl SocialClient {
    /// Client for `https://{api_host}`.
    ///
    /// # Errors
    ///
    /// Returns [`FeedError::Http`] if the client cannot be constructed, or
    /// [`FeedError::InvalidUrl`] for a bad host.
    pub fn new(api_key: &str, api_host: &str, timeout_secs: u64) -> Result<Self, FeedError> {
        Self::with_base_url(api_key, api_host, &format!("https://{api_host}"), timeout_secs)
    }

    /// # Errors
    ///
    /// See [`SocialClient::new`].
    pub fn with_base_url(
        api_key: &str,
        api_host: &str,
        base_url: &str,
        timeout_secs: u64,
    ) -> Result<Self, FeedError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .build()?;
        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalised).map_err(|e| FeedError::InvalidUrl {
            url: base_url.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self {
            client,
            api_key: api_key.to_owned(),
            api_host: api_host.to_owned(),
            base_url,
        })
    }

    /// # Errors
    ///
    /// [`FeedError::Http`] on network failure, [`FeedError::UnexpectedStatus`]
    /// on a non-2xx status, [`FeedError::Deserialize`] for a non-JSON body.
    pub async fn follower_count(
        &self,
        platform: SocialPlatform,
        username: &str,
    ) -> Result<Option<u64>, FeedError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| FeedError::InvalidUrl {
                url: self.base_url.to_string(),
                reason: "cannot be a base".to_string(),
            })?
            .pop_if_empty()
            .extend(["live", platform.api_name(), "user", username]);

        let response = self
            .client
            .get(url.clone())
            .header("x-rapidapi-key", &self.api_key)
            .header("x-rapidapi-host", &self.api_host)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FeedError::UnexpectedStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let text = response.text().await?;
        let body: serde_json::Value =
            serde_json::from_str(&text).map_err(|e| FeedError::Deserialize {
                context: format!("{platform} follower count for {username}"),
                source: e,
            })?;
        Ok(extract_follower_count(&body))
    }
}
