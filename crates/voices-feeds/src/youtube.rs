//! `YouTube` helpers: page-URL classification, Data API lookups, the public
//! video feed, and channel-id scraping from channel pages.

use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;
use reqwest::{Client, Url};

use crate::error::FeedError;
use crate::parse::Article;

const DEFAULT_API_BASE_URL: &str = "https://www.googleapis.com/youtube/v3/";

/// Public per-channel video feed (no API quota).
pub const DEFAULT_VIDEO_FEED_URL: &str = "https://www.youtube.com/feeds/videos.xml";

const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

static HANDLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"youtube\.com/@([^/?#]+)").expect("valid regex"));
static CHANNEL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"youtube\.com/channel/([^/?#]+)").expect("valid regex"));
static CUSTOM_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"youtube\.com/(?:(?:c|user)/)?([^/?#@]+)").expect("valid regex")
});
static CHANNEL_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^UC[A-Za-z0-9_-]{22}$").expect("valid regex"));

/// Channel page markup patterns, most reliable first.
static PAGE_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r#""channelId":"(UC[A-Za-z0-9_-]{22})""#,
        r#""externalId":"(UC[A-Za-z0-9_-]{22})""#,
        r"channel_id=(UC[A-Za-z0-9_-]{22})",
        r#"<meta itemprop="channelId" content="(UC[A-Za-z0-9_-]{22})">"#,
        r#""browseId":"(UC[A-Za-z0-9_-]{22})""#,
    ]
    .iter()
    .map(|p| Regex::new(p).expect("valid regex"))
    .collect()
});

/// Path segments that are site sections, not channel names.
const RESERVED_SEGMENTS: [&str; 9] = [
    "channel", "c", "user", "watch", "playlist", "feed", "shorts", "results", "embed",
];

/// The three recognized shapes of a channel page URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum YoutubeUrl {
    /// `youtube.com/channel/UC…`: the id is in the URL.
    ChannelId(String),
    /// `youtube.com/@handle`
    Handle(String),
    /// `youtube.com/name`, `youtube.com/c/name`, `youtube.com/user/name`
    Custom(String),
}

impl YoutubeUrl {
    /// Classify a channel page URL. Handles are checked first, then channel
    /// ids, then bare names. A `/channel/` URL whose id is not `UC` plus 22
    /// characters is not recognized.
    #[must_use]
    pub fn parse(url: &str) -> Option<Self> {
        if let Some(caps) = HANDLE_RE.captures(url) {
            return Some(YoutubeUrl::Handle(caps[1].to_string()));
        }
        if let Some(caps) = CHANNEL_RE.captures(url) {
            let id = &caps[1];
            return is_channel_id(id).then(|| YoutubeUrl::ChannelId(id.to_string()));
        }
        let caps = CUSTOM_RE.captures(url)?;
        let name = &caps[1];
        if RESERVED_SEGMENTS.contains(&name.to_ascii_lowercase().as_str()) {
            return None;
        }
        Some(YoutubeUrl::Custom(name.to_string()))
    }
}

#[must_use]
pub fn is_channel_id(candidate: &str) -> bool {
    CHANNEL_ID_RE.is_match(candidate)
}

/// Video feed URL for a channel, against `base` (normally
/// [`DEFAULT_VIDEO_FEED_URL`]).
#[must_use]
pub fn video_feed_url(base: &str, channel_id: &str) -> String {
    match Url::parse(base) {
        Ok(mut url) => {
            url.query_pairs_mut().append_pair("channel_id", channel_id);
            url.to_string()
        }
        Err(_) => format!("{base}?channel_id={channel_id}"),
    }
}

#[must_use]
pub fn thumbnail_url(video_id: &str) -> String {
    format!("https://i.ytimg.com/vi/{video_id}/mqdefault.jpg")
}

#[must_use]
pub fn watch_url(video_id: &str) -> String {
    format!("https://www.youtube.com/watch?v={video_id}")
}

/// Video id of a feed entry: `yt:video:<id>` in the entry id, else the `v`
/// query parameter of its link.
#[must_use]
pub fn video_id(article: &Article) -> Option<String> {
    if let Some(id) = article
        .guid
        .as_deref()
        .and_then(|g| g.strip_prefix("yt:video:"))
        .filter(|id| !id.is_empty())
    {
        return Some(id.to_string());
    }
    let link = Url::parse(article.link.as_deref()?).ok()?;
    link.query_pairs()
        .find(|(k, _)| k == "v")
        .map(|(_, v)| v.into_owned())
        .filter(|v| !v.is_empty())
}

/// First channel id found in a channel page's HTML.
#[must_use]
pub fn channel_id_from_html(html: &str) -> Option<String> {
    PAGE_PATTERNS
        .iter()
        .find_map(|re| re.captures(html).map(|caps| caps[1].to_string()))
}

/// Client for the `YouTube` Data API v3.
///
/// Use [`YoutubeClient::new`] for production or
/// [`YoutubeClient::with_base_url`] to point at a mock server in tests.
pub struct YoutubeClient {
    client: Client,
    api_key: String,
    base_url: Url,
}

impl YoutubeClient {
    /// # Errors
    ///
    /// Returns [`FeedError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(api_key: &str, timeout_secs: u64) -> Result<Self, FeedError> {
        Self::with_base_url(api_key, timeout_secs, DEFAULT_API_BASE_URL)
    }

    /// # Errors
    ///
    /// Returns [`FeedError::Http`] if the client cannot be constructed, or
    /// [`FeedError::InvalidUrl`] if `base_url` is not a valid URL.
    pub fn with_base_url(
        api_key: &str,
        timeout_secs: u64,
        base_url: &str,
    ) -> Result<Self, FeedError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .build()?;

        // Trailing slash so `join` appends the endpoint instead of replacing
        // the last path segment.
        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalised).map_err(|e| FeedError::InvalidUrl {
            url: base_url.to_string(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            client,
            api_key: api_key.to_owned(),
            base_url,
        })
    }

    /// Resolve `@handle` to a channel id. `Ok(None)` when nothing matched.
    ///
    /// # Errors
    ///
    /// [`FeedError::Api`] for an error payload, [`FeedError::Http`] /
    /// [`FeedError::UnexpectedStatus`] for transport failures, and
    /// [`FeedError::Deserialize`] for a non-JSON body.
    pub async fn channel_id_for_handle(&self, handle: &str) -> Result<Option<String>, FeedError> {
        let url = self.build_url("channels", &[("forHandle", handle), ("part", "id")])?;
        let body = self.request_json(&url).await?;
        Ok(body
            .pointer("/items/0/id")
            .and_then(serde_json::Value::as_str)
            .map(str::to_string))
    }

    /// Best channel match for a custom channel name.
    ///
    /// # Errors
    ///
    /// See [`YoutubeClient::channel_id_for_handle`].
    pub async fn search_channel_id(&self, name: &str) -> Result<Option<String>, FeedError> {
        let url = self.build_url(
            "search",
            &[
                ("q", name),
                ("type", "channel"),
                ("part", "snippet"),
                ("maxResults", "1"),
            ],
        )?;
        let body = self.request_json(&url).await?;
        Ok(body
            .pointer("/items/0/id/channelId")
            .and_then(serde_json::Value::as_str)
            .map(str::to_string))
    }

    /// Current subscriber count for a channel.
    ///
    /// # Errors
    ///
    /// See [`YoutubeClient::channel_id_for_handle`].
    pub async fn subscriber_count(&self, channel_id: &str) -> Result<Option<u64>, FeedError> {
        let url = self.build_url("channels", &[("id", channel_id), ("part", "statistics")])?;
        let body = self.request_json(&url).await?;
        let count = body.pointer("/items/0/statistics/subscriberCount");
        Ok(match count {
            Some(serde_json::Value::String(s)) => s.parse().ok(),
            Some(serde_json::Value::Number(n)) => n.as_u64(),
            _ => None,
        })
    }

    fn build_url(&self, endpoint: &str, params: &[(&str, &str)]) -> Result<Url, FeedError> {
        let mut url = self
            .base_url
            .join(endpoint)
            .map_err(|e| FeedError::InvalidUrl {
                url: format!("{}{endpoint}", self.base_url),
                reason: e.to_string(),
            })?;
        {
            let mut pairs = url.query_pairs_mut();
            for (k, v) in params {
                pairs.append_pair(k, v);
            }
            pairs.append_pair("key", &self.api_key);
        }
        Ok(url)
    }

    /// GET and parse JSON. The API reports most failures as a JSON `error`
    /// object on a 4xx, so the payload is inspected before the status.
    async fn request_json(&self, url: &Url) -> Result<serde_json::Value, FeedError> {
        let response = self.client.get(url.clone()).send().await?;
        let status = response.status();
        let text = response.text().await?;

        let body: serde_json::Value = match serde_json::from_str(&text) {
            Ok(body) => body,
            Err(_) if !status.is_success() => {
                return Err(FeedError::UnexpectedStatus {
                    status: status.as_u16(),
                    url: redact_key(url),
                })
            }
            Err(e) => {
                return Err(FeedError::Deserialize {
                    context: redact_key(url),
                    source: e,
                })
            }
        };

        check_api_error(&body)?;

        if !status.is_success() {
            return Err(FeedError::UnexpectedStatus {
                status: status.as_u16(),
                url: redact_key(url),
            });
        }
        Ok(body)
    }
}

fn check_api_error(body: &serde_json::Value) -> Result<(), FeedError> {
    let Some(error) = body.get("error") else {
        return Ok(());
    };
    let message = error
        .get("message")
        .and_then(serde_json::Value::as_str)
        .or_else(|| error.as_str())
        .unwrap_or("unknown error")
        .to_string();
    Err(FeedError::Api(message))
}

/// URL for logs and errors, without the API key.
fn redact_key(url: &Url) -> String {
    let mut clean = url.clone();
    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(k, _)| k != "key")
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    clean.query_pairs_mut().clear().extend_pairs(pairs);
    clean.to_string()
}

/// Fetches channel pages with a browser user agent to read the channel id
/// out of the markup. No API key involved.
pub struct ChannelPageScraper {
    client: Client,
}

impl ChannelPageScraper {
    /// # Errors
    ///
    /// Returns [`FeedError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(timeout_secs: u64) -> Result<Self, FeedError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(BROWSER_USER_AGENT)
            .build()?;
        Ok(Self { client })
    }

    /// # Errors
    ///
    /// [`FeedError::Http`] on network failure, [`FeedError::NotFound`] /
    /// [`FeedError::UnexpectedStatus`] on a non-2xx page.
    pub async fn channel_id_for_page(&self, page_url: &str) -> Result<Option<String>, FeedError> {
        let response = self
            .client
            .get(page_url)
            .header(reqwest::header::ACCEPT_LANGUAGE, "en-US,en;q=0.9")
            .send()
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(FeedError::NotFound {
                url: page_url.to_string(),
            });
        }
        if !status.is_success() {
            return Err(FeedError::UnexpectedStatus {
                status: status.as_u16(),
                url: page_url.to_string(),
            });
        }

        let html = response.text().await?;
        Ok(channel_id_from_html(&html))
    }
}
