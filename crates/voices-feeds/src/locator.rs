//! Feed discovery: try a fixed list of candidate URLs until one answers
//! with something that looks like a feed.

use std::time::Duration;

use reqwest::{Client, StatusCode, Url};

use crate::error::FeedError;
use crate::parse::{parse_articles, Article};

/// Paths tried against the origin, in priority order.
pub const FEED_PATHS: [&str; 5] = ["/feed", "/rss", "/feed.xml", "/rss.xml", "/atom.xml"];

const FEED_ACCEPT: &str = "application/rss+xml, application/xml, text/xml";

/// A feed body together with the candidate URL that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocatedFeed<T> {
    pub url: Url,
    pub value: T,
}

/// Finds and downloads feeds for blog / channel URLs.
///
/// Every candidate is one bounded request; a failed candidate is a miss and
/// the next one is tried. Only when all candidates miss does the caller see
/// [`FeedError::NoFeed`].
#[derive(Debug, Clone)]
pub struct FeedLocator {
    client: Client,
}

impl FeedLocator {
    /// # Errors
    ///
    /// Returns [`FeedError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(timeout_secs: u64, user_agent: &str) -> Result<Self, FeedError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(timeout_secs.min(10)))
            .user_agent(user_agent)
            .build()?;
        Ok(Self { client })
    }

    /// Candidate URLs for `url`, deduplicated, in the order they are tried.
    ///
    /// A URL that already looks like a feed is tried first, unmodified;
    /// the origin-relative [`FEED_PATHS`] follow.
    ///
    /// # Errors
    ///
    /// Returns [`FeedError::InvalidUrl`] for unparseable or non-HTTP URLs.
    pub fn candidate_urls(url: &str) -> Result<Vec<Url>, FeedError> {
        let parsed = parse_http_url(url)?;
        let origin = parsed.origin().ascii_serialization();

        let mut candidates = Vec::with_capacity(FEED_PATHS.len() + 1);
        if looks_like_feed(&parsed) {
            candidates.push(parsed.clone());
        }
        for path in FEED_PATHS {
            let candidate = Url::parse(&format!("{origin}{path}")).map_err(|e| {
                FeedError::InvalidUrl {
                    url: url.to_string(),
                    reason: e.to_string(),
                }
            })?;
            if !candidates.contains(&candidate) {
                candidates.push(candidate);
            }
        }
        Ok(candidates)
    }

    /// First candidate body that contains an `<item>` or `<entry>` marker.
    ///
    /// # Errors
    ///
    /// [`FeedError::InvalidUrl`] for a bad input URL, otherwise
    /// [`FeedError::NoFeed`] listing every miss.
    pub async fn locate(&self, url: &str) -> Result<LocatedFeed<String>, FeedError> {
        self.locate_with(url, |body| Ok(body.to_string())).await
    }

    /// Like [`FeedLocator::locate`], but a candidate only counts once its body
    /// parses into at least one titled record; capped at `max_items`.
    ///
    /// # Errors
    ///
    /// See [`FeedLocator::locate`].
    pub async fn locate_articles(
        &self,
        url: &str,
        max_items: usize,
    ) -> Result<LocatedFeed<Vec<Article>>, FeedError> {
        self.locate_with(url, |body| titled_articles(url, body, max_items))
            .await
    }

    /// One request against exactly `url`, no candidate paths. For feeds
    /// whose address is already known, such as a channel's video feed.
    ///
    /// # Errors
    ///
    /// [`FeedError::InvalidUrl`] for a bad URL, otherwise the error of the
    /// single attempt.
    pub async fn fetch_articles(
        &self,
        url: &str,
        max_items: usize,
    ) -> Result<LocatedFeed<Vec<Article>>, FeedError> {
        let feed_url = parse_http_url(url)?;
        let body = self.attempt(&feed_url).await?;
        let value = titled_articles(url, &body, max_items)?;
        Ok(LocatedFeed {
            url: feed_url,
            value,
        })
    }

    /// Fold the candidates into the first body `accept` takes, or a
    /// [`FeedError::NoFeed`] carrying one line per miss.
    ///
    /// # Errors
    ///
    /// See [`FeedLocator::locate`].
    pub async fn locate_with<T, F>(
        &self,
        url: &str,
        accept: F,
    ) -> Result<LocatedFeed<T>, FeedError>
    where
        F: Fn(&str) -> Result<T, FeedError>,
    {
        let candidates = Self::candidate_urls(url)?;
        let mut attempts = Vec::with_capacity(candidates.len());

        for candidate in candidates {
            let outcome = self
                .attempt(&candidate)
                .await
                .and_then(|body| accept(&body));
            match outcome {
                Ok(value) => {
                    tracing::debug!(url, feed = %candidate, "feed located");
                    return Ok(LocatedFeed {
                        url: candidate,
                        value,
                    });
                }
                Err(e) => {
                    tracing::debug!(url, attempt = %candidate, error = %e, "feed candidate missed");
                    attempts.push(format!("{candidate}: {e}"));
                }
            }
        }

        Err(FeedError::NoFeed {
            url: url.to_string(),
            attempts,
        })
    }

    /// One bounded GET. OK status plus a feed marker in the body, or a miss.
    async fn attempt(&self, url: &Url) -> Result<String, FeedError> {
        let response = self
            .client
            .get(url.clone())
            .header(reqwest::header::ACCEPT, FEED_ACCEPT)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(FeedError::NotFound {
                url: url.to_string(),
            });
        }
        if !status.is_success() {
            return Err(FeedError::UnexpectedStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let body = response.text().await?;
        if has_feed_marker(&body) {
            Ok(body)
        } else {
            Err(FeedError::NotAFeed {
                url: url.to_string(),
            })
        }
    }
}

fn titled_articles(url: &str, body: &str, max_items: usize) -> Result<Vec<Article>, FeedError> {
    let articles = parse_articles(body, max_items)?;
    if articles.is_empty() {
        return Err(FeedError::NotAFeed {
            url: url.to_string(),
        });
    }
    Ok(articles)
}

/// Cheap validity check run before any parsing.
#[must_use]
pub fn has_feed_marker(body: &str) -> bool {
    body.contains("<item>") || body.contains("<entry>")
}

/// Parse `raw` and require an `http`/`https` scheme with a host.
///
/// # Errors
///
/// Returns [`FeedError::InvalidUrl`] otherwise.
pub fn parse_http_url(raw: &str) -> Result<Url, FeedError> {
    let invalid = |reason: String| FeedError::InvalidUrl {
        url: raw.to_string(),
        reason,
    };
    let url = Url::parse(raw.trim()).map_err(|e| invalid(e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme '{}'", url.scheme())));
    }
    if url.host_str().is_none_or(str::is_empty) {
        return Err(invalid("missing host".to_string()));
    }
    Ok(url)
}

fn looks_like_feed(url: &Url) -> bool {
    let path = url.path().to_ascii_lowercase();
    if path.ends_with(".xml") || path.ends_with(".rss") || path.ends_with(".atom") {
        return true;
    }
    if path.contains("/feeds/") {
        return true;
    }
    let last = path.trim_end_matches('/').rsplit('/').next().unwrap_or_default();
    matches!(last, "feed" | "rss" | "atom")
}
