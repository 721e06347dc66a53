use thiserror::Error;

/// Errors from feed fetching, feed parsing, and the platform API clients.
///
/// Callers on the content path treat every variant as a miss; the variants
/// exist so logs and the feed proxy can say which kind of miss it was.
#[derive(Debug, Error)]
pub enum FeedError {
    /// Network, timeout, or TLS failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("not found: {url}")]
    NotFound { url: String },

    #[error("unexpected HTTP status {status} for {url}")]
    UnexpectedStatus { status: u16, url: String },

    /// The response was OK but does not look like (or parse as) a feed.
    #[error("response from {url} is not a feed")]
    NotAFeed { url: String },

    /// Every candidate was tried; `attempts` holds one line per miss.
    #[error("no feed found for {url} after {} attempts", attempts.len())]
    NoFeed { url: String, attempts: Vec<String> },

    /// The remote API answered with an error payload.
    #[error("API error: {0}")]
    Api(String),

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("missing credential: {0}")]
    MissingCredential(&'static str),
}
