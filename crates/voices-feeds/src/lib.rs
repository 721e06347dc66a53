//! Feed parsing and discovery plus the external platform clients the
//! content pipeline talks to.

pub mod error;
pub mod locator;
pub mod parse;
pub mod social;
pub mod youtube;

pub use error::FeedError;
pub use locator::{has_feed_marker, parse_http_url, FeedLocator, LocatedFeed, FEED_PATHS};
pub use parse::{
    parse_articles, parse_date, parse_feed, strip_html, Article, FeedKind, ParsedFeed,
    DEFAULT_MAX_ITEMS, DESCRIPTION_MAX_CHARS,
};
pub use social::{extract_follower_count, extract_username, SocialClient, SocialPlatform};
pub use youtube::{
    channel_id_from_html, is_channel_id, thumbnail_url, video_feed_url, video_id, watch_url,
    ChannelPageScraper, YoutubeClient, YoutubeUrl, DEFAULT_VIDEO_FEED_URL,
};
