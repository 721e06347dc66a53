//! Latest-content pipeline: caches, channel resolution, batched fetching,
//! two-phase reads, and lean aggregation.

pub mod aggregate;
pub mod cache;
pub mod clock;
pub mod error;
pub mod fetcher;
pub mod model;
pub mod resolver;
pub mod service;
pub mod storage;

pub use aggregate::{
    group_by_lean, is_recent, CommentatorArticles, ContentAggregator, LeanGroups, RECENT_WINDOW,
};
pub use cache::{cache_key, ttl_for, CacheEntry, ChannelIdCache, ContentCache, FAILURE_TTL, SUCCESS_TTL};
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::ContentError;
pub use fetcher::{ContentFetcher, DEFAULT_BATCH_SIZE};
pub use model::{LatestArticle, LatestContent, LatestVideo};
pub use resolver::ChannelResolver;
pub use service::{spawn_refresh, ContentView, LatestContentService, RefreshHandle};
pub use storage::{FileSlot, MemorySlot, SlotStorage};
