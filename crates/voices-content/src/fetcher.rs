//! Per-commentator latest-content fetching in bounded batches.

use std::collections::HashMap;

use futures::future::join_all;
use voices_core::{Commentator, CommentatorId};
use voices_feeds::{
    is_channel_id, thumbnail_url, video_feed_url, video_id, watch_url, FeedError, FeedLocator,
    DEFAULT_VIDEO_FEED_URL,
};

use crate::cache::ContentCache;
use crate::model::{LatestArticle, LatestContent, LatestVideo};
use crate::resolver::ChannelResolver;

pub const DEFAULT_BATCH_SIZE: usize = 5;

pub struct ContentFetcher {
    locator: FeedLocator,
    resolver: ChannelResolver,
    cache: ContentCache,
    batch_size: usize,
    video_feed_base: String,
}

impl ContentFetcher {
    #[must_use]
    pub fn new(
        locator: FeedLocator,
        resolver: ChannelResolver,
        cache: ContentCache,
        batch_size: usize,
    ) -> Self {
        Self {
            locator,
            resolver,
            cache,
            batch_size: batch_size.max(1),
            video_feed_base: DEFAULT_VIDEO_FEED_URL.to_string(),
        }
    }

    /// Point video feed requests somewhere other than youtube.com.
    #[must_use]
    pub fn with_video_feed_base(mut self, base: &str) -> Self {
        self.video_feed_base = base.to_string();
        self
    }

    #[must_use]
    pub fn cache(&self) -> &ContentCache {
        &self.cache
    }

    /// Split commentators into live cache hits and those needing a fetch.
    /// Commentators without a blog or channel URL appear in neither. The
    /// cache slot is read once.
    pub async fn partition(
        &self,
        commentators: &[Commentator],
    ) -> (HashMap<CommentatorId, LatestContent>, Vec<Commentator>) {
        let mut live = self.cache.live_entries().await;
        let mut cached = HashMap::new();
        let mut pending = Vec::new();
        for commentator in commentators.iter().filter(|c| c.has_content_source()) {
            match live.remove(&commentator.id) {
                Some(hit) => {
                    cached.insert(commentator.id.clone(), hit);
                }
                None => pending.push(commentator.clone()),
            }
        }
        (cached, pending)
    }

    /// Cached results plus fresh fetches for everything else.
    pub async fn fetch_latest(
        &self,
        commentators: &[Commentator],
    ) -> HashMap<CommentatorId, LatestContent> {
        let (mut out, pending) = self.partition(commentators).await;
        tracing::info!(
            cached = out.len(),
            pending = pending.len(),
            "fetching latest content"
        );
        out.extend(self.refresh(&pending).await);
        out
    }

    /// Fetch `pending` batch by batch, ignoring the cache on the way in and
    /// writing each finished batch to it on the way out.
    ///
    /// A batch is only written once every fetch in it has settled, so
    /// dropping this future mid-batch leaves that batch uncached.
    pub async fn refresh(&self, pending: &[Commentator]) -> HashMap<CommentatorId, LatestContent> {
        let mut out = HashMap::with_capacity(pending.len());

        for batch in pending.chunks(self.batch_size) {
            let results = join_all(batch.iter().map(|commentator| async move {
                (commentator.id.clone(), self.fetch_one(commentator).await)
            }))
            .await;

            if let Err(e) = self.cache.set_many(results.iter().cloned()).await {
                tracing::warn!(error = %e, "failed to write latest-content cache");
            }
            out.extend(results);
        }

        out
    }

    /// Video and article fetched concurrently; either failing leaves the
    /// other intact.
    pub async fn fetch_one(&self, commentator: &Commentator) -> LatestContent {
        if !commentator.has_content_source() {
            return LatestContent::default();
        }
        let (video, article) = tokio::join!(
            self.fetch_video(commentator),
            self.fetch_article(commentator)
        );
        LatestContent {
            video: settle(commentator, "video", video),
            article: settle(commentator, "article", article),
        }
    }

    async fn fetch_video(&self, commentator: &Commentator) -> Result<Option<LatestVideo>, FeedError> {
        let Some(page_url) = commentator.video_url() else {
            return Ok(None);
        };
        if let Some(known) = commentator.channel_id().filter(|id| is_channel_id(id)) {
            self.resolver.seed(page_url, known).await;
        }
        let Some(channel_id) = self.resolver.resolve(page_url).await else {
            return Ok(None);
        };

        let feed_url = video_feed_url(&self.video_feed_base, &channel_id);
        let located = self.locator.fetch_articles(&feed_url, 1).await?;
        let Some(entry) = located.value.into_iter().next() else {
            return Ok(None);
        };
        let Some(id) = video_id(&entry) else {
            tracing::debug!(
                commentator = %commentator.name,
                feed = %located.url,
                "latest video entry has no video id"
            );
            return Ok(None);
        };

        Ok(Some(LatestVideo {
            title: entry.title,
            thumbnail_url: thumbnail_url(&id),
            url: watch_url(&id),
            published_at: entry.published_at,
            video_id: id,
        }))
    }

    async fn fetch_article(
        &self,
        commentator: &Commentator,
    ) -> Result<Option<LatestArticle>, FeedError> {
        let Some(blog_url) = commentator.blog_url() else {
            return Ok(None);
        };
        let located = self.locator.locate_articles(blog_url, 1).await?;
        Ok(located.value.into_iter().next().map(|item| LatestArticle {
            title: item.title,
            url: item.link,
            published_at: item.published_at,
        }))
    }
}

fn settle<T>(commentator: &Commentator, kind: &str, outcome: Result<Option<T>, FeedError>) -> Option<T> {
    match outcome {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!(
                commentator = %commentator.name,
                id = %commentator.id,
                kind,
                error = %e,
                "latest content fetch failed"
            );
            None
        }
    }
}
