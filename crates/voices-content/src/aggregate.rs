//! Recent blog articles grouped by political lean, the input to key-issue
//! generation.

use chrono::{DateTime, Duration, Utc};
use futures::future::join_all;
use serde::Serialize;
use voices_core::{Bucket, Commentator, CommentatorId};
use voices_feeds::{Article, FeedLocator, DEFAULT_MAX_ITEMS};

use crate::fetcher::DEFAULT_BATCH_SIZE;

/// Articles older than this are left out of the groups.
pub const RECENT_WINDOW: Duration = Duration::days(7);

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommentatorArticles {
    pub id: CommentatorId,
    pub name: String,
    pub score: String,
    pub bucket: Bucket,
    pub articles: Vec<Article>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LeanGroups {
    pub left: Vec<CommentatorArticles>,
    pub center: Vec<CommentatorArticles>,
    pub right: Vec<CommentatorArticles>,
}

impl LeanGroups {
    #[must_use]
    pub fn get(&self, bucket: Bucket) -> &[CommentatorArticles] {
        match bucket {
            Bucket::Left => &self.left,
            Bucket::Center => &self.center,
            Bucket::Right => &self.right,
        }
    }

    fn get_mut(&mut self, bucket: Bucket) -> &mut Vec<CommentatorArticles> {
        match bucket {
            Bucket::Left => &mut self.left,
            Bucket::Center => &mut self.center,
            Bucket::Right => &mut self.right,
        }
    }

    /// Buckets in left, center, right order.
    pub fn iter(&self) -> impl Iterator<Item = (Bucket, &[CommentatorArticles])> {
        Bucket::ALL.into_iter().map(move |bucket| (bucket, self.get(bucket)))
    }

    #[must_use]
    pub fn total_articles(&self) -> usize {
        self.iter()
            .flat_map(|(_, group)| group)
            .map(|c| c.articles.len())
            .sum()
    }
}

/// Undated articles count as recent.
#[must_use]
pub fn is_recent(article: &Article, now: DateTime<Utc>) -> bool {
    article
        .published_at
        .is_none_or(|published| published > now - RECENT_WINDOW)
}

/// Bucket each result by its lean, keep only recent articles, and drop
/// commentators left with none.
#[must_use]
pub fn group_by_lean(results: Vec<CommentatorArticles>, now: DateTime<Utc>) -> LeanGroups {
    let mut groups = LeanGroups::default();
    for mut result in results {
        result.articles.retain(|article| is_recent(article, now));
        if result.articles.is_empty() {
            continue;
        }
        groups.get_mut(result.bucket).push(result);
    }
    groups
}

/// Fetches blog feeds for every commentator that has one.
pub struct ContentAggregator {
    locator: FeedLocator,
    batch_size: usize,
    max_items: usize,
}

impl ContentAggregator {
    #[must_use]
    pub fn new(locator: FeedLocator) -> Self {
        Self {
            locator,
            batch_size: DEFAULT_BATCH_SIZE,
            max_items: DEFAULT_MAX_ITEMS,
        }
    }

    #[must_use]
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    #[must_use]
    pub fn with_max_items(mut self, max_items: usize) -> Self {
        self.max_items = max_items;
        self
    }

    /// Unfiltered articles per commentator. Commentators whose feed could
    /// not be found are logged and left out.
    pub async fn collect(&self, commentators: &[Commentator]) -> Vec<CommentatorArticles> {
        let with_blog: Vec<&Commentator> =
            commentators.iter().filter(|c| c.blog_url().is_some()).collect();
        let mut results = Vec::with_capacity(with_blog.len());

        for batch in with_blog.chunks(self.batch_size) {
            let fetched = join_all(batch.iter().map(|c| self.collect_one(c))).await;
            results.extend(fetched.into_iter().flatten());
        }

        tracing::info!(
            candidates = with_blog.len(),
            with_articles = results.len(),
            "blog feeds collected"
        );
        results
    }

    async fn collect_one(&self, commentator: &Commentator) -> Option<CommentatorArticles> {
        let blog_url = commentator.blog_url()?;
        match self.locator.locate_articles(blog_url, self.max_items).await {
            Ok(located) => Some(CommentatorArticles {
                id: commentator.id.clone(),
                name: commentator.name.clone(),
                score: commentator.score.clone(),
                bucket: commentator.lean().bucket(),
                articles: located.value,
            }),
            Err(e) => {
                tracing::warn!(
                    commentator = %commentator.name,
                    url = blog_url,
                    error = %e,
                    "blog feed unavailable"
                );
                None
            }
        }
    }

    /// [`ContentAggregator::collect`] followed by [`group_by_lean`].
    pub async fn aggregate(&self, commentators: &[Commentator], now: DateTime<Utc>) -> LeanGroups {
        group_by_lean(self.collect(commentators).await, now)
    }
}
