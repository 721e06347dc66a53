//! Pipeline components built from configuration, shared by the commands.

use std::sync::Arc;

use voices_content::{
    ChannelIdCache, ChannelResolver, Clock, ContentAggregator, ContentCache, ContentFetcher,
    FileSlot, SystemClock,
};
use voices_core::{AppConfig, Commentator};
use voices_feeds::{FeedLocator, YoutubeClient};
use voices_issues::{AnthropicClient, IssueStore, KeyIssuesJob, MemoryIssueStore, PgIssueStore};

pub(crate) fn load_snapshot(config: &AppConfig) -> anyhow::Result<Vec<Commentator>> {
    let commentators = voices_core::load_commentators(&config.data_path)?;
    tracing::info!(
        count = commentators.len(),
        path = %config.data_path.display(),
        "commentator snapshot loaded"
    );
    Ok(commentators)
}

pub(crate) fn locator(config: &AppConfig) -> anyhow::Result<FeedLocator> {
    Ok(FeedLocator::new(
        config.feed_timeout_secs,
        &config.feed_user_agent,
    )?)
}

pub(crate) fn youtube_client(config: &AppConfig) -> anyhow::Result<Option<YoutubeClient>> {
    Ok(config
        .youtube_api_key
        .as_deref()
        .map(|key| YoutubeClient::new(key, config.feed_timeout_secs))
        .transpose()?)
}

pub(crate) fn resolver(config: &AppConfig) -> anyhow::Result<ChannelResolver> {
    let ids = ChannelIdCache::new(Arc::new(FileSlot::new(config.channel_id_slot())));
    Ok(ChannelResolver::new(ids, youtube_client(config)?))
}

pub(crate) fn fetcher(config: &AppConfig) -> anyhow::Result<ContentFetcher> {
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let cache = ContentCache::new(
        Arc::new(FileSlot::new(config.latest_content_slot())),
        clock,
    );
    Ok(ContentFetcher::new(
        locator(config)?,
        resolver(config)?,
        cache,
        config.fetch_batch_size,
    ))
}

pub(crate) fn aggregator(config: &AppConfig) -> anyhow::Result<ContentAggregator> {
    Ok(ContentAggregator::new(locator(config)?).with_batch_size(config.fetch_batch_size))
}

/// Postgres when `DATABASE_URL` is set, otherwise a store that lives only
/// as long as this process.
pub(crate) async fn issue_store(
    config: &AppConfig,
    clock: Arc<dyn Clock>,
) -> anyhow::Result<Arc<dyn IssueStore>> {
    match config.database_url.as_deref() {
        Some(url) => {
            let pool = voices_db::connect_pool(url, voices_db::PoolConfig::default()).await?;
            voices_db::run_migrations(&pool).await?;
            Ok(Arc::new(PgIssueStore::new(pool)))
        }
        None => {
            tracing::warn!("DATABASE_URL not set; key issues will not outlive this process");
            Ok(Arc::new(MemoryIssueStore::new(clock)))
        }
    }
}

pub(crate) async fn issues_job(config: &AppConfig) -> anyhow::Result<KeyIssuesJob> {
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let generator = match config.anthropic_api_key.as_deref() {
        Some(key) => {
            let client: Arc<dyn voices_issues::TextGenerator> =
                Arc::new(AnthropicClient::new(key, &config.llm_model)?);
            Some(client)
        }
        None => None,
    };
    let store = issue_store(config, Arc::clone(&clock)).await?;
    Ok(KeyIssuesJob::new(aggregator(config)?, generator, store, clock))
}
