mod api;
mod middleware;
mod scheduler;

use std::sync::Arc;

use tracing_subscriber::EnvFilter;
use voices_content::{
    ChannelIdCache, ChannelResolver, Clock, ContentAggregator, ContentCache, ContentFetcher,
    FileSlot, LatestContentService, SystemClock,
};
use voices_core::AppConfig;
use voices_feeds::{FeedLocator, YoutubeClient};
use voices_issues::{
    AnthropicClient, IssueStore, KeyIssuesJob, MemoryIssueStore, PgIssueStore, TextGenerator,
};

use crate::{
    api::{build_app, default_rate_limit_state, AppState},
    middleware::CronAuth,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = voices_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    tracing::info!(env = %config.env, "starting voices-server");

    let commentators = Arc::new(voices_core::load_commentators(&config.data_path)?);
    tracing::info!(
        count = commentators.len(),
        path = %config.data_path.display(),
        "commentator snapshot loaded"
    );

    let state = build_state(&config, commentators).await?;
    let content = Arc::clone(&state.content);

    let _scheduler = scheduler::build_scheduler(
        &config.key_issues_cron,
        Arc::clone(&state.issues),
        Arc::clone(&state.commentators),
    )
    .await?;

    let auth = CronAuth::new(config.cron_secret.as_deref());
    let app = build_app(state, auth, default_rate_limit_state());

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!(addr = %config.bind_addr, "listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if content.abort_refresh() {
        tracing::info!("aborted in-flight latest-content refresh");
    }
    Ok(())
}

async fn build_state(
    config: &AppConfig,
    commentators: Arc<Vec<voices_core::Commentator>>,
) -> anyhow::Result<AppState> {
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let locator = FeedLocator::new(config.feed_timeout_secs, &config.feed_user_agent)?;

    let youtube = config
        .youtube_api_key
        .as_deref()
        .map(|key| YoutubeClient::new(key, config.feed_timeout_secs))
        .transpose()?;
    let channel_ids = ChannelIdCache::new(Arc::new(FileSlot::new(config.channel_id_slot())));
    let resolver = ChannelResolver::new(channel_ids, youtube);
    let cache = ContentCache::new(
        Arc::new(FileSlot::new(config.latest_content_slot())),
        Arc::clone(&clock),
    );
    let fetcher = ContentFetcher::new(
        locator.clone(),
        resolver,
        cache,
        config.fetch_batch_size,
    );
    let content = Arc::new(LatestContentService::new(Arc::new(fetcher)));

    let generator = match config.anthropic_api_key.as_deref() {
        Some(key) => {
            let client: Arc<dyn TextGenerator> =
                Arc::new(AnthropicClient::new(key, &config.llm_model)?);
            Some(client)
        }
        None => {
            tracing::warn!("ANTHROPIC_API_KEY not set; key-issues generation will fail closed");
            None
        }
    };

    let store: Arc<dyn IssueStore> = match config.database_url.as_deref() {
        Some(url) => {
            let pool = voices_db::connect_pool(url, voices_db::PoolConfig::default()).await?;
            voices_db::run_migrations(&pool).await?;
            Arc::new(PgIssueStore::new(pool))
        }
        None => {
            tracing::info!("DATABASE_URL not set; key issues kept in memory");
            Arc::new(MemoryIssueStore::new(Arc::clone(&clock)))
        }
    };

    let aggregator =
        ContentAggregator::new(locator.clone()).with_batch_size(config.fetch_batch_size);
    let issues = Arc::new(KeyIssuesJob::new(aggregator, generator, store, clock));

    Ok(AppState {
        commentators,
        locator,
        content,
        issues,
    })
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to listen for ctrl-c");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, starting graceful shutdown");
}
