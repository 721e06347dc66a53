//! `content` command handlers.

use std::collections::BTreeMap;

use chrono::Utc;
use voices_core::{AppConfig, Commentator};

use crate::context;

/// Everything, or just the commentator whose id renders as `id`.
pub(crate) fn select_commentators(
    commentators: Vec<Commentator>,
    id: Option<&str>,
) -> anyhow::Result<Vec<Commentator>> {
    let Some(id) = id else {
        return Ok(commentators);
    };
    let selected: Vec<Commentator> = commentators
        .into_iter()
        .filter(|c| c.id.to_string() == id)
        .collect();
    if selected.is_empty() {
        anyhow::bail!("no commentator with id '{id}' in the snapshot");
    }
    Ok(selected)
}

/// Print latest content as JSON keyed by commentator id.
///
/// # Errors
///
/// Returns an error if the snapshot cannot be loaded, the id filter matches
/// nothing, or the pipeline cannot be built. Per-commentator fetch failures
/// only show up as missing content.
pub(crate) async fn run_latest(config: &AppConfig, id: Option<&str>) -> anyhow::Result<()> {
    let commentators = select_commentators(context::load_snapshot(config)?, id)?;
    let fetcher = context::fetcher(config)?;

    let results = fetcher.fetch_latest(&commentators).await;
    let by_id: BTreeMap<String, _> = results
        .into_iter()
        .map(|(id, content)| (id.to_string(), content))
        .collect();

    println!("{}", serde_json::to_string_pretty(&by_id)?);
    Ok(())
}

/// Print recent blog articles grouped by lean as JSON.
///
/// # Errors
///
/// Returns an error if the snapshot cannot be loaded or the locator cannot
/// be built.
pub(crate) async fn run_aggregate(config: &AppConfig) -> anyhow::Result<()> {
    let commentators = context::load_snapshot(config)?;
    let groups = context::aggregator(config)?
        .aggregate(&commentators, Utc::now())
        .await;

    for (bucket, group) in groups.iter() {
        let articles: usize = group.iter().map(|c| c.articles.len()).sum();
        tracing::info!(%bucket, commentators = group.len(), articles, "lean group");
    }
    println!("{}", serde_json::to_string_pretty(&groups)?);
    Ok(())
}
