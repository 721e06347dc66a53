//! `feed` and `channel` command handlers.

use voices_core::AppConfig;

use crate::context;

/// # Errors
///
/// Returns an error when no candidate yields a feed or the URL is invalid.
pub(crate) async fn run_locate(config: &AppConfig, url: &str, max_items: usize) -> anyhow::Result<()> {
    let located = context::locator(config)?
        .locate_articles(url, max_items)
        .await?;

    println!("feed: {}", located.url);
    for article in &located.value {
        let published = article
            .published_at
            .map_or_else(|| "undated".to_string(), |d| d.to_rfc3339());
        println!("- [{published}] {}", article.title);
        if let Some(link) = &article.link {
            println!("  {link}");
        }
    }
    Ok(())
}

/// # Errors
///
/// Returns an error if the resolver cannot be built or nothing resolved.
pub(crate) async fn run_resolve_channel(config: &AppConfig, url: &str) -> anyhow::Result<()> {
    let resolver = context::resolver(config)?;
    match resolver.resolve(url).await {
        Some(id) => {
            println!("{id}");
            Ok(())
        }
        None => anyhow::bail!("could not resolve a channel id for {url}"),
    }
}
