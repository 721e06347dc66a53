//! Batch updates that write back to the commentator snapshot: channel-id
//! population and follower counts.

use std::time::Duration;

use voices_core::{AppConfig, Commentator};
use voices_feeds::{
    extract_username, ChannelPageScraper, SocialClient, SocialPlatform, YoutubeClient, YoutubeUrl,
};

use crate::context;

/// Pause between channel pages.
pub(crate) const CHANNEL_PAGE_DELAY: Duration = Duration::from_millis(500);
/// Pause between commentators during a follower update.
pub(crate) const FOLLOWER_DELAY: Duration = Duration::from_millis(200);

/// Fill in `youtubeChannelId` for entries with a channel URL and no id.
/// Returns how many ids were found.
pub(crate) async fn populate_channel_ids(
    commentators: &mut [Commentator],
    scraper: &ChannelPageScraper,
    delay: Duration,
) -> usize {
    let mut found = 0;
    let mut first = true;

    for commentator in commentators
        .iter_mut()
        .filter(|c| c.channel_id().is_none())
    {
        let Some(page_url) = commentator.video_url().map(str::to_owned) else {
            continue;
        };
        if !first {
            tokio::time::sleep(delay).await;
        }
        first = false;

        match scraper.channel_id_for_page(&page_url).await {
            Ok(Some(id)) => {
                tracing::info!(commentator = %commentator.name, channel_id = %id, "channel id found");
                commentator.youtube_channel_id = Some(id);
                found += 1;
            }
            Ok(None) => {
                tracing::warn!(commentator = %commentator.name, url = %page_url, "no channel id on page");
            }
            Err(e) => {
                tracing::warn!(commentator = %commentator.name, url = %page_url, error = %e, "channel page fetch failed");
            }
        }
    }

    found
}

/// # Errors
///
/// Returns an error if the snapshot cannot be read or written back.
pub(crate) async fn run_populate_channel_ids(config: &AppConfig) -> anyhow::Result<()> {
    let mut commentators = context::load_snapshot(config)?;
    let scraper = ChannelPageScraper::new(config.feed_timeout_secs)?;

    let found = populate_channel_ids(&mut commentators, &scraper, CHANNEL_PAGE_DELAY).await;
    if found == 0 {
        println!("no new channel ids found; snapshot unchanged");
        return Ok(());
    }

    voices_core::save_commentators(&config.data_path, &commentators)?;
    println!("added {found} channel ids to {}", config.data_path.display());
    Ok(())
}

#[derive(Debug, Default, PartialEq, Eq)]
pub(crate) struct FollowerReport {
    pub youtube: usize,
    pub social: usize,
}

async fn youtube_channel_id(commentator: &Commentator, client: &YoutubeClient) -> Option<String> {
    if let Some(id) = commentator.channel_id() {
        return Some(id.to_owned());
    }
    match YoutubeUrl::parse(commentator.video_url()?)? {
        YoutubeUrl::ChannelId(id) => Some(id),
        YoutubeUrl::Handle(handle) => match client.channel_id_for_handle(&handle).await {
            Ok(id) => id,
            Err(e) => {
                tracing::warn!(commentator = %commentator.name, error = %e, "handle lookup failed");
                None
            }
        },
        YoutubeUrl::Custom(_) => None,
    }
}

async fn youtube_subscribers(commentator: &Commentator, client: &YoutubeClient) -> Option<u64> {
    let channel_id = youtube_channel_id(commentator, client).await?;
    match client.subscriber_count(&channel_id).await {
        Ok(count) => count,
        Err(e) => {
            tracing::warn!(commentator = %commentator.name, error = %e, "subscriber lookup failed");
            None
        }
    }
}

async fn social_followers(
    commentator: &Commentator,
    client: &SocialClient,
    platform: SocialPlatform,
    profile_url: Option<&str>,
) -> Option<u64> {
    let username = extract_username(profile_url?)?;
    match client.follower_count(platform, &username).await {
        Ok(count) => count,
        Err(e) => {
            tracing::warn!(commentator = %commentator.name, %platform, error = %e, "follower lookup failed");
            None
        }
    }
}

/// Refresh counts in place. A lookup that fails or is not configured
/// leaves the existing count alone.
pub(crate) async fn update_followers(
    commentators: &mut [Commentator],
    youtube: Option<&YoutubeClient>,
    social: Option<&SocialClient>,
    delay: Duration,
) -> FollowerReport {
    let mut report = FollowerReport::default();

    for (index, commentator) in commentators.iter_mut().enumerate() {
        if index > 0 {
            tokio::time::sleep(delay).await;
        }

        if let Some(client) = youtube {
            if let Some(count) = youtube_subscribers(commentator, client).await {
                commentator.youtube_subscribers = Some(count);
                report.youtube += 1;
            }
        }

        let Some(client) = social else {
            continue;
        };
        let x = commentator.x_profile().map(str::to_owned);
        if let Some(count) = social_followers(commentator, client, SocialPlatform::X, x.as_deref()).await {
            commentator.x_followers = Some(count);
            report.social += 1;
        }
        let instagram = commentator.instagram_profile().map(str::to_owned);
        if let Some(count) =
            social_followers(commentator, client, SocialPlatform::Instagram, instagram.as_deref()).await
        {
            commentator.instagram_followers = Some(count);
            report.social += 1;
        }
        let tiktok = commentator.tiktok_profile().map(str::to_owned);
        if let Some(count) =
            social_followers(commentator, client, SocialPlatform::Tiktok, tiktok.as_deref()).await
        {
            commentator.tiktok_followers = Some(count);
            report.social += 1;
        }
    }

    report
}

/// # Errors
///
/// Returns an error if the snapshot cannot be read or written back, or a
/// client cannot be built.
pub(crate) async fn run_update_followers(config: &AppConfig) -> anyhow::Result<()> {
    let mut commentators = context::load_snapshot(config)?;
    let youtube = context::youtube_client(config)?;
    if youtube.is_none() {
        tracing::warn!("YOUTUBE_API_KEY not set; subscriber counts left as they are");
    }
    let social = config
        .rapidapi_key
        .as_deref()
        .map(|key| SocialClient::new(key, &config.social_api_host, config.feed_timeout_secs))
        .transpose()?;
    if social.is_none() {
        tracing::warn!("RAPIDAPI_KEY not set; follower counts left as they are");
    }

    let report = update_followers(
        &mut commentators,
        youtube.as_ref(),
        social.as_ref(),
        FOLLOWER_DELAY,
    )
    .await;

    voices_core::save_commentators(&config.data_path, &commentators)?;
    println!(
        "updated {} subscriber counts and {} follower counts for {} entries",
        report.youtube,
        report.social,
        commentators.len()
    );
    Ok(())
}

#[cfg(test)]
#[path = "snapshot_test.rs"]
mod tests;
