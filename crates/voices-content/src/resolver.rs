//! Channel page URL to channel id, cached permanently.

use voices_feeds::{YoutubeClient, YoutubeUrl};

use crate::cache::ChannelIdCache;

/// Resolves channel page URLs. Never fails: every problem is logged and
/// turned into `None`.
pub struct ChannelResolver {
    cache: ChannelIdCache,
    client: Option<YoutubeClient>,
}

impl ChannelResolver {
    /// `client` is `None` when no API key is configured; handle and custom
    /// URLs then resolve to `None` without a request.
    #[must_use]
    pub fn new(cache: ChannelIdCache, client: Option<YoutubeClient>) -> Self {
        Self { cache, client }
    }

    /// Record an id already known from the snapshot. Existing mappings win.
    pub async fn seed(&self, page_url: &str, channel_id: &str) {
        self.remember(page_url, channel_id).await;
    }

    pub async fn resolve(&self, page_url: &str) -> Option<String> {
        if let Some(id) = self.cache.get(page_url).await {
            return Some(id);
        }

        let Some(shape) = YoutubeUrl::parse(page_url) else {
            tracing::warn!(url = page_url, "unrecognized channel URL");
            return None;
        };

        let lookup = match shape {
            YoutubeUrl::ChannelId(id) => {
                self.remember(page_url, &id).await;
                return Some(id);
            }
            YoutubeUrl::Handle(handle) => {
                let client = self.client_or_warn(page_url)?;
                client.channel_id_for_handle(&handle).await
            }
            YoutubeUrl::Custom(name) => {
                let client = self.client_or_warn(page_url)?;
                client.search_channel_id(&name).await
            }
        };

        match lookup {
            Ok(Some(id)) => {
                self.remember(page_url, &id).await;
                Some(id)
            }
            Ok(None) => {
                tracing::warn!(url = page_url, "channel lookup matched nothing");
                None
            }
            Err(e) => {
                tracing::warn!(url = page_url, error = %e, "channel lookup failed");
                None
            }
        }
    }

    fn client_or_warn(&self, page_url: &str) -> Option<&YoutubeClient> {
        if self.client.is_none() {
            tracing::warn!(url = page_url, "YOUTUBE_API_KEY not set; cannot resolve channel id");
        }
        self.client.as_ref()
    }

    async fn remember(&self, page_url: &str, channel_id: &str) {
        if let Err(e) = self.cache.insert(page_url, channel_id).await {
            tracing::warn!(url = page_url, error = %e, "failed to persist channel id");
        }
    }
}
