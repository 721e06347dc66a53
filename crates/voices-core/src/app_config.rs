use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    pub data_path: PathBuf,
    pub cache_dir: PathBuf,
    pub feed_timeout_secs: u64,
    pub feed_user_agent: String,
    pub fetch_batch_size: usize,
    pub youtube_api_key: Option<String>,
    pub anthropic_api_key: Option<String>,
    pub llm_model: String,
    pub cron_secret: Option<String>,
    pub database_url: Option<String>,
    pub key_issues_cron: String,
    pub rapidapi_key: Option<String>,
    pub social_api_host: String,
}

impl AppConfig {
    /// Path of the persisted latest-content slot inside [`AppConfig::cache_dir`].
    #[must_use]
    pub fn latest_content_slot(&self) -> PathBuf {
        self.cache_dir.join("latest-content.json")
    }

    /// Path of the persisted channel-id slot inside [`AppConfig::cache_dir`].
    #[must_use]
    pub fn channel_id_slot(&self) -> PathBuf {
        self.cache_dir.join("channel-ids.json")
    }
}

fn redact(value: Option<&String>) -> Option<&'static str> {
    value.map(|_| "[redacted]")
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field("data_path", &self.data_path)
            .field("cache_dir", &self.cache_dir)
            .field("feed_timeout_secs", &self.feed_timeout_secs)
            .field("feed_user_agent", &self.feed_user_agent)
            .field("fetch_batch_size", &self.fetch_batch_size)
            .field("youtube_api_key", &redact(self.youtube_api_key.as_ref()))
            .field("anthropic_api_key", &redact(self.anthropic_api_key.as_ref()))
            .field("llm_model", &self.llm_model)
            .field("cron_secret", &redact(self.cron_secret.as_ref()))
            .field("database_url", &redact(self.database_url.as_ref()))
            .field("key_issues_cron", &self.key_issues_cron)
            .field("rapidapi_key", &redact(self.rapidapi_key.as_ref()))
            .field("social_api_host", &self.social_api_host)
            .finish()
    }
}
