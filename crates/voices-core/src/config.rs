use crate::app_config::{AppConfig, Environment};
use crate::ConfigError;

pub const DEFAULT_FEED_USER_AGENT: &str = "Mozilla/5.0 (compatible; IndependentVoices RSS Reader)";
pub const DEFAULT_LLM_MODEL: &str = "claude-3-5-haiku-latest";
pub const DEFAULT_SOCIAL_API_HOST: &str = "social-media-data-tt.p.rapidapi.com";

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the real environment so it can be tested with a pure
/// `HashMap` lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;
    use std::path::PathBuf;

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    // Empty values count as unset so `FOO=` in a .env file disables a credential.
    let optional = |var: &str| -> Option<String> {
        lookup(var)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        or_default(var, default)
            .parse::<u64>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let env = parse_environment(&or_default("VOICES_ENV", "development"));

    let bind_addr = or_default("VOICES_BIND_ADDR", "0.0.0.0:3000")
        .parse::<SocketAddr>()
        .map_err(|e| invalid("VOICES_BIND_ADDR", e.to_string()))?;
    let log_level = or_default("VOICES_LOG_LEVEL", "info");
    let data_path = PathBuf::from(or_default("VOICES_DATA_PATH", "./public/data.json"));
    let cache_dir = PathBuf::from(or_default("VOICES_CACHE_DIR", "./.cache"));

    let feed_timeout_secs = parse_u64("VOICES_FEED_TIMEOUT_SECS", "10")?;
    let feed_user_agent = or_default("VOICES_FEED_USER_AGENT", DEFAULT_FEED_USER_AGENT);

    let fetch_batch_size = or_default("VOICES_FETCH_BATCH_SIZE", "5")
        .parse::<usize>()
        .map_err(|e| invalid("VOICES_FETCH_BATCH_SIZE", e.to_string()))?;
    if fetch_batch_size == 0 {
        return Err(invalid(
            "VOICES_FETCH_BATCH_SIZE",
            "batch size must be at least 1".to_string(),
        ));
    }

    let youtube_api_key = optional("YOUTUBE_API_KEY");
    let anthropic_api_key = optional("ANTHROPIC_API_KEY");
    let llm_model = or_default("VOICES_LLM_MODEL", DEFAULT_LLM_MODEL);
    let cron_secret = optional("CRON_SECRET");
    let database_url = optional("DATABASE_URL");
    let key_issues_cron = or_default("KEY_ISSUES_CRON", "0 0 6 * * *");
    let rapidapi_key = optional("RAPIDAPI_KEY");
    let social_api_host = or_default("VOICES_SOCIAL_API_HOST", DEFAULT_SOCIAL_API_HOST);

    Ok(AppConfig {
        env,
        bind_addr,
        log_level,
        data_path,
        cache_dir,
        feed_timeout_secs,
        feed_user_agent,
        fetch_batch_size,
        youtube_api_key,
        anthropic_api_key,
        llm_model,
        cron_secret,
        database_url,
        key_issues_cron,
        rapidapi_key,
        social_api_host,
    })
}

/// Parse a string into an `Environment` variant.
///
/// Unrecognized values default to `Environment::Development`.
fn parse_environment(s: &str) -> Environment {
    match s {
        "production" => Environment::Production,
        "test" => Environment::Test,
        _ => Environment::Development,
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
