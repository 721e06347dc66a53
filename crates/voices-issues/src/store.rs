//! Where generated key issues live between runs.

use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use sqlx::PgPool;
use voices_content::Clock;

use crate::error::IssuesError;
use crate::model::KeyIssues;

/// Storage key of the current document.
pub const ISSUES_KEY: &str = "key-issues-v1";
/// Lifetime of a generated document.
pub const ISSUES_TTL: Duration = Duration::hours(24);

/// Key-value store with expiry. Expired documents read as absent.
#[async_trait]
pub trait IssueStore: Send + Sync {
    async fn get(&self) -> Result<Option<KeyIssues>, IssuesError>;

    async fn put(&self, issues: &KeyIssues, ttl: Duration) -> Result<(), IssuesError>;
}

/// In-process store, used when no database is configured.
pub struct MemoryIssueStore {
    clock: Arc<dyn Clock>,
    slot: Mutex<Option<(KeyIssues, DateTime<Utc>)>>,
}

impl MemoryIssueStore {
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            slot: Mutex::new(None),
        }
    }
}

#[async_trait]
impl IssueStore for MemoryIssueStore {
    async fn get(&self) -> Result<Option<KeyIssues>, IssuesError> {
        let now = self.clock.now();
        let slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(slot
            .as_ref()
            .filter(|(_, expires_at)| *expires_at > now)
            .map(|(issues, _)| issues.clone()))
    }

    async fn put(&self, issues: &KeyIssues, ttl: Duration) -> Result<(), IssuesError> {
        let expires_at = self.clock.now() + ttl;
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) =
            Some((issues.clone(), expires_at));
        Ok(())
    }
}

/// Postgres-backed store over the shared `kv_store` table.
#[derive(Debug, Clone)]
pub struct PgIssueStore {
    pool: PgPool,
}

impl PgIssueStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl IssueStore for PgIssueStore {
    async fn get(&self) -> Result<Option<KeyIssues>, IssuesError> {
        let Some(value) = voices_db::get_value(&self.pool, ISSUES_KEY).await? else {
            return Ok(None);
        };
        Ok(Some(serde_json::from_value(value)?))
    }

    async fn put(&self, issues: &KeyIssues, ttl: Duration) -> Result<(), IssuesError> {
        let value = serde_json::to_value(issues)?;
        let ttl_secs = u64::try_from(ttl.num_seconds()).unwrap_or(0);
        let expires_at = voices_db::put_value(&self.pool, ISSUES_KEY, &value, ttl_secs).await?;
        tracing::debug!(key = ISSUES_KEY, %expires_at, "key issues stored");
        Ok(())
    }
}
