//! Database operations for the `kv_store` table.
//!
//! Every read filters on `expires_at > NOW()`, so an expired row behaves
//! exactly like a missing one.

use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::PgPool;

use crate::DbError;

/// A live row from the `kv_store` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct KvRow {
    pub key: String,
    pub value: Value,
    pub expires_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fetch the value stored under `key`, if present and not expired.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_value(pool: &PgPool, key: &str) -> Result<Option<Value>, DbError> {
    let value = sqlx::query_scalar::<_, Value>(
        "SELECT value FROM kv_store WHERE key = $1 AND expires_at > NOW()",
    )
    .bind(key)
    .fetch_optional(pool)
    .await?;
    Ok(value)
}

/// Fetch the full row under `key`, if present and not expired.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_entry(pool: &PgPool, key: &str) -> Result<Option<KvRow>, DbError> {
    let row = sqlx::query_as::<_, KvRow>(
        "SELECT key, value, expires_at, updated_at \
         FROM kv_store WHERE key = $1 AND expires_at > NOW()",
    )
    .bind(key)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

/// Insert or replace `key` with an expiry `ttl_secs` seconds from now.
///
/// # Errors
///
/// Returns [`DbError::InvalidTtl`] for a TTL of zero or one that does not fit
/// the column, [`DbError::Sqlx`] if the upsert fails.
pub async fn put_value(
    pool: &PgPool,
    key: &str,
    value: &Value,
    ttl_secs: u64,
) -> Result<DateTime<Utc>, DbError> {
    let ttl = i64::try_from(ttl_secs)
        .ok()
        .filter(|t| *t > 0)
        .ok_or_else(|| DbError::InvalidTtl(ttl_secs.to_string()))?;

    let expires_at: DateTime<Utc> = sqlx::query_scalar(
        "INSERT INTO kv_store (key, value, expires_at, updated_at) \
         VALUES ($1, $2, NOW() + ($3::BIGINT * INTERVAL '1 second'), NOW()) \
         ON CONFLICT (key) DO UPDATE \
         SET value = EXCLUDED.value, \
             expires_at = EXCLUDED.expires_at, \
             updated_at = NOW() \
         RETURNING expires_at",
    )
    .bind(key)
    .bind(value)
    .bind(ttl)
    .fetch_one(pool)
    .await?;

    Ok(expires_at)
}

/// Remove `key`; returns whether a row was deleted.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the delete fails.
pub async fn delete_value(pool: &PgPool, key: &str) -> Result<bool, DbError> {
    let result = sqlx::query("DELETE FROM kv_store WHERE key = $1")
        .bind(key)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Delete expired rows and return how many were removed.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the delete fails.
pub async fn purge_expired(pool: &PgPool) -> Result<u64, DbError> {
    let result = sqlx::query("DELETE FROM kv_store WHERE expires_at <= NOW()")
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}
