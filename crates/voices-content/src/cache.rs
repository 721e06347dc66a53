//! Persistent caches: latest content with success/failure TTLs, and the
//! permanent channel-id mapping.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Duration, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use voices_core::CommentatorId;

use crate::clock::Clock;
use crate::error::ContentError;
use crate::model::LatestContent;
use crate::storage::SlotStorage;

/// Lifetime of a record with a video or an article.
pub const SUCCESS_TTL: Duration = Duration::hours(24);

/// Lifetime of an empty record, so failures are retried soon.
pub const FAILURE_TTL: Duration = Duration::hours(1);

const LATEST_CONTENT_SLOT: &str = "latest-content";
const CHANNEL_IDS_SLOT: &str = "channel-ids";

#[must_use]
pub fn ttl_for(content: &LatestContent) -> Duration {
    if content.has_content() {
        SUCCESS_TTL
    } else {
        FAILURE_TTL
    }
}

/// Stored form of a cache entry: the record plus its write time in
/// milliseconds since the epoch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub data: LatestContent,
    pub timestamp: i64,
}

impl CacheEntry {
    /// Live while `now - written <= ttl`.
    #[must_use]
    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        let Some(written) = DateTime::<Utc>::from_timestamp_millis(self.timestamp) else {
            return false;
        };
        now - written <= ttl_for(&self.data)
    }
}

/// Storage key for a commentator: the id's JSON form, so `7` and `"7"`
/// stay distinct.
#[must_use]
pub fn cache_key(id: &CommentatorId) -> String {
    match id {
        CommentatorId::Number(n) => n.to_string(),
        CommentatorId::Text(s) => serde_json::Value::from(s.as_str()).to_string(),
    }
}

fn id_from_key(key: &str) -> Option<CommentatorId> {
    serde_json::from_str(key).ok()
}

/// Load a JSON map from a slot. Unreadable or corrupt slots are empty.
fn read_map<V: DeserializeOwned>(storage: &dyn SlotStorage, slot: &str) -> BTreeMap<String, V> {
    let raw = match storage.read() {
        Ok(Some(raw)) => raw,
        Ok(None) => return BTreeMap::new(),
        Err(e) => {
            tracing::warn!(slot, error = %e, "cache slot unreadable; treating as empty");
            return BTreeMap::new();
        }
    };
    match serde_json::from_str(&raw) {
        Ok(map) => map,
        Err(e) => {
            tracing::warn!(slot, error = %e, "cache slot corrupt; treating as empty");
            BTreeMap::new()
        }
    }
}

fn write_map<V: Serialize>(
    storage: &dyn SlotStorage,
    map: &BTreeMap<String, V>,
) -> Result<(), ContentError> {
    let raw = serde_json::to_string(map)?;
    storage.write(&raw)
}

/// [`read_map`] on the blocking pool.
async fn load_map<V>(storage: &Arc<dyn SlotStorage>, slot: &'static str) -> BTreeMap<String, V>
where
    V: DeserializeOwned + Send + 'static,
{
    let storage = Arc::clone(storage);
    match tokio::task::spawn_blocking(move || read_map(storage.as_ref(), slot)).await {
        Ok(map) => map,
        Err(e) => {
            tracing::warn!(slot, error = %e, "cache read task failed; treating as empty");
            BTreeMap::new()
        }
    }
}

/// Read-modify-write of a whole slot on the blocking pool, serialized by
/// `lock`. `update` returns whether anything changed.
async fn update_map<V, F>(
    storage: &Arc<dyn SlotStorage>,
    lock: &Arc<Mutex<()>>,
    slot: &'static str,
    update: F,
) -> Result<bool, ContentError>
where
    V: Serialize + DeserializeOwned + Send + 'static,
    F: FnOnce(&mut BTreeMap<String, V>) -> bool + Send + 'static,
{
    let storage = Arc::clone(storage);
    let lock = Arc::clone(lock);
    tokio::task::spawn_blocking(move || {
        let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut map = read_map(storage.as_ref(), slot);
        if !update(&mut map) {
            return Ok(false);
        }
        write_map(storage.as_ref(), &map)?;
        Ok(true)
    })
    .await?
}

/// Latest-content cache keyed by commentator id.
///
/// Reads apply the TTL of the stored record; writes are a read-modify-write
/// of the whole slot under one lock. Slot I/O runs on the blocking pool.
#[derive(Clone)]
pub struct ContentCache {
    storage: Arc<dyn SlotStorage>,
    clock: Arc<dyn Clock>,
    write_lock: Arc<Mutex<()>>,
}

impl ContentCache {
    #[must_use]
    pub fn new(storage: Arc<dyn SlotStorage>, clock: Arc<dyn Clock>) -> Self {
        Self {
            storage,
            clock,
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Live record for `id`, or `None` if missing or past its TTL.
    pub async fn get(&self, id: &CommentatorId) -> Option<LatestContent> {
        let mut map: BTreeMap<String, CacheEntry> =
            load_map(&self.storage, LATEST_CONTENT_SLOT).await;
        let entry = map.remove(&cache_key(id))?;
        entry.is_live(self.clock.now()).then_some(entry.data)
    }

    /// Every live record, from a single read of the slot. Keys that are not
    /// a valid id are skipped.
    pub async fn live_entries(&self) -> BTreeMap<CommentatorId, LatestContent> {
        let now = self.clock.now();
        load_map::<CacheEntry>(&self.storage, LATEST_CONTENT_SLOT)
            .await
            .into_iter()
            .filter(|(_, entry)| entry.is_live(now))
            .filter_map(|(key, entry)| Some((id_from_key(&key)?, entry.data)))
            .collect()
    }

    /// # Errors
    ///
    /// Returns [`ContentError`] if the slot cannot be written.
    pub async fn set(&self, id: &CommentatorId, content: LatestContent) -> Result<(), ContentError> {
        self.set_many(std::iter::once((id.clone(), content))).await
    }

    /// Stamp every record with the current time and write them in one
    /// read-modify-write.
    ///
    /// # Errors
    ///
    /// Returns [`ContentError`] if the slot cannot be written.
    pub async fn set_many<I>(&self, entries: I) -> Result<(), ContentError>
    where
        I: IntoIterator<Item = (CommentatorId, LatestContent)>,
    {
        let timestamp = self.clock.now().timestamp_millis();
        let entries: Vec<(String, CacheEntry)> = entries
            .into_iter()
            .map(|(id, data)| (cache_key(&id), CacheEntry { data, timestamp }))
            .collect();
        update_map(
            &self.storage,
            &self.write_lock,
            LATEST_CONTENT_SLOT,
            move |map: &mut BTreeMap<String, CacheEntry>| {
                map.extend(entries);
                true
            },
        )
        .await
        .map(|_| ())
    }
}

/// Permanent page-URL to channel-id mapping. Entries never expire and are
/// never overwritten once written.
#[derive(Clone)]
pub struct ChannelIdCache {
    storage: Arc<dyn SlotStorage>,
    write_lock: Arc<Mutex<()>>,
}

impl ChannelIdCache {
    #[must_use]
    pub fn new(storage: Arc<dyn SlotStorage>) -> Self {
        Self {
            storage,
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    pub async fn get(&self, page_url: &str) -> Option<String> {
        load_map::<String>(&self.storage, CHANNEL_IDS_SLOT)
            .await
            .remove(page_url)
    }

    /// Record a mapping unless one exists. Returns whether it was written.
    ///
    /// # Errors
    ///
    /// Returns [`ContentError`] if the slot cannot be written.
    pub async fn insert(&self, page_url: &str, channel_id: &str) -> Result<bool, ContentError> {
        let page_url = page_url.to_string();
        let channel_id = channel_id.to_string();
        update_map(
            &self.storage,
            &self.write_lock,
            CHANNEL_IDS_SLOT,
            move |map: &mut BTreeMap<String, String>| {
                if map.contains_key(&page_url) {
                    return false;
                }
                map.insert(page_url, channel_id);
                true
            },
        )
        .await
    }
}

#[cfg(test)]
#[path = "cache_test.rs"]
mod tests;
