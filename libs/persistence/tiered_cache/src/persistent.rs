//! Disk-backed cache tier.
//!
//! One sled record per cache key. The record holds the JSON encoding of a
//! [`CacheEntry`] wrapping the value, so expiry survives process restarts.
//! The encoding is private to this crate; nothing else reads the
//! directory.

use std::time::Duration;

use serde::{Serialize, de::DeserializeOwned};
use sled::Db;
use tracing::{debug, info, instrument, warn};

use crate::{
    clock::SharedClock,
    config::PersistentConfig,
    entry::CacheEntry,
    error::{CacheError, CacheResult},
};

type StoredEntry = CacheEntry<serde_json::Value>;

#[derive(Clone)]
pub struct PersistentTier {
    db: Db,
    clock: SharedClock,
}

impl PersistentTier {
    #[instrument(skip_all, fields(path = %config.path.display()))]
    pub fn open(
        config: &PersistentConfig, clock: SharedClock,
    ) -> CacheResult<Self> {
        // Temporary databases get a fresh random location from sled.
        let db = if config.temporary {
            sled::Config::new().temporary(true).open()?
        }
        else {
            sled::Config::new().path(&config.path).open()?
        };

        info!(entries = db.len(), "opened persistent cache tier");
        Ok(Self { db, clock })
    }

    /// Returns the stored value if present and not expired.
    ///
    /// Expired records are removed on read. A record that cannot be decoded
    /// is removed and reported as [`CacheError::Corrupt`].
    pub async fn get<T>(&self, key: &str) -> CacheResult<Option<T>>
    where
        T: DeserializeOwned,
    {
        let Some(raw) = self.db.get(key)?
        else {
            return Ok(None);
        };

        let entry: StoredEntry = match serde_json::from_slice(&raw) {
            Ok(entry) => entry,
            Err(e) => {
                self.discard(key);
                return Err(CacheError::Corrupt {
                    key: key.to_string(),
                    reason: e.to_string(),
                });
            }
        };

        if !entry.is_valid_at(self.clock.now_ms()) {
            debug!(key, "persistent entry expired");
            self.discard(key);
            return Ok(None);
        }

        serde_json::from_value(entry.value)
            .map(Some)
            .map_err(|e| CacheError::DeserializationError(e.to_string()))
    }

    pub async fn insert<T>(
        &self, key: &str, value: &T, ttl: Duration,
    ) -> CacheResult<()>
    where
        T: Serialize,
    {
        let value = serde_json::to_value(value)
            .map_err(|e| CacheError::SerializationError(e.to_string()))?;
        let entry = StoredEntry::new(value, self.clock.now_ms(), ttl);
        let bytes = serde_json::to_vec(&entry)
            .map_err(|e| CacheError::SerializationError(e.to_string()))?;

        self.db.insert(key, bytes)?;
        self.db.flush_async().await?;
        Ok(())
    }

    pub async fn remove(&self, key: &str) -> CacheResult<bool> {
        let existed = self.db.remove(key)?.is_some();
        self.db.flush_async().await?;
        Ok(existed)
    }

    pub async fn remove_prefix(&self, prefix: &str) -> CacheResult<usize> {
        let mut removed = 0;
        for item in self.db.scan_prefix(prefix) {
            let (key, _) = item?;
            self.db.remove(key)?;
            removed += 1;
        }

        self.db.flush_async().await?;
        Ok(removed)
    }

    pub async fn clear(&self) -> CacheResult<()> {
        self.db.clear()?;
        self.db.flush_async().await?;
        Ok(())
    }

    /// Drops expired and undecodable records. Returns how many were removed.
    pub async fn purge_expired(&self) -> CacheResult<usize> {
        let now = self.clock.now_ms();
        let mut removed = 0;

        for item in self.db.iter() {
            let (key, raw) = item?;
            let expired = serde_json::from_slice::<StoredEntry>(&raw)
                .map(|entry| !entry.is_valid_at(now))
                .unwrap_or(true);

            if expired {
                self.db.remove(key)?;
                removed += 1;
            }
        }

        self.db.flush_async().await?;
        Ok(removed)
    }

    pub fn len(&self) -> usize { self.db.len() }

    pub fn is_empty(&self) -> bool { self.db.is_empty() }

    /// Writes raw bytes under `key`, bypassing the entry encoding.
    #[doc(hidden)]
    pub fn insert_raw(&self, key: &str, bytes: &[u8]) -> CacheResult<()> {
        self.db.insert(key, bytes)?;
        Ok(())
    }

    fn discard(&self, key: &str) {
        if let Err(e) = self.db.remove(key) {
            warn!(key, error = %e, "failed to discard persistent entry");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    fn tier() -> (ManualClock, PersistentTier) {
        let clock = ManualClock::new(0);
        let tier =
            PersistentTier::open(&PersistentConfig::temporary(), clock.shared())
                .unwrap();
        (clock, tier)
    }

    #[tokio::test]
    async fn round_trips_until_expiry() {
        let (clock, tier) = tier();
        tier.insert("lessons_1_true", &vec!["a", "b"], Duration::from_secs(30))
            .await
            .unwrap();

        clock.advance(Duration::from_secs(29));
        let hit: Option<Vec<String>> = tier.get("lessons_1_true").await.unwrap();
        assert_eq!(hit, Some(vec!["a".to_string(), "b".to_string()]));

        clock.advance(Duration::from_secs(1));
        let miss: Option<Vec<String>> = tier.get("lessons_1_true").await.unwrap();
        assert_eq!(miss, None);
        assert!(tier.is_empty());
    }

    #[tokio::test]
    async fn corrupt_record_is_reported_and_discarded() {
        let (_, tier) = tier();
        tier.insert_raw("topic_x", b"not json").unwrap();

        let err = tier.get::<u32>("topic_x").await.unwrap_err();
        assert!(matches!(err, CacheError::Corrupt { .. }));
        assert_eq!(tier.get::<u32>("topic_x").await.unwrap(), None);
    }

    #[tokio::test]
    async fn purge_expired_keeps_live_records() {
        let (clock, tier) = tier();
        tier.insert("a", &1u8, Duration::from_secs(10)).await.unwrap();
        tier.insert("b", &2u8, Duration::from_secs(100)).await.unwrap();
        tier.insert_raw("c", b"{").unwrap();

        clock.advance(Duration::from_secs(50));

        assert_eq!(tier.purge_expired().await.unwrap(), 2);
        assert_eq!(tier.get::<u8>("b").await.unwrap(), Some(2));
    }

    #[tokio::test]
    async fn remove_prefix_scopes_deletion() {
        let (_, tier) = tier();
        let ttl = Duration::from_secs(60);
        tier.insert("progress_u1_aa", &1u8, ttl).await.unwrap();
        tier.insert("progress_u1_bb", &1u8, ttl).await.unwrap();
        tier.insert("progress_u2_aa", &1u8, ttl).await.unwrap();

        assert_eq!(tier.remove_prefix("progress_u1_").await.unwrap(), 2);
        assert_eq!(tier.len(), 1);
    }
}
