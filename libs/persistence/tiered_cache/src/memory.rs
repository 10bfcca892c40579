use std::time::Duration;

use bytes::Bytes;
use moka::future::Cache;
use serde::{Serialize, de::DeserializeOwned};
use tracing::debug;

use crate::{
    clock::SharedClock,
    config::MemoryConfig,
    entry::{CacheEntry, CacheValue, Json},
    error::CacheResult,
};

/// In-memory tier: a shared map from key to a TTL-stamped JSON payload.
///
/// Each entry carries its own TTL; validity is judged against the injected
/// clock on read and expired entries are dropped lazily.
#[derive(Clone)]
pub struct MemoryTier {
    memory: Cache<String, CacheEntry<Bytes>>,
    clock: SharedClock,
}

impl MemoryTier {
    pub fn new(config: &MemoryConfig, clock: SharedClock) -> Self {
        let mut builder = Cache::builder().name("content-memory-tier");
        if let Some(capacity) = config.capacity {
            builder = builder.max_capacity(capacity);
        }

        Self {
            memory: builder.build(),
            clock,
        }
    }

    pub async fn get<T>(&self, key: &str) -> CacheResult<Option<T>>
    where
        T: Serialize + DeserializeOwned + Send + Sync,
    {
        let Some(entry) = self.memory.get(key).await
        else {
            return Ok(None);
        };

        if !entry.is_valid_at(self.clock.now_ms()) {
            debug!(key, "memory entry expired");
            self.memory.invalidate(key).await;
            return Ok(None);
        }

        let json = Json::<T>::from_bytes(&entry.value)?;
        Ok(Some(json.inner()))
    }

    pub async fn insert<T>(
        &self, key: &str, value: &T, ttl: Duration,
    ) -> CacheResult<()>
    where
        T: Serialize + DeserializeOwned + Clone + Send + Sync,
    {
        let bytes = Json(value.clone()).to_bytes()?;
        let entry =
            CacheEntry::new(Bytes::from(bytes), self.clock.now_ms(), ttl);
        self.memory.insert(key.to_string(), entry).await;
        Ok(())
    }

    pub async fn remove(&self, key: &str) -> bool {
        self.memory.remove(key).await.is_some()
    }

    /// Removes every entry whose key starts with `prefix`.
    pub async fn remove_prefix(&self, prefix: &str) -> usize {
        let keys: Vec<_> = self
            .memory
            .iter()
            .filter(|(key, _)| key.starts_with(prefix))
            .map(|(key, _)| key)
            .collect();

        for key in &keys {
            self.memory.invalidate(key.as_str()).await;
        }

        keys.len()
    }

    pub async fn clear(&self) {
        self.memory.invalidate_all();
        self.memory.run_pending_tasks().await;
    }

    pub async fn len(&self) -> u64 {
        self.memory.run_pending_tasks().await;
        self.memory.entry_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    fn tier() -> (ManualClock, MemoryTier) {
        let clock = ManualClock::new(0);
        let tier = MemoryTier::new(&MemoryConfig::default(), clock.shared());
        (clock, tier)
    }

    #[tokio::test]
    async fn entry_expires_after_its_own_ttl() {
        let (clock, tier) = tier();
        tier.insert("short", &1u32, Duration::from_secs(10))
            .await
            .unwrap();
        tier.insert("long", &2u32, Duration::from_secs(60))
            .await
            .unwrap();

        clock.advance(Duration::from_secs(10));

        assert_eq!(tier.get::<u32>("short").await.unwrap(), None);
        assert_eq!(tier.get::<u32>("long").await.unwrap(), Some(2));
    }

    #[tokio::test]
    async fn remove_prefix_only_touches_matching_keys() {
        let (_, tier) = tier();
        let ttl = Duration::from_secs(60);
        tier.insert("topics_a", &1u32, ttl).await.unwrap();
        tier.insert("topics_b", &2u32, ttl).await.unwrap();
        tier.insert("lessons_a", &3u32, ttl).await.unwrap();

        assert_eq!(tier.remove_prefix("topics_").await, 2);

        assert_eq!(tier.get::<u32>("topics_a").await.unwrap(), None);
        assert_eq!(tier.get::<u32>("lessons_a").await.unwrap(), Some(3));
    }

    #[tokio::test]
    async fn wrong_type_is_a_deserialization_error() {
        let (_, tier) = tier();
        tier.insert("k", &vec![1u8], Duration::from_secs(5))
            .await
            .unwrap();

        assert!(tier.get::<String>("k").await.is_err());
    }
}
