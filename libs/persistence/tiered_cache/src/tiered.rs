use std::future::Future;

use serde::{Serialize, de::DeserializeOwned};
use tracing::{debug, info, instrument, warn};

use crate::{
    clock::SharedClock,
    config::{TieredConfig, TtlPolicy},
    error::CacheResult,
    memory::MemoryTier,
    persistent::PersistentTier,
};

/// Where a value returned by [`TieredCache::lookup`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheOutcome {
    PersistentHit,
    MemoryHit,
    /// Both tiers missed and the origin was called.
    Fetched,
    /// The caller asked to skip both tiers.
    Refreshed,
}

impl CacheOutcome {
    pub fn is_hit(self) -> bool {
        matches!(self, Self::PersistentHit | Self::MemoryHit)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Lookup<T> {
    pub value: T,
    pub outcome: CacheOutcome,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidationReport {
    pub memory_removed: usize,
    /// `None` when the persistent tier is absent or its delete failed.
    pub persistent_removed: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub memory_entries: u64,
    pub persistent_entries: usize,
}

/// Fetch-through cache over a persistent tier and an in-memory tier.
///
/// Lookups check the persistent tier, then the memory tier, then call the
/// origin. Origin results are written to both tiers before returning.
/// Tier failures are logged and treated as misses; origin failures are
/// returned to the caller untouched.
///
/// Constructed once per process and cloned into every repository; clones
/// share both tiers.
#[derive(Clone)]
pub struct TieredCache {
    memory: MemoryTier,
    persistent: Option<PersistentTier>,
}

impl TieredCache {
    pub fn new(memory: MemoryTier, persistent: Option<PersistentTier>) -> Self {
        Self { memory, persistent }
    }

    /// Opens both tiers. A persistent tier that fails to open is logged and
    /// left out; the cache then runs on the memory tier alone.
    pub fn open(config: &TieredConfig, clock: SharedClock) -> Self {
        let memory = MemoryTier::new(&config.memory, clock.clone());
        let persistent = match PersistentTier::open(&config.persistent, clock)
        {
            Ok(tier) => Some(tier),
            Err(e) => {
                warn!(
                    error = %e,
                    "persistent cache tier unavailable, continuing with memory only"
                );
                None
            }
        };

        Self::new(memory, persistent)
    }

    pub fn memory_only(memory: MemoryTier) -> Self { Self::new(memory, None) }

    pub fn memory(&self) -> &MemoryTier { &self.memory }

    pub fn persistent(&self) -> Option<&PersistentTier> {
        self.persistent.as_ref()
    }

    pub async fn get_or_fetch<T, E, F, Fut>(
        &self, key: &str, policy: &TtlPolicy, force_refresh: bool, fetch: F,
    ) -> Result<T, E>
    where
        T: Serialize + DeserializeOwned + Clone + Send + Sync,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        self.lookup(key, policy, force_refresh, fetch)
            .await
            .map(|lookup| lookup.value)
    }

    #[instrument(skip(self, policy, fetch))]
    pub async fn lookup<T, E, F, Fut>(
        &self, key: &str, policy: &TtlPolicy, force_refresh: bool, fetch: F,
    ) -> Result<Lookup<T>, E>
    where
        T: Serialize + DeserializeOwned + Clone + Send + Sync,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if force_refresh {
            debug!("forced refresh, bypassing cache tiers");
            let value = fetch().await?;
            self.write_through(key, &value, policy).await;
            return Ok(Lookup {
                value,
                outcome: CacheOutcome::Refreshed,
            });
        }

        if let Some(value) = self.read_persistent::<T>(key).await {
            debug!("persistent tier hit");
            return Ok(Lookup {
                value,
                outcome: CacheOutcome::PersistentHit,
            });
        }

        match self.memory.get::<T>(key).await {
            Ok(Some(value)) => {
                debug!("memory tier hit");
                return Ok(Lookup {
                    value,
                    outcome: CacheOutcome::MemoryHit,
                });
            }
            Ok(None) => {}
            Err(e) => warn!(error = %e, "memory tier read failed"),
        }

        debug!("cache miss, fetching from origin");
        let value = fetch().await?;
        self.write_through(key, &value, policy).await;

        Ok(Lookup {
            value,
            outcome: CacheOutcome::Fetched,
        })
    }

    /// Drops every entry whose key starts with `prefix`.
    ///
    /// The memory tier is cleared before this returns. Persistent deletion
    /// is best-effort: a failure is logged and left to that tier's TTL.
    #[instrument(skip(self))]
    pub async fn invalidate(&self, prefix: &str) -> InvalidationReport {
        let memory_removed = self.memory.remove_prefix(prefix).await;

        let persistent_removed = match &self.persistent {
            Some(tier) => {
                match tier.remove_prefix(prefix).await {
                    Ok(removed) => Some(removed),
                    Err(e) => {
                        warn!(error = %e, "persistent invalidation failed");
                        None
                    }
                }
            }
            None => None,
        };

        debug!(memory_removed, ?persistent_removed, "invalidated prefix");
        InvalidationReport {
            memory_removed,
            persistent_removed,
        }
    }

    #[instrument(skip(self))]
    pub async fn invalidate_all(&self) {
        self.memory.clear().await;

        if let Some(tier) = &self.persistent {
            if let Err(e) = tier.clear().await {
                warn!(error = %e, "failed to clear persistent tier");
            }
        }

        info!("cleared all cache tiers");
    }

    /// Removes expired persistent records. Memory entries expire lazily.
    pub async fn purge_expired(&self) -> CacheResult<usize> {
        match &self.persistent {
            Some(tier) => tier.purge_expired().await,
            None => Ok(0),
        }
    }

    pub async fn stats(&self) -> CacheStats {
        CacheStats {
            memory_entries: self.memory.len().await,
            persistent_entries: self
                .persistent
                .as_ref()
                .map(PersistentTier::len)
                .unwrap_or(0),
        }
    }

    async fn read_persistent<T>(&self, key: &str) -> Option<T>
    where
        T: DeserializeOwned,
    {
        let tier = self.persistent.as_ref()?;
        match tier.get::<T>(key).await {
            Ok(value) => value,
            Err(e) => {
                warn!(key, error = %e, "persistent tier read failed");
                None
            }
        }
    }

    async fn write_through<T>(&self, key: &str, value: &T, policy: &TtlPolicy)
    where
        T: Serialize + DeserializeOwned + Clone + Send + Sync,
    {
        if let Err(e) =
            self.memory.insert(key, value, policy.memory_ttl()).await
        {
            warn!(key, error = %e, "memory tier write failed");
        }

        if let Some(tier) = &self.persistent {
            if let Err(e) =
                tier.insert(key, value, policy.persistent_ttl()).await
            {
                warn!(key, error = %e, "persistent tier write failed");
            }
        }
    }
}
