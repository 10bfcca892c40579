use lesson_cache_keys::{CachePolicies, InvalidationScope};
use origin_source::{SharedIdentity, SharedOrigin};
use tiered_cache::TieredCache;
use tracing::instrument;

/// Collaborators shared by every handler. Built once at startup and
/// cloned into each handler; clones share the cache tiers.
#[derive(Clone)]
pub struct ContentServices {
    pub origin: SharedOrigin,
    pub cache: TieredCache,
    pub identity: SharedIdentity,
    pub policies: CachePolicies,
}

impl ContentServices {
    pub fn new(
        origin: SharedOrigin, cache: TieredCache, identity: SharedIdentity,
        policies: CachePolicies,
    ) -> Self {
        Self {
            origin,
            cache,
            identity,
            policies,
        }
    }

    #[instrument(skip(self))]
    pub async fn invalidate(&self, scope: InvalidationScope) {
        match scope.prefix() {
            Some(prefix) => {
                self.cache.invalidate(&prefix).await;
            }
            None => self.cache.invalidate_all().await,
        }
    }

    pub async fn invalidate_all_of(&self, scopes: &[InvalidationScope]) {
        for scope in scopes {
            self.invalidate(*scope).await;
        }
    }
}
