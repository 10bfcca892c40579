use std::{
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use tiered_cache::{
    CacheOutcome, ManualClock, MemoryConfig, MemoryTier, PersistentConfig,
    PersistentTier, TieredCache, TtlPolicy,
};

const POLICY: TtlPolicy = TtlPolicy::from_secs(120, 30);

fn setup_cache() -> (ManualClock, TieredCache) {
    test_utils::init_tracing();
    let clock = ManualClock::new(1_700_000_000_000);
    let memory = MemoryTier::new(&MemoryConfig::default(), clock.shared());
    let persistent =
        PersistentTier::open(&PersistentConfig::temporary(), clock.shared())
            .unwrap();
    (clock, TieredCache::new(memory, Some(persistent)))
}

/// Origin stand-in that returns an incrementing value per call.
#[derive(Clone, Default)]
struct CountingOrigin {
    calls: Arc<AtomicUsize>,
}

impl CountingOrigin {
    async fn fetch(&self) -> Result<String, String> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(format!("origin-{n}"))
    }

    fn calls(&self) -> usize { self.calls.load(Ordering::SeqCst) }
}

#[tokio::test]
async fn test_miss_fetches_and_writes_both_tiers() {
    let (_, cache) = setup_cache();
    let origin = CountingOrigin::default();

    let first = cache
        .lookup("topics_all_spanish_anon", &POLICY, false, || origin.fetch())
        .await
        .unwrap();
    assert_eq!(first.outcome, CacheOutcome::Fetched);
    assert_eq!(first.value, "origin-1");

    let second = cache
        .lookup("topics_all_spanish_anon", &POLICY, false, || origin.fetch())
        .await
        .unwrap();
    assert_eq!(second.outcome, CacheOutcome::PersistentHit);
    assert_eq!(second.value, "origin-1");
    assert_eq!(origin.calls(), 1);

    let stats = cache.stats().await;
    assert_eq!(stats.memory_entries, 1);
    assert_eq!(stats.persistent_entries, 1);
}

#[tokio::test]
async fn test_memory_serves_after_persistent_expiry() {
    let (clock, cache) = setup_cache();
    let origin = CountingOrigin::default();

    cache
        .get_or_fetch("lessons_t1_true", &POLICY, false, || origin.fetch())
        .await
        .unwrap();

    clock.advance(Duration::from_secs(40));

    let lookup = cache
        .lookup("lessons_t1_true", &POLICY, false, || origin.fetch())
        .await
        .unwrap();
    assert_eq!(lookup.outcome, CacheOutcome::MemoryHit);
    assert_eq!(lookup.value, "origin-1");
    assert_eq!(origin.calls(), 1);
}

#[tokio::test]
async fn test_nothing_is_served_past_ttl() {
    let (clock, cache) = setup_cache();
    let origin = CountingOrigin::default();

    cache
        .get_or_fetch("k", &POLICY, false, || origin.fetch())
        .await
        .unwrap();

    clock.advance(Duration::from_secs(119));
    let still_cached: String = cache
        .get_or_fetch("k", &POLICY, false, || origin.fetch())
        .await
        .unwrap();
    assert_eq!(still_cached, "origin-1");

    clock.advance(Duration::from_secs(1));
    let refetched: String = cache
        .get_or_fetch("k", &POLICY, false, || origin.fetch())
        .await
        .unwrap();
    assert_eq!(refetched, "origin-2");
}

#[tokio::test]
async fn test_persistent_tier_takes_precedence() {
    let (_, cache) = setup_cache();
    let origin = CountingOrigin::default();
    let ttl = Duration::from_secs(60);

    cache
        .memory()
        .insert("k", &"from-memory".to_string(), ttl)
        .await
        .unwrap();
    cache
        .persistent()
        .unwrap()
        .insert("k", &"from-disk".to_string(), ttl)
        .await
        .unwrap();

    let lookup = cache
        .lookup("k", &POLICY, false, || origin.fetch())
        .await
        .unwrap();
    assert_eq!(lookup.outcome, CacheOutcome::PersistentHit);
    assert_eq!(lookup.value, "from-disk");
    assert_eq!(origin.calls(), 0);
}

#[tokio::test]
async fn test_force_refresh_bypasses_valid_entries() {
    let (_, cache) = setup_cache();
    let origin = CountingOrigin::default();

    cache
        .get_or_fetch("k", &POLICY, false, || origin.fetch())
        .await
        .unwrap();

    let lookup = cache
        .lookup("k", &POLICY, true, || origin.fetch())
        .await
        .unwrap();
    assert_eq!(lookup.outcome, CacheOutcome::Refreshed);
    assert_eq!(lookup.value, "origin-2");

    let cached: String = cache
        .get_or_fetch("k", &POLICY, false, || origin.fetch())
        .await
        .unwrap();
    assert_eq!(cached, "origin-2");
}

#[tokio::test]
async fn test_origin_failure_propagates_without_writing() {
    let (clock, cache) = setup_cache();
    let origin = CountingOrigin::default();

    cache
        .get_or_fetch("k", &POLICY, false, || origin.fetch())
        .await
        .unwrap();
    clock.advance(Duration::from_secs(600));

    let result: Result<String, String> = cache
        .get_or_fetch("k", &POLICY, false, || async {
            Err("origin unreachable".to_string())
        })
        .await;
    assert_eq!(result.unwrap_err(), "origin unreachable");

    let stats = cache.stats().await;
    assert_eq!(stats.persistent_entries, 0);
}

#[tokio::test]
async fn test_invalidate_prefix_leaves_other_keys() {
    let (_, cache) = setup_cache();
    let origin = CountingOrigin::default();

    for key in ["topics_X_a", "topics_X_b", "topics_Y_a", "lessons_X"] {
        cache
            .get_or_fetch(key, &POLICY, false, || origin.fetch())
            .await
            .unwrap();
    }

    let report = cache.invalidate("topics_X").await;
    assert_eq!(report.memory_removed, 2);
    assert_eq!(report.persistent_removed, Some(2));

    let calls_before = origin.calls();
    for key in ["topics_Y_a", "lessons_X"] {
        let lookup = cache
            .lookup(key, &POLICY, false, || origin.fetch())
            .await
            .unwrap();
        assert!(lookup.outcome.is_hit());
    }
    let lookup = cache
        .lookup("topics_X_a", &POLICY, false, || origin.fetch())
        .await
        .unwrap();
    assert_eq!(lookup.outcome, CacheOutcome::Fetched);
    assert_eq!(origin.calls(), calls_before + 1);
}

#[tokio::test]
async fn test_invalidate_all_empties_both_tiers() {
    let (_, cache) = setup_cache();
    let origin = CountingOrigin::default();

    for key in ["a", "b", "c"] {
        cache
            .get_or_fetch(key, &POLICY, false, || origin.fetch())
            .await
            .unwrap();
    }

    cache.invalidate_all().await;

    let stats = cache.stats().await;
    assert_eq!(stats.memory_entries, 0);
    assert_eq!(stats.persistent_entries, 0);
}

#[tokio::test]
async fn test_corrupt_persistent_entry_falls_through_to_memory() {
    let (_, cache) = setup_cache();
    let origin = CountingOrigin::default();

    cache
        .memory()
        .insert("k", &"from-memory".to_string(), Duration::from_secs(60))
        .await
        .unwrap();
    cache.persistent().unwrap().insert_raw("k", b"\x00garbage").unwrap();

    let lookup = cache
        .lookup("k", &POLICY, false, || origin.fetch())
        .await
        .unwrap();
    assert_eq!(lookup.outcome, CacheOutcome::MemoryHit);
    assert_eq!(lookup.value, "from-memory");
}

#[tokio::test]
async fn test_memory_only_cache_still_fetches_through() {
    test_utils::init_tracing();
    let clock = ManualClock::new(0);
    let cache = TieredCache::memory_only(MemoryTier::new(
        &MemoryConfig::default(),
        clock.shared(),
    ));
    let origin = CountingOrigin::default();

    cache
        .get_or_fetch("k", &POLICY, false, || origin.fetch())
        .await
        .unwrap();
    let lookup = cache
        .lookup("k", &POLICY, false, || origin.fetch())
        .await
        .unwrap();

    assert_eq!(lookup.outcome, CacheOutcome::MemoryHit);
    assert_eq!(cache.invalidate("k").await.persistent_removed, None);
    assert_eq!(cache.purge_expired().await.unwrap(), 0);
}

#[tokio::test]
async fn test_cancelled_fetch_writes_nothing() {
    let (_, cache) = setup_cache();

    let abandoned = tokio::time::timeout(
        Duration::from_millis(20),
        cache.lookup("lesson_l1", &POLICY, false, || {
            std::future::pending::<Result<String, String>>()
        }),
    )
    .await;
    assert!(abandoned.is_err());

    let stats = cache.stats().await;
    assert_eq!(stats.memory_entries, 0);
    assert_eq!(stats.persistent_entries, 0);

    let origin = CountingOrigin::default();
    let lookup = cache
        .lookup("lesson_l1", &POLICY, false, || origin.fetch())
        .await
        .unwrap();
    assert_eq!(lookup.outcome, CacheOutcome::Fetched);
    assert_eq!(lookup.value, "origin-1");
}
