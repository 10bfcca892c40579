use std::collections::HashMap;

use lesson_cache_keys::LessonCountsCacheKey;
use lesson_errors::LessonResult;
use lesson_models::{LessonCounts, tables::LESSONS};
use origin_source::{OriginQuery, RowExt};
use tiered_cache::CacheKey;
use tracing::instrument;
use uuid::Uuid;

use crate::services::ContentServices;

/// Published lesson totals per topic, cached per topic id set.
#[derive(Clone)]
pub struct LessonCountsRepository {
    services: ContentServices,
}

impl LessonCountsRepository {
    pub fn new(services: ContentServices) -> Self { Self { services } }

    /// Every requested topic is present in the result; topics without
    /// published lessons count zero.
    #[instrument(skip(self, topic_ids), fields(topics = topic_ids.len()))]
    pub async fn counts(
        &self, topic_ids: &[Uuid], force_refresh: bool,
    ) -> LessonResult<HashMap<Uuid, LessonCounts>> {
        if topic_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let key = LessonCountsCacheKey::new(topic_ids);
        self.services
            .cache
            .get_or_fetch(
                &key.render(),
                &self.services.policies.lesson_counts,
                force_refresh,
                || self.fetch(topic_ids),
            )
            .await
    }

    async fn fetch(
        &self, topic_ids: &[Uuid],
    ) -> LessonResult<HashMap<Uuid, LessonCounts>> {
        let rows = self
            .services
            .origin
            .select(
                &OriginQuery::table(LESSONS)
                    .columns(["topic_id"])
                    .eq("is_published", true)
                    .is_in("topic_id", topic_ids.iter().map(Uuid::to_string)),
            )
            .await?;

        let mut counts: HashMap<Uuid, LessonCounts> = topic_ids
            .iter()
            .map(|id| (*id, LessonCounts::default()))
            .collect();

        for topic_id in rows.iter().filter_map(|row| row.uuid("topic_id")) {
            if let Some(count) = counts.get_mut(&topic_id) {
                count.total += 1;
            }
        }
        Ok(counts)
    }
}
