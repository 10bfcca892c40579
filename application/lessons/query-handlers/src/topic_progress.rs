use std::collections::{HashMap, HashSet};

use lesson_cache_keys::TopicProgressCacheKey;
use lesson_errors::LessonResult;
use lesson_models::{TopicLessonProgress, tables::USER_LESSON_PROGRESS};
use origin_source::{OriginQuery, RowExt};
use tiered_cache::CacheKey;
use tracing::instrument;
use uuid::Uuid;

use crate::services::ContentServices;

/// Completed lessons per topic for one user.
#[derive(Clone)]
pub struct TopicProgressRepository {
    services: ContentServices,
}

impl TopicProgressRepository {
    pub fn new(services: ContentServices) -> Self { Self { services } }

    #[instrument(skip(self, topic_ids), fields(topics = topic_ids.len()))]
    pub async fn completed(
        &self, user_id: Uuid, topic_ids: &[Uuid], force_refresh: bool,
    ) -> LessonResult<HashMap<Uuid, TopicLessonProgress>> {
        if topic_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let key = TopicProgressCacheKey::new(user_id, topic_ids);
        self.services
            .cache
            .get_or_fetch(
                &key.render(),
                &self.services.policies.topic_progress,
                force_refresh,
                || self.fetch(user_id, topic_ids),
            )
            .await
    }

    async fn fetch(
        &self, user_id: Uuid, topic_ids: &[Uuid],
    ) -> LessonResult<HashMap<Uuid, TopicLessonProgress>> {
        let rows = self
            .services
            .origin
            .select(
                &OriginQuery::table(USER_LESSON_PROGRESS)
                    .columns(["topic_id", "lesson_id"])
                    .eq("user_id", user_id.to_string())
                    .eq("is_completed", true)
                    .is_in("topic_id", topic_ids.iter().map(Uuid::to_string)),
            )
            .await?;

        let mut lessons: HashMap<Uuid, HashSet<Uuid>> = HashMap::new();
        for row in &rows {
            if let (Some(topic_id), Some(lesson_id)) =
                (row.uuid("topic_id"), row.uuid("lesson_id"))
            {
                lessons.entry(topic_id).or_default().insert(lesson_id);
            }
        }

        Ok(topic_ids
            .iter()
            .map(|id| {
                let completed_count =
                    lessons.get(id).map_or(0, |set| set.len() as u32);
                (*id, TopicLessonProgress { completed_count })
            })
            .collect())
    }
}
