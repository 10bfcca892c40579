use lesson_cache_keys::{LessonCacheKey, LessonsCacheKey};
use lesson_errors::LessonResult;
use lesson_models::{Lesson, tables::LESSONS};
use lesson_queries::{GetLessonQuery, GetLessonsQuery};
use origin_source::{OriginQuery, decode_rows};
use tiered_cache::CacheKey;
use tracing::instrument;
use uuid::Uuid;

use crate::services::ContentServices;

#[derive(Clone)]
pub struct LessonsQueryHandler {
    services: ContentServices,
}

impl LessonsQueryHandler {
    pub fn new(services: ContentServices) -> Self { Self { services } }

    /// Lessons of a topic ordered by `sort_order`, then `lesson_number`
    /// with missing numbers last.
    #[instrument(skip(self))]
    pub async fn execute(&self, query: GetLessonsQuery) -> LessonResult<Vec<Lesson>> {
        let key = LessonsCacheKey::new(query.topic_id, query.published_only);

        self.services
            .cache
            .get_or_fetch(
                &key.render(),
                &self.services.policies.lessons,
                query.force_refresh,
                || self.load(query.topic_id, query.published_only),
            )
            .await
    }

    async fn load(
        &self, topic_id: Uuid, published_only: bool,
    ) -> LessonResult<Vec<Lesson>> {
        let mut request =
            OriginQuery::table(LESSONS).eq("topic_id", topic_id.to_string());
        if published_only {
            request = request.eq("is_published", true);
        }
        let request = request
            .order_by("sort_order", true, true)
            .order_by("lesson_number", true, true);

        let rows = self.services.origin.select(&request).await?;
        Ok(decode_rows(LESSONS, rows)?)
    }
}

#[derive(Clone)]
pub struct LessonQueryHandler {
    services: ContentServices,
}

impl LessonQueryHandler {
    pub fn new(services: ContentServices) -> Self { Self { services } }

    #[instrument(skip(self))]
    pub async fn execute(&self, query: GetLessonQuery) -> LessonResult<Option<Lesson>> {
        let key = LessonCacheKey::new(query.lesson_id);

        self.services
            .cache
            .get_or_fetch(
                &key.render(),
                &self.services.policies.lessons,
                query.force_refresh,
                || self.load(query.lesson_id),
            )
            .await
    }

    async fn load(&self, lesson_id: Uuid) -> LessonResult<Option<Lesson>> {
        let rows = self
            .services
            .origin
            .select(
                &OriginQuery::table(LESSONS)
                    .eq("id", lesson_id.to_string())
                    .limit(1),
            )
            .await?;
        Ok(decode_rows::<Lesson>(LESSONS, rows)?.into_iter().next())
    }
}
