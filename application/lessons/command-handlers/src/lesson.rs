use lesson_cache_keys::InvalidationScope;
use lesson_commands::{
    CreateLessonCommand, DeleteLessonCommand, UpdateLessonCommand,
};
use lesson_errors::{LessonError, LessonResult};
use lesson_models::{Lesson, tables::LESSONS};
use lesson_query_handlers::ContentServices;
use origin_source::{OriginQuery, decode_rows};
use tracing::{debug, instrument};
use uuid::Uuid;

use crate::by_id;

/// Views that embed a topic's lessons or their counts. Counts feed the
/// lock of later topics, hence every single-topic view.
fn lesson_scopes(lesson_id: Uuid, topic_id: Uuid) -> [InvalidationScope; 5] {
    [
        InvalidationScope::Lessons(topic_id),
        InvalidationScope::Lesson(lesson_id),
        InvalidationScope::LessonCounts,
        InvalidationScope::AllTopics,
        InvalidationScope::EveryTopic,
    ]
}

/// Reads the lesson straight from the origin, bypassing the cache.
async fn find_lesson(
    services: &ContentServices, lesson_id: Uuid,
) -> LessonResult<Lesson> {
    let rows = services
        .origin
        .select(&OriginQuery::table(LESSONS).eq("id", lesson_id.to_string()).limit(1))
        .await?;

    decode_rows::<Lesson>(LESSONS, rows)?
        .into_iter()
        .next()
        .ok_or(LessonError::LessonNotFound { lesson_id })
}

#[derive(Clone)]
pub struct CreateLessonHandler {
    services: ContentServices,
}

impl CreateLessonHandler {
    pub fn new(services: ContentServices) -> Self { Self { services } }

    #[instrument(skip(self))]
    pub async fn execute(&self, command: CreateLessonCommand) -> LessonResult<Lesson> {
        let lesson_id = Uuid::now_v7();
        let topic_id = command.topic_id;
        let row = command.into_row(lesson_id)?;

        let saved = self.services.origin.insert(LESSONS, row).await?;
        let lesson = decode_rows::<Lesson>(LESSONS, vec![saved])?
            .into_iter()
            .next()
            .ok_or(LessonError::LessonNotFound { lesson_id })?;

        self.services
            .invalidate_all_of(&lesson_scopes(lesson_id, topic_id))
            .await;
        Ok(lesson)
    }
}

#[derive(Clone)]
pub struct UpdateLessonHandler {
    services: ContentServices,
}

impl UpdateLessonHandler {
    pub fn new(services: ContentServices) -> Self { Self { services } }

    /// Applies the patch. A lesson moved to another topic invalidates
    /// the views of both topics.
    #[instrument(skip(self))]
    pub async fn execute(&self, command: UpdateLessonCommand) -> LessonResult<()> {
        let patch = command.patch()?;
        let lesson_id = command.lesson_id;
        let existing = find_lesson(&self.services, lesson_id).await?;

        self.services
            .origin
            .update(LESSONS, &[by_id(lesson_id)], patch)
            .await?;

        self.services
            .invalidate_all_of(&lesson_scopes(lesson_id, existing.topic_id))
            .await;
        if let Some(topic_id) = command.topic_id.filter(|id| *id != existing.topic_id) {
            debug!(%lesson_id, from = %existing.topic_id, to = %topic_id, "lesson moved");
            self.services
                .invalidate_all_of(&lesson_scopes(lesson_id, topic_id))
                .await;
        }
        Ok(())
    }
}

#[derive(Clone)]
pub struct DeleteLessonHandler {
    services: ContentServices,
}

impl DeleteLessonHandler {
    pub fn new(services: ContentServices) -> Self { Self { services } }

    #[instrument(skip(self))]
    pub async fn execute(&self, command: DeleteLessonCommand) -> LessonResult<()> {
        let lesson_id = command.lesson_id;
        let existing = find_lesson(&self.services, lesson_id).await?;

        self.services
            .origin
            .delete(LESSONS, &[by_id(lesson_id)])
            .await?;

        self.services
            .invalidate_all_of(&lesson_scopes(lesson_id, existing.topic_id))
            .await;
        Ok(())
    }
}
