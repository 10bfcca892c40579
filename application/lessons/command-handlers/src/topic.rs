use lesson_cache_keys::InvalidationScope;
use lesson_commands::{CreateTopicCommand, DeleteTopicCommand, UpdateTopicCommand};
use lesson_errors::{LessonError, LessonResult};
use lesson_models::{Topic, TopicRecord, tables::LESSON_TOPICS};
use lesson_query_handlers::ContentServices;
use origin_source::decode_rows;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::by_id;

/// Reordering or removing a topic can change the lock of every sibling,
/// so all single-topic views go along with the lists.
fn topic_scopes() -> [InvalidationScope; 3] {
    [
        InvalidationScope::AllTopics,
        InvalidationScope::EveryTopic,
        InvalidationScope::LessonCounts,
    ]
}

#[derive(Clone)]
pub struct CreateTopicHandler {
    services: ContentServices,
}

impl CreateTopicHandler {
    pub fn new(services: ContentServices) -> Self { Self { services } }

    #[instrument(skip(self))]
    pub async fn execute(&self, command: CreateTopicCommand) -> LessonResult<Topic> {
        let topic_id = Uuid::now_v7();
        let row = command.into_row(topic_id)?;

        let saved = self.services.origin.insert(LESSON_TOPICS, row).await?;
        let record = decode_rows::<TopicRecord>(LESSON_TOPICS, vec![saved])?
            .into_iter()
            .next()
            .ok_or(LessonError::TopicNotFound { topic_id })?;

        self.services.invalidate_all_of(&topic_scopes()).await;
        info!(%topic_id, "topic created");
        Ok(Topic::from_record(record))
    }
}

#[derive(Clone)]
pub struct UpdateTopicHandler {
    services: ContentServices,
}

impl UpdateTopicHandler {
    pub fn new(services: ContentServices) -> Self { Self { services } }

    #[instrument(skip(self))]
    pub async fn execute(&self, command: UpdateTopicCommand) -> LessonResult<()> {
        let patch = command.patch()?;
        let topic_id = command.topic_id;

        let updated = self
            .services
            .origin
            .update(LESSON_TOPICS, &[by_id(topic_id)], patch)
            .await?;
        if updated == 0 {
            return Err(LessonError::TopicNotFound { topic_id });
        }

        self.services.invalidate_all_of(&topic_scopes()).await;
        Ok(())
    }
}

#[derive(Clone)]
pub struct DeleteTopicHandler {
    services: ContentServices,
}

impl DeleteTopicHandler {
    pub fn new(services: ContentServices) -> Self { Self { services } }

    /// Removes the topic row only; its lessons are left to the origin's
    /// own cascade rules.
    #[instrument(skip(self))]
    pub async fn execute(&self, command: DeleteTopicCommand) -> LessonResult<()> {
        let topic_id = command.topic_id;
        let deleted = self
            .services
            .origin
            .delete(LESSON_TOPICS, &[by_id(topic_id)])
            .await?;
        if deleted == 0 {
            return Err(LessonError::TopicNotFound { topic_id });
        }

        self.services.invalidate_all_of(&topic_scopes()).await;
        self.services
            .invalidate(InvalidationScope::Lessons(topic_id))
            .await;
        info!(%topic_id, "topic deleted");
        Ok(())
    }
}
