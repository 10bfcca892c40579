use chrono::Utc;
use lesson_cache_keys::InvalidationScope;
use lesson_commands::{CompleteLessonCommand, PROGRESS_CONFLICT_COLUMNS};
use lesson_errors::LessonResult;
use lesson_models::tables::USER_LESSON_PROGRESS;
use lesson_query_handlers::ContentServices;
use tracing::{info, instrument};

#[derive(Clone)]
pub struct CompleteLessonHandler {
    services: ContentServices,
}

impl CompleteLessonHandler {
    pub fn new(services: ContentServices) -> Self { Self { services } }

    /// Marks the lesson completed for the user. Completing it twice keeps
    /// a single progress row with the latest timestamp.
    #[instrument(skip(self))]
    pub async fn execute(&self, command: CompleteLessonCommand) -> LessonResult<()> {
        let row = command.progress_row(Utc::now());
        self.services
            .origin
            .upsert(USER_LESSON_PROGRESS, row, &PROGRESS_CONFLICT_COLUMNS)
            .await?;

        self.services
            .invalidate_all_of(&[
                InvalidationScope::UserProgress(command.user_id),
                InvalidationScope::AllTopics,
                InvalidationScope::EveryTopic,
            ])
            .await;
        info!(user_id = %command.user_id, lesson_id = %command.lesson_id, "lesson completed");
        Ok(())
    }
}
