use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Published lessons under one topic.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LessonCounts {
    pub total: u32,
}

/// Lessons of one topic a user has completed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicLessonProgress {
    pub completed_count: u32,
}

/// A `user_lesson_progress` row; unique per `(user_id, lesson_id)`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LessonProgressRecord {
    pub user_id: Uuid,
    pub lesson_id: Uuid,
    pub topic_id: Uuid,
    #[serde(default)]
    pub is_completed: bool,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
}
