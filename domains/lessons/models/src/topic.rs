use serde::{Deserialize, Serialize};
use typed_builder::TypedBuilder;
use uuid::Uuid;

use crate::progress::{LessonCounts, TopicLessonProgress};

/// A `lesson_topics` row as stored at the origin.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicRecord {
    pub id: Uuid,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub lesson_number: Option<i32>,
    #[serde(default)]
    pub duration_minutes: Option<i32>,
    pub language: String,
    #[serde(default)]
    pub difficulty: Option<String>,
    #[serde(default)]
    pub sort_order: i32,
    #[serde(default = "published_default")]
    pub is_published: bool,
}

fn published_default() -> bool { true }

/// A topic decorated with the current user's progress and lock state.
///
/// Never patched in place: a change to counts or progress produces a new
/// value through [`Topic::with_progress`] and a fresh lock computation.
#[derive(
    Clone, Debug, PartialEq, Eq, Serialize, Deserialize, TypedBuilder,
)]
pub struct Topic {
    pub id: Uuid,
    #[builder(setter(into))]
    pub title: String,
    #[builder(default, setter(into))]
    pub description: String,
    #[builder(default)]
    pub lesson_number: Option<i32>,
    #[builder(default)]
    pub duration_minutes: Option<i32>,
    #[builder(setter(into))]
    pub language: String,
    #[builder(default)]
    pub difficulty: Option<String>,
    #[builder(default)]
    pub sort_order: i32,
    #[builder(default)]
    pub is_completed: bool,
    #[builder(default)]
    pub is_locked: bool,
    #[builder(default)]
    pub completed_lessons_count: u32,
    #[builder(default)]
    pub total_lessons_count: u32,
}

impl Topic {
    /// Undecorated topic: no progress, unlocked.
    pub fn from_record(record: TopicRecord) -> Self {
        Self {
            id: record.id,
            title: record.title,
            description: record.description.unwrap_or_default(),
            lesson_number: record.lesson_number,
            duration_minutes: record.duration_minutes,
            language: record.language,
            difficulty: record.difficulty,
            sort_order: record.sort_order,
            is_completed: false,
            is_locked: false,
            completed_lessons_count: 0,
            total_lessons_count: 0,
        }
    }

    pub fn with_progress(
        self, counts: LessonCounts, progress: TopicLessonProgress,
    ) -> Self {
        let mut topic = Self {
            total_lessons_count: counts.total,
            completed_lessons_count: progress.completed_count,
            ..self
        };
        topic.is_completed = topic.is_fully_completed();
        topic
    }

    pub fn progress_percentage(&self) -> f64 {
        if self.total_lessons_count == 0 {
            return 0.0;
        }
        f64::from(self.completed_lessons_count)
            / f64::from(self.total_lessons_count)
            * 100.0
    }

    pub fn is_fully_completed(&self) -> bool {
        self.total_lessons_count > 0
            && self.completed_lessons_count >= self.total_lessons_count
    }
}
