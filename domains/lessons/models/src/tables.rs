//! Origin table names.

pub const LESSON_TOPICS: &str = "lesson_topics";
pub const LESSONS: &str = "lessons";
pub const USER_LESSON_PROGRESS: &str = "user_lesson_progress";
