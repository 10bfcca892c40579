pub mod language;
pub mod lesson;
pub mod progress;
pub mod tables;
pub mod topic;
pub mod unlock;

pub use language::LanguageTag;
pub use lesson::Lesson;
pub use progress::{LessonCounts, LessonProgressRecord, TopicLessonProgress};
pub use topic::{Topic, TopicRecord};
pub use unlock::{TopicWithCounts, apply_progression, compute_locks, sort_for_progression};
