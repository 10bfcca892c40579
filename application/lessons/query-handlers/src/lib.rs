pub mod lesson_counts;
pub mod lessons;
pub mod services;
pub mod topic_progress;
pub mod topics;

pub use lesson_counts::LessonCountsRepository;
pub use lessons::{LessonQueryHandler, LessonsQueryHandler};
pub use services::ContentServices;
pub use topic_progress::TopicProgressRepository;
pub use topics::{TopicQueryHandler, TopicsQueryHandler};
