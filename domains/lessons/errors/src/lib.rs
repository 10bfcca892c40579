use origin_source::{IdentityError, OriginError};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum LessonError {
    #[error("Origin error: {0}")]
    Origin(#[from] OriginError),
    #[error("Identity error: {0}")]
    Identity(#[from] IdentityError),
    #[error("Topic not found: {topic_id}")]
    TopicNotFound { topic_id: Uuid },
    #[error("Lesson not found: {lesson_id}")]
    LessonNotFound { lesson_id: Uuid },
    #[error("Invalid command: {0}")]
    Invalid(String),
}

impl LessonError {
    pub fn invalid(reason: impl Into<String>) -> Self { Self::Invalid(reason.into()) }
}

pub type LessonResult<T> = Result<T, LessonError>;
