use serde::Deserialize;
use uuid::Uuid;

#[derive(Debug, Clone, Deserialize)]
pub struct GetTopicsQuery {
    pub difficulty: Option<String>,
    pub language: String,
    #[serde(default)]
    pub force_refresh: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GetTopicQuery {
    pub topic_id: Uuid,
    #[serde(default)]
    pub force_refresh: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GetLessonsQuery {
    pub topic_id: Uuid,
    #[serde(default = "published_only_default")]
    pub published_only: bool,
    #[serde(default)]
    pub force_refresh: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GetLessonQuery {
    pub lesson_id: Uuid,
    #[serde(default)]
    pub force_refresh: bool,
}

fn published_only_default() -> bool { true }
