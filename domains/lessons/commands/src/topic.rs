use lesson_errors::{LessonError, LessonResult};
use origin_source::Row;
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use crate::{require_text, set_if};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTopicCommand {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub language: String,
    pub difficulty: Option<String>,
    pub lesson_number: Option<i32>,
    pub duration_minutes: Option<i32>,
    #[serde(default)]
    pub sort_order: i32,
    #[serde(default)]
    pub is_published: bool,
}

impl CreateTopicCommand {
    pub fn into_row(self, topic_id: Uuid) -> LessonResult<Row> {
        require_text("title", &self.title)?;
        require_text("language", &self.language)?;

        let value = json!({
            "id": topic_id,
            "title": self.title,
            "description": self.description,
            "language": self.language.trim().to_lowercase(),
            "difficulty": self.difficulty,
            "lesson_number": self.lesson_number,
            "duration_minutes": self.duration_minutes,
            "sort_order": self.sort_order,
            "is_published": self.is_published,
        });
        match value {
            serde_json::Value::Object(row) => Ok(row),
            _ => Err(LessonError::invalid("topic row is not an object")),
        }
    }
}

/// Partial topic update; `None` fields are left untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateTopicCommand {
    pub topic_id: Uuid,
    pub title: Option<String>,
    pub description: Option<String>,
    pub difficulty: Option<String>,
    pub lesson_number: Option<i32>,
    pub duration_minutes: Option<i32>,
    pub sort_order: Option<i32>,
    pub is_published: Option<bool>,
}

impl UpdateTopicCommand {
    pub fn patch(&self) -> LessonResult<Row> {
        if let Some(title) = &self.title {
            require_text("title", title)?;
        }

        let mut row = Row::new();
        set_if(&mut row, "title", self.title.clone());
        set_if(&mut row, "description", self.description.clone());
        set_if(&mut row, "difficulty", self.difficulty.clone());
        set_if(&mut row, "lesson_number", self.lesson_number);
        set_if(&mut row, "duration_minutes", self.duration_minutes);
        set_if(&mut row, "sort_order", self.sort_order);
        set_if(&mut row, "is_published", self.is_published);

        if row.is_empty() {
            return Err(LessonError::invalid("update changes no fields"));
        }
        Ok(row)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DeleteTopicCommand {
    pub topic_id: Uuid,
}
