use lesson_errors::{LessonError, LessonResult};
use origin_source::Row;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use uuid::Uuid;

use crate::{require_text, set_if};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateLessonCommand {
    pub topic_id: Uuid,
    pub title: String,
    pub content: Option<String>,
    pub lesson_number: Option<i32>,
    #[serde(default)]
    pub sort_order: i32,
    #[serde(default)]
    pub is_published: bool,
}

impl CreateLessonCommand {
    pub fn into_row(self, lesson_id: Uuid) -> LessonResult<Row> {
        require_text("title", &self.title)?;

        match json!({
            "id": lesson_id,
            "topic_id": self.topic_id,
            "title": self.title,
            "content": self.content,
            "lesson_number": self.lesson_number,
            "sort_order": self.sort_order,
            "is_published": self.is_published,
        }) {
            Value::Object(row) => Ok(row),
            _ => Err(LessonError::invalid("lesson row is not an object")),
        }
    }
}

/// Partial lesson update. Setting `topic_id` moves the lesson.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateLessonCommand {
    pub lesson_id: Uuid,
    pub topic_id: Option<Uuid>,
    pub title: Option<String>,
    pub content: Option<String>,
    pub lesson_number: Option<i32>,
    pub sort_order: Option<i32>,
    pub is_published: Option<bool>,
}

impl UpdateLessonCommand {
    pub fn patch(&self) -> LessonResult<Row> {
        if let Some(title) = &self.title {
            require_text("title", title)?;
        }

        let mut row = Row::new();
        set_if(&mut row, "topic_id", self.topic_id.map(|id| id.to_string()));
        set_if(&mut row, "title", self.title.clone());
        set_if(&mut row, "content", self.content.clone());
        set_if(&mut row, "lesson_number", self.lesson_number);
        set_if(&mut row, "sort_order", self.sort_order);
        set_if(&mut row, "is_published", self.is_published);

        if row.is_empty() {
            return Err(LessonError::invalid("update changes no fields"));
        }
        Ok(row)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DeleteLessonCommand {
    pub lesson_id: Uuid,
}
