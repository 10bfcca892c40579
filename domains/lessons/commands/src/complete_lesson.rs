use chrono::{DateTime, Utc};
use origin_source::Row;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Columns that identify one progress row.
pub const PROGRESS_CONFLICT_COLUMNS: [&str; 2] = ["user_id", "lesson_id"];

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CompleteLessonCommand {
    pub user_id: Uuid,
    pub lesson_id: Uuid,
    pub topic_id: Uuid,
}

impl CompleteLessonCommand {
    pub fn progress_row(&self, completed_at: DateTime<Utc>) -> Row {
        let mut row = Row::new();
        row.insert("user_id".into(), Value::String(self.user_id.to_string()));
        row.insert("lesson_id".into(), Value::String(self.lesson_id.to_string()));
        row.insert("topic_id".into(), Value::String(self.topic_id.to_string()));
        row.insert("is_completed".into(), Value::Bool(true));
        row.insert(
            "completed_at".into(),
            Value::String(completed_at.to_rfc3339()),
        );
        row
    }
}
