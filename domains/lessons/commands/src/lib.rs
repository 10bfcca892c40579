pub mod complete_lesson;
pub mod lesson;
pub mod topic;

pub use complete_lesson::*;
pub use lesson::*;
pub use topic::*;

use origin_source::Row;
use serde_json::Value;

/// Inserts `value` under `column` when present.
pub(crate) fn set_if(row: &mut Row, column: &str, value: Option<impl Into<Value>>) {
    if let Some(value) = value {
        row.insert(column.to_string(), value.into());
    }
}

pub(crate) fn require_text(field: &str, value: &str) -> lesson_errors::LessonResult<()> {
    if value.trim().is_empty() {
        return Err(lesson_errors::LessonError::invalid(format!(
            "{field} must not be empty"
        )));
    }
    Ok(())
}
