use anyhow::Result;
use chrono::Utc;
use origin_source::{OriginSource, Row};
use serde_json::{Value, json};
use uuid::Uuid;

/// Unwraps a `json!` object literal into a [`Row`].
pub fn row(value: Value) -> Row {
    match value {
        Value::Object(map) => map,
        other => panic!("fixture row must be a JSON object, got {other}"),
    }
}

/// Returns `row` with `column` set to `value`.
pub fn with(mut row: Row, column: &str, value: impl Into<Value>) -> Row {
    row.insert(column.to_string(), value.into());
    row
}

pub fn topic_row(id: Uuid, title: &str, language: &str, sort_order: i64) -> Row {
    row(json!({
        "id": id.to_string(),
        "title": title,
        "description": format!("{title} description"),
        "lesson_number": null,
        "duration_minutes": 15,
        "language": language,
        "difficulty": "beginner",
        "sort_order": sort_order,
        "is_published": true,
    }))
}

pub fn lesson_row(id: Uuid, topic_id: Uuid, sort_order: i64) -> Row {
    row(json!({
        "id": id.to_string(),
        "topic_id": topic_id.to_string(),
        "title": format!("Lesson {sort_order}"),
        "content": "Hola",
        "lesson_number": sort_order,
        "sort_order": sort_order,
        "is_published": true,
    }))
}

pub fn progress_row(
    user_id: Uuid, lesson_id: Uuid, topic_id: Uuid, is_completed: bool,
) -> Row {
    row(json!({
        "id": Uuid::now_v7().to_string(),
        "user_id": user_id.to_string(),
        "lesson_id": lesson_id.to_string(),
        "topic_id": topic_id.to_string(),
        "is_completed": is_completed,
        "completed_at": is_completed.then(|| Utc::now().to_rfc3339()),
    }))
}

pub fn conversation_session_row(
    id: &str, session_id: Option<&str>, user_id: Uuid, language: &str,
    duration_seconds: Option<i64>,
) -> Row {
    row(json!({
        "id": id,
        "session_id": session_id,
        "user_id": user_id.to_string(),
        "language": language,
        "duration_seconds": duration_seconds,
    }))
}

pub fn practice_session_row(
    id: &str, session_id: Option<&str>, user_id: Uuid, language: &str,
    total_time_seconds: Option<i64>,
) -> Row {
    row(json!({
        "id": id,
        "session_id": session_id,
        "user_id": user_id.to_string(),
        "language": language,
        "total_time_seconds": total_time_seconds,
    }))
}

/// Feedback row with every score set to `score`; override single columns
/// with [`with`].
pub fn feedback_row(session_id: &str, user_id: Uuid, score: f64) -> Row {
    row(json!({
        "id": Uuid::now_v7().to_string(),
        "session_id": session_id,
        "user_id": user_id.to_string(),
        "pronunciation_score": score,
        "grammar_score": score,
        "fluency_score": score,
        "vocabulary_score": score,
        "overall_score": score,
    }))
}

pub fn score_aggregate_row(user_id: Uuid, language: &str, score: f64) -> Row {
    row(json!({
        "user_id": user_id.to_string(),
        "language": language,
        "avg_pronunciation": score,
        "avg_grammar": score,
        "avg_fluency": score,
        "avg_vocabulary": score,
        "avg_overall": score,
    }))
}

pub fn vocabulary_row(user_id: Uuid, language: &str, word: &str) -> Row {
    row(json!({
        "id": Uuid::now_v7().to_string(),
        "user_id": user_id.to_string(),
        "language": language,
        "word": word,
    }))
}

/// Create a published topic and return its id
pub async fn create_test_topic(
    origin: &impl OriginSource, title: &str, language: &str, sort_order: i64,
) -> Result<Uuid> {
    let topic_id = Uuid::now_v7();
    origin
        .insert(
            "lesson_topics",
            topic_row(topic_id, title, language, sort_order),
        )
        .await?;
    Ok(topic_id)
}

/// Create `count` published lessons under `topic_id` and return their ids
pub async fn create_test_lessons(
    origin: &impl OriginSource, topic_id: Uuid, count: usize,
) -> Result<Vec<Uuid>> {
    let mut ids = Vec::with_capacity(count);
    for position in 0..count {
        let lesson_id = Uuid::now_v7();
        origin
            .insert(
                "lessons",
                lesson_row(lesson_id, topic_id, position as i64 + 1),
            )
            .await?;
        ids.push(lesson_id);
    }
    Ok(ids)
}

/// Mark the given lessons completed for `user_id`
pub async fn complete_test_lessons(
    origin: &impl OriginSource, user_id: Uuid, topic_id: Uuid,
    lesson_ids: &[Uuid],
) -> Result<()> {
    for lesson_id in lesson_ids {
        origin
            .upsert(
                "user_lesson_progress",
                progress_row(user_id, *lesson_id, topic_id, true),
                &["user_id", "lesson_id"],
            )
            .await?;
    }
    Ok(())
}
