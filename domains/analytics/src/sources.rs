//! Per-table fetches behind the aggregate.
//!
//! Legacy rows spell languages inconsistently, so every table is queried
//! once per spelling and the results are unioned. Rows are merged by
//! session identity: the explicit `session_id` when present, otherwise the
//! row's own `id`.

use fnv::{FnvHashMap, FnvHashSet};
use futures::future::join_all;
use lesson_models::tables::{LESSON_TOPICS, USER_LESSON_PROGRESS};
use origin_source::{
    OriginQuery, OriginResult, OriginSource, Row, RowExt,
};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::config::TimeAccounting;

pub const CONVERSATION_SESSIONS: &str = "conversation_sessions";
pub const PRACTICE_SESSIONS: &str = "practice_sessions";
pub const USER_VOCABULARY: &str = "user_vocabulary";

/// A session table and the column its duration lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionSource {
    pub table: &'static str,
    pub duration_column: &'static str,
}

pub static SESSION_SOURCES: [SessionSource; 2] = [
    SessionSource {
        table: CONVERSATION_SESSIONS,
        duration_column: "duration_seconds",
    },
    SessionSource {
        table: PRACTICE_SESSIONS,
        duration_column: "total_time_seconds",
    },
];

/// Runs one query per language spelling concurrently and unions the rows.
/// Any failing spelling fails the whole fetch. An empty `columns` selects
/// every column.
pub async fn select_variants(
    origin: &dyn OriginSource, table: &str, user_id: Uuid, variants: &[String],
    columns: &[&str],
) -> OriginResult<Vec<Row>> {
    let queries: Vec<OriginQuery> = variants
        .iter()
        .map(|variant| {
            let query = OriginQuery::table(table)
                .eq("user_id", user_id.to_string())
                .eq("language", variant.as_str());
            if columns.is_empty() {
                query
            }
            else {
                query.columns(columns.iter().copied())
            }
        })
        .collect();

    let results = join_all(queries.iter().map(|q| origin.select(q))).await;

    let mut rows = Vec::new();
    for result in results {
        rows.extend(result?);
    }
    Ok(rows)
}

pub fn session_identity(row: &Row) -> Option<String> {
    row.text("session_id")
        .filter(|id| !id.is_empty())
        .or_else(|| row.text("id"))
}

/// Session rows folded by identity.
#[derive(Debug, Clone, Default)]
pub struct SessionTally {
    identities: FnvHashSet<String>,
    feedback_keys: FnvHashSet<String>,
    first_durations: FnvHashMap<String, i64>,
    row_duration_total: i64,
    duplicate_rows_with_time: usize,
}

impl SessionTally {
    pub fn add(&mut self, row: &Row, duration_column: &str) {
        // Feedback may reference either the row id or the session id.
        self.feedback_keys.extend(row.text("id"));
        self.feedback_keys
            .extend(row.text("session_id").filter(|id| !id.is_empty()));

        let Some(identity) = session_identity(row) else {
            debug!("session row without identity skipped");
            return;
        };

        let duration = row.int(duration_column).unwrap_or(0).max(0);
        self.row_duration_total += duration;

        if self.identities.insert(identity.clone()) {
            self.first_durations.insert(identity, duration);
        }
        else if duration > 0 {
            self.duplicate_rows_with_time += 1;
        }
    }

    pub fn session_count(&self) -> u64 { self.identities.len() as u64 }

    pub fn is_empty(&self) -> bool { self.identities.is_empty() }

    /// Row ids and session ids seen, for joining feedback rows.
    pub fn feedback_keys(&self) -> &FnvHashSet<String> { &self.feedback_keys }

    pub fn into_feedback_keys(self) -> FnvHashSet<String> { self.feedback_keys }

    pub fn total_time_seconds(&self, accounting: TimeAccounting) -> i64 {
        match accounting {
            TimeAccounting::PerSourceRow => {
                if self.duplicate_rows_with_time > 0 {
                    warn!(
                        duplicate_rows = self.duplicate_rows_with_time,
                        "sessions visible under several language spellings \
                         contribute their duration more than once"
                    );
                }
                self.row_duration_total
            }
            TimeAccounting::PerSession => self.first_durations.values().sum(),
        }
    }
}

/// Session identities from every session table under every spelling.
pub async fn fetch_sessions(
    origin: &dyn OriginSource, user_id: Uuid, variants: &[String],
) -> OriginResult<SessionTally> {
    tally_sessions(origin, user_id, variants, false).await
}

/// Session identities with their durations. Fetched separately from
/// [`fetch_sessions`] so the time metric fails on its own.
pub async fn fetch_session_time(
    origin: &dyn OriginSource, user_id: Uuid, variants: &[String],
) -> OriginResult<SessionTally> {
    tally_sessions(origin, user_id, variants, true).await
}

async fn tally_sessions(
    origin: &dyn OriginSource, user_id: Uuid, variants: &[String],
    with_duration: bool,
) -> OriginResult<SessionTally> {
    let fetches = SESSION_SOURCES.iter().map(|source| async move {
        let mut columns = vec!["id", "session_id"];
        if with_duration {
            columns.push(source.duration_column);
        }
        select_variants(origin, source.table, user_id, variants, &columns)
            .await
            .map(|rows| (source, rows))
    });

    let mut tally = SessionTally::default();
    for result in join_all(fetches).await {
        let (source, rows) = result?;
        for row in &rows {
            tally.add(row, source.duration_column);
        }
    }
    Ok(tally)
}

/// Distinct vocabulary entries; `None` when the user has none.
pub async fn count_vocabulary(
    origin: &dyn OriginSource, user_id: Uuid, variants: &[String],
) -> OriginResult<Option<u64>> {
    let rows = select_variants(origin, USER_VOCABULARY, user_id, variants, &[]).await?;

    let words: FnvHashSet<String> = rows
        .iter()
        .filter_map(|row| {
            row.text("id")
                .or_else(|| row.text("word").map(|w| w.to_lowercase()))
        })
        .collect();

    Ok((!words.is_empty()).then_some(words.len() as u64))
}

/// Distinct completed lessons under topics of the language; `None` when
/// there are none.
pub async fn count_completed_lessons(
    origin: &dyn OriginSource, user_id: Uuid, variants: &[String],
) -> OriginResult<Option<u64>> {
    let topics = origin
        .select(
            &OriginQuery::table(LESSON_TOPICS)
                .columns(["id"])
                .is_in("language", variants.iter().map(String::as_str)),
        )
        .await?;

    let topic_ids: Vec<String> =
        topics.iter().filter_map(|row| row.text("id")).collect();
    if topic_ids.is_empty() {
        return Ok(None);
    }

    let progress = origin
        .select(
            &OriginQuery::table(USER_LESSON_PROGRESS)
                .eq("user_id", user_id.to_string())
                .eq("is_completed", true)
                .is_in("topic_id", topic_ids),
        )
        .await?;

    let lessons: FnvHashSet<String> = progress
        .iter()
        .filter_map(|row| row.text("lesson_id"))
        .collect();

    Ok((!lessons.is_empty()).then_some(lessons.len() as u64))
}
