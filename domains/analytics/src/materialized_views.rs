use origin_source::{OriginQuery, OriginResult, OriginSource, Row, RowExt};
use tracing::instrument;
use uuid::Uuid;

use crate::models::{
    MetricReport, MetricStatus, ProgressSummary, ScoreSummary, SummarySource,
};

/// Per `(user_id, language)` rollup of the whole aggregate.
pub const USER_PROGRESS_SUMMARY: &str = "user_progress_summary";

fn count(row: &Row, column: &str) -> u64 {
    row.int(column).map(|n| n.max(0) as u64).unwrap_or(0)
}

pub fn summary_from_row(row: &Row) -> ProgressSummary {
    let score = |column: &str| row.float(column).unwrap_or(0.0);

    ProgressSummary {
        session_count: count(row, "total_sessions"),
        total_time_seconds: row.int("total_time_seconds").unwrap_or(0).max(0),
        scores: ScoreSummary {
            pronunciation: score("avg_pronunciation"),
            grammar: score("avg_grammar"),
            fluency: score("avg_fluency"),
            vocabulary: score("avg_vocabulary"),
            overall: score("avg_overall"),
        },
        vocabulary_count: count(row, "vocabulary_count"),
        lessons_completed: count(row, "lessons_completed"),
        source: SummarySource::MaterializedView,
        metrics: MetricReport::all(MetricStatus::Loaded),
    }
}

/// The precomputed summary for any spelling of the language.
#[instrument(skip(origin, variants))]
pub async fn fetch_summary(
    origin: &dyn OriginSource, user_id: Uuid, variants: &[String],
) -> OriginResult<Option<ProgressSummary>> {
    let rows = origin
        .select(
            &OriginQuery::table(USER_PROGRESS_SUMMARY)
                .eq("user_id", user_id.to_string())
                .is_in("language", variants.iter().map(String::as_str))
                .limit(1),
        )
        .await?;

    Ok(rows.first().map(summary_from_row))
}
