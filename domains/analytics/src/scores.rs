use std::borrow::Cow;

use fnv::FnvHashSet;
use origin_source::{OriginQuery, OriginResult, OriginSource, Row, RowExt};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::{
    models::ScoreSummary,
    sources::{SessionTally, fetch_sessions},
};

pub const SESSION_FEEDBACK: &str = "session_feedback";
pub const USER_SCORE_AGGREGATES: &str = "user_score_aggregates";

const FEEDBACK_COLUMNS: [&str; 5] = [
    "pronunciation_score",
    "grammar_score",
    "fluency_score",
    "vocabulary_score",
    "overall_score",
];

const AGGREGATE_COLUMNS: [&str; 5] = [
    "avg_pronunciation",
    "avg_grammar",
    "avg_fluency",
    "avg_vocabulary",
    "avg_overall",
];

fn from_columns(values: [f64; 5]) -> ScoreSummary {
    let [pronunciation, grammar, fluency, vocabulary, overall] = values;
    ScoreSummary {
        pronunciation,
        grammar,
        fluency,
        vocabulary,
        overall,
    }
}

/// Averages each column independently over the rows where it is set.
pub fn average_feedback(rows: &[Row]) -> ScoreSummary {
    from_columns(FEEDBACK_COLUMNS.map(|column| {
        let scores: Vec<f64> =
            rows.iter().filter_map(|row| row.float(column)).collect();
        if scores.is_empty() {
            0.0
        }
        else {
            scores.iter().sum::<f64>() / scores.len() as f64
        }
    }))
}

/// Precomputed per-user averages, if a row exists for any spelling.
pub async fn fetch_precomputed(
    origin: &dyn OriginSource, user_id: Uuid, variants: &[String],
) -> OriginResult<Option<ScoreSummary>> {
    let rows = origin
        .select(
            &OriginQuery::table(USER_SCORE_AGGREGATES)
                .eq("user_id", user_id.to_string())
                .is_in("language", variants.iter().map(String::as_str))
                .limit(1),
        )
        .await?;

    Ok(rows.first().map(|row| {
        from_columns(AGGREGATE_COLUMNS.map(|column| row.float(column).unwrap_or(0.0)))
    }))
}

/// Averages raw feedback for the given session keys.
pub async fn compute_from_feedback(
    origin: &dyn OriginSource, user_id: Uuid, session_keys: &FnvHashSet<String>,
) -> OriginResult<Option<ScoreSummary>> {
    if session_keys.is_empty() {
        return Ok(None);
    }

    let feedback = origin
        .select(
            &OriginQuery::table(SESSION_FEEDBACK)
                .eq("user_id", user_id.to_string())
                .is_in("session_id", session_keys.iter().map(String::as_str)),
        )
        .await?;

    debug!(rows = feedback.len(), "feedback rows joined to sessions");
    Ok((!feedback.is_empty()).then(|| average_feedback(&feedback)))
}

/// Settles the score metric from the precomputed lookup, averaging raw
/// feedback when it has nothing. Session keys come from `sessions` when
/// that fetch succeeded and are queried again otherwise.
pub async fn scores_or_feedback(
    origin: &dyn OriginSource, user_id: Uuid, variants: &[String],
    precomputed: OriginResult<Option<ScoreSummary>>,
    sessions: Option<&SessionTally>,
) -> OriginResult<Option<ScoreSummary>> {
    match precomputed {
        Ok(Some(scores)) => return Ok(Some(scores)),
        Ok(None) => debug!("no precomputed scores, averaging feedback"),
        Err(e) => {
            warn!(error = %e, "precomputed scores unavailable, averaging feedback")
        }
    }

    let session_keys = match sessions {
        Some(tally) => Cow::Borrowed(tally.feedback_keys()),
        None => Cow::Owned(
            fetch_sessions(origin, user_id, variants)
                .await?
                .into_feedback_keys(),
        ),
    };
    compute_from_feedback(origin, user_id, &session_keys).await
}

#[cfg(test)]
mod tests {
    use serde_json::{Value, json};

    use super::*;

    fn row(value: Value) -> Row {
        match value {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    #[test]
    fn each_score_is_averaged_over_its_own_contributors() {
        let rows = vec![
            row(json!({"pronunciation_score": 80.0, "grammar_score": null, "overall_score": 70})),
            row(json!({"pronunciation_score": 60.0, "grammar_score": 90.0})),
        ];
        let scores = average_feedback(&rows);

        assert_eq!(scores.pronunciation, 70.0);
        assert_eq!(scores.grammar, 90.0);
        assert_eq!(scores.overall, 70.0);
        assert_eq!(scores.fluency, 0.0);
    }

    #[test]
    fn no_rows_average_to_zero() {
        assert_eq!(average_feedback(&[]), ScoreSummary::default());
    }
}
