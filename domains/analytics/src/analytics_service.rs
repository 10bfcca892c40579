use lesson_models::LanguageTag;
use origin_source::{OriginError, SharedIdentity, SharedOrigin};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::{
    config::AggregationConfig,
    error::AnalyticsError,
    materialized_views,
    models::{MetricReport, MetricStatus, ProgressSummary, SummarySource},
    scores, sources,
};

/// Turns a sub-fetch result into its value and status. Failures are
/// logged and replaced by `default`.
fn settle<T>(
    metric: &'static str, result: Result<Option<T>, &OriginError>, default: T,
) -> (T, MetricStatus) {
    match result {
        Ok(Some(value)) => (value, MetricStatus::Loaded),
        Ok(None) => (default, MetricStatus::Missing),
        Err(e) => {
            warn!(metric, error = %e, "metric fetch failed, using zero default");
            (default, MetricStatus::Failed(e.to_string()))
        }
    }
}

/// Best-effort progress dashboard over the legacy session tables.
///
/// A materialized rollup is tried first. On a miss the metrics are
/// computed from the raw tables, each sub-fetch concurrently and each
/// failing on its own into a zero default.
#[derive(Clone)]
pub struct ProgressAggregator {
    origin: SharedOrigin,
    identity: SharedIdentity,
    config: AggregationConfig,
}

impl ProgressAggregator {
    pub fn new(
        origin: SharedOrigin, identity: SharedIdentity, config: AggregationConfig,
    ) -> Self {
        Self {
            origin,
            identity,
            config,
        }
    }

    /// Summary for the signed-in user; an empty summary without one.
    #[instrument(skip(self))]
    pub async fn summary_for_current_user(
        &self, language: &str,
    ) -> Result<ProgressSummary, AnalyticsError> {
        match self.identity.current_user().await? {
            Some(user_id) => self.aggregate(user_id, language).await,
            None => {
                debug!("no signed-in user, returning empty summary");
                Ok(ProgressSummary::empty())
            }
        }
    }

    /// Fails only when every metric source is unreachable.
    #[instrument(skip(self))]
    pub async fn aggregate(
        &self, user_id: Uuid, language: &str,
    ) -> Result<ProgressSummary, AnalyticsError> {
        let variants = LanguageTag::parse(language).variants();

        if self.config.use_materialized_view {
            match materialized_views::fetch_summary(
                self.origin.as_ref(),
                user_id,
                &variants,
            )
            .await
            {
                Ok(Some(summary)) => {
                    debug!("served from materialized summary");
                    return Ok(summary);
                }
                Ok(None) => debug!("no materialized summary, computing"),
                Err(e) => {
                    warn!(error = %e, "materialized summary unavailable, computing")
                }
            }
        }

        self.compute(user_id, &variants).await
    }

    async fn compute(
        &self, user_id: Uuid, variants: &[String],
    ) -> Result<ProgressSummary, AnalyticsError> {
        let origin = self.origin.as_ref();
        let (sessions, time, precomputed, vocabulary, lessons) = tokio::join!(
            sources::fetch_sessions(origin, user_id, variants),
            sources::fetch_session_time(origin, user_id, variants),
            scores::fetch_precomputed(origin, user_id, variants),
            sources::count_vocabulary(origin, user_id, variants),
            sources::count_completed_lessons(origin, user_id, variants),
        );
        let scores = scores::scores_or_feedback(
            origin,
            user_id,
            variants,
            precomputed,
            sessions.as_ref().ok(),
        )
        .await;

        if let (Err(e), Err(_), Err(_), Err(_), Err(_)) =
            (&sessions, &time, &scores, &vocabulary, &lessons)
        {
            return Err(AnalyticsError::Unreachable(e.to_string()));
        }

        let (session_count, session_status) = settle(
            "sessions",
            sessions
                .as_ref()
                .map(|t| (!t.is_empty()).then(|| t.session_count())),
            0,
        );
        let (total_time_seconds, time_status) = settle(
            "time",
            time.as_ref().map(|t| {
                (!t.is_empty())
                    .then(|| t.total_time_seconds(self.config.time_accounting))
            }),
            0,
        );
        let (scores, score_status) =
            settle("scores", scores.as_ref().map(|s| *s), Default::default());
        let (vocabulary_count, vocabulary_status) =
            settle("vocabulary", vocabulary.as_ref().map(|v| *v), 0);
        let (lessons_completed, lesson_status) =
            settle("lessons", lessons.as_ref().map(|l| *l), 0);

        let summary = ProgressSummary {
            session_count,
            total_time_seconds,
            scores,
            vocabulary_count,
            lessons_completed,
            source: SummarySource::Computed,
            metrics: MetricReport {
                sessions: session_status,
                time: time_status,
                scores: score_status,
                vocabulary: vocabulary_status,
                lessons: lesson_status,
            },
        };

        info!(
            sessions = summary.session_count,
            time_seconds = summary.total_time_seconds,
            failed = ?summary.metrics.failed(),
            "progress computed"
        );
        Ok(summary)
    }
}
