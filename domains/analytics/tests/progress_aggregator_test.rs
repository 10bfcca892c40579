use std::sync::Arc;

use progress_analytics::{
    AggregationConfig, AnalyticsError, MetricStatus, ProgressAggregator,
    ScoreSummary, SummarySource, TimeAccounting,
};
use serde_json::json;
use test_utils::{
    FailingIdentity, MemoryOrigin, StaticIdentity, conversation_session_row,
    feedback_row, practice_session_row, progress_row, row,
    score_aggregate_row, topic_row, vocabulary_row, with,
};
use uuid::Uuid;

struct Fixture {
    origin: MemoryOrigin,
    user_id: Uuid,
}

impl Fixture {
    fn aggregator(&self, config: AggregationConfig) -> ProgressAggregator {
        ProgressAggregator::new(
            Arc::new(self.origin.clone()),
            StaticIdentity::signed_in(self.user_id).shared(),
            config,
        )
    }
}

/// One Spanish session stored under two spellings, plus one legacy
/// practice session without a session id.
fn setup_sessions() -> Fixture {
    test_utils::init_tracing();
    let origin = MemoryOrigin::new();
    let user_id = Uuid::now_v7();

    origin.seed("conversation_sessions", [
        conversation_session_row("c1", Some("s1"), user_id, "Spanish", Some(300)),
        conversation_session_row("c2", Some("s1"), user_id, "es", Some(300)),
        conversation_session_row("c3", Some("s9"), user_id, "French", Some(999)),
    ]);
    origin.seed("practice_sessions", [practice_session_row(
        "p1", None, user_id, "spanish", Some(120),
    )]);

    Fixture { origin, user_id }
}

#[tokio::test]
async fn test_sessions_are_counted_once_across_spellings() -> anyhow::Result<()> {
    let fixture = setup_sessions();
    let summary = fixture
        .aggregator(AggregationConfig::default())
        .aggregate(fixture.user_id, "Spanish")
        .await?;

    assert_eq!(summary.session_count, 2);
    assert_eq!(summary.source, SummarySource::Computed);
    assert_eq!(summary.metrics.sessions, MetricStatus::Loaded);
    Ok(())
}

#[tokio::test]
async fn test_row_accounting_double_counts_duplicate_time() -> anyhow::Result<()> {
    let fixture = setup_sessions();

    let per_row = fixture
        .aggregator(AggregationConfig::default())
        .aggregate(fixture.user_id, "es")
        .await?;
    let per_session = fixture
        .aggregator(AggregationConfig {
            time_accounting: TimeAccounting::PerSession,
            ..AggregationConfig::default()
        })
        .aggregate(fixture.user_id, "es")
        .await?;

    assert_eq!(per_row.total_time_seconds, 720);
    assert_eq!(per_session.total_time_seconds, 420);
    assert_eq!(per_row.session_count, per_session.session_count);
    Ok(())
}

#[tokio::test]
async fn test_score_failure_leaves_other_metrics_intact() -> anyhow::Result<()> {
    let fixture = setup_sessions();
    fixture.origin.fail_table("user_score_aggregates");
    fixture.origin.fail_table("session_feedback");

    let summary = fixture
        .aggregator(AggregationConfig::default())
        .aggregate(fixture.user_id, "spanish")
        .await?;

    assert_eq!(summary.session_count, 2);
    assert_eq!(summary.total_time_seconds, 720);
    assert_eq!(summary.scores, ScoreSummary::default());
    assert!(summary.metrics.scores.is_failed());
    assert_eq!(summary.metrics.failed(), vec!["scores"]);
    Ok(())
}

#[tokio::test]
async fn test_precomputed_scores_take_precedence() -> anyhow::Result<()> {
    let fixture = setup_sessions();
    fixture.origin.seed("user_score_aggregates", [score_aggregate_row(
        fixture.user_id,
        "es",
        88.0,
    )]);
    fixture
        .origin
        .seed("session_feedback", [feedback_row("s1", fixture.user_id, 10.0)]);

    let summary = fixture
        .aggregator(AggregationConfig::default())
        .aggregate(fixture.user_id, "Spanish")
        .await?;

    assert_eq!(summary.scores.overall, 88.0);
    assert_eq!(fixture.origin.select_count("session_feedback"), 0);
    Ok(())
}

#[tokio::test]
async fn test_feedback_is_averaged_for_sessions_in_the_language() -> anyhow::Result<()> {
    let fixture = setup_sessions();
    fixture.origin.seed("session_feedback", [
        feedback_row("s1", fixture.user_id, 80.0),
        with(feedback_row("p1", fixture.user_id, 60.0), "grammar_score", json!(null)),
        // French session, excluded by the join.
        feedback_row("s9", fixture.user_id, 5.0),
    ]);

    let summary = fixture
        .aggregator(AggregationConfig::default())
        .aggregate(fixture.user_id, "Spanish")
        .await?;

    assert_eq!(summary.scores.overall, 70.0);
    assert_eq!(summary.scores.grammar, 80.0);
    assert_eq!(summary.metrics.scores, MetricStatus::Loaded);
    Ok(())
}

#[tokio::test]
async fn test_feedback_reuses_the_session_rows() -> anyhow::Result<()> {
    let fixture = setup_sessions();
    fixture.origin.seed("session_feedback", [feedback_row(
        "s1",
        fixture.user_id,
        75.0,
    )]);

    let summary = fixture
        .aggregator(AggregationConfig::default())
        .aggregate(fixture.user_id, "Spanish")
        .await?;

    assert_eq!(summary.scores.overall, 75.0);
    // One select per spelling for sessions and one for time.
    assert_eq!(fixture.origin.select_count("conversation_sessions"), 6);
    assert_eq!(fixture.origin.select_count("session_feedback"), 1);
    Ok(())
}

#[tokio::test]
async fn test_session_failure_leaves_time_intact() -> anyhow::Result<()> {
    let fixture = setup_sessions();
    // The session count fetch is polled first and takes all three spellings.
    fixture.origin.fail_next("conversation_sessions", 3);

    let summary = fixture
        .aggregator(AggregationConfig::default())
        .aggregate(fixture.user_id, "Spanish")
        .await?;

    assert_eq!(summary.session_count, 0);
    assert!(summary.metrics.sessions.is_failed());
    assert_eq!(summary.total_time_seconds, 720);
    assert_eq!(summary.metrics.time, MetricStatus::Loaded);
    assert_eq!(summary.metrics.failed(), vec!["sessions"]);
    Ok(())
}

#[tokio::test]
async fn test_vocabulary_and_lessons_are_counted() -> anyhow::Result<()> {
    let fixture = setup_sessions();
    let user_id = fixture.user_id;
    let topic_id = Uuid::now_v7();
    let other_topic = Uuid::now_v7();

    fixture.origin.seed("user_vocabulary", [
        vocabulary_row(user_id, "Spanish", "hola"),
        vocabulary_row(user_id, "es", "adiós"),
        vocabulary_row(user_id, "French", "bonjour"),
    ]);
    fixture.origin.seed("lesson_topics", [
        topic_row(topic_id, "Greetings", "spanish", 1),
        topic_row(other_topic, "Salut", "french", 1),
    ]);
    let lesson = Uuid::now_v7();
    fixture.origin.seed("user_lesson_progress", [
        progress_row(user_id, lesson, topic_id, true),
        progress_row(user_id, lesson, topic_id, true),
        progress_row(user_id, Uuid::now_v7(), topic_id, false),
        progress_row(user_id, Uuid::now_v7(), other_topic, true),
    ]);

    let summary = fixture
        .aggregator(AggregationConfig::default())
        .aggregate(user_id, "spanish")
        .await?;

    assert_eq!(summary.vocabulary_count, 2);
    assert_eq!(summary.lessons_completed, 1);
    Ok(())
}

#[tokio::test]
async fn test_materialized_summary_short_circuits() -> anyhow::Result<()> {
    let fixture = setup_sessions();
    fixture.origin.seed("user_progress_summary", [row(json!({
        "user_id": fixture.user_id.to_string(),
        "language": "spanish",
        "total_sessions": 42,
        "total_time_seconds": 3600,
        "avg_overall": 75.5,
        "vocabulary_count": 10,
        "lessons_completed": 7,
    }))]);

    let summary = fixture
        .aggregator(AggregationConfig::default())
        .aggregate(fixture.user_id, "Spanish")
        .await?;

    assert_eq!(summary.source, SummarySource::MaterializedView);
    assert_eq!(summary.session_count, 42);
    assert_eq!(summary.scores.overall, 75.5);
    assert_eq!(fixture.origin.select_count("conversation_sessions"), 0);
    Ok(())
}

#[tokio::test]
async fn test_failing_materialized_summary_falls_back() -> anyhow::Result<()> {
    let fixture = setup_sessions();
    fixture.origin.fail_table("user_progress_summary");

    let summary = fixture
        .aggregator(AggregationConfig::default())
        .aggregate(fixture.user_id, "Spanish")
        .await?;

    assert_eq!(summary.source, SummarySource::Computed);
    assert_eq!(summary.session_count, 2);
    Ok(())
}

#[tokio::test]
async fn test_empty_sources_are_missing_not_failed() -> anyhow::Result<()> {
    test_utils::init_tracing();
    let fixture = Fixture {
        origin: MemoryOrigin::new(),
        user_id: Uuid::now_v7(),
    };

    let summary = fixture
        .aggregator(AggregationConfig::default())
        .aggregate(fixture.user_id, "Spanish")
        .await?;

    assert_eq!(summary.session_count, 0);
    assert_eq!(summary.metrics.sessions, MetricStatus::Missing);
    assert_eq!(summary.metrics.scores, MetricStatus::Missing);
    assert!(summary.metrics.failed().is_empty());
    Ok(())
}

#[tokio::test]
async fn test_every_source_down_is_an_error() {
    let fixture = setup_sessions();
    for table in [
        "conversation_sessions",
        "user_score_aggregates",
        "user_vocabulary",
        "lesson_topics",
    ] {
        fixture.origin.fail_table(table);
    }

    let result = fixture
        .aggregator(AggregationConfig::default())
        .aggregate(fixture.user_id, "Spanish")
        .await;

    assert!(matches!(result, Err(AnalyticsError::Unreachable(_))));
}

#[tokio::test]
async fn test_current_user_summary_branches_on_identity() -> anyhow::Result<()> {
    let fixture = setup_sessions();

    let anonymous = ProgressAggregator::new(
        Arc::new(fixture.origin.clone()),
        StaticIdentity::anonymous().shared(),
        AggregationConfig::default(),
    );
    assert_eq!(
        anonymous.summary_for_current_user("Spanish").await?,
        progress_analytics::ProgressSummary::empty()
    );

    let signed_in = fixture.aggregator(AggregationConfig::default());
    assert_eq!(
        signed_in.summary_for_current_user("Spanish").await?.session_count,
        2
    );

    let broken = ProgressAggregator::new(
        Arc::new(fixture.origin.clone()),
        Arc::new(FailingIdentity),
        AggregationConfig::default(),
    );
    assert!(matches!(
        broken.summary_for_current_user("Spanish").await,
        Err(AnalyticsError::Identity(_))
    ));
    Ok(())
}
