use origin_source::{OriginQuery, OriginSource, RetryConfig, RetryingOrigin};
use serde_json::json;
use test_utils::{MemoryOrigin, row};

fn setup_origin(config: RetryConfig) -> (MemoryOrigin, RetryingOrigin<MemoryOrigin>) {
    test_utils::init_tracing();
    let origin = MemoryOrigin::new();
    origin.seed("lessons", [row(json!({"id": "l1", "topic_id": "t1"}))]);
    (origin.clone(), RetryingOrigin::new(origin, config))
}

fn fast_retries(max_attempts: u32) -> RetryConfig {
    RetryConfig {
        max_attempts,
        initial_backoff_ms: 1,
        max_backoff_ms: 5,
    }
}

#[tokio::test]
async fn test_transient_failures_are_retried() -> anyhow::Result<()> {
    let (origin, retrying) = setup_origin(fast_retries(3));
    origin.fail_next("lessons", 2);

    let rows = retrying.select(&OriginQuery::table("lessons")).await?;

    assert_eq!(rows.len(), 1);
    assert_eq!(origin.select_count("lessons"), 3);
    Ok(())
}

#[tokio::test]
async fn test_retries_stop_at_max_attempts() {
    let (origin, retrying) = setup_origin(fast_retries(2));
    origin.fail_table("lessons");

    let result = retrying.select(&OriginQuery::table("lessons")).await;

    assert!(result.is_err());
    assert_eq!(origin.select_count("lessons"), 2);
}

#[tokio::test]
async fn test_permanent_failures_pass_through() {
    let (origin, retrying) = setup_origin(fast_retries(5));
    origin.reject_table("lessons");

    let err = retrying
        .select(&OriginQuery::table("lessons"))
        .await
        .unwrap_err();

    assert!(!err.is_transient());
    assert_eq!(origin.select_count("lessons"), 1);
}

#[tokio::test]
async fn test_writes_are_retried_with_the_same_payload() -> anyhow::Result<()> {
    let (origin, retrying) = setup_origin(fast_retries(3));
    origin.fail_next("lessons", 1);

    let inserted = retrying
        .insert("lessons", row(json!({"id": "l2", "topic_id": "t1"})))
        .await?;

    assert_eq!(inserted["id"], json!("l2"));
    assert_eq!(origin.rows("lessons").len(), 2);
    Ok(())
}
