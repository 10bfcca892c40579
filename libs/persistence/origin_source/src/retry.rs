use std::{future::Future, time::Duration};

use async_trait::async_trait;
use tracing::warn;

use crate::{
    error::OriginResult,
    query::{Filter, OriginQuery},
    row::Row,
    source::OriginSource,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Deserialize)]
pub struct RetryConfig {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,
    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_backoff_ms: default_initial_backoff_ms(),
            max_backoff_ms: default_max_backoff_ms(),
        }
    }
}

impl RetryConfig {
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// Delay before retry number `attempt` (1-based), doubling each time.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 1u64 << attempt.saturating_sub(1).min(16);
        let millis = self
            .initial_backoff_ms
            .saturating_mul(factor)
            .min(self.max_backoff_ms);
        Duration::from_millis(millis)
    }
}

fn default_max_attempts() -> u32 { 3 }
fn default_initial_backoff_ms() -> u64 { 200 }
fn default_max_backoff_ms() -> u64 { 2_000 }

/// Retries transient failures of the wrapped origin with exponential backoff.
pub struct RetryingOrigin<S> {
    inner: S,
    config: RetryConfig,
}

impl<S> RetryingOrigin<S>
where
    S: OriginSource,
{
    pub fn new(inner: S, config: RetryConfig) -> Self { Self { inner, config } }

    async fn with_retry<T, F, Fut>(
        &self, op: &str, mut call: F,
    ) -> OriginResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = OriginResult<T>>,
    {
        let mut attempt = 1;
        loop {
            match call().await {
                Ok(value) => return Ok(value),
                Err(e)
                    if e.is_transient()
                        && attempt < self.config.max_attempts =>
                {
                    let delay = self.config.backoff(attempt);
                    warn!(
                        op,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "transient origin failure, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[async_trait]
impl<S> OriginSource for RetryingOrigin<S>
where
    S: OriginSource,
{
    async fn select(&self, query: &OriginQuery) -> OriginResult<Vec<Row>> {
        self.with_retry("select", || self.inner.select(query)).await
    }

    async fn insert(&self, table: &str, row: Row) -> OriginResult<Row> {
        self.with_retry("insert", || self.inner.insert(table, row.clone()))
            .await
    }

    async fn upsert(
        &self, table: &str, row: Row, conflict_columns: &[&str],
    ) -> OriginResult<Row> {
        self.with_retry("upsert", || {
            self.inner.upsert(table, row.clone(), conflict_columns)
        })
        .await
    }

    async fn update(
        &self, table: &str, filters: &[Filter], patch: Row,
    ) -> OriginResult<u64> {
        self.with_retry("update", || {
            self.inner.update(table, filters, patch.clone())
        })
        .await
    }

    async fn delete(&self, table: &str, filters: &[Filter]) -> OriginResult<u64> {
        self.with_retry("delete", || self.inner.delete(table, filters))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_doubles_and_caps() {
        let config = RetryConfig {
            max_attempts: 5,
            initial_backoff_ms: 100,
            max_backoff_ms: 350,
        };

        assert_eq!(config.backoff(1), Duration::from_millis(100));
        assert_eq!(config.backoff(2), Duration::from_millis(200));
        assert_eq!(config.backoff(3), Duration::from_millis(350));
    }

    #[test]
    fn retry_config_defaults() {
        let config: RetryConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, RetryConfig::default());
        assert_eq!(RetryConfig::no_retry().max_attempts, 1);
    }
}
