use std::sync::Arc;

use async_trait::async_trait;

use crate::{
    error::OriginResult,
    query::{Filter, OriginQuery},
    row::Row,
};

/// The remote data source behind the cache.
///
/// Implementations perform one request per call; retry policy belongs to
/// wrappers such as [`RetryingOrigin`](crate::retry::RetryingOrigin).
#[async_trait]
pub trait OriginSource: Send + Sync {
    async fn select(&self, query: &OriginQuery) -> OriginResult<Vec<Row>>;

    async fn insert(&self, table: &str, row: Row) -> OriginResult<Row>;

    /// Inserts `row`, or updates the existing row that matches it on every
    /// column in `conflict_columns`.
    async fn upsert(
        &self, table: &str, row: Row, conflict_columns: &[&str],
    ) -> OriginResult<Row>;

    /// Applies `patch` to every matching row. Returns the affected count.
    async fn update(
        &self, table: &str, filters: &[Filter], patch: Row,
    ) -> OriginResult<u64>;

    async fn delete(&self, table: &str, filters: &[Filter]) -> OriginResult<u64>;
}

pub type SharedOrigin = Arc<dyn OriginSource>;

#[async_trait]
impl<T> OriginSource for Arc<T>
where
    T: OriginSource + ?Sized,
{
    async fn select(&self, query: &OriginQuery) -> OriginResult<Vec<Row>> {
        (**self).select(query).await
    }

    async fn insert(&self, table: &str, row: Row) -> OriginResult<Row> {
        (**self).insert(table, row).await
    }

    async fn upsert(
        &self, table: &str, row: Row, conflict_columns: &[&str],
    ) -> OriginResult<Row> {
        (**self).upsert(table, row, conflict_columns).await
    }

    async fn update(
        &self, table: &str, filters: &[Filter], patch: Row,
    ) -> OriginResult<u64> {
        (**self).update(table, filters, patch).await
    }

    async fn delete(&self, table: &str, filters: &[Filter]) -> OriginResult<u64> {
        (**self).delete(table, filters).await
    }
}
