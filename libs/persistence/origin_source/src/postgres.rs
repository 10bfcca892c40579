//! Postgres-backed origin.
//!
//! Structured queries are rendered into parameterised SQL. Every row comes
//! back as a single `jsonb` column so callers see the same [`Row`] shape as
//! from any other origin. Comparisons are made on the `::text` form of the
//! column, matching [`value_as_text`].

use std::time::Duration;

use async_trait::async_trait;
use deadpool_postgres::{Manager, ManagerConfig, Pool, RecyclingMethod};
use serde_json::Value;
use tokio_postgres::{NoTls, types::ToSql};
use tracing::{debug, info, instrument};

use crate::{
    error::{OriginError, OriginResult},
    query::{Filter, OriginQuery},
    row::{Row, value_as_text},
    source::OriginSource,
};

#[derive(Debug, Clone, serde::Deserialize)]
pub struct PostgresOriginConfig {
    pub uri: String,
    #[serde(default = "max_conn_default")]
    pub max_conn: usize,
    #[serde(default = "wait_timeout_ms_default")]
    pub wait_timeout_ms: u64,
}

fn max_conn_default() -> usize { 16 }
fn wait_timeout_ms_default() -> u64 { 2_000 }

impl PostgresOriginConfig {
    pub fn new(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            max_conn: max_conn_default(),
            wait_timeout_ms: wait_timeout_ms_default(),
        }
    }
}

#[instrument(skip_all, name = "connect-pg-origin")]
pub fn connect_pg_origin(config: &PostgresOriginConfig) -> OriginResult<PgOrigin> {
    let pg_config = config
        .uri
        .parse::<tokio_postgres::Config>()
        .map_err(|e| OriginError::Config(e.to_string()))?;

    let mgr_config = ManagerConfig {
        recycling_method: RecyclingMethod::Fast,
    };
    let mgr = Manager::from_config(pg_config, NoTls, mgr_config);

    let pool = Pool::builder(mgr)
        .max_size(config.max_conn)
        .runtime(deadpool_postgres::Runtime::Tokio1)
        .wait_timeout(Some(Duration::from_millis(config.wait_timeout_ms)))
        .build()
        .map_err(|e| OriginError::Config(e.to_string()))?;

    info!(postgres.max_conn = config.max_conn, "origin pool created");
    Ok(PgOrigin::new(pool))
}

#[derive(Debug, Clone, PartialEq)]
pub enum PgParam {
    Text(String),
    TextList(Vec<String>),
    Json(Value),
}

impl PgParam {
    fn as_sql(&self) -> &(dyn ToSql + Sync) {
        match self {
            Self::Text(text) => text,
            Self::TextList(list) => list,
            Self::Json(json) => json,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PgStatement {
    pub sql: String,
    pub params: Vec<PgParam>,
}

fn quote_ident(ident: &str) -> OriginResult<String> {
    let valid = ident
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_lowercase() || c == '_')
        && ident
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_');

    if valid {
        Ok(format!("\"{ident}\""))
    }
    else {
        Err(OriginError::Unsupported(format!("invalid identifier {ident:?}")))
    }
}

fn render_where(
    filters: &[Filter], qualifier: Option<&str>, params: &mut Vec<PgParam>,
) -> OriginResult<String> {
    let mut clauses = Vec::with_capacity(filters.len());

    for filter in filters {
        let column = quote_ident(filter.column())?;
        let column = match qualifier {
            Some(q) => format!("{q}.{column}"),
            None => column,
        };

        match filter {
            Filter::Eq { value, .. } => {
                match value_as_text(value) {
                    None => clauses.push(format!("{column} IS NULL")),
                    Some(text) => {
                        params.push(PgParam::Text(text));
                        clauses.push(format!("{column}::text = ${}", params.len()));
                    }
                }
            }
            Filter::In { values, .. } => {
                let texts = values.iter().filter_map(value_as_text).collect();
                params.push(PgParam::TextList(texts));
                clauses.push(format!("{column}::text = ANY(${})", params.len()));
            }
        }
    }

    if clauses.is_empty() {
        Ok(String::new())
    }
    else {
        Ok(format!(" WHERE {}", clauses.join(" AND ")))
    }
}

fn row_columns(row: &Row) -> OriginResult<Vec<String>> {
    if row.is_empty() {
        return Err(OriginError::Unsupported("empty row".to_string()));
    }
    row.keys().map(|k| quote_ident(k)).collect()
}

pub fn render_select(query: &OriginQuery) -> OriginResult<PgStatement> {
    let table = quote_ident(&query.table)?;
    let columns = match &query.columns {
        Some(columns) if !columns.is_empty() => columns
            .iter()
            .map(|c| quote_ident(c))
            .collect::<OriginResult<Vec<_>>>()?
            .join(", "),
        _ => "*".to_string(),
    };

    let mut params = Vec::new();
    let mut sql = format!("SELECT {columns} FROM {table}");
    sql.push_str(&render_where(&query.filters, None, &mut params)?);

    if !query.order.is_empty() {
        let order = query
            .order
            .iter()
            .map(|o| {
                Ok(format!(
                    "{} {} {}",
                    quote_ident(&o.column)?,
                    if o.ascending { "ASC" } else { "DESC" },
                    if o.nulls_last { "NULLS LAST" } else { "NULLS FIRST" }
                ))
            })
            .collect::<OriginResult<Vec<_>>>()?;
        sql.push_str(&format!(" ORDER BY {}", order.join(", ")));
    }

    if let Some(limit) = query.limit {
        sql.push_str(&format!(" LIMIT {limit}"));
    }

    Ok(PgStatement {
        sql: format!("SELECT to_jsonb(t) FROM ({sql}) AS t"),
        params,
    })
}

pub fn render_insert(
    table: &str, row: Row, conflict_columns: &[&str],
) -> OriginResult<PgStatement> {
    let table = quote_ident(table)?;
    let columns = row_columns(&row)?;
    let column_list = columns.join(", ");

    let mut sql = format!(
        "INSERT INTO {table} AS r ({column_list}) SELECT {column_list} FROM \
         jsonb_populate_record(NULL::{table}, $1)"
    );

    if !conflict_columns.is_empty() {
        let conflict = conflict_columns
            .iter()
            .map(|c| quote_ident(c))
            .collect::<OriginResult<Vec<_>>>()?;
        let mut updates: Vec<String> = columns
            .iter()
            .filter(|c| !conflict.contains(c))
            .map(|c| format!("{c} = EXCLUDED.{c}"))
            .collect();
        if updates.is_empty() {
            updates.push(format!("{0} = EXCLUDED.{0}", conflict[0]));
        }

        sql.push_str(&format!(
            " ON CONFLICT ({}) DO UPDATE SET {}",
            conflict.join(", "),
            updates.join(", ")
        ));
    }

    sql.push_str(" RETURNING to_jsonb(r)");
    Ok(PgStatement {
        sql,
        params: vec![PgParam::Json(Value::Object(row))],
    })
}

pub fn render_update(
    table: &str, filters: &[Filter], patch: Row,
) -> OriginResult<PgStatement> {
    if filters.is_empty() {
        return Err(OriginError::Unsupported(
            "update without filters".to_string(),
        ));
    }

    let table = quote_ident(table)?;
    let assignments = row_columns(&patch)?
        .iter()
        .map(|c| format!("{c} = p.{c}"))
        .collect::<Vec<_>>()
        .join(", ");

    let mut params = vec![PgParam::Json(Value::Object(patch))];
    let where_clause = render_where(filters, Some(table.as_str()), &mut params)?;

    Ok(PgStatement {
        sql: format!(
            "UPDATE {table} SET {assignments} FROM \
             jsonb_populate_record(NULL::{table}, $1) AS p{where_clause}"
        ),
        params,
    })
}

pub fn render_delete(table: &str, filters: &[Filter]) -> OriginResult<PgStatement> {
    if filters.is_empty() {
        return Err(OriginError::Unsupported(
            "delete without filters".to_string(),
        ));
    }

    let table = quote_ident(table)?;
    let mut params = Vec::new();
    let where_clause = render_where(filters, None, &mut params)?;

    Ok(PgStatement {
        sql: format!("DELETE FROM {table}{where_clause}"),
        params,
    })
}

#[derive(Debug, Clone)]
pub struct PgOrigin {
    pool: Pool,
}

impl PgOrigin {
    pub fn new(pool: Pool) -> Self { Self { pool } }

    async fn query_rows(&self, table: &str, stmt: PgStatement) -> OriginResult<Vec<Row>> {
        let client = self.pool.get().await?;
        let params: Vec<_> = stmt.params.iter().map(PgParam::as_sql).collect();
        debug!(sql = %stmt.sql, "origin query");

        let rows = client.query(stmt.sql.as_str(), &params).await?;
        rows.iter()
            .map(|row| {
                match row.try_get::<_, Value>(0) {
                    Ok(Value::Object(map)) => Ok(map),
                    Ok(other) => Err(OriginError::decode(
                        table,
                        format!("expected object, got {other}"),
                    )),
                    Err(e) => Err(OriginError::decode(table, e)),
                }
            })
            .collect()
    }

    async fn execute(&self, stmt: PgStatement) -> OriginResult<u64> {
        let client = self.pool.get().await?;
        let params: Vec<_> = stmt.params.iter().map(PgParam::as_sql).collect();
        debug!(sql = %stmt.sql, "origin execute");

        Ok(client.execute(stmt.sql.as_str(), &params).await?)
    }

    async fn single_row(&self, table: &str, stmt: PgStatement) -> OriginResult<Row> {
        self.query_rows(table, stmt)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| OriginError::decode(table, "write returned no row"))
    }
}

#[async_trait]
impl OriginSource for PgOrigin {
    #[instrument(skip(self), fields(table = %query.table))]
    async fn select(&self, query: &OriginQuery) -> OriginResult<Vec<Row>> {
        if query.is_trivially_empty() {
            return Ok(Vec::new());
        }
        self.query_rows(&query.table, render_select(query)?).await
    }

    #[instrument(skip(self, row))]
    async fn insert(&self, table: &str, row: Row) -> OriginResult<Row> {
        self.single_row(table, render_insert(table, row, &[])?).await
    }

    #[instrument(skip(self, row))]
    async fn upsert(
        &self, table: &str, row: Row, conflict_columns: &[&str],
    ) -> OriginResult<Row> {
        self.single_row(table, render_insert(table, row, conflict_columns)?)
            .await
    }

    #[instrument(skip(self, filters, patch))]
    async fn update(
        &self, table: &str, filters: &[Filter], patch: Row,
    ) -> OriginResult<u64> {
        self.execute(render_update(table, filters, patch)?).await
    }

    #[instrument(skip(self, filters))]
    async fn delete(&self, table: &str, filters: &[Filter]) -> OriginResult<u64> {
        self.execute(render_delete(table, filters)?).await
    }
}
