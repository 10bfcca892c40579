use std::{
    cmp::Ordering,
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard},
};

use async_trait::async_trait;
use origin_source::{
    Filter, OriginError, OriginQuery, OriginResult, OriginSource, Row,
    value_as_text,
};
use serde_json::Value;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Failure {
    /// Every call fails with a transient error until healed.
    Unavailable,
    /// The next `n` calls fail with a transient error.
    Times(usize),
    /// Every call fails with a non-transient error until healed.
    Rejected,
}

#[derive(Debug, Default)]
struct State {
    tables: HashMap<String, Vec<Row>>,
    failures: HashMap<String, Failure>,
    selects: HashMap<String, usize>,
    writes: HashMap<String, usize>,
}

/// Origin backed by in-process tables of JSON rows.
///
/// Evaluates the same filters, ordering and limits the Postgres origin
/// renders, counts calls per table and can be told to fail per table.
/// Clones share state.
#[derive(Debug, Clone, Default)]
pub struct MemoryOrigin {
    state: Arc<Mutex<State>>,
}

impl MemoryOrigin {
    pub fn new() -> Self { Self::default() }

    fn state(&self) -> MutexGuard<'_, State> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    pub fn seed(&self, table: &str, rows: impl IntoIterator<Item = Row>) {
        self.state()
            .tables
            .entry(table.to_string())
            .or_default()
            .extend(rows);
    }

    pub fn rows(&self, table: &str) -> Vec<Row> {
        self.state().tables.get(table).cloned().unwrap_or_default()
    }

    pub fn select_count(&self, table: &str) -> usize {
        self.state().selects.get(table).copied().unwrap_or(0)
    }

    pub fn write_count(&self, table: &str) -> usize {
        self.state().writes.get(table).copied().unwrap_or(0)
    }

    pub fn reset_counts(&self) {
        let mut state = self.state();
        state.selects.clear();
        state.writes.clear();
    }

    /// Makes every call touching `table` fail with a transient error.
    pub fn fail_table(&self, table: &str) {
        self.state()
            .failures
            .insert(table.to_string(), Failure::Unavailable);
    }

    /// Makes the next `times` calls touching `table` fail transiently.
    pub fn fail_next(&self, table: &str, times: usize) {
        self.state()
            .failures
            .insert(table.to_string(), Failure::Times(times));
    }

    /// Makes every call touching `table` fail with a permanent error.
    pub fn reject_table(&self, table: &str) {
        self.state()
            .failures
            .insert(table.to_string(), Failure::Rejected);
    }

    pub fn heal_table(&self, table: &str) { self.state().failures.remove(table); }

    fn check(state: &mut State, table: &str) -> OriginResult<()> {
        let failure = match state.failures.get(table).copied() {
            None => return Ok(()),
            Some(failure) => failure,
        };

        match failure {
            Failure::Times(0) => {
                state.failures.remove(table);
                Ok(())
            }
            Failure::Times(n) => {
                state.failures.insert(table.to_string(), Failure::Times(n - 1));
                Err(unavailable(table))
            }
            Failure::Unavailable => Err(unavailable(table)),
            Failure::Rejected => Err(OriginError::Rejected {
                table: table.to_string(),
                reason: "injected rejection".to_string(),
            }),
        }
    }

    fn begin_write<'a>(
        state: &'a mut State, table: &str,
    ) -> OriginResult<&'a mut Vec<Row>> {
        Self::check(state, table)?;
        *state.writes.entry(table.to_string()).or_default() += 1;
        Ok(state.tables.entry(table.to_string()).or_default())
    }
}

fn unavailable(table: &str) -> OriginError {
    OriginError::Unavailable {
        table: table.to_string(),
        reason: "injected failure".to_string(),
    }
}

fn matches_filter(row: &Row, filter: &Filter) -> bool {
    let actual = row.get(filter.column()).and_then(value_as_text);
    match filter {
        Filter::Eq { value, .. } => actual == value_as_text(value),
        Filter::In { values, .. } => {
            actual.is_some_and(|a| {
                values.iter().filter_map(value_as_text).any(|v| v == a)
            })
        }
    }
}

fn matches_all(row: &Row, filters: &[Filter]) -> bool {
    filters.iter().all(|f| matches_filter(row, f))
}

fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a.as_f64(), b.as_f64()) {
        (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
        _ => value_as_text(a).cmp(&value_as_text(b)),
    }
}

fn compare_rows(a: &Row, b: &Row, query: &OriginQuery) -> Ordering {
    for order in &query.order {
        let left = a.get(&order.column).filter(|v| !v.is_null());
        let right = b.get(&order.column).filter(|v| !v.is_null());

        let ordering = match (left, right) {
            (None, None) => Ordering::Equal,
            (None, Some(_)) => {
                if order.nulls_last { Ordering::Greater } else { Ordering::Less }
            }
            (Some(_), None) => {
                if order.nulls_last { Ordering::Less } else { Ordering::Greater }
            }
            (Some(x), Some(y)) => {
                let ord = compare_values(x, y);
                if order.ascending { ord } else { ord.reverse() }
            }
        };

        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    Ordering::Equal
}

fn project(row: Row, columns: Option<&[String]>) -> Row {
    match columns {
        Some(columns) if !columns.is_empty() => row
            .into_iter()
            .filter(|(k, _)| columns.iter().any(|c| c == k))
            .collect(),
        _ => row,
    }
}

#[async_trait]
impl OriginSource for MemoryOrigin {
    async fn select(&self, query: &OriginQuery) -> OriginResult<Vec<Row>> {
        let mut state = self.state();
        *state.selects.entry(query.table.clone()).or_default() += 1;
        Self::check(&mut state, &query.table)?;

        let mut rows: Vec<Row> = state
            .tables
            .get(&query.table)
            .map(|rows| {
                rows.iter()
                    .filter(|row| matches_all(row, &query.filters))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        rows.sort_by(|a, b| compare_rows(a, b, query));
        if let Some(limit) = query.limit {
            rows.truncate(limit as usize);
        }

        Ok(rows
            .into_iter()
            .map(|row| project(row, query.columns.as_deref()))
            .collect())
    }

    async fn insert(&self, table: &str, mut row: Row) -> OriginResult<Row> {
        let mut state = self.state();
        let rows = Self::begin_write(&mut state, table)?;

        row.entry("id")
            .or_insert_with(|| Value::String(Uuid::now_v7().to_string()));
        rows.push(row.clone());
        Ok(row)
    }

    async fn upsert(
        &self, table: &str, row: Row, conflict_columns: &[&str],
    ) -> OriginResult<Row> {
        let mut state = self.state();
        let rows = Self::begin_write(&mut state, table)?;

        let existing = rows.iter_mut().find(|existing| {
            conflict_columns.iter().all(|c| {
                existing.get(*c).and_then(value_as_text)
                    == row.get(*c).and_then(value_as_text)
            })
        });

        match existing {
            Some(existing) => {
                existing.extend(row);
                Ok(existing.clone())
            }
            None => {
                let mut row = row;
                row.entry("id")
                    .or_insert_with(|| Value::String(Uuid::now_v7().to_string()));
                rows.push(row.clone());
                Ok(row)
            }
        }
    }

    async fn update(
        &self, table: &str, filters: &[Filter], patch: Row,
    ) -> OriginResult<u64> {
        let mut state = self.state();
        let rows = Self::begin_write(&mut state, table)?;

        let mut affected = 0;
        for row in rows.iter_mut().filter(|row| matches_all(row, filters)) {
            row.extend(patch.clone());
            affected += 1;
        }
        Ok(affected)
    }

    async fn delete(&self, table: &str, filters: &[Filter]) -> OriginResult<u64> {
        let mut state = self.state();
        let rows = Self::begin_write(&mut state, table)?;

        let before = rows.len();
        rows.retain(|row| !matches_all(row, filters));
        Ok((before - rows.len()) as u64)
    }
}
