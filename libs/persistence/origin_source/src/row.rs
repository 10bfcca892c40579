use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::error::{OriginError, OriginResult};

/// One record as returned by the origin: column name to JSON value.
pub type Row = Map<String, Value>;

/// Renders a scalar the way a text cast in the database would, so equality
/// filters behave the same against every origin implementation.
pub fn value_as_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        other => Some(other.to_string()),
    }
}

pub trait RowExt {
    fn text(&self, column: &str) -> Option<String>;
    fn uuid(&self, column: &str) -> Option<Uuid>;
    fn int(&self, column: &str) -> Option<i64>;
    fn float(&self, column: &str) -> Option<f64>;
    fn flag(&self, column: &str) -> Option<bool>;
}

impl RowExt for Row {
    fn text(&self, column: &str) -> Option<String> {
        self.get(column).and_then(value_as_text)
    }

    fn uuid(&self, column: &str) -> Option<Uuid> {
        self.get(column)
            .and_then(Value::as_str)
            .and_then(|s| Uuid::parse_str(s).ok())
    }

    fn int(&self, column: &str) -> Option<i64> {
        let value = self.get(column)?;
        value
            .as_i64()
            .or_else(|| value.as_f64().map(|f| f as i64))
            .or_else(|| value.as_str().and_then(|s| s.parse().ok()))
    }

    fn float(&self, column: &str) -> Option<f64> {
        let value = self.get(column)?;
        value
            .as_f64()
            .or_else(|| value.as_str().and_then(|s| s.parse().ok()))
    }

    fn flag(&self, column: &str) -> Option<bool> {
        self.get(column).and_then(Value::as_bool)
    }
}

/// Deserializes every row of `table` into `T`.
pub fn decode_rows<T>(table: &str, rows: Vec<Row>) -> OriginResult<Vec<T>>
where
    T: DeserializeOwned,
{
    rows.into_iter()
        .map(|row| {
            serde_json::from_value(Value::Object(row))
                .map_err(|e| OriginError::decode(table, e))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn row(value: Value) -> Row {
        match value {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    #[test]
    fn row_accessors_coerce_loosely() {
        let id = Uuid::now_v7();
        let row = row(json!({
            "id": id.to_string(),
            "duration": 90.7,
            "count": "12",
            "score": 4,
            "done": true,
            "missing": null,
        }));

        assert_eq!(row.uuid("id"), Some(id));
        assert_eq!(row.int("duration"), Some(90));
        assert_eq!(row.int("count"), Some(12));
        assert_eq!(row.float("score"), Some(4.0));
        assert_eq!(row.flag("done"), Some(true));
        assert_eq!(row.text("missing"), None);
        assert_eq!(row.text("score").as_deref(), Some("4"));
    }

    #[test]
    fn decode_rows_reports_table() {
        #[derive(serde::Deserialize)]
        struct Named {
            #[allow(dead_code)]
            name: String,
        }

        let err = decode_rows::<Named>("lesson_topics", vec![row(json!({"name": 3}))])
            .err()
            .unwrap();
        assert!(err.to_string().contains("lesson_topics"));
    }
}
