//! # Repository Functions
//!
//! Free async functions over a shared `turso::Database`. Every call opens its
//! own connection, so a handler's unit of work never shares state with
//! another request. Rows are mapped through `TryFrom<&Row>`.

pub mod knowledge;
pub mod ownership;
pub mod threads;

use crate::errors::AssistantError;
use chrono::{DateTime, NaiveDateTime, Utc};
use turso::{Connection, Database, Value};

pub(crate) fn connect(db: &Database) -> Result<Connection, AssistantError> {
    db.connect()
        .map_err(|e| AssistantError::StorageConnection(e.to_string()))
}

/// Parses SQLite's `CURRENT_TIMESTAMP` format.
pub(crate) fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, AssistantError> {
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
        .map(|ndt| DateTime::<Utc>::from_naive_utc_and_offset(ndt, Utc))
        .map_err(|e| {
            AssistantError::StorageOperationFailed(format!("Failed to parse date '{raw}': {e}"))
        })
}

pub(crate) fn text_or_null(value: Option<&str>) -> Value {
    value.map_or(Value::Null, |s| Value::Text(s.to_string()))
}

pub(crate) fn integer_or_null(value: Option<i64>) -> Value {
    value.map_or(Value::Null, Value::Integer)
}

pub(crate) fn real_or_null(value: Option<f64>) -> Value {
    value.map_or(Value::Null, Value::Real)
}

pub(crate) fn value_to_text(value: Value) -> Option<String> {
    match value {
        Value::Text(s) => Some(s),
        _ => None,
    }
}

pub(crate) fn value_to_integer(value: Value) -> Option<i64> {
    match value {
        Value::Integer(i) => Some(i),
        _ => None,
    }
}

pub(crate) fn value_to_real(value: Value) -> Option<f64> {
    match value {
        Value::Real(f) => Some(f),
        Value::Integer(i) => Some(i as f64),
        _ => None,
    }
}

/// Reads the id produced by an `INSERT ... RETURNING id`.
pub(crate) async fn returned_id(
    mut rows: turso::Rows,
    what: &str,
) -> Result<i64, AssistantError> {
    let row = rows.next().await?.ok_or_else(|| {
        AssistantError::StorageOperationFailed(format!("Insert into {what} returned no id"))
    })?;
    Ok(row.get(0)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_timestamp() {
        let ts = parse_timestamp("2024-05-01 12:30:00").unwrap();
        assert_eq!(ts.to_rfc3339(), "2024-05-01T12:30:00+00:00");
        assert!(parse_timestamp("yesterday").is_err());
    }

    #[test]
    fn test_nullable_conversions() {
        assert_eq!(text_or_null(None), Value::Null);
        assert_eq!(text_or_null(Some("a")), Value::Text("a".into()));
        assert_eq!(value_to_real(Value::Integer(1)), Some(1.0));
        assert_eq!(value_to_integer(Value::Null), None);
    }
}
