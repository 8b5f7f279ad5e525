use super::{guard_path, require_existing, AdapterError};
use crate::config::Settings;
use rusqlite::types::Value as SqlValue;
use rusqlite::Connection;
use serde_json::Value;
use std::path::Path;

/// Runs a read-only query against a SQLite database inside the data root
/// and returns rows as JSON arrays. Only statements beginning with SELECT
/// are accepted; the database file must already exist.
pub fn run_select(
    settings: &Settings,
    db_path: &str,
    query: &str,
) -> Result<Vec<Vec<Value>>, AdapterError> {
    let authorized = guard_path(settings, Path::new(db_path))?;
    require_existing(&authorized)?;

    if !query.trim_start().to_ascii_uppercase().starts_with("SELECT") {
        return Err(AdapterError::SqlRestricted);
    }

    let sql_error = |source: rusqlite::Error| AdapterError::Sql {
        path: authorized.as_path().display().to_string(),
        source,
    };

    let connection = Connection::open(authorized.as_path()).map_err(sql_error)?;
    let mut statement = connection.prepare(query).map_err(sql_error)?;
    let column_count = statement.column_count();

    let mapped = statement
        .query_map([], |row| {
            let mut values = Vec::with_capacity(column_count);
            for index in 0..column_count {
                values.push(row.get::<_, SqlValue>(index)?);
            }
            Ok(values)
        })
        .map_err(sql_error)?;

    let mut rows = Vec::new();
    for row in mapped {
        let values = row.map_err(sql_error)?;
        rows.push(values.into_iter().map(json_value).collect());
    }
    Ok(rows)
}

fn json_value(value: SqlValue) -> Value {
    match value {
        SqlValue::Null => Value::Null,
        SqlValue::Integer(v) => Value::from(v),
        SqlValue::Real(v) => serde_json::Number::from_f64(v)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        SqlValue::Text(v) => Value::String(v),
        SqlValue::Blob(v) => Value::String(String::from_utf8_lossy(&v).into_owned()),
    }
}
