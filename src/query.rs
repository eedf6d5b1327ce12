//! Row-returning queries
//!
//! Unlike [`exec`](crate::exec::exec), a query materializes its result set.
//! Cells are converted to JSON so they can be handed to the host as `jsonb`.

use crate::error::Result;
use crate::handle::Sqlite;
use rusqlite::types::ValueRef;
use serde::Serialize;
use serde_json::{Map, Number, Value};

/// One result row
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Row {
    pub columns: Vec<String>,
    pub values: Vec<Value>,
}

impl Row {
    /// Look up a cell by column name (first match wins)
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.columns
            .iter()
            .position(|c| c == column)
            .map(|i| &self.values[i])
    }

    /// Render as a JSON object; duplicate column names keep the last value
    pub fn to_object(&self) -> Map<String, Value> {
        self.columns
            .iter()
            .cloned()
            .zip(self.values.iter().cloned())
            .collect()
    }
}

/// Run the first statement of `sql` and collect every row it returns.
///
/// Only the first statement is prepared; anything after its terminating `;`
/// is ignored and never runs. Text with no statement at all (empty,
/// whitespace, `;`, comments) returns no rows, matching `exec`'s no-op.
pub fn query(db: &Sqlite, sql: &str) -> Result<Vec<Row>> {
    let conn = db.connection()?;
    tracing::debug!(id = %db.id(), len = sql.len(), "query");

    if !has_statement(sql) {
        return Ok(Vec::new());
    }

    let mut stmt = conn.prepare(sql)?;
    let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();

    let mut rows = stmt.query([])?;
    let mut out = Vec::new();
    while let Some(row) = rows.next()? {
        let mut values = Vec::with_capacity(columns.len());
        for i in 0..columns.len() {
            values.push(to_json(row.get_ref(i)?));
        }
        out.push(Row {
            columns: columns.clone(),
            values,
        });
    }

    tracing::debug!(id = %db.id(), rows = out.len(), "query complete");
    Ok(out)
}

/// Render rows as a JSON array of objects
pub fn rows_to_json(rows: &[Row]) -> Value {
    Value::Array(rows.iter().map(|r| Value::Object(r.to_object())).collect())
}

/// Whether `sql` holds anything besides whitespace, `;` and comments
fn has_statement(sql: &str) -> bool {
    let mut rest = sql;
    loop {
        rest = rest.trim_start_matches(|c: char| c.is_whitespace() || c == ';');
        if let Some(after) = rest.strip_prefix("--") {
            rest = after.find('\n').map(|i| &after[i + 1..]).unwrap_or("");
        } else if let Some(after) = rest.strip_prefix("/*") {
            // An unterminated block comment runs to the end of input
            rest = after.find("*/").map(|i| &after[i + 2..]).unwrap_or("");
        } else {
            return !rest.is_empty();
        }
    }
}

fn to_json(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::Number(i.into()),
        // NaN and infinities have no JSON form
        ValueRef::Real(f) => Number::from_f64(f).map(Value::Number).unwrap_or(Value::Null),
        ValueRef::Text(bytes) => Value::String(String::from_utf8_lossy(bytes).into_owned()),
        ValueRef::Blob(bytes) => Value::Array(bytes.iter().map(|b| Value::from(*b)).collect()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::exec::exec;
    use serde_json::json;

    fn setup() -> Sqlite {
        let db = Sqlite::open_in_memory().unwrap();
        exec(
            &db,
            "CREATE TABLE todos(id INTEGER PRIMARY KEY, title TEXT, score REAL, data BLOB);
             INSERT INTO todos VALUES (1, 'Buy milk', 1.5, x'0102');
             INSERT INTO todos VALUES (2, NULL, NULL, NULL);",
        )
        .unwrap();
        db
    }

    #[test]
    fn test_query_rows() {
        let db = setup();
        let rows = query(&db, "SELECT id, title, score, data FROM todos ORDER BY id").unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].columns, vec!["id", "title", "score", "data"]);
        assert_eq!(rows[0].get("title"), Some(&json!("Buy milk")));
        assert_eq!(rows[0].get("score"), Some(&json!(1.5)));
        assert_eq!(rows[0].get("data"), Some(&json!([1, 2])));
        assert_eq!(rows[1].get("title"), Some(&Value::Null));
    }

    #[test]
    fn test_query_empty_result() {
        let db = setup();
        let rows = query(&db, "SELECT * FROM todos WHERE id > 10").unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn test_query_error_message() {
        let db = setup();
        let err = query(&db, "SELECT * FROM nope").unwrap_err();
        assert!(matches!(err, Error::QueryFailed { .. }));
        assert_eq!(err.to_string(), "Failed to execute query: no such table: nope");
    }

    #[test]
    fn test_query_empty_text() {
        let db = setup();
        assert!(query(&db, "").unwrap().is_empty());
        assert!(query(&db, "  \n\t ").unwrap().is_empty());
        assert!(query(&db, " ; ;").unwrap().is_empty());
        assert!(query(&db, "-- nothing here\n/* or here */").unwrap().is_empty());
    }

    #[test]
    fn test_has_statement() {
        assert!(has_statement("SELECT 1"));
        assert!(has_statement("-- lead\nSELECT 1"));
        assert!(has_statement("/* x */ ; SELECT 1"));
        assert!(!has_statement("/* unterminated"));
        assert!(!has_statement("-- trailing"));
    }

    #[test]
    fn test_query_runs_first_statement_only() {
        let db = setup();
        let rows = query(&db, "SELECT id FROM todos WHERE id = 1; DELETE FROM todos").unwrap();
        assert_eq!(rows.len(), 1);

        let remaining = query(&db, "SELECT count(*) AS n FROM todos").unwrap();
        assert_eq!(remaining[0].get("n"), Some(&json!(2)));
    }

    #[test]
    fn test_rows_to_json() {
        let db = setup();
        let rows = query(&db, "SELECT id, title FROM todos WHERE id = 1").unwrap();
        assert_eq!(rows_to_json(&rows), json!([{ "id": 1, "title": "Buy milk" }]));
    }
}
