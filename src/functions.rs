//! SQL-callable functions
//!
//! The surface the extension installs into the host. Each function has a
//! fixed signature in [`FUNCTIONS`]; [`call`] dispatches a host call to it
//! and turns any failure into a host `ERROR` report.
//!
//! | Function                              | Returns  |
//! |---------------------------------------|----------|
//! | `sqlite_open(location text)`          | `sqlite` |
//! | `sqlite_exec(db sqlite, query text)`  | `sqlite` |
//! | `sqlite_query(db sqlite, query text)` | `jsonb`  |
//! | `sqlite_close(db sqlite)`             | `void`   |
//!
//! All functions are `STRICT`: a `NULL` argument yields `NULL` and the body
//! is never run.

use crate::error::{Error, Result};
use crate::exec::exec;
use crate::handle::SessionId;
use crate::query::{query, rows_to_json};
use crate::registry::Registry;
use crate::validation::validate_schema_name;
use omni_host::{abort, HostError};
use std::fmt::Write;

/// A host value passed to or returned from an extension function
#[derive(Debug, Clone, PartialEq)]
pub enum Datum {
    Null,
    Void,
    Text(String),
    Sqlite(SessionId),
    Json(serde_json::Value),
}

impl Datum {
    pub fn is_null(&self) -> bool {
        matches!(self, Datum::Null)
    }

    /// Host type name, as used in error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            Datum::Null => "null",
            Datum::Void => "void",
            Datum::Text(_) => "text",
            Datum::Sqlite(_) => "sqlite",
            Datum::Json(_) => "jsonb",
        }
    }
}

impl From<&str> for Datum {
    fn from(s: &str) -> Self {
        Datum::Text(s.to_string())
    }
}

impl From<SessionId> for Datum {
    fn from(id: SessionId) -> Self {
        Datum::Sqlite(id)
    }
}

/// Argument type of a function parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgType {
    Text,
    Sqlite,
}

impl ArgType {
    fn name(self) -> &'static str {
        match self {
            ArgType::Text => "text",
            ArgType::Sqlite => "sqlite",
        }
    }
}

type Body = fn(&mut Registry, &[Datum]) -> Result<Datum>;

/// Signature and body of one installed function
pub struct FunctionDef {
    pub name: &'static str,
    pub args: &'static [(&'static str, ArgType)],
    pub returns: &'static str,
    body: Body,
}

/// Every function the extension installs
pub static FUNCTIONS: &[FunctionDef] = &[
    FunctionDef {
        name: "sqlite_open",
        args: &[("location", ArgType::Text)],
        returns: "sqlite",
        body: sqlite_open,
    },
    FunctionDef {
        name: "sqlite_exec",
        args: &[("db", ArgType::Sqlite), ("query", ArgType::Text)],
        returns: "sqlite",
        body: sqlite_exec,
    },
    FunctionDef {
        name: "sqlite_query",
        args: &[("db", ArgType::Sqlite), ("query", ArgType::Text)],
        returns: "jsonb",
        body: sqlite_query,
    },
    FunctionDef {
        name: "sqlite_close",
        args: &[("db", ArgType::Sqlite)],
        returns: "void",
        body: sqlite_close,
    },
];

/// Find a function by name
pub fn lookup(name: &str) -> Option<&'static FunctionDef> {
    FUNCTIONS.iter().find(|f| f.name == name)
}

/// Dispatch a host call.
///
/// Any error is emitted as an `ERROR` report and returned as the
/// [`HostError`] that ends the request.
pub fn call(registry: &mut Registry, name: &str, args: &[Datum]) -> std::result::Result<Datum, HostError> {
    invoke(registry, name, args).map_err(|err| abort(err.to_report()))
}

fn invoke(registry: &mut Registry, name: &str, args: &[Datum]) -> Result<Datum> {
    let def = lookup(name).ok_or_else(|| Error::UnknownFunction {
        name: name.to_string(),
    })?;

    if args.len() != def.args.len() {
        return Err(Error::WrongArity {
            name: def.name,
            expected: def.args.len(),
            actual: args.len(),
        });
    }

    if args.iter().any(Datum::is_null) {
        return Ok(Datum::Null);
    }

    for (position, ((_, expected), actual)) in def.args.iter().zip(args).enumerate() {
        let matches = matches!(
            (expected, actual),
            (ArgType::Text, Datum::Text(_)) | (ArgType::Sqlite, Datum::Sqlite(_))
        );
        if !matches {
            return Err(Error::ArgumentType {
                name: def.name,
                position: position + 1,
                expected: expected.name(),
                actual: actual.type_name(),
            });
        }
    }

    (def.body)(registry, args)
}

// =============================================================================
// Function bodies (arguments are type-checked by `invoke`)
// =============================================================================

/// Text argument at `index`; a signature mismatch surfaces as `ArgumentType`
fn text<'a>(name: &'static str, args: &'a [Datum], index: usize) -> Result<&'a str> {
    match args.get(index) {
        Some(Datum::Text(s)) => Ok(s),
        other => Err(mismatch(name, index, "text", other)),
    }
}

/// Handle argument at `index`
fn handle(name: &'static str, args: &[Datum], index: usize) -> Result<SessionId> {
    match args.get(index) {
        Some(Datum::Sqlite(id)) => Ok(*id),
        other => Err(mismatch(name, index, "sqlite", other)),
    }
}

fn mismatch(name: &'static str, index: usize, expected: &'static str, actual: Option<&Datum>) -> Error {
    Error::ArgumentType {
        name,
        position: index + 1,
        expected,
        actual: actual.map(Datum::type_name).unwrap_or("nothing"),
    }
}

fn sqlite_open(registry: &mut Registry, args: &[Datum]) -> Result<Datum> {
    let location = text("sqlite_open", args, 0)?;
    Ok(Datum::Sqlite(registry.open(location)?))
}

fn sqlite_exec(registry: &mut Registry, args: &[Datum]) -> Result<Datum> {
    let id = handle("sqlite_exec", args, 0)?;
    let command = text("sqlite_exec", args, 1)?;
    exec(registry.get(id)?, command)?;
    Ok(Datum::Sqlite(id))
}

fn sqlite_query(registry: &mut Registry, args: &[Datum]) -> Result<Datum> {
    let id = handle("sqlite_query", args, 0)?;
    let sql = text("sqlite_query", args, 1)?;
    let rows = query(registry.get(id)?, sql)?;
    Ok(Datum::Json(rows_to_json(&rows)))
}

fn sqlite_close(registry: &mut Registry, args: &[Datum]) -> Result<Datum> {
    registry.close(handle("sqlite_close", args, 0)?)?;
    Ok(Datum::Void)
}

// =============================================================================
// Install script
// =============================================================================

/// Render the extension's install script for `schema`.
///
/// The `sqlite` type is a domain over `bigint` holding the session id.
pub fn install_script(schema: &str) -> Result<String> {
    validate_schema_name(schema)?;

    let mut sql = String::new();
    sql.push_str("-- complain if script is sourced in psql, rather than via CREATE EXTENSION\n");
    sql.push_str("\\echo Use \"CREATE EXTENSION omni_sqlite\" to load this file. \\quit\n\n");
    let _ = writeln!(sql, "CREATE DOMAIN {}.sqlite AS bigint;\n", schema);

    for def in FUNCTIONS {
        let params = def
            .args
            .iter()
            .map(|(name, ty)| match ty {
                ArgType::Text => format!("{} text", name),
                ArgType::Sqlite => format!("{} {}.sqlite", name, schema),
            })
            .collect::<Vec<_>>()
            .join(", ");
        let returns = match def.returns {
            "sqlite" => format!("{}.sqlite", schema),
            other => other.to_string(),
        };
        let _ = writeln!(
            sql,
            "CREATE FUNCTION {schema}.{name}({params}) RETURNS {returns}\n    AS 'MODULE_PATHNAME', '{name}'\n    LANGUAGE C STRICT VOLATILE;\n",
            schema = schema,
            name = def.name,
            params = params,
            returns = returns,
        );
    }

    Ok(sql)
}

#[cfg(test)]
mod tests {
    use super::*;
    use omni_host::{Request, Severity, SqlState};

    fn open(registry: &mut Registry) -> Datum {
        call(registry, "sqlite_open", &[Datum::from(":memory:")]).unwrap()
    }

    #[test]
    fn test_exec_returns_handle_unchanged() {
        let mut registry = Registry::new();
        let db = open(&mut registry);

        let returned = call(&mut registry, "sqlite_exec", &[db.clone(), "CREATE TABLE t(x INT)".into()]).unwrap();
        assert_eq!(returned, db);
    }

    #[test]
    fn test_exec_failure_raises_error_report() {
        let mut registry = Registry::new();
        let db = open(&mut registry);

        let err = call(&mut registry, "sqlite_exec", &[db, "SELEC 1".into()]).unwrap_err();
        let report = err.report();
        assert_eq!(report.severity, Severity::Error);
        assert_eq!(report.sqlstate, SqlState::EXTERNAL_ROUTINE_EXCEPTION);
        assert!(report.message.starts_with("Failed to execute query: "));
        assert!(report.message.contains("syntax error"));
    }

    #[test]
    fn test_strict_null_arguments() {
        let mut registry = Registry::new();
        let result = call(&mut registry, "sqlite_exec", &[Datum::Null, "SELECT 1".into()]).unwrap();
        assert_eq!(result, Datum::Null);

        let db = open(&mut registry);
        let result = call(&mut registry, "sqlite_exec", &[db, Datum::Null]).unwrap();
        assert_eq!(result, Datum::Null);
    }

    #[test]
    fn test_argument_checks() {
        let mut registry = Registry::new();

        let err = call(&mut registry, "sqlite_exec", &["SELECT 1".into()]).unwrap_err();
        assert!(err.report().message.contains("expects 2 argument(s), got 1"));

        let err = call(&mut registry, "sqlite_exec", &["x".into(), "SELECT 1".into()]).unwrap_err();
        assert_eq!(err.report().sqlstate, SqlState::DATATYPE_MISMATCH);

        let err = call(&mut registry, "sqlite_vacuum", &[]).unwrap_err();
        assert_eq!(err.report().sqlstate, SqlState::UNDEFINED_FUNCTION);
    }

    #[test]
    fn test_bodies_reject_mismatched_arguments() {
        let mut registry = Registry::new();

        let err = sqlite_exec(&mut registry, &["x".into(), "SELECT 1".into()]).unwrap_err();
        assert!(matches!(
            err,
            Error::ArgumentType { name: "sqlite_exec", position: 1, expected: "sqlite", actual: "text" }
        ));

        let err = sqlite_query(&mut registry, &[SessionId(1).into()]).unwrap_err();
        assert!(matches!(
            err,
            Error::ArgumentType { position: 2, expected: "text", actual: "nothing", .. }
        ));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_query_empty_text_through_surface() {
        let mut registry = Registry::new();
        let db = open(&mut registry);
        let rows = call(&mut registry, "sqlite_query", &[db, "".into()]).unwrap();
        assert_eq!(rows, Datum::Json(serde_json::json!([])));
    }

    #[test]
    fn test_query_and_close() {
        let mut registry = Registry::new();
        let db = open(&mut registry);
        call(&mut registry, "sqlite_exec", &[db.clone(), "CREATE TABLE t(x INT); INSERT INTO t VALUES (7)".into()]).unwrap();

        let rows = call(&mut registry, "sqlite_query", &[db.clone(), "SELECT x FROM t".into()]).unwrap();
        assert_eq!(rows, Datum::Json(serde_json::json!([{ "x": 7 }])));

        assert_eq!(call(&mut registry, "sqlite_close", &[db.clone()]).unwrap(), Datum::Void);
        let err = call(&mut registry, "sqlite_exec", &[db, "SELECT 1".into()]).unwrap_err();
        assert!(err.report().message.contains("does not exist"));
    }

    #[test]
    fn test_request_outcome() {
        let mut registry = Registry::new();
        let db = open(&mut registry);

        let outcome = Request::call(|| call(&mut registry, "sqlite_exec", &[db.clone(), "DROP TABLE nope".into()]));
        assert!(outcome.is_raised());

        let outcome = Request::call(|| call(&mut registry, "sqlite_exec", &[db.clone(), "SELECT 1".into()]));
        assert!(outcome.is_returned());
    }

    #[test]
    fn test_install_script() {
        let sql = install_script("omni_sqlite").unwrap();
        assert!(sql.contains("CREATE DOMAIN omni_sqlite.sqlite AS bigint;"));
        assert!(sql.contains(
            "CREATE FUNCTION omni_sqlite.sqlite_exec(db omni_sqlite.sqlite, query text) RETURNS omni_sqlite.sqlite"
        ));
        assert!(sql.contains("CREATE FUNCTION omni_sqlite.sqlite_close(db omni_sqlite.sqlite) RETURNS void"));
        assert_eq!(sql.matches("LANGUAGE C STRICT").count(), FUNCTIONS.len());
    }

    #[test]
    fn test_install_script_rejects_bad_schema() {
        assert!(install_script("public; DROP TABLE x").is_err());
        assert!(install_script("pg_catalog").is_err());
    }
}
