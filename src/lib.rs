//! omni_sqlite - embedded SQLite sessions for a host database
//!
//! Lets users of the host database open SQLite databases and run commands
//! against them from SQL.
//!
//! # Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                      Host SQL dispatcher                        │
//! │           sqlite_exec(db, 'CREATE TABLE t(x INT)')              │
//! └───────────────────────────────┬─────────────────────────────────┘
//!                                 │  Datum args
//!                                 ▼
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                    functions (call / FUNCTIONS)                 │
//! │     arity + type checks, STRICT nulls, Error -> ERROR report    │
//! └───────────────┬─────────────────────────────────┬───────────────┘
//!                 │                                 │
//!                 ▼                                 ▼
//! ┌───────────────────────────────┐   ┌───────────────────────────────┐
//! │  registry (SessionId -> db)   │   │  omni_host                    │
//! │  handle (Sqlite, OpenOptions) │   │  ereport / abort / Request    │
//! └───────────────┬───────────────┘   └───────────────────────────────┘
//!                 │
//!                 ▼
//! ┌─────────────────────────────────────────────────────────────────┐
//! │      exec (sqlite3_exec, no callback)   query (rows -> JSON)    │
//! │      message (engine-owned errmsg, freed with sqlite3_free)     │
//! └───────────────────────────────┬─────────────────────────────────┘
//!                                 ▼
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                     SQLite (bundled, in-process)                │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```
//! use omni_sqlite::{exec, Sqlite};
//!
//! let db = Sqlite::open_in_memory()?;
//! let db = exec(&db, "CREATE TABLE t(x INT)")?;
//! let db = exec(db, "INSERT INTO t VALUES (1)")?;
//!
//! let err = exec(db, "INSERT INTO t VALUES (x)").unwrap_err();
//! assert_eq!(err.to_string(), "Failed to execute query: no such column: x");
//! # Ok::<(), omni_sqlite::Error>(())
//! ```

pub mod config;
pub mod error;
pub mod exec;
pub mod functions;
pub mod handle;
pub mod message;
pub mod query;
pub mod registry;
pub mod validation;

pub use error::{Error, Result};

pub use config::Config;
pub use exec::exec;
pub use functions::{call, install_script, Datum};
pub use handle::{OpenOptions, SessionId, Sqlite};
pub use query::{query, Row};
pub use registry::Registry;
