//! Error types for omni_sqlite
//!
//! Every failure of an extension function ends up here before it is handed
//! to the host as an `ERROR` report.

use crate::handle::SessionId;
use omni_host::{Report, Severity, SqlState};
use std::os::raw::c_int;
use std::path::PathBuf;
use thiserror::Error;

/// The main error type for omni_sqlite operations
#[derive(Debug, Error)]
pub enum Error {
    // ==========================================================================
    // Engine Errors
    // ==========================================================================
    /// `sqlite3_exec` returned a status other than `SQLITE_OK`
    #[error("Failed to execute query: {message}")]
    ExecFailed { code: c_int, message: String },

    #[error("Failed to execute query: {message}")]
    QueryFailed {
        message: String,
        #[source]
        source: rusqlite::Error,
    },

    #[error("Command contains a NUL byte at offset {offset}")]
    NulInCommand { offset: usize },

    // ==========================================================================
    // Handle Errors
    // ==========================================================================
    #[error("Failed to open SQLite database '{location}': {source}")]
    OpenFailed {
        location: String,
        #[source]
        source: rusqlite::Error,
    },

    #[error("SQLite handle {id} is closed")]
    HandleClosed { id: SessionId },

    #[error("SQLite handle {id} does not exist")]
    UnknownHandle { id: SessionId },

    // ==========================================================================
    // Function Surface Errors
    // ==========================================================================
    #[error("Function {name} does not exist")]
    UnknownFunction { name: String },

    #[error("Function {name} expects {expected} argument(s), got {actual}")]
    WrongArity {
        name: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("Argument {position} of {name} must be {expected}, got {actual}")]
    ArgumentType {
        name: &'static str,
        position: usize,
        expected: &'static str,
        actual: &'static str,
    },

    // ==========================================================================
    // Validation Errors
    // ==========================================================================
    #[error("Invalid {kind} '{value}': {reason}")]
    InvalidIdentifier {
        kind: &'static str,
        value: String,
        reason: &'static str,
    },

    #[error("Reserved name '{name}' cannot be used")]
    ReservedName { name: String },

    // ==========================================================================
    // Configuration Errors
    // ==========================================================================
    #[error("Failed to read config '{path}': {source}")]
    ConfigReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {message}")]
    ConfigParseError { message: String },

}

/// Result type alias for omni_sqlite operations
pub type Result<T> = std::result::Result<T, Error>;

// =============================================================================
// Conversions from external error types
// =============================================================================

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Error::QueryFailed {
            message: engine_message(&err),
            source: err,
        }
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(err: serde_yaml::Error) -> Self {
        Error::ConfigParseError {
            message: err.to_string(),
        }
    }
}

impl From<crate::validation::ValidationError> for Error {
    fn from(err: crate::validation::ValidationError) -> Self {
        match err {
            crate::validation::ValidationError::InvalidIdentifier(value, reason) => {
                Error::InvalidIdentifier {
                    kind: "identifier",
                    value,
                    reason,
                }
            }
            crate::validation::ValidationError::TooLong(value, _max) => Error::InvalidIdentifier {
                kind: "identifier",
                value,
                reason: "exceeds maximum length",
            },
            crate::validation::ValidationError::Empty => Error::InvalidIdentifier {
                kind: "identifier",
                value: String::new(),
                reason: "cannot be empty",
            },
            crate::validation::ValidationError::Reserved(name) => Error::ReservedName { name },
        }
    }
}

/// The engine's own text for a rusqlite error, without rusqlite's wrapping
fn engine_message(err: &rusqlite::Error) -> String {
    match err {
        rusqlite::Error::SqliteFailure(_, Some(msg)) => msg.clone(),
        other => other.to_string(),
    }
}

// =============================================================================
// Host Reporting
// =============================================================================

impl Error {
    /// Returns a user-friendly suggestion for fixing the error
    pub fn suggestion(&self) -> Option<&'static str> {
        match self {
            Error::HandleClosed { .. } | Error::UnknownHandle { .. } => {
                Some("Open a new handle with sqlite_open() and retry")
            }
            Error::WrongArity { .. } | Error::ArgumentType { .. } => {
                Some("Check the function signature in the extension install script")
            }
            Error::InvalidIdentifier { .. } => {
                Some("Use only letters, digits, and underscores, starting with a letter")
            }
            _ => None,
        }
    }

    /// Returns true if the handle involved can still be used after this error
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Error::ExecFailed { .. } | Error::QueryFailed { .. } | Error::NulInCommand { .. }
        )
    }

    /// SQLSTATE the host reports this error under
    pub fn sqlstate(&self) -> SqlState {
        match self {
            Error::ExecFailed { .. } | Error::QueryFailed { .. } | Error::OpenFailed { .. } => {
                SqlState::EXTERNAL_ROUTINE_EXCEPTION
            }
            Error::NulInCommand { .. } => SqlState::CHARACTER_NOT_IN_REPERTOIRE,
            Error::HandleClosed { .. }
            | Error::UnknownHandle { .. }
            | Error::InvalidIdentifier { .. }
            | Error::ReservedName { .. } => SqlState::INVALID_PARAMETER_VALUE,
            Error::UnknownFunction { .. } | Error::WrongArity { .. } => {
                SqlState::UNDEFINED_FUNCTION
            }
            Error::ArgumentType { .. } => SqlState::DATATYPE_MISMATCH,
            Error::ConfigReadError { .. } | Error::ConfigParseError { .. } => {
                SqlState::INTERNAL_ERROR
            }
        }
    }

    /// Build the `ERROR` report the host raises for this error
    pub fn to_report(&self) -> Report {
        let mut report =
            Report::new(Severity::Error, self.to_string()).with_sqlstate(self.sqlstate());
        if let Error::ExecFailed { code, .. } = self {
            report = report.with_detail(format!("SQLite result code {}", code));
        }
        if let Some(hint) = self.suggestion() {
            report = report.with_hint(hint);
        }
        report
    }
}
