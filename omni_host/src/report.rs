//! Severity-tagged reports, the host's error-reporting facility
//!
//! Mirrors the shape of a server-side `ereport(level, errcode(..), errmsg(..),
//! errdetail(..), errhint(..))` call. Reports below [`Severity::Error`] are
//! logged and control returns to the caller; reports at or above it abort
//! the request.

use crate::error::HostError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Report severity, ordered from least to most severe
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Debug,
    Log,
    Info,
    Notice,
    Warning,
    Error,
    Fatal,
    Panic,
}

impl Severity {
    /// Whether a report at this level aborts the current request
    pub fn aborts(self) -> bool {
        self >= Severity::Error
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Debug => "DEBUG",
            Severity::Log => "LOG",
            Severity::Info => "INFO",
            Severity::Notice => "NOTICE",
            Severity::Warning => "WARNING",
            Severity::Error => "ERROR",
            Severity::Fatal => "FATAL",
            Severity::Panic => "PANIC",
        }
    }
}

impl Default for Severity {
    fn default() -> Self {
        Self::Notice
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A five-character SQLSTATE code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SqlState(&'static str);

impl SqlState {
    /// `XX000` internal_error, the code of a plain `elog(ERROR)`
    pub const INTERNAL_ERROR: SqlState = SqlState("XX000");
    /// `38000` external_routine_exception
    pub const EXTERNAL_ROUTINE_EXCEPTION: SqlState = SqlState("38000");
    /// `22023` invalid_parameter_value
    pub const INVALID_PARAMETER_VALUE: SqlState = SqlState("22023");
    /// `42883` undefined_function
    pub const UNDEFINED_FUNCTION: SqlState = SqlState("42883");
    /// `42804` datatype_mismatch
    pub const DATATYPE_MISMATCH: SqlState = SqlState("42804");
    /// `22021` character_not_in_repertoire
    pub const CHARACTER_NOT_IN_REPERTOIRE: SqlState = SqlState("22021");

    pub fn code(&self) -> &'static str {
        self.0
    }
}

impl Default for SqlState {
    fn default() -> Self {
        Self::INTERNAL_ERROR
    }
}

impl fmt::Display for SqlState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// A single report
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub severity: Severity,
    pub sqlstate: SqlState,
    /// Primary message (`errmsg`)
    pub message: String,
    /// Secondary message (`errdetail`)
    pub detail: Option<String>,
    /// Suggestion for the user (`errhint`)
    pub hint: Option<String>,
}

impl Report {
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            severity,
            sqlstate: SqlState::default(),
            message: message.into(),
            detail: None,
            hint: None,
        }
    }

    pub fn with_sqlstate(mut self, sqlstate: SqlState) -> Self {
        self.sqlstate = sqlstate;
        self
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    /// Write the report to the server log
    pub(crate) fn emit(&self) {
        let detail = self.detail.as_deref().unwrap_or("");
        let hint = self.hint.as_deref().unwrap_or("");
        match self.severity {
            Severity::Debug => {
                tracing::debug!(sqlstate = %self.sqlstate, detail, hint, "{}", self.message)
            }
            Severity::Log | Severity::Info | Severity::Notice => {
                tracing::info!(severity = %self.severity, sqlstate = %self.sqlstate, detail, hint, "{}", self.message)
            }
            Severity::Warning => {
                tracing::warn!(sqlstate = %self.sqlstate, detail, hint, "{}", self.message)
            }
            Severity::Error | Severity::Fatal | Severity::Panic => {
                tracing::error!(severity = %self.severity, sqlstate = %self.sqlstate, detail, hint, "{}", self.message)
            }
        }
    }
}

/// Emit a report.
///
/// Returns `Ok(())` for non-aborting severities. For `ERROR` and above the
/// report comes back as [`HostError::Raised`]; propagate it with `?` so the
/// calling request ends without a normal result.
pub fn ereport(report: Report) -> Result<(), HostError> {
    report.emit();
    if report.severity.aborts() {
        Err(HostError::Raised(report))
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Debug < Severity::Notice);
        assert!(Severity::Warning < Severity::Error);
        assert!(Severity::Error < Severity::Fatal);
    }

    #[test]
    fn test_severity_aborts() {
        assert!(!Severity::Warning.aborts());
        assert!(Severity::Error.aborts());
        assert!(Severity::Panic.aborts());
    }

    #[test]
    fn test_report_builder() {
        let report = Report::new(Severity::Error, "boom")
            .with_sqlstate(SqlState::EXTERNAL_ROUTINE_EXCEPTION)
            .with_detail("SQLite status SQLITE_ERROR")
            .with_hint("check the statement");

        assert_eq!(report.sqlstate.code(), "38000");
        assert_eq!(report.detail.as_deref(), Some("SQLite status SQLITE_ERROR"));
        assert_eq!(report.hint.as_deref(), Some("check the statement"));
    }

    #[test]
    fn test_ereport_error_returns_report() {
        let err = ereport(Report::new(Severity::Fatal, "gone")).unwrap_err();
        assert_eq!(err.report().severity, Severity::Fatal);
        assert_eq!(err.into_report().message, "gone");
    }

    #[test]
    fn test_severity_from_yaml_name() {
        let severity: Severity = severity_from_name("warning");
        assert_eq!(severity, Severity::Warning);
    }

    fn severity_from_name(name: &str) -> Severity {
        use serde::de::value::{Error, StrDeserializer};
        use serde::de::IntoDeserializer;
        let de: StrDeserializer<'_, Error> = name.into_deserializer();
        Severity::deserialize(de).unwrap()
    }
}
