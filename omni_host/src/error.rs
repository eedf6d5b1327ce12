//! Error type for host reports that abort the current request

use crate::report::Report;
use thiserror::Error;

/// A report raised at `ERROR` level or above.
///
/// Returning this from an extension function is the typed equivalent of the
/// host's non-local abort: the request stops, and rollback of the enclosing
/// transaction or savepoint is left to the host.
#[derive(Debug, Clone, Error)]
pub enum HostError {
    #[error("{}: {}", .0.severity, .0.message)]
    Raised(Report),
}

impl HostError {
    /// The report that caused the abort
    pub fn report(&self) -> &Report {
        match self {
            HostError::Raised(report) => report,
        }
    }

    /// Consume the error, returning its report
    pub fn into_report(self) -> Report {
        match self {
            HostError::Raised(report) => report,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::Severity;

    #[test]
    fn test_error_display() {
        let err = HostError::Raised(Report::new(
            Severity::Error,
            "Failed to execute query: no such table: t",
        ));
        assert_eq!(
            err.to_string(),
            "ERROR: Failed to execute query: no such table: t"
        );
    }
}
