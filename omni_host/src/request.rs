//! Request scope
//!
//! A request is one call from the host's SQL dispatcher into extension code.
//! It either returns a value or is aborted by an `ERROR`-level report. No
//! intermediate states exist.

use crate::error::HostError;
use crate::report::Report;

/// Terminal state of a request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome<T> {
    /// The function returned normally
    Returned(T),
    /// The function raised; the host rolls back the enclosing transaction
    Raised(Report),
}

impl<T> Outcome<T> {
    pub fn is_returned(&self) -> bool {
        matches!(self, Outcome::Returned(_))
    }

    pub fn is_raised(&self) -> bool {
        matches!(self, Outcome::Raised(_))
    }
}

/// Runs extension code as a single host request
pub struct Request;

impl Request {
    /// Run `f` to completion, blocking the caller until it returns
    pub fn call<T, F>(f: F) -> Outcome<T>
    where
        F: FnOnce() -> Result<T, HostError>,
    {
        match f() {
            Ok(value) => Outcome::Returned(value),
            Err(err) => {
                let report = err.into_report();
                tracing::debug!(sqlstate = %report.sqlstate, "request aborted");
                Outcome::Raised(report)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::{ereport, Severity};

    #[test]
    fn test_returned() {
        let outcome = Request::call(|| Ok::<_, HostError>(42));
        assert_eq!(outcome, Outcome::Returned(42));
    }

    #[test]
    fn test_raised_skips_rest_of_request() {
        let mut reached = false;
        let outcome: Outcome<()> = Request::call(|| {
            ereport(Report::new(Severity::Error, "stop"))?;
            reached = true;
            Ok(())
        });

        assert!(!reached);
        match outcome {
            Outcome::Raised(report) => assert_eq!(report.message, "stop"),
            Outcome::Returned(_) => panic!("Expected Raised"),
        }
    }
}
