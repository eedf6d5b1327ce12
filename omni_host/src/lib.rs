//! omni_host - the host query-execution environment
//!
//! The pieces of the host database that an extension function consumes:
//!
//! - [`Severity`] - the levels a report can be raised at
//! - [`Report`] - a message with optional detail, hint and SQLSTATE
//! - [`ereport`] - emit a report; `ERROR` and above abort the request
//! - [`abort`] - emit a report that always aborts
//! - [`Request`] - runs one request and turns an abort into an [`Outcome`]
//!
//! # Example
//!
//! ```
//! use omni_host::{ereport, Outcome, Report, Request, Severity};
//!
//! let outcome: Outcome<i32> = Request::call(|| {
//!     ereport(Report::new(Severity::Notice, "about to fail"))?;
//!     ereport(Report::new(Severity::Error, "Failed to execute query: boom"))?;
//!     Ok(1)
//! });
//!
//! assert!(outcome.is_raised());
//! ```

mod error;
mod report;
mod request;

pub use error::HostError;
pub use report::{ereport, Report, Severity, SqlState};
pub use request::{Outcome, Request};

/// Emit `report` and turn it into the error that aborts the request.
///
/// Reports below `ERROR` are raised to `ERROR`.
pub fn abort(mut report: Report) -> HostError {
    if !report.severity.aborts() {
        report.severity = Severity::Error;
    }
    report.emit();
    HostError::Raised(report)
}
