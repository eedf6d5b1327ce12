//! Execute-Command: run SQL text against an open handle, discarding rows

use crate::error::{Error, Result};
use crate::handle::Sqlite;
use crate::message::EngineMessage;
use rusqlite::ffi;
use std::ffi::CString;
use std::ptr;

/// Run `command` on `db` and hand the same handle back.
///
/// The text goes to `sqlite3_exec` unchanged, with no row callback, so any
/// rows the command produces are dropped. One attempt is made. On failure
/// the engine's diagnostic is copied into [`Error::ExecFailed`] and its
/// buffer is freed before returning.
///
/// Whatever the command does to the database (schema changes, writes,
/// pragmas, multiple `;`-separated statements) happens exactly as SQLite
/// defines it. Statements that ran before a failing one in the same text are
/// not undone here.
pub fn exec<'a>(db: &'a Sqlite, command: &str) -> Result<&'a Sqlite> {
    let sql = CString::new(command).map_err(|e| Error::NulInCommand {
        offset: e.nul_position(),
    })?;
    let raw = db.raw()?;

    tracing::debug!(id = %db.id(), len = command.len(), "exec");

    let mut msg = EngineMessage::empty();
    // SAFETY: `raw` is live while `db` is borrowed, `sql` is NUL-terminated
    // and outlives the call, and no callback or callback argument is given.
    let rc = unsafe { ffi::sqlite3_exec(raw, sql.as_ptr(), None, ptr::null_mut(), msg.as_out_ptr()) };

    if rc != ffi::SQLITE_OK {
        let message = msg.text_or_errstr(rc);
        tracing::warn!(id = %db.id(), code = rc, "exec failed: {}", message);
        return Err(Error::ExecFailed { code: rc, message });
    }

    Ok(db)
}
