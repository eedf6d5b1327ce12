//! Connection handles
//!
//! A [`Sqlite`] is one open session against the embedded engine. The host
//! only ever sees its [`SessionId`]; the handle itself stays in the
//! [`Registry`](crate::registry::Registry) of the backend that opened it.

use crate::error::{Error, Result};
use rusqlite::{ffi, Connection, OpenFlags};
use std::ffi::CStr;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Location string that opens a private in-memory database
pub const MEMORY: &str = ":memory:";

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

/// Opaque identity of an open session
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SessionId(pub u64);

impl SessionId {
    fn next() -> Self {
        Self(NEXT_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sqlite:{}", self.0)
    }
}

/// How a database file is opened
#[derive(Debug, Clone)]
pub struct OpenOptions {
    pub read_only: bool,
    /// Create the file if it does not exist (ignored when `read_only`)
    pub create: bool,
    pub busy_timeout: Option<Duration>,
}

impl Default for OpenOptions {
    fn default() -> Self {
        Self {
            read_only: false,
            create: true,
            busy_timeout: None,
        }
    }
}

impl OpenOptions {
    fn flags(&self) -> OpenFlags {
        let base = OpenFlags::SQLITE_OPEN_URI | OpenFlags::SQLITE_OPEN_NO_MUTEX;
        if self.read_only {
            base | OpenFlags::SQLITE_OPEN_READ_ONLY
        } else if self.create {
            base | OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_CREATE
        } else {
            base | OpenFlags::SQLITE_OPEN_READ_WRITE
        }
    }
}

/// An open embedded-database session
pub struct Sqlite {
    id: SessionId,
    location: String,
    conn: Option<Connection>,
}

impl Sqlite {
    /// Open a fresh private in-memory database
    pub fn open_in_memory() -> Result<Self> {
        Self::open(MEMORY, &OpenOptions::default())
    }

    /// Open the database at `location` (a path, a `file:` URI, or `:memory:`)
    ///
    /// `options` applies to in-memory databases too; a read-only one stays
    /// empty.
    pub fn open(location: &str, options: &OpenOptions) -> Result<Self> {
        let conn = if location == MEMORY {
            Connection::open_in_memory_with_flags(options.flags())
        } else {
            Connection::open_with_flags(location, options.flags())
        }
        .map_err(|source| Error::OpenFailed {
            location: location.to_string(),
            source,
        })?;

        if let Some(timeout) = options.busy_timeout {
            conn.busy_timeout(timeout).map_err(|source| Error::OpenFailed {
                location: location.to_string(),
                source,
            })?;
        }

        let id = SessionId::next();
        tracing::info!(%id, location, read_only = options.read_only, "opened SQLite session");

        Ok(Self {
            id,
            location: location.to_string(),
            conn: Some(conn),
        })
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn is_open(&self) -> bool {
        self.conn.is_some()
    }

    /// The underlying rusqlite connection, if the session is still open
    pub fn connection(&self) -> Result<&Connection> {
        self.conn
            .as_ref()
            .ok_or(Error::HandleClosed { id: self.id })
    }

    /// Raw engine pointer for direct C API calls.
    ///
    /// The pointer is valid for as long as `self` is borrowed and open.
    pub(crate) fn raw(&self) -> Result<*mut ffi::sqlite3> {
        let conn = self.connection()?;
        // SAFETY: the pointer is only handed to engine calls made while
        // `conn` is borrowed, and never closed through it.
        Ok(unsafe { conn.handle() })
    }

    /// Copy of the engine's error-message slot for this session.
    ///
    /// Reflects the most recent failed call; `"not an error"` otherwise.
    pub fn engine_message(&self) -> Result<String> {
        let db = self.raw()?;
        // SAFETY: `db` is a live connection; sqlite3_errmsg returns an
        // engine-owned, NUL-terminated string valid until the next call.
        let text = unsafe { CStr::from_ptr(ffi::sqlite3_errmsg(db)) };
        Ok(text.to_string_lossy().into_owned())
    }

    /// Close the session. Closing an already closed handle is an error.
    pub fn close(&mut self) -> Result<()> {
        let conn = self.conn.take().ok_or(Error::HandleClosed { id: self.id })?;
        if let Err((conn, source)) = conn.close() {
            self.conn = Some(conn);
            return Err(Error::from(source));
        }
        tracing::info!(id = %self.id, "closed SQLite session");
        Ok(())
    }
}

impl fmt::Debug for Sqlite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sqlite")
            .field("id", &self.id)
            .field("location", &self.location)
            .field("open", &self.is_open())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_open_in_memory() {
        let db = Sqlite::open_in_memory().unwrap();
        assert!(db.is_open());
        assert_eq!(db.location(), MEMORY);
        assert!(db.connection().is_ok());
    }

    #[test]
    fn test_ids_are_unique() {
        let a = Sqlite::open_in_memory().unwrap();
        let b = Sqlite::open_in_memory().unwrap();
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn test_close_twice_fails() {
        let mut db = Sqlite::open_in_memory().unwrap();
        db.close().unwrap();
        assert!(!db.is_open());

        let err = db.close().unwrap_err();
        assert!(matches!(err, Error::HandleClosed { id } if id == db.id()));
        assert!(db.connection().is_err());
    }

    #[test]
    fn test_open_missing_file_without_create() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("missing.db");
        let options = OpenOptions {
            create: false,
            ..OpenOptions::default()
        };

        let result = Sqlite::open(path.to_str().unwrap(), &options);
        assert!(matches!(result, Err(Error::OpenFailed { .. })));
        assert!(!path.exists());
    }

    #[test]
    fn test_read_only_in_memory() {
        let options = OpenOptions {
            read_only: true,
            ..OpenOptions::default()
        };
        let db = Sqlite::open(MEMORY, &options).unwrap();

        let err = db
            .connection()
            .unwrap()
            .execute_batch("CREATE TABLE t(x INT)")
            .unwrap_err();
        assert!(err.to_string().contains("readonly"), "got: {}", err);
    }

    #[test]
    fn test_engine_message_before_any_error() {
        let db = Sqlite::open_in_memory().unwrap();
        assert_eq!(db.engine_message().unwrap(), "not an error");
    }

    #[test]
    fn test_session_id_display() {
        assert_eq!(SessionId(7).to_string(), "sqlite:7");
    }
}
