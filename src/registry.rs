//! Session registry
//!
//! The handles opened by one host backend. A backend runs one request at a
//! time, so the registry is borrowed mutably by that request and does no
//! locking of its own.

use crate::error::{Error, Result};
use crate::handle::{OpenOptions, SessionId, Sqlite};
use std::collections::BTreeMap;

#[derive(Debug, Default)]
pub struct Registry {
    sessions: BTreeMap<SessionId, Sqlite>,
    defaults: OpenOptions,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry whose `open` calls use `defaults`
    pub fn with_options(defaults: OpenOptions) -> Self {
        Self {
            sessions: BTreeMap::new(),
            defaults,
        }
    }

    /// Open `location` and keep the session
    pub fn open(&mut self, location: &str) -> Result<SessionId> {
        let db = Sqlite::open(location, &self.defaults)?;
        let id = db.id();
        self.sessions.insert(id, db);
        Ok(id)
    }

    pub fn get(&self, id: SessionId) -> Result<&Sqlite> {
        self.sessions.get(&id).ok_or(Error::UnknownHandle { id })
    }

    /// Close a session and forget it.
    ///
    /// If the engine refuses to close, the session stays registered.
    pub fn close(&mut self, id: SessionId) -> Result<()> {
        let db = self
            .sessions
            .get_mut(&id)
            .ok_or(Error::UnknownHandle { id })?;
        db.close()?;
        self.sessions.remove(&id);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = SessionId> + '_ {
        self.sessions.keys().copied()
    }
}
