//! Connect-once accessor for the habit document store.
//!
//! # Responsibility
//! - Open the underlying SQLite connection at most once per store object.
//! - Hand out exclusive access to the connection for one operation at a time.
//!
//! # Invariants
//! - `connect` is idempotent: later calls never reopen the connection.
//! - `collection` fails with `DbError::Uninitialized` before `connect`.

use super::{open_db, open_db_in_memory, DbError, DbResult};
use log::info;
use once_cell::sync::OnceCell;
use rusqlite::Connection;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard};

/// Where the store keeps its documents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreTarget {
    File(PathBuf),
    Memory,
}

impl Display for StoreTarget {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::File(path) => write!(f, "{}", path.display()),
            Self::Memory => write!(f, ":memory:"),
        }
    }
}

/// Explicitly constructed store handle, owned by the process entry point and
/// shared with request handlers.
pub struct HabitStore {
    target: StoreTarget,
    conn: OnceCell<Mutex<Connection>>,
}

impl HabitStore {
    pub fn new(target: StoreTarget) -> Self {
        Self {
            target,
            conn: OnceCell::new(),
        }
    }

    /// Store backed by a database file at `path`.
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self::new(StoreTarget::File(path.into()))
    }

    /// Store backed by a private in-memory database.
    pub fn in_memory() -> Self {
        Self::new(StoreTarget::Memory)
    }

    pub fn target(&self) -> &StoreTarget {
        &self.target
    }

    pub fn is_connected(&self) -> bool {
        self.conn.get().is_some()
    }

    /// Opens the store if it is not open yet.
    ///
    /// # Errors
    /// - Returns the open/migration error; the store stays unconnected and a
    ///   later call may try again.
    pub fn connect(&self) -> DbResult<()> {
        self.conn.get_or_try_init(|| -> DbResult<Mutex<Connection>> {
            let conn = match &self.target {
                StoreTarget::File(path) => open_db(path)?,
                StoreTarget::Memory => open_db_in_memory()?,
            };
            info!(
                "event=store_connect module=db status=ok target={}",
                self.target
            );
            Ok(Mutex::new(conn))
        })?;
        Ok(())
    }

    /// Returns exclusive access to the open connection.
    ///
    /// # Errors
    /// - `DbError::Uninitialized` when `connect` has not succeeded yet.
    /// - `DbError::LockPoisoned` when a previous holder panicked.
    pub fn collection(&self) -> DbResult<MutexGuard<'_, Connection>> {
        let conn = self.conn.get().ok_or(DbError::Uninitialized)?;
        conn.lock().map_err(|_| DbError::LockPoisoned)
    }
}
