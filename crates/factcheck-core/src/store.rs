//! Persisted [`AccumulatedState`] behind an atomic read-modify-write primitive.
//!
//! All writers go through [`StateStore::read_modify_write`], which re-reads
//! the latest stored value, applies the caller's mutation and writes the
//! result back as one unit. Interleaved request completions therefore never
//! overwrite each other's increments, decrements or prepended batches.
//!
//! The SQLite layout is a two-row key-value table:
//!
//! | key                | value                               |
//! |--------------------|-------------------------------------|
//! | `factCheckResults` | JSON array of fact-check records    |
//! | `pendingChecks`    | non-negative integer (JSON number)  |

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use rusqlite::{Connection, OpenFlags, OptionalExtension, TransactionBehavior, params};
use thiserror::Error;

use crate::{AccumulatedState, FactCheckRecord};

pub const RESULTS_KEY: &str = "factCheckResults";
pub const PENDING_KEY: &str = "pendingChecks";

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("stored value for {key} is corrupt")]
    Corrupt { key: &'static str },
    #[error("state lock poisoned")]
    Poisoned,
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Storage for the accumulated fact-check state.
pub trait StateStore: Send + Sync {
    /// Read the current state.
    fn load(&self) -> Result<AccumulatedState, StoreError>;

    /// Atomically read the latest state, apply `f`, and persist the result.
    ///
    /// Returns the state as written.
    fn read_modify_write(
        &self,
        f: &mut dyn FnMut(&mut AccumulatedState),
    ) -> Result<AccumulatedState, StoreError>;
}

/// In-process state, lost on exit.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<AccumulatedState>,
}

impl MemoryStore {
    pub fn new(state: AccumulatedState) -> Self {
        Self {
            state: Mutex::new(state),
        }
    }
}

impl StateStore for MemoryStore {
    fn load(&self) -> Result<AccumulatedState, StoreError> {
        let state = self.state.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(state.clone())
    }

    fn read_modify_write(
        &self,
        f: &mut dyn FnMut(&mut AccumulatedState),
    ) -> Result<AccumulatedState, StoreError> {
        let mut state = self.state.lock().map_err(|_| StoreError::Poisoned)?;
        f(&mut state);
        Ok(state.clone())
    }
}

/// Open a SQLite connection with WAL mode and standard pragmas.
fn open_sqlite(path: &Path) -> Result<Connection, rusqlite::Error> {
    let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
        | OpenFlags::SQLITE_OPEN_CREATE
        | OpenFlags::SQLITE_OPEN_NO_MUTEX;
    let conn = Connection::open_with_flags(path, flags)?;
    conn.execute_batch(
        "PRAGMA journal_mode = WAL;
         PRAGMA synchronous = NORMAL;
         PRAGMA busy_timeout = 5000;",
    )?;
    Ok(conn)
}

/// Persistent key-value state backed by SQLite.
pub struct SqliteStore {
    path: PathBuf,
    conn: Mutex<Connection>,
}

impl std::fmt::Debug for SqliteStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteStore")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl SqliteStore {
    /// Open (or create) the store at `path`. A fresh file is seeded with an
    /// empty result list and a zero pending count.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let conn = open_sqlite(path)?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS kv (
                 key   TEXT PRIMARY KEY,
                 value TEXT NOT NULL
             );",
        )?;
        conn.execute(
            "INSERT OR IGNORE INTO kv (key, value) VALUES (?1, '[]')",
            params![RESULTS_KEY],
        )?;
        conn.execute(
            "INSERT OR IGNORE INTO kv (key, value) VALUES (?1, '0')",
            params![PENDING_KEY],
        )?;
        Ok(Self {
            path: path.to_path_buf(),
            conn: Mutex::new(conn),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Zero a pending count left behind by a process that exited with requests
/// still in flight. Results are kept. Returns the stale count.
pub fn reset_pending(store: &dyn StateStore) -> Result<u32, StoreError> {
    let mut stale = 0;
    store.read_modify_write(&mut |state| {
        stale = state.pending_checks;
        state.pending_checks = 0;
    })?;
    if stale > 0 {
        tracing::info!(stale, "reset pending count from previous session");
    }
    Ok(stale)
}

fn read_value(conn: &Connection, key: &'static str) -> Result<Option<String>, StoreError> {
    Ok(conn
        .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
            row.get(0)
        })
        .optional()?)
}

fn read_state(conn: &Connection) -> Result<AccumulatedState, StoreError> {
    let results: Vec<FactCheckRecord> = match read_value(conn, RESULTS_KEY)? {
        Some(json) => {
            serde_json::from_str(&json).map_err(|_| StoreError::Corrupt { key: RESULTS_KEY })?
        }
        None => Vec::new(),
    };
    let pending_checks: u32 = match read_value(conn, PENDING_KEY)? {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| StoreError::Corrupt { key: PENDING_KEY })?,
        None => 0,
    };
    Ok(AccumulatedState {
        results,
        pending_checks,
    })
}

fn write_state(conn: &Connection, state: &AccumulatedState) -> Result<(), StoreError> {
    let results = serde_json::to_string(&state.results)?;
    conn.execute(
        "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
        params![RESULTS_KEY, results],
    )?;
    conn.execute(
        "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
        params![PENDING_KEY, state.pending_checks.to_string()],
    )?;
    Ok(())
}

impl StateStore for SqliteStore {
    fn load(&self) -> Result<AccumulatedState, StoreError> {
        let conn = self.conn.lock().map_err(|_| StoreError::Poisoned)?;
        read_state(&conn)
    }

    fn read_modify_write(
        &self,
        f: &mut dyn FnMut(&mut AccumulatedState),
    ) -> Result<AccumulatedState, StoreError> {
        let mut conn = self.conn.lock().map_err(|_| StoreError::Poisoned)?;
        // IMMEDIATE takes the write lock up front so another process sharing
        // the file cannot slip a write between our read and our write.
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let mut state = read_state(&tx)?;
        f(&mut state);
        write_state(&tx, &state)?;
        tx.commit()?;
        tracing::trace!(
            results = state.results.len(),
            pending = state.pending_checks,
            "state written"
        );
        Ok(state)
    }
}
