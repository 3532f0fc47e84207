//! SQLite database setup and connection lifecycle.
//!
//! The [`Database`] struct wraps a `rusqlite::Connection` behind an
//! `Arc<Mutex<>>` and exposes async methods that use
//! `tokio::task::spawn_blocking` to avoid blocking the async runtime.
//!
//! The lifecycle is explicit: construct with [`Database::open`] (or
//! [`Database::open_in_memory`] in tests), call [`Database::initialize`]
//! to create or upgrade the schema, use the store types, then
//! [`Database::close`]. Every data operation invoked before
//! `initialize()` fails with [`StoreError::NotInitialized`].

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use chrono::{SecondsFormat, Utc};
use rusqlite::Connection;
use tracing::{debug, info};

use crate::error::{StoreError, StoreResult};
use crate::migration;

/// Current time as an ISO 8601 string with millisecond precision,
/// e.g. `2024-01-01T00:00:00.000Z`. All persisted timestamps use this
/// format so lexicographic ordering matches chronological ordering.
pub(crate) fn now_iso() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Thread-safe handle to a SQLite database.
///
/// All read/write operations go through [`Database::execute`] which
/// dispatches onto the blocking thread pool via `tokio::task::spawn_blocking`.
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Option<Connection>>>,
    initialized: Arc<AtomicBool>,
}

impl Database {
    /// Open (or create) a database at `path` and apply pragmas.
    ///
    /// The schema is not touched here; call [`Database::initialize`]
    /// before using any store. This call blocks briefly (file I/O), so
    /// call it during startup or wrap it in `spawn_blocking` yourself.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref();
        info!(path = %path.display(), "opening database");

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        Self::apply_pragmas(&conn)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(Some(conn))),
            initialized: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Create an in-memory database — useful for tests.
    pub fn open_in_memory() -> StoreResult<Self> {
        debug!("opening in-memory database");

        let conn = Connection::open_in_memory()?;
        Self::apply_pragmas(&conn)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(Some(conn))),
            initialized: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Open the database at `path` and run all pending migrations.
    pub async fn open_and_initialize(path: impl AsRef<Path> + Send + 'static) -> StoreResult<Self> {
        let path = path.as_ref().to_path_buf();
        let db = tokio::task::spawn_blocking(move || Self::open(&path)).await??;
        db.initialize().await?;
        Ok(db)
    }

    /// Create the schema if absent and apply pending additive migrations.
    ///
    /// Idempotent: safe to call when the tables already exist, and safe
    /// to call against an older schema missing newer columns — those are
    /// added without touching existing rows. Must be called before any
    /// store operation.
    pub async fn initialize(&self) -> StoreResult<()> {
        let conn = Arc::clone(&self.conn);
        let initialized = Arc::clone(&self.initialized);
        tokio::task::spawn_blocking(move || {
            let guard = conn
                .lock()
                .map_err(|e| StoreError::TaskJoin(format!("mutex poisoned: {e}")))?;
            let conn = guard.as_ref().ok_or(StoreError::Closed)?;
            migration::run_all(conn)?;
            initialized.store(true, Ordering::SeqCst);
            Ok(())
        })
        .await?
    }

    /// Whether [`Database::initialize`] has completed on this handle.
    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::SeqCst)
    }

    /// Close the underlying connection.
    ///
    /// Subsequent operations on this handle (or any clone) fail with
    /// [`StoreError::Closed`]. Closing an already-closed database is a
    /// no-op.
    pub async fn close(&self) -> StoreResult<()> {
        let conn = Arc::clone(&self.conn);
        let initialized = Arc::clone(&self.initialized);
        tokio::task::spawn_blocking(move || {
            let mut guard = conn
                .lock()
                .map_err(|e| StoreError::TaskJoin(format!("mutex poisoned: {e}")))?;
            if let Some(c) = guard.take() {
                c.close().map_err(|(_, e)| StoreError::Sqlite(e))?;
                initialized.store(false, Ordering::SeqCst);
                debug!("database closed");
            }
            Ok(())
        })
        .await?
    }

    /// Execute an arbitrary closure against the connection on the blocking pool.
    ///
    /// This is the primary way the store types interact with the database.
    /// The closure receives a `&Connection` and must return a `StoreResult<T>`.
    ///
    /// # Example
    ///
    /// ```ignore
    /// let count: i64 = db.execute(|conn| {
    ///     let mut stmt = conn.prepare("SELECT count(*) FROM items")?;
    ///     let count = stmt.query_row([], |row| row.get(0))?;
    ///     Ok(count)
    /// }).await?;
    /// ```
    pub async fn execute<F, T>(&self, f: F) -> StoreResult<T>
    where
        F: FnOnce(&Connection) -> StoreResult<T> + Send + 'static,
        T: Send + 'static,
    {
        if !self.initialized.load(Ordering::SeqCst) {
            return Err(StoreError::NotInitialized);
        }

        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let guard = conn
                .lock()
                .map_err(|e| StoreError::TaskJoin(format!("mutex poisoned: {e}")))?;
            let conn = guard.as_ref().ok_or(StoreError::Closed)?;
            f(conn)
        })
        .await?
    }

    // ── pragmas ──────────────────────────────────────────────────────

    /// Apply pragmas to a fresh connection.
    fn apply_pragmas(conn: &Connection) -> StoreResult<()> {
        debug!("applying SQLite pragmas");

        // WAL mode: concurrent readers, non-blocking writes.
        conn.pragma_update(None, "journal_mode", "WAL")?;

        // NORMAL sync is safe with WAL — we only lose the last transaction
        // on a power failure, not corruption.
        conn.pragma_update(None, "synchronous", "NORMAL")?;

        // Foreign keys are OFF by default in SQLite. The items→groups
        // ON DELETE SET NULL and usage_records→items ON DELETE CASCADE
        // rules depend on this being ON.
        conn.pragma_update(None, "foreign_keys", "ON")?;

        // Busy timeout so a second handle waits instead of failing immediately.
        conn.pragma_update(None, "busy_timeout", 5_000_i32)?;

        Ok(())
    }
}

// ── tests ────────────────────────────────────────────────────────────
