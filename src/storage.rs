use std::fs;
use std::path::{Path, PathBuf};

use rusqlite::functions::FunctionFlags;
use rusqlite::{Connection, OpenFlags, OptionalExtension};
use tracing::debug;

use crate::error::{Error, Result};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS task_statuses (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    category TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS task_priorities (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    level INTEGER NOT NULL DEFAULT 0
);
CREATE TABLE IF NOT EXISTS task_categories (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS tasks (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    description TEXT,
    category_id INTEGER,
    priority_id INTEGER NOT NULL,
    status_id INTEGER NOT NULL,
    deadline TEXT,
    expected_date TEXT,
    completed_at TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS tasks_status_id ON tasks (status_id);
";

/// Returns the path to the SQLite database file.
///
/// The path is determined in the following order:
/// 1. `TODO_DB` environment variable.
/// 2. `~/.todo/database.sqlite`.
/// 3. `./.todo/database.sqlite` (fallback when no home directory is known).
///
/// The `--db` flag of the binary takes precedence over all of these.
pub fn db_path() -> PathBuf {
    std::env::var("TODO_DB").map(PathBuf::from).unwrap_or_else(|_| {
        let mut p = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        p.push(".todo");
        p.push("database.sqlite");
        p
    })
}

/// Handle on the task database.
///
/// Reference data operations live in [`crate::reference`], task operations in
/// [`crate::repository`].
pub struct Store {
    pub(crate) conn: Connection,
}

impl Store {
    /// Opens an existing database without creating it.
    ///
    /// A missing file means the tool was never installed.
    pub fn open(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "database file missing");
            return Err(Error::NotInstalled);
        }
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        debug!(path = %path.display(), "opened database");
        Store::with_connection(conn)
    }

    /// Opens the database, creating the file, its directory and the schema
    /// when absent. Safe to call on an already initialised database.
    pub fn create(path: &Path) -> Result<Self> {
        if let Some(dir) = path.parent() {
            if !dir.as_os_str().is_empty() && !dir.exists() {
                fs::create_dir_all(dir)?;
            }
        }
        let store = Store::with_connection(Connection::open(path)?)?;
        store.migrate()?;
        debug!(path = %path.display(), "database ready");
        Ok(store)
    }

    /// A fresh database held in memory, schema applied.
    pub fn open_in_memory() -> Result<Self> {
        let store = Store::with_connection(Connection::open_in_memory()?)?;
        store.migrate()?;
        Ok(store)
    }

    /// Wraps `conn` and registers `fold_case(text)`, a Unicode-aware
    /// lowercase. SQLite's own `lower()` and `LIKE` only fold ASCII.
    fn with_connection(conn: Connection) -> Result<Self> {
        conn.create_scalar_function(
            "fold_case",
            1,
            FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
            |ctx| Ok(ctx.get::<Option<String>>(0)?.map(|text| text.to_lowercase())),
        )?;
        Ok(Store { conn })
    }

    /// Runs `f` inside one transaction. Any error rolls back everything `f`
    /// wrote.
    pub fn in_transaction<T>(&self, f: impl FnOnce(&Store) -> Result<T>) -> Result<T> {
        let tx = self.conn.unchecked_transaction()?;
        let value = f(self)?;
        tx.commit()?;
        Ok(value)
    }

    pub fn migrate(&self) -> Result<()> {
        self.conn.execute_batch(SCHEMA)?;
        Ok(())
    }

    /// True when the schema exists and at least one status is configured.
    pub fn is_installed(&self) -> Result<bool> {
        let has_table: Option<i64> = self
            .conn
            .query_row(
                "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = 'task_statuses'",
                [],
                |row| row.get(0),
            )
            .optional()?;
        if has_table.is_none() {
            return Ok(false);
        }
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM task_statuses", [], |row| row.get(0))?;
        Ok(count > 0)
    }

    /// Pre-flight check run before every command except install.
    pub fn ensure_installed(&self) -> Result<()> {
        if self.is_installed()? {
            Ok(())
        } else {
            Err(Error::NotInstalled)
        }
    }
}
