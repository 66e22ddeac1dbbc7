//! SQLite connection implementation.
//!
//! Safe RAII wrapper around a `sqlite3*` handle, implementing the
//! `Connection` trait from siderite-core.
//!
//! A `SqliteConnection` is single-owner: it carries no internal lock, so it
//! is `Send` but not `Sync`. Callers who want to share one connection
//! across threads must serialize access themselves.

// FFI code needs casts that match C types exactly
#![allow(clippy::cast_possible_truncation)]

use crate::ffi;
use crate::statement::Statement;
use siderite_core::{
    Connection, Error, Result, Row, Value,
    error::{ConnectionError, ConnectionErrorKind, QueryError, QueryErrorKind},
};
use std::ffi::{CStr, CString, c_int};
use std::ptr;

/// Configuration for opening SQLite connections.
#[derive(Debug, Clone)]
pub struct SqliteConfig {
    /// Path to the database file, or ":memory:" for an in-memory database.
    pub path: String,
    /// Open flags (read-only, read-write, create, ...).
    pub flags: OpenFlags,
    /// Busy timeout in milliseconds. Zero disables the handler.
    pub busy_timeout_ms: u32,
}

/// Flags controlling how the database is opened.
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenFlags {
    /// Open for reading only.
    pub read_only: bool,
    /// Open for reading and writing.
    pub read_write: bool,
    /// Create the database if it doesn't exist.
    pub create: bool,
    /// Enable URI filename interpretation.
    pub uri: bool,
    /// Open in multi-thread mode (no per-connection mutex in the engine).
    pub no_mutex: bool,
    /// Open in serialized mode (engine-level mutex around every call).
    pub full_mutex: bool,
}

impl OpenFlags {
    /// Flags for read-only access.
    pub fn read_only() -> Self {
        Self {
            read_only: true,
            ..Default::default()
        }
    }

    /// Flags for read-write access (database must exist).
    pub fn read_write() -> Self {
        Self {
            read_write: true,
            ..Default::default()
        }
    }

    /// Flags for read-write access, creating the database if needed.
    pub fn create_read_write() -> Self {
        Self {
            read_write: true,
            create: true,
            ..Default::default()
        }
    }

    fn to_sqlite_flags(self) -> c_int {
        let mut flags = 0;

        if self.read_only {
            flags |= ffi::SQLITE_OPEN_READONLY;
        }
        if self.read_write {
            flags |= ffi::SQLITE_OPEN_READWRITE;
        }
        if self.create {
            flags |= ffi::SQLITE_OPEN_CREATE;
        }
        if self.uri {
            flags |= ffi::SQLITE_OPEN_URI;
        }
        if self.no_mutex {
            flags |= ffi::SQLITE_OPEN_NOMUTEX;
        }
        if self.full_mutex {
            flags |= ffi::SQLITE_OPEN_FULLMUTEX;
        }

        // Default to read-write if no mode specified
        if flags & (ffi::SQLITE_OPEN_READONLY | ffi::SQLITE_OPEN_READWRITE) == 0 {
            flags |= ffi::SQLITE_OPEN_READWRITE | ffi::SQLITE_OPEN_CREATE;
        }

        flags
    }
}

impl Default for SqliteConfig {
    fn default() -> Self {
        Self {
            path: ":memory:".to_string(),
            flags: OpenFlags::create_read_write(),
            busy_timeout_ms: 5000,
        }
    }
}

impl SqliteConfig {
    /// Config for a file-based database.
    pub fn file(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Default::default()
        }
    }

    /// Config for an in-memory database.
    pub fn memory() -> Self {
        Self::default()
    }

    /// Set open flags.
    pub fn flags(mut self, flags: OpenFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Set the busy timeout.
    pub fn busy_timeout(mut self, ms: u32) -> Self {
        self.busy_timeout_ms = ms;
        self
    }
}

/// A connection to a SQLite database.
pub struct SqliteConnection {
    db: *mut ffi::sqlite3,
    path: String,
}

// SAFETY: a sqlite3 handle may move between threads as long as only one
// thread uses it at a time, which is exactly the single-owner contract of
// this type. It is deliberately not Sync.
unsafe impl Send for SqliteConnection {}

impl SqliteConnection {
    /// Open a connection with the given configuration.
    pub fn open(config: &SqliteConfig) -> Result<Self> {
        let c_path = CString::new(config.path.as_str()).map_err(|_| {
            Error::Connection(ConnectionError {
                kind: ConnectionErrorKind::InvalidInput,
                code: None,
                message: "invalid path: contains NUL byte".to_string(),
            })
        })?;

        let mut db: *mut ffi::sqlite3 = ptr::null_mut();
        let flags = config.flags.to_sqlite_flags();

        // SAFETY: we pass valid pointers and check the return value
        let rc = unsafe { ffi::sqlite3_open_v2(c_path.as_ptr(), &mut db, flags, ptr::null()) };

        if rc != ffi::SQLITE_OK {
            let message = if db.is_null() {
                ffi::error_string(rc).to_string()
            } else {
                // SAFETY: db is valid, errmsg returns a valid C string
                unsafe {
                    let msg = CStr::from_ptr(ffi::sqlite3_errmsg(db))
                        .to_string_lossy()
                        .into_owned();
                    ffi::sqlite3_close(db);
                    msg
                }
            };

            return Err(Error::Connection(ConnectionError {
                kind: ConnectionErrorKind::Open,
                code: Some(rc),
                message: format!("failed to open database: {}", message),
            }));
        }

        if config.busy_timeout_ms > 0 {
            // SAFETY: db is valid
            unsafe {
                ffi::sqlite3_busy_timeout(db, config.busy_timeout_ms as c_int);
            }
        }

        tracing::debug!(path = %config.path, "opened sqlite database");

        Ok(Self {
            db,
            path: config.path.clone(),
        })
    }

    /// Open an in-memory database.
    pub fn open_memory() -> Result<Self> {
        Self::open(&SqliteConfig::memory())
    }

    /// Open a file-based database.
    pub fn open_file(path: impl Into<String>) -> Result<Self> {
        Self::open(&SqliteConfig::file(path))
    }

    /// The database path this connection was opened with.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The raw handle, for the statement wrapper.
    pub(crate) fn handle(&self) -> *mut ffi::sqlite3 {
        self.db
    }

    /// Prepare a statement for execution.
    pub fn prepare(&self, sql: &str) -> Result<Statement<'_>> {
        Statement::prepare(self, sql)
    }

    /// Execute SQL directly without binding (DDL, pragmas, batches).
    pub fn execute_raw(&self, sql: &str) -> Result<()> {
        let c_sql = CString::new(sql).map_err(|_| nul_byte_error(sql))?;
        let mut errmsg: *mut std::ffi::c_char = ptr::null_mut();

        // SAFETY: all pointers are valid
        let rc = unsafe {
            ffi::sqlite3_exec(self.db, c_sql.as_ptr(), None, ptr::null_mut(), &mut errmsg)
        };

        if rc != ffi::SQLITE_OK {
            let message = if errmsg.is_null() {
                ffi::error_string(rc).to_string()
            } else {
                // SAFETY: errmsg is a valid C string allocated by sqlite
                unsafe {
                    let msg = CStr::from_ptr(errmsg).to_string_lossy().into_owned();
                    ffi::sqlite3_free(errmsg.cast());
                    msg
                }
            };

            return Err(Error::Query(QueryError {
                kind: error_code_to_kind(rc),
                code: Some(rc),
                sql: Some(sql.to_string()),
                message,
            }));
        }

        Ok(())
    }

    /// Number of rows changed by the most recent statement.
    pub fn changes(&self) -> u64 {
        // SAFETY: db is valid
        unsafe { ffi::sqlite3_changes(self.db) as u64 }
    }

    /// Interrupt any in-progress operation on this connection.
    pub fn interrupt(&self) {
        // SAFETY: db is valid
        unsafe { ffi::sqlite3_interrupt(self.db) }
    }
}

impl Drop for SqliteConnection {
    fn drop(&mut self) {
        if !self.db.is_null() {
            // SAFETY: db is valid and not used after this
            unsafe {
                ffi::sqlite3_close_v2(self.db);
            }
        }
    }
}

impl Connection for SqliteConnection {
    fn query(&self, sql: &str, params: &[Value]) -> Result<Vec<Row>> {
        let mut stmt = self.prepare(sql)?;
        stmt.bind_all(params)?;
        stmt.rows()
    }

    fn execute(&self, sql: &str, params: &[Value]) -> Result<u64> {
        let mut stmt = self.prepare(sql)?;
        stmt.bind_all(params)?;
        stmt.execute()?;
        Ok(self.changes())
    }

    fn total_changes(&self) -> u64 {
        // SAFETY: db is valid
        unsafe { ffi::sqlite3_total_changes(self.db) as u64 }
    }

    fn last_insert_rowid(&self) -> i64 {
        // SAFETY: db is valid
        unsafe { ffi::sqlite3_last_insert_rowid(self.db) }
    }
}

pub(crate) fn nul_byte_error(sql: &str) -> Error {
    Error::Query(QueryError {
        kind: QueryErrorKind::Syntax,
        code: None,
        sql: Some(sql.to_string()),
        message: "SQL contains NUL byte".to_string(),
    })
}

/// Build a query error from the connection's current error state.
pub(crate) fn engine_error(db: *mut ffi::sqlite3, sql: &str) -> Error {
    // SAFETY: db is valid
    let (code, message) = unsafe {
        let code = ffi::sqlite3_extended_errcode(db);
        let msg = CStr::from_ptr(ffi::sqlite3_errmsg(db))
            .to_string_lossy()
            .into_owned();
        (code, msg)
    };

    Error::Query(QueryError {
        kind: error_code_to_kind(code),
        code: Some(code),
        sql: Some(sql.to_string()),
        message,
    })
}

pub(crate) fn error_code_to_kind(code: c_int) -> QueryErrorKind {
    // Extended result codes keep the primary code in the low byte
    match code & 0xff {
        ffi::SQLITE_CONSTRAINT => QueryErrorKind::Constraint,
        ffi::SQLITE_BUSY | ffi::SQLITE_LOCKED => QueryErrorKind::Locked,
        ffi::SQLITE_PERM | ffi::SQLITE_AUTH | ffi::SQLITE_READONLY => QueryErrorKind::Permission,
        ffi::SQLITE_NOTFOUND => QueryErrorKind::NotFound,
        ffi::SQLITE_INTERRUPT => QueryErrorKind::Interrupted,
        ffi::SQLITE_MISUSE | ffi::SQLITE_RANGE => QueryErrorKind::Misuse,
        _ => QueryErrorKind::Database,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_memory() {
        let conn = SqliteConnection::open_memory().unwrap();
        assert_eq!(conn.path(), ":memory:");
    }

    #[test]
    fn execute_raw_and_counters() {
        let conn = SqliteConnection::open_memory().unwrap();
        conn.execute_raw("CREATE TABLE t (id INTEGER PRIMARY KEY, name TEXT)")
            .unwrap();
        conn.execute_raw("INSERT INTO t (name) VALUES ('ada')")
            .unwrap();
        assert_eq!(conn.changes(), 1);
        assert_eq!(conn.last_insert_rowid(), 1);
        assert_eq!(conn.total_changes(), 1);
    }

    #[test]
    fn query_with_params() {
        let conn = SqliteConnection::open_memory().unwrap();
        conn.execute_raw("CREATE TABLE t (id INTEGER PRIMARY KEY, name TEXT, age INTEGER)")
            .unwrap();
        conn.execute(
            "INSERT INTO t (name, age) VALUES (?, ?)",
            &[Value::Text("ada".to_string()), Value::Integer(36)],
        )
        .unwrap();

        let rows = conn
            .query(
                "SELECT * FROM t WHERE name = ?",
                &[Value::Text("ada".to_string())],
            )
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get_named::<String>("name").unwrap(), "ada");
        assert_eq!(rows[0].get_named::<i64>("age").unwrap(), 36);
    }

    #[test]
    fn null_round_trips() {
        let conn = SqliteConnection::open_memory().unwrap();
        conn.execute_raw("CREATE TABLE t (name TEXT)").unwrap();
        conn.execute("INSERT INTO t (name) VALUES (?)", &[Value::Null])
            .unwrap();

        let rows = conn.query("SELECT name FROM t", &[]).unwrap();
        assert_eq!(rows[0].get_named::<Option<String>>("name").unwrap(), None);
    }

    #[test]
    fn table_exists_in_main_and_temp() {
        let conn = SqliteConnection::open_memory().unwrap();
        conn.execute_raw("CREATE TABLE t (id INTEGER)").unwrap();
        conn.execute_raw("CREATE TEMPORARY TABLE scratch (id INTEGER)")
            .unwrap();

        assert!(conn.table_exists(None, "t").unwrap());
        assert!(!conn.table_exists(None, "missing").unwrap());
        assert!(conn.table_exists(Some("temp"), "scratch").unwrap());
        assert!(!conn.table_exists(None, "scratch").unwrap());
    }

    #[test]
    fn syntax_error_carries_code_and_sql() {
        let conn = SqliteConnection::open_memory().unwrap();
        let err = conn.execute_raw("NOT SQL AT ALL").unwrap_err();
        assert!(err.code().is_some());
        assert!(err.to_string().contains("query error"));
    }

    #[test]
    fn read_only_flag_rejects_writes() {
        let dir = std::env::temp_dir().join("siderite_ro_test.db");
        let _ = std::fs::remove_file(&dir);

        let path = dir.to_string_lossy().to_string();
        let conn = SqliteConnection::open_file(path.clone()).unwrap();
        conn.execute_raw("CREATE TABLE t (id INTEGER)").unwrap();
        drop(conn);

        let conn =
            SqliteConnection::open(&SqliteConfig::file(path).flags(OpenFlags::read_only())).unwrap();
        assert!(conn.query("SELECT * FROM t", &[]).is_ok());
        assert!(conn.execute_raw("INSERT INTO t VALUES (1)").is_err());

        drop(conn);
        let _ = std::fs::remove_file(&dir);
    }
}
