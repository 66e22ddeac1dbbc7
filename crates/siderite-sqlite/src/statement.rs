//! Prepared statements and result cursors.
//!
//! A `Statement` owns a `sqlite3_stmt*` for the lifetime of one borrow of
//! its connection: bind values by 1-based position, `step` through result
//! rows, and read the current row's columns by index or name. Dropping the
//! statement finalizes the handle.

#![allow(clippy::cast_possible_truncation)]

use crate::connection::{SqliteConnection, engine_error, nul_byte_error};
use crate::{ffi, types};
use siderite_core::{ColumnNames, Error, Result, Row, Value, error::TypeError};
use std::ffi::{CString, c_int};
use std::ptr;
use std::sync::Arc;

/// A prepared statement bound to its parent connection.
pub struct Statement<'conn> {
    conn: &'conn SqliteConnection,
    stmt: *mut ffi::sqlite3_stmt,
    sql: String,
}

impl<'conn> Statement<'conn> {
    pub(crate) fn prepare(conn: &'conn SqliteConnection, sql: &str) -> Result<Self> {
        let c_sql = CString::new(sql).map_err(|_| nul_byte_error(sql))?;
        let mut stmt: *mut ffi::sqlite3_stmt = ptr::null_mut();

        // SAFETY: all pointers are valid
        let rc = unsafe {
            ffi::sqlite3_prepare_v2(
                conn.handle(),
                c_sql.as_ptr(),
                c_sql.as_bytes().len() as c_int,
                &mut stmt,
                ptr::null_mut(),
            )
        };

        if rc != ffi::SQLITE_OK {
            return Err(engine_error(conn.handle(), sql));
        }

        tracing::trace!(sql, "prepared statement");

        Ok(Self {
            conn,
            stmt,
            sql: sql.to_string(),
        })
    }

    /// The SQL text this statement was prepared from.
    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// Number of bindable parameters.
    pub fn parameter_count(&self) -> usize {
        // SAFETY: stmt is valid
        unsafe { ffi::sqlite3_bind_parameter_count(self.stmt) as usize }
    }

    /// Bind one value at a 1-based parameter position.
    pub fn bind(&mut self, index: usize, value: &Value) -> Result<()> {
        // SAFETY: stmt is valid, index is checked by sqlite
        let rc = unsafe { types::bind_value(self.stmt, index as c_int, value) };
        if rc != ffi::SQLITE_OK {
            return Err(engine_error(self.conn.handle(), &self.sql));
        }
        Ok(())
    }

    /// Bind a slice of values to positions 1..=len.
    pub fn bind_all(&mut self, params: &[Value]) -> Result<()> {
        for (i, param) in params.iter().enumerate() {
            self.bind(i + 1, param)?;
        }
        Ok(())
    }

    /// Advance the cursor. Returns true while a result row is available.
    pub fn step(&mut self) -> Result<bool> {
        // SAFETY: stmt is valid
        let rc = unsafe { ffi::sqlite3_step(self.stmt) };
        match rc {
            ffi::SQLITE_ROW => Ok(true),
            ffi::SQLITE_DONE => Ok(false),
            _ => Err(engine_error(self.conn.handle(), &self.sql)),
        }
    }

    /// Execute a statement that produces no interesting rows.
    pub fn execute(&mut self) -> Result<()> {
        self.step().map(|_| ())
    }

    /// Number of result columns.
    pub fn column_count(&self) -> usize {
        // SAFETY: stmt is valid
        unsafe { ffi::sqlite3_column_count(self.stmt) as usize }
    }

    /// Name of a result column by 0-based index.
    pub fn column_name(&self, index: usize) -> Option<String> {
        if index >= self.column_count() {
            return None;
        }
        // SAFETY: stmt is valid, index is in range
        unsafe { types::column_name(self.stmt, index as c_int) }
    }

    /// Index of a result column by name.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        (0..self.column_count()).find(|&i| self.column_name(i).as_deref() == Some(name))
    }

    /// Read a column of the current row by 0-based index.
    ///
    /// Only meaningful after `step` returned true.
    pub fn value(&self, index: usize) -> Result<Value> {
        if index >= self.column_count() {
            return Err(Error::Type(TypeError {
                expected: "column index in range",
                actual: format!(
                    "index {} out of bounds ({} columns)",
                    index,
                    self.column_count()
                ),
                column: None,
            }));
        }
        // SAFETY: stmt is valid and positioned on a row, index is in range
        Ok(unsafe { types::read_column(self.stmt, index as c_int) })
    }

    /// Read a column of the current row by name.
    pub fn value_named(&self, name: &str) -> Result<Value> {
        let index = self.column_index(name).ok_or_else(|| {
            Error::Type(TypeError {
                expected: "existing column",
                actual: format!("column '{}' not found", name),
                column: Some(name.to_string()),
            })
        })?;
        self.value(index)
    }

    /// Snapshot the current row.
    pub fn row(&self) -> Result<Row> {
        let names: Vec<String> = (0..self.column_count())
            .map(|i| self.column_name(i).unwrap_or_else(|| format!("col{}", i)))
            .collect();
        let values = (0..self.column_count())
            .map(|i| self.value(i))
            .collect::<Result<Vec<_>>>()?;
        Ok(Row::new(names, values))
    }

    /// Step through all remaining rows and collect them.
    ///
    /// All rows share one column-name table.
    pub fn rows(&mut self) -> Result<Vec<Row>> {
        let names: Vec<String> = (0..self.column_count())
            .map(|i| self.column_name(i).unwrap_or_else(|| format!("col{}", i)))
            .collect();
        let columns = Arc::new(ColumnNames::new(names));

        let mut rows = Vec::new();
        while self.step()? {
            let values = (0..self.column_count())
                .map(|i| self.value(i))
                .collect::<Result<Vec<_>>>()?;
            rows.push(Row::with_columns(Arc::clone(&columns), values));
        }
        Ok(rows)
    }

    /// Reset the statement so it can be stepped again. Bindings survive.
    pub fn reset(&mut self) -> Result<()> {
        // SAFETY: stmt is valid
        let rc = unsafe { ffi::sqlite3_reset(self.stmt) };
        if rc != ffi::SQLITE_OK {
            return Err(engine_error(self.conn.handle(), &self.sql));
        }
        Ok(())
    }

    /// Clear all parameter bindings back to NULL.
    pub fn clear_bindings(&mut self) -> Result<()> {
        // SAFETY: stmt is valid
        let rc = unsafe { ffi::sqlite3_clear_bindings(self.stmt) };
        if rc != ffi::SQLITE_OK {
            return Err(engine_error(self.conn.handle(), &self.sql));
        }
        Ok(())
    }
}

impl Drop for Statement<'_> {
    fn drop(&mut self) {
        if !self.stmt.is_null() {
            // SAFETY: stmt is valid and not used after this
            unsafe {
                ffi::sqlite3_finalize(self.stmt);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded() -> SqliteConnection {
        let conn = SqliteConnection::open_memory().unwrap();
        conn.execute_raw("CREATE TABLE t (id INTEGER PRIMARY KEY, name TEXT, score REAL)")
            .unwrap();
        conn.execute_raw(
            "INSERT INTO t (name, score) VALUES ('ada', 9.5), ('brin', 7.25), ('cleo', NULL)",
        )
        .unwrap();
        conn
    }

    #[test]
    fn step_and_read_by_index_and_name() {
        let conn = seeded();
        let mut stmt = conn.prepare("SELECT id, name, score FROM t ORDER BY id").unwrap();

        assert!(stmt.step().unwrap());
        assert_eq!(stmt.value(1).unwrap(), Value::Text("ada".to_string()));
        assert_eq!(stmt.value_named("score").unwrap(), Value::Real(9.5));

        assert!(stmt.step().unwrap());
        assert_eq!(stmt.value_named("name").unwrap(), Value::Text("brin".to_string()));

        assert!(stmt.step().unwrap());
        assert_eq!(stmt.value_named("score").unwrap(), Value::Null);

        assert!(!stmt.step().unwrap());
    }

    #[test]
    fn bind_positions_are_one_based() {
        let conn = seeded();
        let mut stmt = conn
            .prepare("SELECT name FROM t WHERE id = ? AND score > ?")
            .unwrap();
        assert_eq!(stmt.parameter_count(), 2);
        stmt.bind(1, &Value::Integer(1)).unwrap();
        stmt.bind(2, &Value::Real(1.0)).unwrap();

        assert!(stmt.step().unwrap());
        assert_eq!(stmt.value(0).unwrap(), Value::Text("ada".to_string()));
    }

    #[test]
    fn rows_share_column_names() {
        let conn = seeded();
        let mut stmt = conn.prepare("SELECT * FROM t").unwrap();
        let rows = stmt.rows().unwrap();
        assert_eq!(rows.len(), 3);
        assert!(Arc::ptr_eq(&rows[0].columns(), &rows[1].columns()));
    }

    #[test]
    fn reset_allows_re_stepping() {
        let conn = seeded();
        let mut stmt = conn.prepare("SELECT count(*) FROM t").unwrap();
        assert!(stmt.step().unwrap());
        assert_eq!(stmt.value(0).unwrap(), Value::Integer(3));
        stmt.reset().unwrap();
        assert!(stmt.step().unwrap());
        assert_eq!(stmt.value(0).unwrap(), Value::Integer(3));
    }

    #[test]
    fn out_of_range_column_is_a_type_error() {
        let conn = seeded();
        let mut stmt = conn.prepare("SELECT id FROM t").unwrap();
        assert!(stmt.step().unwrap());
        assert!(stmt.value(5).is_err());
        assert!(stmt.value_named("nope").is_err());
    }

    #[test]
    fn blob_round_trip() {
        let conn = SqliteConnection::open_memory().unwrap();
        conn.execute_raw("CREATE TABLE b (data BLOB)").unwrap();

        let mut stmt = conn.prepare("INSERT INTO b (data) VALUES (?)").unwrap();
        stmt.bind(1, &Value::Blob(vec![1, 2, 3])).unwrap();
        stmt.execute().unwrap();
        drop(stmt);

        let mut stmt = conn.prepare("SELECT data FROM b").unwrap();
        assert!(stmt.step().unwrap());
        assert_eq!(stmt.value(0).unwrap(), Value::Blob(vec![1, 2, 3]));
    }
}
