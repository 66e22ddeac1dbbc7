//! Database connection abstraction.

use crate::row::Row;
use crate::value::Value;
use crate::{Result, quote_ident};

/// A synchronous connection to an embedded SQL database.
///
/// Every operation blocks until the engine completes it; there are no
/// suspension points, retries or timeouts at this layer. Implementations
/// provide no internal locking either - a connection is single-owner per
/// logical unit of work, and callers who share one across threads are
/// responsible for serializing access themselves.
pub trait Connection {
    /// Execute a statement and collect all result rows.
    fn query(&self, sql: &str, params: &[Value]) -> Result<Vec<Row>>;

    /// Execute a statement and report the number of rows changed by it.
    fn execute(&self, sql: &str, params: &[Value]) -> Result<u64>;

    /// Check whether a table (or view) exists in the given namespace.
    fn table_exists(&self, schema: Option<&str>, table: &str) -> Result<bool> {
        let master = match schema {
            Some(ns) => format!("{}.sqlite_master", quote_ident(ns)),
            None => "sqlite_master".to_string(),
        };
        let sql = format!(
            "SELECT 1 FROM {} WHERE type IN ('table', 'view') AND name = ?",
            master
        );
        let rows = self.query(&sql, &[Value::Text(table.to_string())])?;
        Ok(!rows.is_empty())
    }

    /// Total number of rows inserted, updated or deleted over the
    /// lifetime of the connection.
    fn total_changes(&self) -> u64;

    /// Rowid assigned by the most recent successful INSERT.
    fn last_insert_rowid(&self) -> i64;
}
