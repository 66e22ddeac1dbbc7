//! Error types for siderite operations.
//!
//! The taxonomy is two-tier: engine-level failures (connection, statement,
//! introspection) are errors and carry the native SQLite status code; schema
//! discrepancies found during verification are never errors and are
//! accumulated into a [`crate::VerificationReport`]-style message list by the
//! schema crate instead.

use std::fmt;

/// The primary error type for all siderite operations.
#[derive(Debug)]
pub enum Error {
    /// Connection-related errors (open, close, invalid path)
    Connection(ConnectionError),
    /// Statement preparation and execution errors
    Query(QueryError),
    /// Value conversion errors
    Type(TypeError),
}

/// A failure while opening or managing a database connection.
#[derive(Debug)]
pub struct ConnectionError {
    pub kind: ConnectionErrorKind,
    /// Native SQLite result code, when the engine produced one.
    pub code: Option<i32>,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionErrorKind {
    /// Failed to open the database
    Open,
    /// Path or SQL text contained an interior NUL byte
    InvalidInput,
}

/// A failure while preparing, binding or stepping a statement.
#[derive(Debug)]
pub struct QueryError {
    pub kind: QueryErrorKind,
    /// Native SQLite extended result code.
    pub code: Option<i32>,
    /// The SQL text that caused the error, if available.
    pub sql: Option<String>,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryErrorKind {
    /// Syntax error in SQL
    Syntax,
    /// Constraint violation (unique, foreign key, not null, ...)
    Constraint,
    /// Table or column not found
    NotFound,
    /// Permission denied
    Permission,
    /// Database or table is locked
    Locked,
    /// Interrupted via `interrupt()`
    Interrupted,
    /// API misuse (e.g. binding out of range)
    Misuse,
    /// Other database error
    Database,
}

/// A failed conversion between a [`crate::Value`] and a Rust type.
#[derive(Debug)]
pub struct TypeError {
    pub expected: &'static str,
    pub actual: String,
    pub column: Option<String>,
}

impl Error {
    /// The native SQLite result code behind this error, if any.
    pub fn code(&self) -> Option<i32> {
        match self {
            Error::Connection(e) => e.code,
            Error::Query(e) => e.code,
            Error::Type(_) => None,
        }
    }

    /// The SQL that caused this error, if available.
    pub fn sql(&self) -> Option<&str> {
        match self {
            Error::Query(e) => e.sql.as_deref(),
            _ => None,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Connection(e) => write!(f, "connection error: {}", e.message),
            Error::Query(e) => {
                if let Some(code) = e.code {
                    write!(f, "query error (code {}): {}", code, e.message)
                } else {
                    write!(f, "query error: {}", e.message)
                }
            }
            Error::Type(e) => {
                if let Some(col) = &e.column {
                    write!(
                        f,
                        "type error in column '{}': expected {}, found {}",
                        col, e.expected, e.actual
                    )
                } else {
                    write!(f, "type error: expected {}, found {}", e.expected, e.actual)
                }
            }
        }
    }
}

impl std::error::Error for Error {}

impl fmt::Display for ConnectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl fmt::Display for QueryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(code) = self.code {
            write!(f, "{} (code {})", self.message, code)
        } else {
            write!(f, "{}", self.message)
        }
    }
}

impl fmt::Display for TypeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(col) = &self.column {
            write!(
                f,
                "expected {} for column '{}', found {}",
                self.expected, col, self.actual
            )
        } else {
            write!(f, "expected {}, found {}", self.expected, self.actual)
        }
    }
}

impl From<ConnectionError> for Error {
    fn from(err: ConnectionError) -> Self {
        Error::Connection(err)
    }
}

impl From<QueryError> for Error {
    fn from(err: QueryError) -> Self {
        Error::Query(err)
    }
}

impl From<TypeError> for Error {
    fn from(err: TypeError) -> Self {
        Error::Type(err)
    }
}

/// Result type alias for siderite operations.
pub type Result<T> = std::result::Result<T, Error>;
