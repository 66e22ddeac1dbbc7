//! SQLite driver for siderite.
//!
//! Implements the `Connection` trait from siderite-core over the bundled
//! SQLite C library: RAII connection and prepared-statement wrappers, value
//! binding and result reading.

pub mod connection;
pub mod ffi;
pub mod statement;
pub mod types;

pub use connection::{OpenFlags, SqliteConfig, SqliteConnection};
pub use statement::Statement;
