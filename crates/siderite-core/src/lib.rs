//! Core types and traits for siderite.
//!
//! This crate provides the foundational abstractions for the typed SQLite
//! layer:
//!
//! - `Value` for dynamically-typed SQL values
//! - The two-tier error taxonomy (engine errors vs. schema discrepancies)
//! - `Row` for result access by index or name
//! - `TableSchema`/`SchemaBuilder` for declarative table descriptions
//! - `Connection` trait for the synchronous driver boundary

pub mod connection;
pub mod error;
pub mod identifiers;
pub mod row;
pub mod schema;
pub mod types;
pub mod value;

pub use connection::Connection;
pub use error::{
    ConnectionError, ConnectionErrorKind, Error, QueryError, QueryErrorKind, Result, TypeError,
};
pub use identifiers::{quote_ident, temp_namespace};
pub use row::{ColumnNames, FromValue, Row};
pub use schema::{
    FieldAttr, FieldDescriptor, FkAction, ForeignKeyRef, SchemaBuilder, TableSchema, UniqueSpec, fk,
};
pub use types::ColumnType;
pub use value::Value;
