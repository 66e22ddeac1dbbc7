//! siderite: a typed convenience layer over SQLite.
//!
//! - RAII connection and prepared-statement wrappers over the bundled
//!   SQLite library
//! - Declarative table schemas with CREATE TABLE generation
//! - Live schema verification producing diagnostic reports
//! - A small entity layer: runtime field accessors plus generic CRUD
//!
//! # Example
//!
//! ```
//! use siderite::{
//!     ColumnType, Entity, EntityBuilder, EntityDef, FieldAttr, SqliteConnection, Stored, Value,
//!     generate_create_table, verify_table_schema,
//! };
//! use std::sync::LazyLock;
//!
//! #[derive(Default)]
//! struct Track {
//!     id: i64,
//!     title: String,
//! }
//!
//! impl Entity for Track {
//!     fn def() -> &'static EntityDef<Track> {
//!         static DEF: LazyLock<EntityDef<Track>> = LazyLock::new(|| {
//!             EntityBuilder::<Track>::new("track")
//!                 .field(
//!                     "id",
//!                     ColumnType::Integer,
//!                     |t| Value::from(t.id),
//!                     |t, v| t.id = v.as_i64().unwrap_or_default(),
//!                     [FieldAttr::RowIdentity],
//!                 )
//!                 .field(
//!                     "title",
//!                     ColumnType::Text,
//!                     |t| Value::from(t.title.clone()),
//!                     |t, v| t.title = v.as_str().unwrap_or_default().to_string(),
//!                     [],
//!                 )
//!                 .build()
//!         });
//!         &DEF
//!     }
//! }
//!
//! let conn = SqliteConnection::open_memory().unwrap();
//! conn.execute_raw(&generate_create_table(Track::def().schema())).unwrap();
//! assert!(verify_table_schema(&conn, Track::def().schema()).unwrap().is_ok());
//!
//! let mut track = Stored::new(Track {
//!     title: "Blue in Green".to_string(),
//!     ..Track::default()
//! });
//! track.save(&conn).unwrap();
//! assert_eq!(track.rowid(), Some(1));
//! ```

pub mod entity;
pub mod repo;

pub use entity::{Entity, EntityBuilder, EntityDef, FieldAccessor};
pub use repo::{Stored, count, delete_where, select_all, select_one};

pub use siderite_core::{
    ColumnNames, ColumnType, Connection, ConnectionError, ConnectionErrorKind, Error, FieldAttr,
    FieldDescriptor, FkAction, ForeignKeyRef, FromValue, QueryError, QueryErrorKind, Result, Row,
    SchemaBuilder, TableSchema, TypeError, UniqueSpec, Value, fk, quote_ident, temp_namespace,
};
pub use siderite_schema::{
    CatalogReader, LiveColumn, LiveForeignKey, LiveIndexColumn, LiveUniqueIndex,
    VerificationReport, generate_create_table, verify_snapshots, verify_table_schema,
};
pub use siderite_sqlite::{OpenFlags, SqliteConfig, SqliteConnection, Statement};
