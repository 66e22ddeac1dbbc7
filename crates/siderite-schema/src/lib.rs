//! Schema reflection and verification for siderite.
//!
//! This crate provides:
//! - Catalog introspection over the pragma interface
//! - CREATE TABLE generation from declarative table schemas
//! - Live schema verification (structured discrepancy reports)

pub mod ddl;
pub mod introspect;
pub mod verify;

pub use ddl::generate_create_table;
pub use introspect::{
    CatalogReader, LiveColumn, LiveForeignKey, LiveIndexColumn, LiveUniqueIndex,
};
pub use verify::{VerificationReport, verify_snapshots, verify_table_schema};
