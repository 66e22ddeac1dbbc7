//! Live catalog introspection.
//!
//! The catalog reader queries SQLite's pragma interface for one logical
//! table and returns typed snapshots of its columns, foreign keys and
//! unique indexes. The snapshots mirror the pragma rows as reported; they
//! are valid for the duration of one verification call and are not cached.
//!
//! Pragma arguments cannot be bound as parameters, so schema and table
//! identifiers are quoted and interpolated into the query text. Do not pass
//! attacker-controlled names here.

use siderite_core::{Connection, Result, quote_ident};

/// One row of `PRAGMA table_info`.
#[derive(Debug, Clone)]
pub struct LiveColumn {
    /// Column position in the table.
    pub cid: i64,
    /// Column name.
    pub name: String,
    /// Declared type string, as written in the CREATE TABLE.
    pub decl_type: String,
    /// Whether the column carries a NOT NULL constraint.
    pub not_null: bool,
    /// Default value expression text, if any.
    pub default_value: Option<String>,
    /// 1-based position within the primary key, 0 when not part of it.
    pub pk: i64,
}

/// One row of `PRAGMA foreign_key_list`.
#[derive(Debug, Clone)]
pub struct LiveForeignKey {
    /// Constraint id; multi-column constraints share one id.
    pub id: i64,
    /// Column sequence within the constraint.
    pub seq: i64,
    /// Referenced table.
    pub table: String,
    /// Referencing column in this table.
    pub from: String,
    /// Referenced column; NULL when the reference targets the parent's
    /// implicit primary key.
    pub to: Option<String>,
    /// ON UPDATE action phrase.
    pub on_update: String,
    /// ON DELETE action phrase.
    pub on_delete: String,
    /// MATCH clause; SQLite reports "NONE" unless one was declared.
    pub fk_match: String,
}

/// One row of `PRAGMA index_info`.
#[derive(Debug, Clone)]
pub struct LiveIndexColumn {
    /// Rank of the column within the index.
    pub seqno: i64,
    /// Table column id; -1 for rowid, -2 for an expression.
    pub cid: i64,
    /// Column name; NULL for rowid or expression columns.
    pub name: Option<String>,
}

/// One row of `PRAGMA index_list`, restricted to UNIQUE-constraint
/// indexes, together with its column listing.
#[derive(Debug, Clone)]
pub struct LiveUniqueIndex {
    /// Index rank in the listing.
    pub seq: i64,
    /// Index name (autogenerated for constraint indexes).
    pub name: String,
    /// Uniqueness flag as reported; always true after filtering.
    pub unique: bool,
    /// Index origin: "u" for UNIQUE constraints.
    pub origin: String,
    /// Whether the index is partial.
    pub partial: bool,
    /// Indexed columns in order.
    pub columns: Vec<LiveIndexColumn>,
}

impl LiveUniqueIndex {
    /// The named columns covered by this index, in index order.
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().filter_map(|c| c.name.as_deref())
    }
}

/// Reads catalog metadata for single tables from a live connection.
pub struct CatalogReader<'a, C> {
    conn: &'a C,
}

impl<'a, C: Connection> CatalogReader<'a, C> {
    /// Create a reader over the given connection.
    pub fn new(conn: &'a C) -> Self {
        Self { conn }
    }

    /// All physical columns of the table, in declaration order.
    ///
    /// An empty result means the table does not exist (or has no columns);
    /// callers distinguish the two with a prior existence check. Engine
    /// query failures propagate.
    pub fn columns(&self, schema: Option<&str>, table: &str) -> Result<Vec<LiveColumn>> {
        let sql = pragma_sql(schema, "table_info", table);
        tracing::trace!(%sql, "reading table columns");
        let rows = self.conn.query(&sql, &[])?;

        rows.iter()
            .map(|row| {
                Ok(LiveColumn {
                    cid: row.get_named("cid")?,
                    name: row.get_named("name")?,
                    decl_type: row.get_named("type")?,
                    not_null: row.get_named::<i64>("notnull")? != 0,
                    default_value: row.get_named("dflt_value")?,
                    pk: row.get_named("pk")?,
                })
            })
            .collect()
    }

    /// All declared foreign-key references of the table; may be empty.
    pub fn foreign_keys(&self, schema: Option<&str>, table: &str) -> Result<Vec<LiveForeignKey>> {
        let sql = pragma_sql(schema, "foreign_key_list", table);
        tracing::trace!(%sql, "reading foreign keys");
        let rows = self.conn.query(&sql, &[])?;

        rows.iter()
            .map(|row| {
                Ok(LiveForeignKey {
                    id: row.get_named("id")?,
                    seq: row.get_named("seq")?,
                    table: row.get_named("table")?,
                    from: row.get_named("from")?,
                    to: row.get_named("to")?,
                    on_update: row.get_named("on_update")?,
                    on_delete: row.get_named("on_delete")?,
                    fk_match: row.get_named("match")?,
                })
            })
            .collect()
    }

    /// The table's indexes that arise from UNIQUE constraints.
    ///
    /// Indexes created by the primary key ("pk" origin) or by explicit
    /// CREATE INDEX ("c" origin) are excluded; for each surviving index a
    /// second pragma call enumerates its columns.
    pub fn unique_indexes(&self, schema: Option<&str>, table: &str) -> Result<Vec<LiveUniqueIndex>> {
        let sql = pragma_sql(schema, "index_list", table);
        tracing::trace!(%sql, "reading index list");
        let rows = self.conn.query(&sql, &[])?;

        let mut indexes = Vec::new();
        for row in &rows {
            let origin: String = row.get_named("origin")?;
            if origin != "u" {
                continue;
            }

            let name: String = row.get_named("name")?;
            let info_sql = pragma_sql(schema, "index_info", &name);
            let info_rows = self.conn.query(&info_sql, &[])?;
            let columns = info_rows
                .iter()
                .map(|r| {
                    Ok(LiveIndexColumn {
                        seqno: r.get_named("seqno")?,
                        cid: r.get_named("cid")?,
                        name: r.get_named("name")?,
                    })
                })
                .collect::<Result<Vec<_>>>()?;

            indexes.push(LiveUniqueIndex {
                seq: row.get_named("seq")?,
                name,
                unique: row.get_named::<i64>("unique")? != 0,
                origin,
                partial: row.get_named::<i64>("partial")? != 0,
                columns,
            });
        }

        Ok(indexes)
    }
}

/// Build a pragma query for one namespace-qualified object.
fn pragma_sql(schema: Option<&str>, pragma: &str, arg: &str) -> String {
    match schema {
        Some(ns) => format!("PRAGMA {}.{}({})", quote_ident(ns), pragma, quote_ident(arg)),
        None => format!("PRAGMA {}({})", pragma, quote_ident(arg)),
    }
}
