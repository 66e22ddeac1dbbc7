//! Generic persistence over entity definitions.
//!
//! [`Stored`] wraps an entity together with its row identity and the
//! values it last exchanged with the database, providing change tracking
//! and save/delete. The free functions build their SQL from the entity's
//! table schema plus a caller-supplied WHERE fragment and parameter list.

use crate::entity::Entity;
use siderite_core::{Connection, Result, Row, TableSchema, Value, quote_ident};
use std::ops::{Deref, DerefMut};

/// Alias under which every SELECT exposes the implicit row identifier.
const ROWID: &str = "_rowid_";

/// An entity together with its persistence state.
///
/// SQLite gives every row a unique rowid (aliased by an INTEGER PRIMARY
/// KEY when one is declared); it identifies the row across updates and
/// deletes. A negative rowid means the entity is not stored: freshly
/// constructed, or deleted. `Stored` also keeps the values last read from
/// or written to the database, which drives [`Stored::is_modified`] and
/// [`Stored::reset`].
pub struct Stored<T: Entity> {
    entity: T,
    rowid: i64,
    db_values: Vec<Value>,
}

impl<T: Entity + 'static> Stored<T> {
    /// Wrap a not-yet-persisted entity.
    pub fn new(entity: T) -> Self {
        Self {
            entity,
            rowid: -1,
            db_values: Vec::new(),
        }
    }

    /// The rowid, when the entity is stored in the database.
    pub fn rowid(&self) -> Option<i64> {
        (self.rowid >= 0).then_some(self.rowid)
    }

    /// Unwrap the entity, discarding persistence state.
    pub fn into_inner(self) -> T {
        self.entity
    }

    /// Build a `Stored` from one row of a rowid-aliasing SELECT.
    pub fn from_row(row: &Row) -> Result<Self> {
        let def = T::def();
        let mut entity = T::default();
        let rowid = row.get_named::<i64>(ROWID)?;

        let mut db_values = Vec::with_capacity(def.accessors().len());
        for (field, accessor) in def.schema().fields.iter().zip(def.accessors()) {
            let value = row.get_by_name(&field.name).cloned().unwrap_or(Value::Null);
            (accessor.set)(&mut entity, &value);
            db_values.push(value);
        }

        Ok(Self {
            entity,
            rowid,
            db_values,
        })
    }

    /// Whether any field differs from the values last seen in the database.
    pub fn is_modified(&self) -> bool {
        let def = T::def();
        if self.db_values.len() != def.accessors().len() {
            return true;
        }
        def.accessors()
            .iter()
            .zip(&self.db_values)
            .any(|(accessor, stored)| (accessor.get)(&self.entity) != *stored)
    }

    /// Restore every field to the value last seen in the database.
    pub fn reset(&mut self) {
        let def = T::def();
        for (accessor, value) in def.accessors().iter().zip(&self.db_values) {
            (accessor.set)(&mut self.entity, value);
        }
    }

    /// Persist all changes: INSERT when new, UPDATE otherwise.
    pub fn save<C: Connection>(&mut self, conn: &C) -> Result<()> {
        if self.rowid >= 0 {
            self.update(conn)
        } else {
            self.insert(conn)
        }
    }

    fn insert<C: Connection>(&mut self, conn: &C) -> Result<()> {
        let def = T::def();
        let schema = def.schema();

        let mut sql = String::from("INSERT INTO ");
        sql.push_str(&schema.qualified_name());
        sql.push_str(" (");
        for (i, field) in schema.fields.iter().enumerate() {
            if i != 0 {
                sql.push_str(", ");
            }
            sql.push_str(&quote_ident(&field.name));
        }
        sql.push_str(") VALUES (");
        for i in 0..schema.fields.len() {
            if i != 0 {
                sql.push_str(", ");
            }
            sql.push('?');
        }
        sql.push_str(");");

        // Row-identity fields are sent as NULL so the engine assigns them.
        let mut values: Vec<Value> = schema
            .fields
            .iter()
            .zip(def.accessors())
            .map(|(field, accessor)| {
                if field.row_identity {
                    Value::Null
                } else {
                    (accessor.get)(&self.entity)
                }
            })
            .collect();

        conn.execute(&sql, &values)?;
        self.rowid = conn.last_insert_rowid();

        for (i, (field, accessor)) in schema.fields.iter().zip(def.accessors()).enumerate() {
            if field.row_identity {
                (accessor.set)(&mut self.entity, &Value::Integer(self.rowid));
                values[i] = Value::Integer(self.rowid);
            }
        }
        self.db_values = values;
        Ok(())
    }

    fn update<C: Connection>(&mut self, conn: &C) -> Result<()> {
        let def = T::def();
        let schema = def.schema();

        let mut sql = String::from("UPDATE ");
        sql.push_str(&schema.qualified_name());
        sql.push_str(" SET ");
        for (i, field) in schema.fields.iter().enumerate() {
            if i != 0 {
                sql.push_str(", ");
            }
            sql.push_str(&quote_ident(&field.name));
            sql.push_str(" = ?");
        }
        sql.push_str(" WHERE _rowid_ = ?;");

        let mut params = def.read_values(&self.entity);
        let db_values = params.clone();
        params.push(Value::Integer(self.rowid));

        conn.execute(&sql, &params)?;
        self.db_values = db_values;
        Ok(())
    }

    /// Remove the entity's row. A no-op when the entity is not stored.
    ///
    /// Afterwards the entity counts as new again; row-identity fields are
    /// set to the invalid rowid.
    pub fn delete<C: Connection>(&mut self, conn: &C) -> Result<()> {
        if self.rowid < 0 {
            return Ok(());
        }
        let def = T::def();
        let schema = def.schema();

        let sql = format!(
            "DELETE FROM {} WHERE _rowid_ = ?;",
            schema.qualified_name()
        );
        conn.execute(&sql, &[Value::Integer(self.rowid)])?;
        self.rowid = -1;

        for (field, accessor) in schema.fields.iter().zip(def.accessors()) {
            if field.row_identity {
                (accessor.set)(&mut self.entity, &Value::Integer(-1));
            }
        }
        Ok(())
    }
}

impl<T: Entity> Deref for Stored<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.entity
    }
}

impl<T: Entity> DerefMut for Stored<T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.entity
    }
}

impl<T: Entity + 'static> From<T> for Stored<T> {
    fn from(entity: T) -> Self {
        Self::new(entity)
    }
}

fn select_sql(schema: &TableSchema, where_clause: &str) -> String {
    let mut sql = String::from("SELECT _rowid_ AS _rowid_");
    for field in &schema.fields {
        sql.push_str(", ");
        sql.push_str(&quote_ident(&field.name));
    }
    sql.push_str(" FROM ");
    sql.push_str(&schema.qualified_name());
    if !where_clause.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(where_clause);
    }
    sql.push(';');
    sql
}

/// Load every entity matching the WHERE fragment.
pub fn select_all<T: Entity + 'static, C: Connection>(
    conn: &C,
    where_clause: &str,
    params: &[Value],
) -> Result<Vec<Stored<T>>> {
    let sql = select_sql(T::def().schema(), where_clause);
    tracing::trace!(%sql, "select");
    conn.query(&sql, params)?
        .iter()
        .map(Stored::from_row)
        .collect()
}

/// Load the first entity matching the WHERE fragment, if any.
pub fn select_one<T: Entity + 'static, C: Connection>(
    conn: &C,
    where_clause: &str,
    params: &[Value],
) -> Result<Option<Stored<T>>> {
    let sql = select_sql(T::def().schema(), where_clause);
    tracing::trace!(%sql, "select one");
    let rows = conn.query(&sql, params)?;
    rows.first().map(Stored::from_row).transpose()
}

/// Count the rows matching the WHERE fragment.
pub fn count<C: Connection>(
    conn: &C,
    schema: &TableSchema,
    where_clause: &str,
    params: &[Value],
) -> Result<i64> {
    let mut sql = format!("SELECT COUNT(*) FROM {}", schema.qualified_name());
    if !where_clause.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(where_clause);
    }
    sql.push(';');

    let rows = conn.query(&sql, params)?;
    match rows.first() {
        Some(row) => row.get_as::<i64>(0),
        None => Ok(0),
    }
}

/// Delete the rows matching the WHERE fragment.
///
/// Returns the number of rows removed, measured through the engine's
/// total-changes counter.
pub fn delete_where<C: Connection>(
    conn: &C,
    schema: &TableSchema,
    where_clause: &str,
    params: &[Value],
) -> Result<u64> {
    let mut sql = format!("DELETE FROM {}", schema.qualified_name());
    if !where_clause.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(where_clause);
    }
    sql.push(';');

    let before = conn.total_changes();
    conn.execute(&sql, params)?;
    Ok(conn.total_changes() - before)
}
