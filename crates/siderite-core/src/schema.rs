//! Declarative table schemas.
//!
//! A [`TableSchema`] is an in-memory description of one table: its name,
//! optional namespace qualifier, temporary flag and ordered field list. It
//! is built once at startup through [`SchemaBuilder`] (typically inside a
//! `std::sync::LazyLock`) and shared by reference afterwards; the DDL
//! generator and the schema verifier both consume it.

use crate::types::ColumnType;
use crate::value::Value;
use crate::{quote_ident, temp_namespace};

/// Referential action for foreign key constraints (ON DELETE / ON UPDATE).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FkAction {
    /// No action - raise an error if any references exist.
    #[default]
    NoAction,
    /// Same as NO ACTION, checked immediately.
    Restrict,
    /// Set referencing columns to NULL.
    SetNull,
    /// Set referencing columns to their default values.
    SetDefault,
    /// Delete or update referencing rows alongside.
    Cascade,
}

impl FkAction {
    /// The SQL keyword phrase for this action.
    pub const fn as_sql(&self) -> &'static str {
        match self {
            FkAction::NoAction => "NO ACTION",
            FkAction::Restrict => "RESTRICT",
            FkAction::SetNull => "SET NULL",
            FkAction::SetDefault => "SET DEFAULT",
            FkAction::Cascade => "CASCADE",
        }
    }

    /// Parse the action from the phrase `PRAGMA foreign_key_list` reports.
    pub fn from_sql(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "NO ACTION" => Some(FkAction::NoAction),
            "RESTRICT" => Some(FkAction::Restrict),
            "SET NULL" => Some(FkAction::SetNull),
            "SET DEFAULT" => Some(FkAction::SetDefault),
            "CASCADE" => Some(FkAction::Cascade),
            _ => None,
        }
    }
}

/// A foreign-key reference declared on a single field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignKeyRef {
    /// Referenced table
    pub table: String,
    /// Referenced column
    pub column: String,
    /// ON DELETE action
    pub on_delete: FkAction,
    /// ON UPDATE action
    pub on_update: FkAction,
}

/// How a field participates in unique constraints.
///
/// The four cases are mutually exclusive per field: no constraint, a named
/// multi-column group, membership in the one implicit default group, or a
/// single-column UNIQUE of its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UniqueSpec {
    /// Not part of any unique constraint.
    #[default]
    None,
    /// Member of the multi-column group with this id. Groups are emitted
    /// in ascending id order.
    Group(u32),
    /// Member of the implicit default group shared by all fields so marked.
    DefaultGroup,
    /// A single-column UNIQUE constraint on this field alone.
    Own,
}

/// Declarative description of one table column.
#[derive(Debug, Clone)]
pub struct FieldDescriptor {
    /// Column name, unique within its table.
    pub name: String,
    /// Logical column type.
    pub column_type: ColumnType,
    /// Whether NULL is allowed. Defaults to false.
    pub nullable: bool,
    /// Whether this field is part of the primary key.
    pub primary_key: bool,
    /// Whether this field mirrors the table's implicit rowid.
    pub row_identity: bool,
    /// Unique-constraint membership.
    pub unique: UniqueSpec,
    /// Optional foreign-key reference.
    pub foreign_key: Option<ForeignKeyRef>,
    /// Optional default value. Not currently compared by the verifier.
    pub default_value: Option<Value>,
}

impl FieldDescriptor {
    fn new(name: String, column_type: ColumnType) -> Self {
        Self {
            name,
            column_type,
            nullable: false,
            primary_key: false,
            row_identity: false,
            unique: UniqueSpec::None,
            foreign_key: None,
            default_value: None,
        }
    }
}

/// An attribute applied to a field while building a schema.
#[derive(Debug, Clone)]
pub enum FieldAttr {
    /// Allow NULL values.
    Nullable(bool),
    /// Part of the primary key.
    PrimaryKey(bool),
    /// Mirrors the implicit rowid. Implies primary key.
    RowIdentity,
    /// Unique-constraint membership.
    Unique(UniqueSpec),
    /// Foreign-key reference.
    ForeignKey(ForeignKeyRef),
    /// Default value.
    Default(Value),
}

impl FieldAttr {
    fn apply(self, field: &mut FieldDescriptor) {
        match self {
            FieldAttr::Nullable(v) => field.nullable = v,
            FieldAttr::PrimaryKey(v) => field.primary_key = v,
            FieldAttr::RowIdentity => {
                field.primary_key = true;
                field.row_identity = true;
            }
            FieldAttr::Unique(spec) => field.unique = spec,
            FieldAttr::ForeignKey(fk) => field.foreign_key = Some(fk),
            FieldAttr::Default(v) => field.default_value = Some(v),
        }
    }
}

/// Shorthand for [`FieldAttr::ForeignKey`].
pub fn fk(
    table: impl Into<String>,
    column: impl Into<String>,
    on_delete: FkAction,
    on_update: FkAction,
) -> FieldAttr {
    FieldAttr::ForeignKey(ForeignKeyRef {
        table: table.into(),
        column: column.into(),
        on_delete,
        on_update,
    })
}

/// Declarative description of one table.
#[derive(Debug, Clone)]
pub struct TableSchema {
    /// Table name.
    pub table: String,
    /// Optional namespace qualifier (e.g. an attached database, or the
    /// temporary namespace).
    pub schema: Option<String>,
    /// Whether the table is temporary. When set, the qualifier is expected
    /// to be the temporary namespace; the verifier reports the
    /// inconsistency if it is not, nothing enforces it here.
    pub temporary: bool,
    /// Fields in declaration order. Names are expected to be unique; the
    /// builder does not check.
    pub fields: Vec<FieldDescriptor>,
}

impl TableSchema {
    /// Look up a field by name.
    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// The quoted, optionally namespace-qualified table name for SQL text.
    pub fn qualified_name(&self) -> String {
        match &self.schema {
            Some(ns) => format!("{}.{}", quote_ident(ns), quote_ident(&self.table)),
            None => quote_ident(&self.table),
        }
    }

    /// Whether the temporary flag and namespace qualifier agree.
    pub fn temp_namespace_consistent(&self) -> bool {
        !self.temporary || self.schema.as_deref() == Some(temp_namespace())
    }
}

/// Fluent accumulation builder for [`TableSchema`].
///
/// No validation happens here: duplicate field names or odd unique-group
/// layouts surface later in the verifier or DDL generator, or not at all.
#[derive(Debug)]
pub struct SchemaBuilder {
    info: TableSchema,
}

impl SchemaBuilder {
    /// Start building a schema for the given table name.
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            info: TableSchema {
                table: table.into(),
                schema: None,
                temporary: false,
                fields: Vec::new(),
            },
        }
    }

    /// Set the namespace qualifier.
    pub fn schema(mut self, namespace: impl Into<String>) -> Self {
        self.info.schema = Some(namespace.into());
        self
    }

    /// Mark the table as temporary.
    pub fn temporary(mut self, v: bool) -> Self {
        self.info.temporary = v;
        self
    }

    /// Append one field with the given attributes.
    pub fn field(
        mut self,
        name: impl Into<String>,
        column_type: ColumnType,
        attrs: impl IntoIterator<Item = FieldAttr>,
    ) -> Self {
        let mut field = FieldDescriptor::new(name.into(), column_type);
        for attr in attrs {
            attr.apply(&mut field);
        }
        self.info.fields.push(field);
        self
    }

    /// Yield the immutable schema snapshot.
    pub fn build(self) -> TableSchema {
        self.info
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_accumulates_fields_in_order() {
        let schema = SchemaBuilder::new("track")
            .field("id", ColumnType::Integer, [FieldAttr::RowIdentity])
            .field("title", ColumnType::Text, [])
            .field(
                "rating",
                ColumnType::Real,
                [FieldAttr::Nullable(true)],
            )
            .build();

        assert_eq!(schema.table, "track");
        let names: Vec<_> = schema.fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, ["id", "title", "rating"]);
    }

    #[test]
    fn row_identity_implies_primary_key() {
        let schema = SchemaBuilder::new("t")
            .field("id", ColumnType::Integer, [FieldAttr::RowIdentity])
            .build();
        let id = schema.field("id").unwrap();
        assert!(id.primary_key);
        assert!(id.row_identity);
    }

    #[test]
    fn fk_shorthand() {
        let schema = SchemaBuilder::new("album")
            .field(
                "artist_id",
                ColumnType::Integer,
                [fk("artist", "id", FkAction::Cascade, FkAction::NoAction)],
            )
            .build();
        let f = schema.field("artist_id").unwrap().foreign_key.as_ref().unwrap();
        assert_eq!(f.table, "artist");
        assert_eq!(f.on_delete, FkAction::Cascade);
        assert_eq!(f.on_update, FkAction::NoAction);
    }

    #[test]
    fn qualified_name_quotes_parts() {
        let schema = SchemaBuilder::new("t").schema("aux").build();
        assert_eq!(schema.qualified_name(), "\"aux\".\"t\"");

        let plain = SchemaBuilder::new("t").build();
        assert_eq!(plain.qualified_name(), "\"t\"");
    }

    #[test]
    fn temp_namespace_consistency() {
        let good = SchemaBuilder::new("t").schema("temp").temporary(true).build();
        assert!(good.temp_namespace_consistent());

        let bad = SchemaBuilder::new("t").temporary(true).build();
        assert!(!bad.temp_namespace_consistent());

        let unrelated = SchemaBuilder::new("t").schema("aux").build();
        assert!(unrelated.temp_namespace_consistent());
    }

    #[test]
    fn fk_action_sql_phrases() {
        assert_eq!(FkAction::SetNull.as_sql(), "SET NULL");
        assert_eq!(FkAction::from_sql("cascade"), Some(FkAction::Cascade));
        assert_eq!(FkAction::from_sql("SET DEFAULT"), Some(FkAction::SetDefault));
        assert_eq!(FkAction::from_sql("whatever"), None);
    }
}
