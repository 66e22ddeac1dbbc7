//! CREATE TABLE generation from a table schema.

use siderite_core::{TableSchema, UniqueSpec, quote_ident};
use std::collections::BTreeMap;

/// Render a `CREATE TABLE` statement for the given schema.
///
/// Pure string construction: per-field column definitions in declaration
/// order, then a `PRIMARY KEY(...)` clause when any field is flagged, one
/// `UNIQUE(...)` clause per unique group (explicit groups in ascending id
/// order, then the default group), and one `FOREIGN KEY` clause per field
/// that declares a reference. Fields with their own single-column unique
/// constraint get an inline `UNIQUE` keyword instead of a group clause.
pub fn generate_create_table(schema: &TableSchema) -> String {
    let mut sql = String::new();
    if schema.temporary {
        sql.push_str("CREATE TEMPORARY TABLE ");
    } else {
        sql.push_str("CREATE TABLE ");
    }
    if let Some(ns) = &schema.schema {
        sql.push_str(&quote_ident(ns));
        sql.push('.');
    }
    sql.push_str(&quote_ident(&schema.table));
    sql.push_str(" (\n");

    let mut pk_fields: Vec<&str> = Vec::new();
    let mut groups: BTreeMap<u32, Vec<&str>> = BTreeMap::new();
    let mut default_group: Vec<&str> = Vec::new();

    let mut first = true;
    for field in &schema.fields {
        if field.primary_key {
            pk_fields.push(&field.name);
        }
        match field.unique {
            UniqueSpec::Group(id) => groups.entry(id).or_default().push(&field.name),
            UniqueSpec::DefaultGroup => default_group.push(&field.name),
            UniqueSpec::None | UniqueSpec::Own => {}
        }

        if !first {
            sql.push_str(",\n");
        }
        first = false;
        sql.push('\t');
        sql.push_str(&quote_ident(&field.name));
        sql.push(' ');
        sql.push_str(field.column_type.sql_name());
        if !field.nullable {
            sql.push_str(" NOT NULL");
        }
        if field.unique == UniqueSpec::Own {
            sql.push_str(" UNIQUE");
        }
    }

    if !pk_fields.is_empty() {
        sql.push_str(",\n\tPRIMARY KEY(");
        push_column_list(&mut sql, &pk_fields);
        sql.push(')');
    }

    let mut unique_groups: Vec<Vec<&str>> = groups.into_values().collect();
    if !default_group.is_empty() {
        unique_groups.push(default_group);
    }
    for group in &unique_groups {
        sql.push_str(",\n\tUNIQUE(");
        push_column_list(&mut sql, group);
        sql.push(')');
    }

    for field in &schema.fields {
        let Some(fk) = &field.foreign_key else {
            continue;
        };
        sql.push_str(",\n\tFOREIGN KEY (");
        sql.push_str(&quote_ident(&field.name));
        sql.push_str(") REFERENCES ");
        sql.push_str(&quote_ident(&fk.table));
        sql.push_str(" (");
        sql.push_str(&quote_ident(&fk.column));
        sql.push_str(") ON DELETE ");
        sql.push_str(fk.on_delete.as_sql());
        sql.push_str(" ON UPDATE ");
        sql.push_str(fk.on_update.as_sql());
    }

    sql.push_str("\n);");
    sql
}

fn push_column_list(sql: &mut String, columns: &[&str]) {
    for (i, col) in columns.iter().enumerate() {
        if i != 0 {
            sql.push_str(", ");
        }
        sql.push_str(&quote_ident(col));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use siderite_core::{ColumnType, FieldAttr, FkAction, SchemaBuilder, fk};

    #[test]
    fn plain_table_has_no_constraint_clauses() {
        let schema = SchemaBuilder::new("track")
            .field("id", ColumnType::Integer, [])
            .field("title", ColumnType::Text, [FieldAttr::Nullable(true)])
            .build();
        let sql = generate_create_table(&schema);

        assert_eq!(
            sql,
            "CREATE TABLE \"track\" (\n\t\"id\" INTEGER NOT NULL,\n\t\"title\" TEXT\n);"
        );
        assert!(!sql.contains("FOREIGN KEY"));
        assert!(!sql.contains("UNIQUE("));
    }

    #[test]
    fn inline_unique_for_own_constraint() {
        let schema = SchemaBuilder::new("t")
            .field(
                "code",
                ColumnType::Text,
                [FieldAttr::Unique(UniqueSpec::Own)],
            )
            .build();
        let sql = generate_create_table(&schema);
        assert!(sql.contains("\"code\" TEXT NOT NULL UNIQUE"));
        assert!(!sql.contains("UNIQUE("));
    }

    #[test]
    fn primary_key_clause_in_declaration_order() {
        let schema = SchemaBuilder::new("t")
            .field("b", ColumnType::Integer, [FieldAttr::PrimaryKey(true)])
            .field("a", ColumnType::Integer, [FieldAttr::PrimaryKey(true)])
            .build();
        let sql = generate_create_table(&schema);
        assert!(sql.contains("PRIMARY KEY(\"b\", \"a\")"));
    }

    #[test]
    fn unique_groups_ordered_by_id_then_default() {
        let schema = SchemaBuilder::new("t")
            .field("a", ColumnType::Integer, [FieldAttr::Unique(UniqueSpec::Group(2))])
            .field("b", ColumnType::Integer, [FieldAttr::Unique(UniqueSpec::DefaultGroup)])
            .field("c", ColumnType::Integer, [FieldAttr::Unique(UniqueSpec::Group(1))])
            .field("d", ColumnType::Integer, [FieldAttr::Unique(UniqueSpec::Group(1))])
            .build();
        let sql = generate_create_table(&schema);

        let g1 = sql.find("UNIQUE(\"c\", \"d\")").unwrap();
        let g2 = sql.find("UNIQUE(\"a\")").unwrap();
        let dg = sql.find("UNIQUE(\"b\")").unwrap();
        assert!(g1 < g2);
        assert!(g2 < dg);
    }

    #[test]
    fn foreign_key_clause_spells_out_actions() {
        let schema = SchemaBuilder::new("album")
            .field(
                "artist_id",
                ColumnType::Integer,
                [fk("artist", "id", FkAction::Cascade, FkAction::SetNull)],
            )
            .build();
        let sql = generate_create_table(&schema);
        assert!(sql.contains(
            "FOREIGN KEY (\"artist_id\") REFERENCES \"artist\" (\"id\") \
             ON DELETE CASCADE ON UPDATE SET NULL"
        ));
    }

    #[test]
    fn temporary_table_with_namespace() {
        let schema = SchemaBuilder::new("scratch")
            .schema("temp")
            .temporary(true)
            .field("id", ColumnType::Integer, [])
            .build();
        let sql = generate_create_table(&schema);
        assert!(sql.starts_with("CREATE TEMPORARY TABLE \"temp\".\"scratch\" ("));
        assert!(sql.ends_with("\n);"));
    }
}
