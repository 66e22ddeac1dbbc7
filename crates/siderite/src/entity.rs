//! Entity definitions: table schemas paired with field accessors.
//!
//! An [`EntityDef`] couples a declarative [`TableSchema`] with one pair of
//! accessor functions per field, so generic code can move values between a
//! struct and its row without knowing the struct's shape. Definitions are
//! built once (typically in a `std::sync::LazyLock`) and shared for the
//! life of the process.

use siderite_core::{ColumnType, FieldAttr, SchemaBuilder, TableSchema, Value};

/// Reads and writes one field of an entity as a [`Value`].
///
/// The setter receives whatever the row holds, including `Null`; fields
/// backed by `Option` map `Null` to `None`.
pub struct FieldAccessor<T> {
    /// Extract the field's current value.
    pub get: fn(&T) -> Value,
    /// Store a database value into the field.
    pub set: fn(&mut T, &Value),
}

/// A table schema plus the accessors that bind it to `T`.
///
/// The accessor list is parallel to `schema().fields`: entry `i` reads and
/// writes the field described by descriptor `i`.
pub struct EntityDef<T> {
    schema: TableSchema,
    accessors: Vec<FieldAccessor<T>>,
}

impl<T> EntityDef<T> {
    /// The table schema.
    pub fn schema(&self) -> &TableSchema {
        &self.schema
    }

    /// The field accessors, in declaration order.
    pub fn accessors(&self) -> &[FieldAccessor<T>] {
        &self.accessors
    }

    /// Read all field values out of an entity, in declaration order.
    pub fn read_values(&self, entity: &T) -> Vec<Value> {
        self.accessors.iter().map(|a| (a.get)(entity)).collect()
    }
}

/// Fluent builder for [`EntityDef`].
///
/// Mirrors [`SchemaBuilder`], with each field also carrying its accessor
/// pair. Like the schema builder, nothing is validated here.
pub struct EntityBuilder<T> {
    builder: SchemaBuilder,
    accessors: Vec<FieldAccessor<T>>,
}

impl<T> EntityBuilder<T> {
    /// Start building an entity definition for the given table.
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            builder: SchemaBuilder::new(table),
            accessors: Vec::new(),
        }
    }

    /// Set the namespace qualifier.
    pub fn schema(mut self, namespace: impl Into<String>) -> Self {
        self.builder = self.builder.schema(namespace);
        self
    }

    /// Mark the table as temporary.
    pub fn temporary(mut self, v: bool) -> Self {
        self.builder = self.builder.temporary(v);
        self
    }

    /// Append one field with its accessors and attributes.
    pub fn field(
        mut self,
        name: impl Into<String>,
        column_type: ColumnType,
        get: fn(&T) -> Value,
        set: fn(&mut T, &Value),
        attrs: impl IntoIterator<Item = FieldAttr>,
    ) -> Self {
        self.builder = self.builder.field(name, column_type, attrs);
        self.accessors.push(FieldAccessor { get, set });
        self
    }

    /// Yield the immutable definition.
    pub fn build(self) -> EntityDef<T> {
        EntityDef {
            schema: self.builder.build(),
            accessors: self.accessors,
        }
    }
}

/// A type that maps to one table.
///
/// The only capability an entity exposes is its definition; everything
/// else (loading, persistence, queries) is generic code in
/// [`crate::repo`] working through the accessors. `Default` provides the
/// blank instance that row loading fills in.
pub trait Entity: Default {
    /// The process-wide definition for this entity type.
    fn def() -> &'static EntityDef<Self>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use siderite_core::UniqueSpec;

    #[derive(Default)]
    struct Sample {
        id: i64,
        label: Option<String>,
    }

    fn sample_def() -> EntityDef<Sample> {
        EntityBuilder::<Sample>::new("sample")
            .field(
                "id",
                ColumnType::Integer,
                |s| Value::from(s.id),
                |s, v| s.id = v.as_i64().unwrap_or_default(),
                [FieldAttr::RowIdentity],
            )
            .field(
                "label",
                ColumnType::Text,
                |s| Value::from(s.label.clone()),
                |s, v| s.label = v.as_str().map(str::to_string),
                [FieldAttr::Nullable(true), FieldAttr::Unique(UniqueSpec::Own)],
            )
            .build()
    }

    #[test]
    fn accessors_parallel_schema_fields() {
        let def = sample_def();
        assert_eq!(def.schema().fields.len(), def.accessors().len());
        assert_eq!(def.schema().fields[1].name, "label");
        assert_eq!(def.schema().fields[1].unique, UniqueSpec::Own);
    }

    #[test]
    fn accessors_round_trip_values() {
        let def = sample_def();
        let mut s = Sample::default();

        (def.accessors()[1].set)(&mut s, &Value::Text("x".to_string()));
        assert_eq!(s.label.as_deref(), Some("x"));
        assert_eq!((def.accessors()[1].get)(&s), Value::Text("x".to_string()));

        (def.accessors()[1].set)(&mut s, &Value::Null);
        assert_eq!(s.label, None);
        assert_eq!((def.accessors()[1].get)(&s), Value::Null);
    }

    #[test]
    fn read_values_in_declaration_order() {
        let def = sample_def();
        let s = Sample {
            id: 7,
            label: Some("a".to_string()),
        };
        assert_eq!(
            def.read_values(&s),
            vec![Value::Integer(7), Value::Text("a".to_string())]
        );
    }
}
