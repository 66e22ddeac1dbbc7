//! Live schema verification.
//!
//! The verifier diffs a declarative [`TableSchema`] against the catalog
//! snapshots of the corresponding live table and accumulates every
//! discrepancy as a human-readable finding. Schema drift is an expected,
//! diagnosable condition: findings never become errors, and only
//! engine-level query failures abort verification.

use crate::introspect::{CatalogReader, LiveColumn, LiveForeignKey, LiveUniqueIndex};
use serde::{Deserialize, Serialize};
use siderite_core::{Connection, FkAction, Result, TableSchema, UniqueSpec, temp_namespace};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// The outcome of one verification run: an ordered list of findings.
///
/// An empty list means the live table matches the schema. Findings are
/// diagnostic strings, not machine-actionable diffs, and their order is
/// the insertion order of the checks - deterministic for fixed input.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VerificationReport {
    findings: Vec<String>,
}

impl VerificationReport {
    /// True when no discrepancies were found.
    pub fn is_ok(&self) -> bool {
        self.findings.is_empty()
    }

    /// The findings, in check order.
    pub fn findings(&self) -> &[String] {
        &self.findings
    }

    /// Number of findings.
    pub fn len(&self) -> usize {
        self.findings.len()
    }

    /// True when there are no findings.
    pub fn is_empty(&self) -> bool {
        self.findings.is_empty()
    }

    fn push(&mut self, finding: String) {
        self.findings.push(finding);
    }
}

impl fmt::Display for VerificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for finding in &self.findings {
            writeln!(f, "{}", finding)?;
        }
        Ok(())
    }
}

/// Verify a table schema against the live database.
///
/// Three conditions end verification early with a single finding: a
/// temporary table whose namespace qualifier is not the temporary
/// namespace, a missing table, and a table reporting zero columns. All
/// other checks run to completion, accumulating findings. Engine-level
/// failures while reading the catalog propagate as errors.
pub fn verify_table_schema<C: Connection>(
    conn: &C,
    schema: &TableSchema,
) -> Result<VerificationReport> {
    let mut report = VerificationReport::default();

    if !schema.temp_namespace_consistent() {
        report.push(format!(
            "table \"{}\" is declared temporary but not in the \"{}\" namespace",
            schema.table,
            temp_namespace()
        ));
        return Ok(report);
    }

    let namespace = schema.schema.as_deref();
    if !conn.table_exists(namespace, &schema.table)? {
        report.push(format!("table \"{}\" is missing", schema.table));
        return Ok(report);
    }

    let reader = CatalogReader::new(conn);
    let columns = reader.columns(namespace, &schema.table)?;
    let foreign_keys = reader.foreign_keys(namespace, &schema.table)?;
    let unique_indexes = reader.unique_indexes(namespace, &schema.table)?;

    verify_into(&mut report, schema, &columns, &foreign_keys, &unique_indexes);
    tracing::debug!(
        table = %schema.table,
        findings = report.len(),
        "schema verification finished"
    );
    Ok(report)
}

/// Diff a table schema against already-fetched catalog snapshots.
///
/// This is the pure core of [`verify_table_schema`]: no I/O, deterministic
/// output. The caller is responsible for the existence check; an empty
/// column list is treated as a second existence failure and short-circuits.
pub fn verify_snapshots(
    schema: &TableSchema,
    columns: &[LiveColumn],
    foreign_keys: &[LiveForeignKey],
    unique_indexes: &[LiveUniqueIndex],
) -> VerificationReport {
    let mut report = VerificationReport::default();
    verify_into(&mut report, schema, columns, foreign_keys, unique_indexes);
    report
}

fn verify_into(
    report: &mut VerificationReport,
    schema: &TableSchema,
    columns: &[LiveColumn],
    foreign_keys: &[LiveForeignKey],
    unique_indexes: &[LiveUniqueIndex],
) {
    if columns.is_empty() {
        report.push(format!("table \"{}\" has no columns", schema.table));
        return;
    }

    check_columns(report, schema, columns);
    check_foreign_keys(report, schema, foreign_keys);
    check_unique_indexes(report, schema, unique_indexes);
}

fn check_columns(report: &mut VerificationReport, schema: &TableSchema, columns: &[LiveColumn]) {
    for live in columns {
        let Some(field) = schema.field(&live.name) else {
            report.push(format!(
                "extra field \"{}\" in table \"{}\"",
                live.name, schema.table
            ));
            continue;
        };

        if !field.column_type.matches_decl(&live.decl_type) {
            report.push(format!(
                "field \"{}\": expected type {}, found {}",
                field.name,
                field.column_type.sql_name(),
                live.decl_type
            ));
        }

        if live.not_null == field.nullable {
            if field.nullable {
                report.push(format!(
                    "field \"{}\" should be nullable but is NOT NULL",
                    field.name
                ));
            } else {
                report.push(format!(
                    "field \"{}\" should be NOT NULL but is nullable",
                    field.name
                ));
            }
        }

        let live_pk = live.pk > 0;
        if live_pk != field.primary_key {
            if field.primary_key {
                report.push(format!(
                    "field \"{}\" should be part of the primary key",
                    field.name
                ));
            } else {
                report.push(format!(
                    "field \"{}\" should not be part of the primary key",
                    field.name
                ));
            }
        }

        // Default values are not compared yet.
    }

    for field in &schema.fields {
        if !columns.iter().any(|c| c.name == field.name) {
            report.push(format!(
                "field \"{}\" is missing in table \"{}\"",
                field.name, schema.table
            ));
        }
    }
}

fn check_foreign_keys(
    report: &mut VerificationReport,
    schema: &TableSchema,
    foreign_keys: &[LiveForeignKey],
) {
    for live in foreign_keys {
        let Some(field) = schema.field(&live.from) else {
            report.push(format!(
                "field \"{}\" is referenced by a foreign key but not declared",
                live.from
            ));
            continue;
        };

        let Some(expected) = &field.foreign_key else {
            report.push(format!(
                "field \"{}\" has a foreign key in the database but none is declared",
                field.name
            ));
            continue;
        };

        if live.table != expected.table {
            report.push(format!(
                "foreign key on \"{}\": references table \"{}\", expected \"{}\"",
                field.name, live.table, expected.table
            ));
        }

        if live.to.as_deref() != Some(expected.column.as_str()) {
            report.push(format!(
                "foreign key on \"{}\": references field \"{}\", expected \"{}\"",
                field.name,
                live.to.as_deref().unwrap_or("<implicit>"),
                expected.column
            ));
        }

        if FkAction::from_sql(&live.on_delete) != Some(expected.on_delete) {
            report.push(format!(
                "foreign key on \"{}\": ON DELETE is {}, expected {}",
                field.name,
                live.on_delete,
                expected.on_delete.as_sql()
            ));
        }

        if FkAction::from_sql(&live.on_update) != Some(expected.on_update) {
            report.push(format!(
                "foreign key on \"{}\": ON UPDATE is {}, expected {}",
                field.name,
                live.on_update,
                expected.on_update.as_sql()
            ));
        }

        if !live.fk_match.eq_ignore_ascii_case("NONE") {
            report.push(format!(
                "foreign key on \"{}\": unexpected MATCH {} clause",
                field.name, live.fk_match
            ));
        }
    }

    for field in &schema.fields {
        if field.foreign_key.is_some() && !foreign_keys.iter().any(|fk| fk.from == field.name) {
            report.push(format!(
                "foreign key for field \"{}\" is missing",
                field.name
            ));
        }
    }
}

fn check_unique_indexes(
    report: &mut VerificationReport,
    schema: &TableSchema,
    unique_indexes: &[LiveUniqueIndex],
) {
    let expected_groups = expected_unique_groups(schema);

    // Exact set-of-column-names comparison, order-independent and with no
    // partial credit. Each live index can satisfy at most one group.
    let mut live_used = vec![false; unique_indexes.len()];
    let live_sets: Vec<BTreeSet<&str>> = unique_indexes
        .iter()
        .map(|idx| idx.column_names().collect())
        .collect();

    for group in &expected_groups {
        let expected_set: BTreeSet<&str> = group.iter().map(String::as_str).collect();
        let found = live_sets
            .iter()
            .enumerate()
            .find(|(i, set)| !live_used[*i] && **set == expected_set);

        match found {
            Some((i, _)) => live_used[i] = true,
            None => report.push(format!(
                "could not find unique key for fields {}",
                quoted_list(group.iter().map(String::as_str))
            )),
        }
    }

    for (i, idx) in unique_indexes.iter().enumerate() {
        if !live_used[i] {
            report.push(format!(
                "extra unique key for fields {}",
                quoted_list(idx.column_names())
            ));
        }
    }
}

/// The unique-column groups a schema declares: one singleton group per
/// field with its own constraint (declaration order), then one group per
/// explicit id (ascending), then the default group if any field joined it.
fn expected_unique_groups(schema: &TableSchema) -> Vec<Vec<String>> {
    let mut groups: Vec<Vec<String>> = Vec::new();
    let mut by_id: BTreeMap<u32, Vec<String>> = BTreeMap::new();
    let mut default_group: Vec<String> = Vec::new();

    for field in &schema.fields {
        match field.unique {
            UniqueSpec::Own => groups.push(vec![field.name.clone()]),
            UniqueSpec::Group(id) => by_id.entry(id).or_default().push(field.name.clone()),
            UniqueSpec::DefaultGroup => default_group.push(field.name.clone()),
            UniqueSpec::None => {}
        }
    }

    groups.extend(by_id.into_values());
    if !default_group.is_empty() {
        groups.push(default_group);
    }
    groups
}

fn quoted_list<'a>(names: impl Iterator<Item = &'a str>) -> String {
    names
        .map(|n| format!("\"{}\"", n))
        .collect::<Vec<_>>()
        .join(", ")
}
