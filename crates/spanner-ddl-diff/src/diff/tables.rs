//! Column diff engine: `ALTER TABLE` statements for a table present in both
//! schema versions.
//!
//! Constraints are handled at the schema level (dropped before and created
//! after column changes), so this module only deals with the table's own
//! alterable surface: interleave delete action, dropped/added columns, and
//! the per-column change rules.

use crate::config::DiffOptions;
use crate::error::{DdlDiffError, Result};
use crate::parser::{ColumnDef, ColumnType};
use crate::schema::Table;

use super::map_diff::{MapDifference, ValueDifference};

/// Statements converting `original` into `new`, or an error when the change
/// requires recreating the table.
pub(super) fn alter_table_statements(
    original: &Table,
    new: &Table,
    options: &DiffOptions,
) -> Result<Vec<String>> {
    let mut statements = Vec::new();

    // Interleaving cannot be added, removed or re-parented in place.
    match (&original.interleave, &new.interleave) {
        (Some(_), None) | (None, Some(_)) => {
            return Err(DdlDiffError::IncompatibleInterleaveChange {
                table: original.name.clone(),
                message: "interleaving cannot be added or removed".to_string(),
            });
        }
        (Some(left), Some(right)) if left.parent != right.parent => {
            return Err(DdlDiffError::IncompatibleInterleaveChange {
                table: original.name.clone(),
                message: format!(
                    "interleaved parent cannot change from {} to {}",
                    left.parent, right.parent
                ),
            });
        }
        _ => {}
    }

    if original.primary_key != new.primary_key {
        return Err(DdlDiffError::IncompatiblePrimaryKeyChange {
            table: original.name.clone(),
            original: original.primary_key.clone(),
            new: new.primary_key.clone(),
        });
    }

    if let (Some(left), Some(right)) = (&original.interleave, &new.interleave) {
        if left.on_delete != right.on_delete {
            statements.push(format!(
                "ALTER TABLE {} SET ON DELETE {}",
                original.name, right.on_delete
            ));
        }
    }

    let column_differences = MapDifference::between(&original.columns, &new.columns);

    if options.allow_drop_statements {
        for column in column_differences.only_in_original().keys() {
            statements.push(format!("ALTER TABLE {} DROP COLUMN {}", original.name, column));
        }
    }

    for column in column_differences.only_in_new().values() {
        statements.push(format!("ALTER TABLE {} ADD COLUMN {}", original.name, column));
    }

    for difference in column_differences.differing().values() {
        column_statements(&original.name, difference, &mut statements)?;
    }

    Ok(statements)
}

/// Apply the per-column rules in order: type compatibility, generation
/// identity, NOT NULL / length, options, default. Each applicable rule
/// contributes one statement.
fn column_statements(
    table: &str,
    difference: &ValueDifference<ColumnDef>,
    statements: &mut Vec<String>,
) -> Result<()> {
    let original = &difference.original;
    let new = &difference.new;

    let type_changed = original.ty != new.ty;
    if type_changed && !alterable_type_change(&original.ty, &new.ty) {
        return Err(DdlDiffError::IncompatibleTypeChange {
            table: table.to_string(),
            column: original.name.clone(),
            original: original.ty.to_string(),
            new: new.ty.to_string(),
        });
    }

    if original.generation != new.generation {
        return Err(DdlDiffError::IncompatibleGenerationChange {
            table: table.to_string(),
            column: original.name.clone(),
            original: describe_clause(&original.generation),
            new: describe_clause(&new.generation),
        });
    }

    if original.not_null != new.not_null || type_changed {
        let mut statement = format!("ALTER TABLE {table} ALTER COLUMN {} {}", new.name, new.ty);
        if new.not_null {
            statement.push_str(" NOT NULL");
        }
        statements.push(statement);
    }

    let options_difference = MapDifference::between(&original.options, &new.options);
    if let Some(updates) = super::generate_options_updates(&options_difference) {
        statements.push(format!(
            "ALTER TABLE {table} ALTER COLUMN {} SET OPTIONS ({updates})",
            new.name
        ));
    }

    if original.default != new.default {
        match &new.default {
            None => statements.push(format!(
                "ALTER TABLE {table} ALTER COLUMN {} DROP DEFAULT",
                new.name
            )),
            Some(expr) => statements.push(format!(
                "ALTER TABLE {table} ALTER COLUMN {} SET DEFAULT ({expr})",
                new.name
            )),
        }
    }

    Ok(())
}

/// Only length changes within STRING or BYTES are alterable in place; the
/// root type and array nesting depth must be unchanged. Everything else,
/// including STRUCT subtypes and dialect-prefixed types, must recreate.
fn alterable_type_change(original: &ColumnType, new: &ColumnType) -> bool {
    let (original_root, original_depth) = original.root();
    let (new_root, new_depth) = new.root();
    original_depth == new_depth
        && original_root.name() == new_root.name()
        && matches!(original_root, ColumnType::String(_) | ColumnType::Bytes(_))
}

fn describe_clause(clause: &Option<String>) -> String {
    clause.clone().unwrap_or_else(|| "<none>".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Schema;

    fn table(ddl: &str) -> Table {
        let schema = Schema::from_ddl(ddl).unwrap();
        schema.tables.values().next().unwrap().clone()
    }

    fn diff_tables(original: &str, new: &str, options: &DiffOptions) -> Result<Vec<String>> {
        alter_table_statements(&table(original), &table(new), options)
    }

    #[test]
    fn test_added_column() {
        let statements = diff_tables(
            "CREATE TABLE T (id INT64) PRIMARY KEY (id)",
            "CREATE TABLE T (id INT64, name STRING(100)) PRIMARY KEY (id)",
            &DiffOptions::default(),
        )
        .unwrap();
        assert_eq!(statements, vec!["ALTER TABLE T ADD COLUMN name STRING(100)"]);
    }

    #[test]
    fn test_dropped_column_requires_flag() {
        let original = "CREATE TABLE T (id INT64, name STRING(100)) PRIMARY KEY (id)";
        let new = "CREATE TABLE T (id INT64) PRIMARY KEY (id)";

        let silent = diff_tables(original, new, &DiffOptions::default()).unwrap();
        assert!(silent.is_empty());

        let options = DiffOptions {
            allow_drop_statements: true,
            ..DiffOptions::default()
        };
        let statements = diff_tables(original, new, &options).unwrap();
        assert_eq!(statements, vec!["ALTER TABLE T DROP COLUMN name"]);
    }

    #[test]
    fn test_string_length_change() {
        let statements = diff_tables(
            "CREATE TABLE T (id INT64, name STRING(100)) PRIMARY KEY (id)",
            "CREATE TABLE T (id INT64, name STRING(200)) PRIMARY KEY (id)",
            &DiffOptions::default(),
        )
        .unwrap();
        assert_eq!(statements, vec!["ALTER TABLE T ALTER COLUMN name STRING(200)"]);
    }

    #[test]
    fn test_array_of_bytes_length_change() {
        let statements = diff_tables(
            "CREATE TABLE T (id INT64, blobs ARRAY<BYTES(100)>) PRIMARY KEY (id)",
            "CREATE TABLE T (id INT64, blobs ARRAY<BYTES(MAX)>) PRIMARY KEY (id)",
            &DiffOptions::default(),
        )
        .unwrap();
        assert_eq!(
            statements,
            vec!["ALTER TABLE T ALTER COLUMN blobs ARRAY<BYTES(MAX)>"]
        );
    }

    #[test]
    fn test_incompatible_type_change() {
        let err = diff_tables(
            "CREATE TABLE T (id INT64, name STRING(100)) PRIMARY KEY (id)",
            "CREATE TABLE T (id INT64, name INT64) PRIMARY KEY (id)",
            &DiffOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, DdlDiffError::IncompatibleTypeChange { .. }));
    }

    #[test]
    fn test_array_depth_change_is_incompatible() {
        let err = diff_tables(
            "CREATE TABLE T (id INT64, v STRING(10)) PRIMARY KEY (id)",
            "CREATE TABLE T (id INT64, v ARRAY<STRING(10)>) PRIMARY KEY (id)",
            &DiffOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, DdlDiffError::IncompatibleTypeChange { .. }));
    }

    #[test]
    fn test_not_null_change_emits_full_column_type() {
        let statements = diff_tables(
            "CREATE TABLE T (id INT64, name STRING(100)) PRIMARY KEY (id)",
            "CREATE TABLE T (id INT64, name STRING(100) NOT NULL) PRIMARY KEY (id)",
            &DiffOptions::default(),
        )
        .unwrap();
        assert_eq!(
            statements,
            vec!["ALTER TABLE T ALTER COLUMN name STRING(100) NOT NULL"]
        );
    }

    #[test]
    fn test_nullable_change_suppresses_not_null_token() {
        let statements = diff_tables(
            "CREATE TABLE T (id INT64, name STRING(100) NOT NULL) PRIMARY KEY (id)",
            "CREATE TABLE T (id INT64, name STRING(100)) PRIMARY KEY (id)",
            &DiffOptions::default(),
        )
        .unwrap();
        assert_eq!(statements, vec!["ALTER TABLE T ALTER COLUMN name STRING(100)"]);
    }

    #[test]
    fn test_generation_change_is_incompatible() {
        let err = diff_tables(
            "CREATE TABLE T (a INT64, b INT64, c INT64 AS (a + b) STORED) PRIMARY KEY (a)",
            "CREATE TABLE T (a INT64, b INT64, c INT64 AS (a - b) STORED) PRIMARY KEY (a)",
            &DiffOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, DdlDiffError::IncompatibleGenerationChange { .. }));
    }

    #[test]
    fn test_options_change() {
        let statements = diff_tables(
            "CREATE TABLE T (id INT64, ts TIMESTAMP OPTIONS (allow_commit_timestamp = true)) PRIMARY KEY (id)",
            "CREATE TABLE T (id INT64, ts TIMESTAMP) PRIMARY KEY (id)",
            &DiffOptions::default(),
        )
        .unwrap();
        assert_eq!(
            statements,
            vec!["ALTER TABLE T ALTER COLUMN ts SET OPTIONS (allow_commit_timestamp=NULL)"]
        );
    }

    #[test]
    fn test_default_added_changed_dropped() {
        let no_default = "CREATE TABLE T (id INT64, v INT64) PRIMARY KEY (id)";
        let default_one = "CREATE TABLE T (id INT64, v INT64 DEFAULT (1)) PRIMARY KEY (id)";
        let default_two = "CREATE TABLE T (id INT64, v INT64 DEFAULT (2)) PRIMARY KEY (id)";

        assert_eq!(
            diff_tables(no_default, default_one, &DiffOptions::default()).unwrap(),
            vec!["ALTER TABLE T ALTER COLUMN v SET DEFAULT (1)"]
        );
        assert_eq!(
            diff_tables(default_one, default_two, &DiffOptions::default()).unwrap(),
            vec!["ALTER TABLE T ALTER COLUMN v SET DEFAULT (2)"]
        );
        assert_eq!(
            diff_tables(default_one, no_default, &DiffOptions::default()).unwrap(),
            vec!["ALTER TABLE T ALTER COLUMN v DROP DEFAULT"]
        );
    }

    #[test]
    fn test_on_delete_change() {
        let statements = diff_tables(
            "CREATE TABLE C (pid INT64, id INT64) PRIMARY KEY (pid, id), INTERLEAVE IN PARENT P",
            "CREATE TABLE C (pid INT64, id INT64) PRIMARY KEY (pid, id), \
             INTERLEAVE IN PARENT P ON DELETE CASCADE",
            &DiffOptions::default(),
        )
        .unwrap();
        assert_eq!(statements, vec!["ALTER TABLE C SET ON DELETE CASCADE"]);
    }

    #[test]
    fn test_interleave_presence_change_fails() {
        let err = diff_tables(
            "CREATE TABLE C (pid INT64, id INT64) PRIMARY KEY (pid, id), INTERLEAVE IN PARENT P",
            "CREATE TABLE C (pid INT64, id INT64) PRIMARY KEY (pid, id)",
            &DiffOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, DdlDiffError::IncompatibleInterleaveChange { .. }));
    }

    #[test]
    fn test_interleave_parent_change_fails() {
        let err = diff_tables(
            "CREATE TABLE C (pid INT64, id INT64) PRIMARY KEY (pid, id), INTERLEAVE IN PARENT P",
            "CREATE TABLE C (pid INT64, id INT64) PRIMARY KEY (pid, id), INTERLEAVE IN PARENT Q",
            &DiffOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, DdlDiffError::IncompatibleInterleaveChange { .. }));
    }

    #[test]
    fn test_primary_key_change_fails() {
        let err = diff_tables(
            "CREATE TABLE T (a INT64, b INT64) PRIMARY KEY (a)",
            "CREATE TABLE T (a INT64, b INT64) PRIMARY KEY (b)",
            &DiffOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, DdlDiffError::IncompatiblePrimaryKeyChange { .. }));
    }
}
