//! Schema comparison and migration plan generation.
//!
//! [`DdlDiff::build`] parses and extracts both DDL documents and computes
//! per-category differences; [`DdlDiff::generate_difference_statements`]
//! turns them into an ordered, dependency-safe statement list:
//!
//! 1. `ALTER DATABASE ... SET OPTIONS`
//! 2. drops of removed indexes and change streams (policy-gated), then the
//!    drop half of every index/constraint recreation, removed constraints,
//!    removed row deletion policies, and removed tables in reverse creation
//!    order (policy-gated);
//! 3. `ALTER TABLE` statements for modified tables;
//! 4. creations in dependency order: tables (new-side creation order), row
//!    deletion policies, indexes, constraints, change streams.
//!
//! Recreating a modified index or constraint is refused up front, before any
//! statement is emitted, unless the matching allow-flag is set.

mod map_diff;
mod tables;

use std::collections::BTreeMap;

use tracing::{info, warn};

use crate::config::{DiffOptions, ALLOW_RECREATE_CONSTRAINTS_OPT, ALLOW_RECREATE_INDEXES_OPT};
use crate::error::{DdlDiffError, Result};
use crate::parser::{CreateChangeStream, CreateIndex, RowDeletionPolicy};
use crate::schema::{Constraint, Schema, Table};

pub use map_diff::{MapDifference, ValueDifference};

/// Comparison of two schema versions, ready to generate a migration plan.
///
/// ```rust
/// use spanner_ddl_diff::{DdlDiff, DiffOptions};
///
/// # fn main() -> spanner_ddl_diff::Result<()> {
/// let diff = DdlDiff::build(
///     "CREATE TABLE T (id INT64) PRIMARY KEY (id)",
///     "CREATE TABLE T (id INT64, name STRING(100)) PRIMARY KEY (id)",
/// )?;
/// let statements = diff.generate_difference_statements(&DiffOptions::default())?;
/// assert_eq!(statements, vec!["ALTER TABLE T ADD COLUMN name STRING(100)"]);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct DdlDiff {
    original: Schema,
    new: Schema,
    database_name: Option<String>,
    table_differences: MapDifference<Table>,
    index_differences: MapDifference<CreateIndex>,
    constraint_differences: MapDifference<Constraint>,
    ttl_differences: MapDifference<RowDeletionPolicy>,
    change_stream_differences: MapDifference<CreateChangeStream>,
    database_options_differences: MapDifference<String>,
}

impl DdlDiff {
    /// Parse, extract and compare two DDL documents. Empty input is an
    /// empty schema.
    pub fn build(original_ddl: &str, new_ddl: &str) -> Result<Self> {
        let original = Schema::from_ddl(original_ddl)?;
        let new = Schema::from_ddl(new_ddl)?;
        Self::from_schemas(original, new)
    }

    /// Compare two already-extracted schemas.
    pub fn from_schemas(original: Schema, new: Schema) -> Result<Self> {
        let database_name = match (&original.database_name, &new.database_name) {
            (Some(first), Some(second)) if first != second => {
                return Err(DdlDiffError::ConflictingDatabaseName {
                    first: first.clone(),
                    second: second.clone(),
                });
            }
            (Some(name), _) => Some(name.clone()),
            (None, name) => name.clone(),
        };

        let table_differences = MapDifference::between(&original.tables, &new.tables);
        let index_differences = MapDifference::between(&original.indexes, &new.indexes);
        let constraint_differences =
            MapDifference::between(&original.constraints, &new.constraints);
        let ttl_differences = MapDifference::between(&original.ttls, &new.ttls);
        let change_stream_differences =
            MapDifference::between(&original.change_streams, &new.change_streams);
        let database_options_differences =
            MapDifference::between(&original.database_options, &new.database_options);

        Ok(Self {
            original,
            new,
            database_name,
            table_differences,
            index_differences,
            constraint_differences,
            ttl_differences,
            change_stream_differences,
            database_options_differences,
        })
    }

    /// Generate the ordered migration statement list under the given policy.
    ///
    /// Statements carry no trailing semicolons. An empty list means the two
    /// schemas already agree.
    pub fn generate_difference_statements(&self, options: &DiffOptions) -> Result<Vec<String>> {
        // Recreate gating happens before anything is emitted, so refusal is
        // atomic.
        if !self.index_differences.differing().is_empty() && !options.allow_recreate_indexes {
            return Err(DdlDiffError::RecreateNotPermitted {
                kind: "Index",
                kind_plural: "Indexes",
                flag: ALLOW_RECREATE_INDEXES_OPT,
                names: join_keys(self.index_differences.differing().keys()),
            });
        }
        if !self.constraint_differences.differing().is_empty()
            && !options.allow_recreate_constraints
        {
            return Err(DdlDiffError::RecreateNotPermitted {
                kind: "constraint",
                kind_plural: "Constraints",
                flag: ALLOW_RECREATE_CONSTRAINTS_OPT,
                names: join_keys(self.constraint_differences.differing().keys()),
            });
        }

        let mut output = Vec::new();

        if let Some(updates) = generate_options_updates(&self.database_options_differences) {
            let database = self
                .database_name
                .as_ref()
                .ok_or(DdlDiffError::MissingDatabaseName)?;
            info!("Updating database options");
            output.push(format!("ALTER DATABASE {database} SET OPTIONS ({updates})"));
        }

        if options.allow_drop_statements {
            for name in self.index_differences.only_in_original().keys() {
                info!("Dropping deleted index: {}", name);
                output.push(format!("DROP INDEX {name}"));
            }
            for name in self.change_stream_differences.only_in_original().keys() {
                info!("Dropping deleted change stream: {}", name);
                output.push(format!("DROP CHANGE STREAM {name}"));
            }
        }

        // Recreation always drops, independent of the drop policy.
        for name in self.index_differences.differing().keys() {
            info!("Dropping changed index for re-creation: {}", name);
            output.push(format!("DROP INDEX {name}"));
        }

        for constraint in self.constraint_differences.only_in_original().values() {
            info!("Dropping constraint: {}", constraint.name);
            output.push(format!(
                "ALTER TABLE {} DROP CONSTRAINT {}",
                constraint.table, constraint.name
            ));
        }

        for difference in self.constraint_differences.differing().values() {
            info!(
                "Dropping changed constraint for re-creation: {}",
                difference.original.name
            );
            output.push(format!(
                "ALTER TABLE {} DROP CONSTRAINT {}",
                difference.original.table, difference.original.name
            ));
        }

        for table in self.ttl_differences.only_in_original().keys() {
            info!("Dropping row deletion policy for: {}", table);
            output.push(format!("ALTER TABLE {table} DROP ROW DELETION POLICY"));
        }

        if options.allow_drop_statements {
            // Reverse creation order so interleaved children drop before
            // their parents.
            for name in self.original.tables.keys().rev() {
                if self.table_differences.only_in_original().contains_key(name) {
                    info!("Dropping deleted table: {}", name);
                    output.push(format!("DROP TABLE {name}"));
                }
            }
        }

        for difference in self.table_differences.differing().values() {
            info!("Altering modified table: {}", difference.original.name);
            output.extend(tables::alter_table_statements(
                &difference.original,
                &difference.new,
                options,
            )?);
        }

        // New tables must appear in their new-DDL creation order so parents
        // exist before interleaved children.
        for (name, table) in &self.new.tables {
            if self.table_differences.only_in_new().contains_key(name) {
                info!("Creating new table: {}", name);
                output.push(table.canonical_text());
            }
        }

        for (table, policy) in self.ttl_differences.only_in_new() {
            info!("Adding new row deletion policy for: {}", table);
            output.push(format!("ALTER TABLE {table} ADD {policy}"));
        }

        for (table, difference) in self.ttl_differences.differing() {
            info!("Updating row deletion policy for: {}", table);
            output.push(format!("ALTER TABLE {table} REPLACE {}", difference.new));
        }

        for index in self.index_differences.only_in_new().values() {
            info!("Creating new index: {}", index.name);
            output.push(index.canonical.clone());
        }

        for difference in self.index_differences.differing().values() {
            info!("Re-creating changed index: {}", difference.new.name);
            output.push(difference.new.canonical.clone());
        }

        for constraint in self.constraint_differences.only_in_new().values() {
            info!("Creating new constraint: {}", constraint.name);
            output.push(format!(
                "ALTER TABLE {} ADD {}",
                constraint.table,
                constraint.definition()
            ));
        }

        for difference in self.constraint_differences.differing().values() {
            info!("Re-creating changed constraint: {}", difference.new.name);
            output.push(format!(
                "ALTER TABLE {} ADD {}",
                difference.new.table,
                difference.new.definition()
            ));
        }

        for stream in self.change_stream_differences.only_in_new().values() {
            info!("Creating new change stream: {}", stream.name);
            output.push(stream.canonical_text());
        }

        for difference in self.change_stream_differences.differing().values() {
            info!("Updating change stream: {}", difference.new.name);
            if difference.original.for_clause != difference.new.for_clause {
                match &difference.new.for_clause {
                    Some(for_clause) => output.push(format!(
                        "ALTER CHANGE STREAM {} SET {for_clause}",
                        difference.new.name
                    )),
                    None => warn!(
                        "Change stream {} dropped its FOR clause; no statement emitted",
                        difference.new.name
                    ),
                }
            }
            if difference.original.options_clause != difference.new.options_clause {
                match &difference.new.options_clause {
                    Some(options_clause) => output.push(format!(
                        "ALTER CHANGE STREAM {} SET {options_clause}",
                        difference.new.name
                    )),
                    None => warn!(
                        "Change stream {} dropped its OPTIONS clause; no statement emitted",
                        difference.new.name
                    ),
                }
            }
        }

        Ok(output)
    }
}

/// Render an options-map difference as `key=value` updates in ascending key
/// order: removed keys are set to `NULL` (Spanner's clear operation),
/// changed and added keys carry their new value literal. `None` when the
/// maps already agree.
pub(crate) fn generate_options_updates(difference: &MapDifference<String>) -> Option<String> {
    if difference.are_equal() {
        return None;
    }

    let mut updates = BTreeMap::new();
    for key in difference.only_in_original().keys() {
        updates.insert(key.clone(), "NULL".to_string());
    }
    for (key, value) in difference.differing() {
        updates.insert(key.clone(), value.new.clone());
    }
    for (key, value) in difference.only_in_new() {
        updates.insert(key.clone(), value.clone());
    }

    Some(
        updates
            .into_iter()
            .map(|(key, value)| format!("{key}={value}"))
            .collect::<Vec<_>>()
            .join(","),
    )
}

fn join_keys<'a>(keys: impl Iterator<Item = &'a String>) -> String {
    keys.map(String::as_str).collect::<Vec<_>>().join(", ")
}
