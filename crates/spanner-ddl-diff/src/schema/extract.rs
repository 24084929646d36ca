//! Folding parsed statements into a [`Schema`].
//!
//! Constraints declared inline with their table are promoted into the
//! schema-wide constraint map so the diff engine can treat them exactly
//! like constraints added via `ALTER TABLE`; inline row deletion policies
//! are promoted the same way.

use tracing::debug;

use crate::error::{DdlDiffError, Result};
use crate::parser::{AlterTableOp, Statement, TableConstraint};

use super::{Constraint, Schema, Table};

impl Schema {
    /// Parse and extract in one step.
    pub fn from_ddl(ddl: &str) -> Result<Self> {
        Self::from_statements(crate::parser::parse_ddl(ddl)?)
    }

    /// Fold a statement list into a schema.
    ///
    /// Later statements win on key collisions, mirroring the map-insert
    /// behavior of reapplying the DDL in order.
    pub fn from_statements(statements: Vec<Statement>) -> Result<Self> {
        let mut schema = Schema::default();

        for statement in statements {
            match statement {
                Statement::CreateTable(create) => {
                    debug!("extracting table {}", create.name);
                    for constraint in create.constraints {
                        let constraint = named_constraint(&create.name, constraint)?;
                        schema.constraints.insert(constraint.name.clone(), constraint);
                    }
                    if let Some(policy) = create.row_deletion_policy {
                        schema.ttls.insert(create.name.clone(), policy);
                    }
                    let mut columns = indexmap::IndexMap::new();
                    for column in create.columns {
                        columns.insert(column.name.clone(), column);
                    }
                    schema.tables.insert(
                        create.name.clone(),
                        Table {
                            name: create.name,
                            columns,
                            primary_key: create.primary_key,
                            interleave: create.interleave,
                        },
                    );
                }
                Statement::CreateIndex(index) => {
                    debug!("extracting index {}", index.name);
                    schema.indexes.insert(index.name.clone(), index);
                }
                Statement::AlterTable(alter) => match alter.op {
                    AlterTableOp::AddConstraint(constraint) => {
                        let constraint = named_constraint(&alter.table, constraint)?;
                        schema.constraints.insert(constraint.name.clone(), constraint);
                    }
                    AlterTableOp::AddRowDeletionPolicy(policy) => {
                        schema.ttls.insert(alter.table, policy);
                    }
                },
                Statement::AlterDatabase(alter) => {
                    match &schema.database_name {
                        Some(existing) if *existing != alter.database => {
                            return Err(DdlDiffError::ConflictingDatabaseName {
                                first: existing.clone(),
                                second: alter.database,
                            });
                        }
                        _ => schema.database_name = Some(alter.database),
                    }
                    for (key, value) in alter.options {
                        schema.database_options.insert(key, value);
                    }
                }
                Statement::CreateChangeStream(stream) => {
                    debug!("extracting change stream {}", stream.name);
                    schema.change_streams.insert(stream.name.clone(), stream);
                }
            }
        }

        Ok(schema)
    }
}

fn named_constraint(table: &str, constraint: TableConstraint) -> Result<Constraint> {
    match constraint.name {
        Some(name) => Ok(Constraint {
            name,
            table: table.to_string(),
            body: constraint.body,
        }),
        None => Err(DdlDiffError::AnonymousConstraint {
            table: table.to_string(),
            body: constraint.body.to_string(),
        }),
    }
}
