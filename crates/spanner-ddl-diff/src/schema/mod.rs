//! Canonical schema model.
//!
//! These types are the database-agnostic representation the diff engine
//! works on. A [`Schema`] is produced once by extraction (see
//! [`Schema::from_statements`]) and is read-only afterwards.
//!
//! Two schemas are equal (and their diff empty) iff the canonical string
//! renderings of their objects agree category by category. Inline
//! constraints and row deletion policies are promoted out of their tables
//! during extraction, so `Table` equality deliberately ignores them.

mod extract;

use std::fmt;

use indexmap::IndexMap;

use crate::parser::{
    ColumnDef, ConstraintBody, CreateChangeStream, CreateIndex, Interleave, RowDeletionPolicy,
};

/// A full database schema in creation order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Schema {
    /// Tables keyed by name, in creation order. Order matters: child tables
    /// interleave into parents, so drops must run in reverse.
    pub tables: IndexMap<String, Table>,
    /// Standalone indexes keyed by name.
    pub indexes: IndexMap<String, CreateIndex>,
    /// All constraints keyed by (globally unique) name, whether declared
    /// inline or via `ALTER TABLE ... ADD`.
    pub constraints: IndexMap<String, Constraint>,
    /// Row deletion policies keyed by table name (at most one per table).
    pub ttls: IndexMap<String, RowDeletionPolicy>,
    /// Change streams keyed by name.
    pub change_streams: IndexMap<String, CreateChangeStream>,
    /// Merged key/value pairs from all `ALTER DATABASE ... SET OPTIONS`.
    pub database_options: IndexMap<String, String>,
    /// Database name from `ALTER DATABASE` statements, when present.
    pub database_name: Option<String>,
}

impl Schema {
    /// Render the schema back to DDL text. Extracting the rendered text
    /// yields an identical schema.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for table in self.tables.values() {
            out.push_str(&table.canonical_text());
            out.push_str(";\n");
        }
        for index in self.indexes.values() {
            out.push_str(&index.canonical);
            out.push_str(";\n");
        }
        for constraint in self.constraints.values() {
            out.push_str(&format!(
                "ALTER TABLE {} ADD {};\n",
                constraint.table,
                constraint.definition()
            ));
        }
        for (table, policy) in &self.ttls {
            out.push_str(&format!("ALTER TABLE {table} ADD {policy};\n"));
        }
        for stream in self.change_streams.values() {
            out.push_str(&stream.canonical_text());
            out.push_str(";\n");
        }
        if let (Some(name), false) = (&self.database_name, self.database_options.is_empty()) {
            out.push_str(&format!(
                "ALTER DATABASE {name} SET OPTIONS ({});\n",
                crate::parser::ast::render_options(&self.database_options)
            ));
        }
        out
    }
}

/// A table after extraction: columns, primary key and interleaving only.
#[derive(Debug, Clone)]
pub struct Table {
    pub name: String,
    /// Columns keyed by name, in declaration order.
    pub columns: IndexMap<String, ColumnDef>,
    /// Canonical text, e.g. `PRIMARY KEY(id, ts DESC)`.
    pub primary_key: String,
    pub interleave: Option<Interleave>,
}

impl Table {
    /// Canonical `CREATE TABLE` text, without constraints or row deletion
    /// policy. This is both the table's identity under diff and the
    /// statement emitted for added tables.
    pub fn canonical_text(&self) -> String {
        let columns = self
            .columns
            .values()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        let mut out = format!("CREATE TABLE {} ({}) {}", self.name, columns, self.primary_key);
        if let Some(interleave) = &self.interleave {
            out.push_str(&format!(", {interleave}"));
        }
        out
    }
}

impl PartialEq for Table {
    /// Canonical-text equality; column order is significant.
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.primary_key == other.primary_key
            && self.interleave == other.interleave
            && self.columns.iter().eq(other.columns.iter())
    }
}

/// A named constraint together with its owning table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Constraint {
    pub name: String,
    /// Owning table name.
    pub table: String,
    pub body: ConstraintBody,
}

impl Constraint {
    /// Canonical `CONSTRAINT name ...` text as used after `ADD`.
    pub fn definition(&self) -> String {
        format!("CONSTRAINT {} {}", self.name, self.body)
    }
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.definition())
    }
}
