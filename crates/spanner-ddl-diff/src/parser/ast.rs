//! AST nodes for the supported DDL statements.
//!
//! Every node renders a deterministic canonical text (keywords upper-cased,
//! normalized spacing, identifier case preserved). Canonical text is the
//! basis for all equality downstream, so `Display` implementations here are
//! part of the diff semantics, not cosmetics.

use std::fmt;

use indexmap::IndexMap;

use super::types::ColumnType;

/// A parsed DDL statement of a supported kind.
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    CreateTable(CreateTable),
    CreateIndex(CreateIndex),
    AlterTable(AlterTable),
    AlterDatabase(AlterDatabase),
    CreateChangeStream(CreateChangeStream),
}

/// `CREATE TABLE` prior to extraction: inline constraints and the row
/// deletion policy are still attached.
#[derive(Debug, Clone, PartialEq)]
pub struct CreateTable {
    pub name: String,
    pub columns: Vec<ColumnDef>,
    pub constraints: Vec<TableConstraint>,
    /// Canonical text, e.g. `PRIMARY KEY(id, ts DESC)`.
    pub primary_key: String,
    pub interleave: Option<Interleave>,
    pub row_deletion_policy: Option<RowDeletionPolicy>,
}

/// A column definition.
#[derive(Debug, Clone)]
pub struct ColumnDef {
    pub name: String,
    pub ty: ColumnType,
    pub not_null: bool,
    /// Canonical generation clause, e.g. `AS (a + b) STORED`.
    pub generation: Option<String>,
    /// Canonical default expression (without the DEFAULT keyword).
    pub default: Option<String>,
    pub options: IndexMap<String, String>,
}

impl PartialEq for ColumnDef {
    /// Canonical-text equality: two columns are equal iff they render
    /// identically, so option order is significant.
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.ty == other.ty
            && self.not_null == other.not_null
            && self.generation == other.generation
            && self.default == other.default
            && self.options.iter().eq(other.options.iter())
    }
}

impl fmt::Display for ColumnDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.name, self.ty)?;
        if self.not_null {
            f.write_str(" NOT NULL")?;
        }
        if let Some(generation) = &self.generation {
            write!(f, " {generation}")?;
        }
        if let Some(default) = &self.default {
            write!(f, " DEFAULT ({default})")?;
        }
        if !self.options.is_empty() {
            write!(f, " OPTIONS ({})", render_options(&self.options))?;
        }
        Ok(())
    }
}

/// `INTERLEAVE IN PARENT` clause. A source clause without an explicit
/// `ON DELETE` is canonicalized to `NO ACTION`, Spanner's default.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interleave {
    pub parent: String,
    pub on_delete: OnDelete,
}

impl fmt::Display for Interleave {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "INTERLEAVE IN PARENT {} ON DELETE {}", self.parent, self.on_delete)
    }
}

/// Interleave delete action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OnDelete {
    #[default]
    NoAction,
    Cascade,
}

impl fmt::Display for OnDelete {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OnDelete::NoAction => f.write_str("NO ACTION"),
            OnDelete::Cascade => f.write_str("CASCADE"),
        }
    }
}

/// `ROW DELETION POLICY` clause; the field is the canonical text inside the
/// outer parentheses, e.g. `OLDER_THAN(CreatedAt, INTERVAL 30 DAY)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowDeletionPolicy(pub String);

impl fmt::Display for RowDeletionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ROW DELETION POLICY ({})", self.0)
    }
}

/// Check or foreign-key constraint body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConstraintBody {
    /// Canonical check expression (without the CHECK keyword).
    Check(String),
    /// Canonical foreign-key text starting at `FOREIGN KEY`.
    ForeignKey(String),
}

impl fmt::Display for ConstraintBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConstraintBody::Check(expr) => write!(f, "CHECK ({expr})"),
            ConstraintBody::ForeignKey(body) => f.write_str(body),
        }
    }
}

/// A table constraint as parsed; the name is still optional here. Anonymous
/// constraints are rejected during extraction, not parsing, so that ALTER
/// and inline forms share one code path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableConstraint {
    pub name: Option<String>,
    pub body: ConstraintBody,
}

/// `CREATE INDEX`. The canonical full-statement text is the index identity
/// under diff and the exact CREATE statement to emit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateIndex {
    pub name: String,
    pub canonical: String,
}

/// Supported `ALTER TABLE` child operations.
#[derive(Debug, Clone, PartialEq)]
pub enum AlterTableOp {
    AddConstraint(TableConstraint),
    AddRowDeletionPolicy(RowDeletionPolicy),
}

/// `ALTER TABLE` statement.
#[derive(Debug, Clone, PartialEq)]
pub struct AlterTable {
    pub table: String,
    pub op: AlterTableOp,
}

/// `ALTER DATABASE name SET OPTIONS (...)`.
#[derive(Debug, Clone, PartialEq)]
pub struct AlterDatabase {
    pub database: String,
    /// Key/value-literal pairs in source order.
    pub options: Vec<(String, String)>,
}

/// `CREATE CHANGE STREAM`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateChangeStream {
    pub name: String,
    /// Canonical FOR clause, e.g. `FOR ALL` or `FOR Users(Name), Orders`.
    pub for_clause: Option<String>,
    /// Canonical OPTIONS clause, e.g. `OPTIONS (retention_period='36h')`.
    pub options_clause: Option<String>,
}

impl CreateChangeStream {
    /// Canonical full-statement text used as identity under diff.
    pub fn canonical_text(&self) -> String {
        let mut out = format!("CREATE CHANGE STREAM {}", self.name);
        if let Some(for_clause) = &self.for_clause {
            out.push(' ');
            out.push_str(for_clause);
        }
        if let Some(options) = &self.options_clause {
            out.push(' ');
            out.push_str(options);
        }
        out
    }
}

/// Render an options map as `key=value, ...` in source order.
pub fn render_options(options: &IndexMap<String, String>) -> String {
    options
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join(", ")
}
