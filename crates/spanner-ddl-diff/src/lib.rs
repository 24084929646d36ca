//! # spanner-ddl-diff
//!
//! Compares two Cloud Spanner schema (DDL) definitions and generates the
//! `ALTER` statements to convert one to the other.
//!
//! The engine is a pure function of its inputs: both DDL documents are
//! parsed and extracted into a canonical schema model, the models are
//! compared category by category (tables, indexes, constraints, row
//! deletion policies, change streams, database options), and the
//! differences are emitted as an ordered, dependency-safe statement list
//! under a policy configuration.
//!
//! ## Example
//!
//! ```rust
//! use spanner_ddl_diff::{DdlDiff, DiffOptions};
//!
//! # fn main() -> spanner_ddl_diff::Result<()> {
//! let statements = DdlDiff::build(
//!     "CREATE TABLE Singers (SingerId INT64, Name STRING(100)) PRIMARY KEY (SingerId)",
//!     "CREATE TABLE Singers (SingerId INT64, Name STRING(1024)) PRIMARY KEY (SingerId)",
//! )?
//! .generate_difference_statements(&DiffOptions::default())?;
//!
//! assert_eq!(
//!     statements,
//!     vec!["ALTER TABLE Singers ALTER COLUMN Name STRING(1024)"]
//! );
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod diff;
pub mod error;
pub mod parser;
pub mod schema;

// Re-exports for convenient access
pub use config::{
    DiffOptions, ALLOW_DROP_STATEMENTS_OPT, ALLOW_RECREATE_CONSTRAINTS_OPT,
    ALLOW_RECREATE_INDEXES_OPT,
};
pub use diff::{DdlDiff, MapDifference, ValueDifference};
pub use error::{DdlDiffError, Result};
pub use parser::{parse_ddl, Statement};
pub use schema::{Constraint, Schema, Table};
