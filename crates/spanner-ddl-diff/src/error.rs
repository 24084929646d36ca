//! Error types for the DDL diff library.

use thiserror::Error;

/// Main error type for diff operations.
///
/// The engine either returns a complete migration plan or fails with the
/// first fatal condition; no error is recovered locally.
#[derive(Error, Debug)]
pub enum DdlDiffError {
    /// A DDL fragment could not be parsed.
    #[error("Unable to parse statement:\n'{statement}'\nFailure: {message}")]
    Parse { statement: String, message: String },

    /// A parseable statement of a kind the diff engine does not handle.
    #[error(
        "Unsupported statement:\n{statement}\nCan only create diffs from CREATE TABLE, \
         CREATE INDEX, CREATE CHANGE STREAM, ALTER DATABASE and \
         'ALTER TABLE table_name ADD [constraint|row deletion policy]' DDL statements"
    )]
    UnsupportedStatement { statement: String },

    /// A constraint (inline or ALTER-added) has no explicit name.
    #[error("Can not create diffs when anonymous constraints are used (table {table}: {body})")]
    AnonymousConstraint { table: String, body: String },

    /// ALTER DATABASE statements reference more than one database name.
    #[error("Database IDs differ in ALTER DATABASE statements: '{first}' vs '{second}'")]
    ConflictingDatabaseName { first: String, second: String },

    /// Database options differ but no ALTER DATABASE statement supplied a name.
    #[error("No database ID defined - required for Alter Database statements")]
    MissingDatabaseName,

    /// Modified indexes or constraints exist without the matching allow-flag.
    #[error("At least one {kind} differs, and {flag} is not set.\n{kind_plural}: {names}")]
    RecreateNotPermitted {
        kind: &'static str,
        kind_plural: &'static str,
        flag: &'static str,
        names: String,
    },

    /// Interleaving presence or parent differs between schema versions.
    #[error("Cannot change interleaving on table {table}: {message}")]
    IncompatibleInterleaveChange { table: String, message: String },

    /// Primary keys differ between schema versions.
    #[error("Cannot change primary key of table {table} from {original} to {new}")]
    IncompatiblePrimaryKeyChange {
        table: String,
        original: String,
        new: String,
    },

    /// Column type change outside the STRING/BYTES length rule.
    #[error("Cannot change type of table {table} column {column} from {original} to {new}")]
    IncompatibleTypeChange {
        table: String,
        column: String,
        original: String,
        new: String,
    },

    /// Generation clause changed on a column.
    #[error("Cannot change generation clause of table {table} column {column} from {original} to {new}")]
    IncompatibleGenerationChange {
        table: String,
        column: String,
        original: String,
        new: String,
    },

    /// Configuration error (bad policy file, invalid flag combination, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error (file operations)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML deserialization error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl DdlDiffError {
    /// Create a Parse error for a statement fragment.
    pub fn parse(statement: impl Into<String>, message: impl Into<String>) -> Self {
        DdlDiffError::Parse {
            statement: statement.into(),
            message: message.into(),
        }
    }

    /// Format error with full details including error chain.
    pub fn format_detailed(&self) -> String {
        let mut output = format!("Error: {}\n", self);

        let mut source = std::error::Error::source(self);
        let mut depth = 1;
        while let Some(err) = source {
            output.push_str(&format!("\nCaused by:\n  {}: {}", depth, err));
            source = err.source();
            depth += 1;
        }

        output
    }

    /// Process exit code for the CLI: 2 for environment problems, 1 for diff failures.
    pub fn exit_code(&self) -> u8 {
        match self {
            DdlDiffError::Config(_)
            | DdlDiffError::Io(_)
            | DdlDiffError::Yaml(_)
            | DdlDiffError::Json(_) => 2,
            _ => 1,
        }
    }
}

/// Result type alias for diff operations.
pub type Result<T> = std::result::Result<T, DdlDiffError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_display() {
        let err = DdlDiffError::parse("CREATE GIBBERISH", "expected TABLE");
        let text = err.to_string();
        assert!(text.contains("CREATE GIBBERISH"));
        assert!(text.contains("expected TABLE"));
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(DdlDiffError::MissingDatabaseName.exit_code(), 1);
        assert_eq!(DdlDiffError::Config("bad".to_string()).exit_code(), 2);
    }

    #[test]
    fn test_format_detailed_includes_chain() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err = DdlDiffError::Io(io);
        let detailed = err.format_detailed();
        assert!(detailed.starts_with("Error: IO error"));
        assert!(detailed.contains("Caused by"));
    }
}
