//! Policy configuration for plan generation.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{DdlDiffError, Result};

/// Flag name for permitting index recreation.
pub const ALLOW_RECREATE_INDEXES_OPT: &str = "allowRecreateIndexes";
/// Flag name for permitting constraint recreation.
pub const ALLOW_RECREATE_CONSTRAINTS_OPT: &str = "allowRecreateConstraints";
/// Flag name for permitting DROP statements.
pub const ALLOW_DROP_STATEMENTS_OPT: &str = "allowDropStatements";

/// The three policy toggles consumed by the plan generator.
///
/// All default to `false`: the safest plan neither drops objects nor
/// recreates modified indexes or constraints.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DiffOptions {
    /// Permit drop-and-recreate of modified indexes. When unset, any
    /// modified index fails the diff.
    pub allow_recreate_indexes: bool,

    /// Permit drop-and-recreate of modified constraints. When unset, any
    /// modified constraint fails the diff.
    pub allow_recreate_constraints: bool,

    /// Emit DROP statements for removed tables, columns, indexes and change
    /// streams. When unset those drops are silently omitted; the drop half
    /// of a recreation is emitted regardless.
    pub allow_drop_statements: bool,
}

impl DiffOptions {
    /// Load options from a file.
    ///
    /// `.json` files are parsed as JSON; anything else is parsed as YAML.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;

        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_lowercase());

        match extension.as_deref() {
            Some("json") => Self::from_json(&content),
            _ => Self::from_yaml(&content),
        }
    }

    /// Parse options from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Parse options from a JSON string.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| DdlDiffError::Config(format!("Failed to parse JSON options: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults_are_all_false() {
        let options = DiffOptions::default();
        assert!(!options.allow_recreate_indexes);
        assert!(!options.allow_recreate_constraints);
        assert!(!options.allow_drop_statements);
    }

    #[test]
    fn test_from_yaml_camel_case_keys() {
        let options = DiffOptions::from_yaml(
            "allowRecreateIndexes: true\nallowDropStatements: true\n",
        )
        .unwrap();
        assert!(options.allow_recreate_indexes);
        assert!(!options.allow_recreate_constraints);
        assert!(options.allow_drop_statements);
    }

    #[test]
    fn test_from_json() {
        let options = DiffOptions::from_json(r#"{"allowRecreateConstraints": true}"#).unwrap();
        assert!(options.allow_recreate_constraints);
    }

    #[test]
    fn test_load_detects_json_extension() {
        let mut file = tempfile::Builder::new()
            .suffix(".json")
            .tempfile()
            .unwrap();
        file.write_all(br#"{"allowDropStatements": true}"#).unwrap();
        let options = DiffOptions::load(file.path()).unwrap();
        assert!(options.allow_drop_statements);
    }

    #[test]
    fn test_load_defaults_to_yaml() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"allowRecreateIndexes: true\n").unwrap();
        let options = DiffOptions::load(file.path()).unwrap();
        assert!(options.allow_recreate_indexes);
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let err = DiffOptions::load("/nonexistent/options.yaml").unwrap_err();
        assert!(matches!(err, DdlDiffError::Io(_)));
    }
}
