//! Parsing of Spanner DDL text into statement lists.
//!
//! `--` comments are stripped through end-of-line and statements are split
//! on `;`; both steps respect quoted string literals. Each non-empty
//! trimmed fragment is then parsed individually.

pub mod ast;
mod lexer;
mod statements;
pub mod types;

use crate::error::{DdlDiffError, Result};
use lexer::Tokens;
use statements::StatementError;

pub use ast::{
    AlterDatabase, AlterTable, AlterTableOp, ColumnDef, ConstraintBody, CreateChangeStream,
    CreateIndex, CreateTable, Interleave, OnDelete, RowDeletionPolicy, Statement, TableConstraint,
};
pub use types::{ColumnType, TypeLength};

/// Parse a DDL document into its supported statements.
///
/// An empty or whitespace-only document yields an empty list.
pub fn parse_ddl(ddl: &str) -> Result<Vec<Statement>> {
    let stripped = strip_line_comments(ddl);
    let mut statements = Vec::new();
    for fragment in split_statements(&stripped) {
        statements.push(parse_statement(&fragment)?);
    }
    Ok(statements)
}

fn parse_statement(fragment: &str) -> Result<Statement> {
    let mut tokens = Tokens::lex(fragment)
        .map_err(|message| DdlDiffError::parse(fragment, message))?;
    statements::parse_statement(&mut tokens).map_err(|err| match err {
        StatementError::Syntax(message) => DdlDiffError::parse(fragment, message),
        StatementError::Unsupported => DdlDiffError::UnsupportedStatement {
            statement: fragment.to_string(),
        },
    })
}

/// Remove `--` comments through end-of-line, skipping quoted literals.
fn strip_line_comments(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let chars: Vec<char> = input.chars().collect();
    let mut i = 0;
    let mut quote: Option<char> = None;

    while i < chars.len() {
        let c = chars[i];
        match quote {
            Some(q) => {
                out.push(c);
                if c == q {
                    quote = None;
                }
                i += 1;
            }
            None => {
                if c == '\'' || c == '"' {
                    quote = Some(c);
                    out.push(c);
                    i += 1;
                } else if c == '-' && chars.get(i + 1) == Some(&'-') {
                    while i < chars.len() && chars[i] != '\n' {
                        i += 1;
                    }
                } else {
                    out.push(c);
                    i += 1;
                }
            }
        }
    }
    out
}

/// Split on `;` outside quoted literals; fragments are trimmed and empty
/// fragments dropped.
fn split_statements(input: &str) -> Vec<String> {
    let mut fragments = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;

    for c in input.chars() {
        match quote {
            Some(q) => {
                current.push(c);
                if c == q {
                    quote = None;
                }
            }
            None => {
                if c == '\'' || c == '"' {
                    quote = Some(c);
                    current.push(c);
                } else if c == ';' {
                    fragments.push(std::mem::take(&mut current));
                } else {
                    current.push(c);
                }
            }
        }
    }
    fragments.push(current);

    fragments
        .into_iter()
        .map(|f| f.trim().to_string())
        .filter(|f| !f.is_empty())
        .collect()
}
