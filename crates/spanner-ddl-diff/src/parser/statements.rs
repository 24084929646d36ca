//! Recursive-descent parsers for the supported statement kinds.

use indexmap::IndexMap;

use super::ast::{
    AlterDatabase, AlterTable, AlterTableOp, ColumnDef, ConstraintBody, CreateChangeStream,
    CreateIndex, CreateTable, Interleave, OnDelete, RowDeletionPolicy, Statement, TableConstraint,
};
use super::lexer::{join_tokens, Token, Tokens};
use super::types::ColumnType;

/// Why a fragment failed to become a supported statement.
#[derive(Debug)]
pub(super) enum StatementError {
    /// Syntactically broken input; the message names the failure.
    Syntax(String),
    /// Well-formed DDL of a kind the diff engine does not handle.
    Unsupported,
}

impl From<String> for StatementError {
    fn from(message: String) -> Self {
        StatementError::Syntax(message)
    }
}

pub(super) fn parse_statement(tokens: &mut Tokens) -> Result<Statement, StatementError> {
    if tokens.eat_keyword("CREATE") {
        if tokens.eat_keyword("TABLE") {
            return Ok(Statement::CreateTable(parse_create_table(tokens)?));
        }
        if tokens.peek().is_some_and(|t| {
            t.is_keyword("UNIQUE") || t.is_keyword("NULL_FILTERED") || t.is_keyword("INDEX")
        }) {
            return Ok(Statement::CreateIndex(parse_create_index(tokens)?));
        }
        if tokens.eat_keywords(&["CHANGE", "STREAM"]) {
            return Ok(Statement::CreateChangeStream(parse_create_change_stream(tokens)?));
        }
        // CREATE VIEW, CREATE SEQUENCE, ... parse fine elsewhere but are not diffable.
        return Err(StatementError::Unsupported);
    }

    if tokens.eat_keyword("ALTER") {
        if tokens.eat_keyword("TABLE") {
            return parse_alter_table(tokens).map(Statement::AlterTable);
        }
        if tokens.eat_keyword("DATABASE") {
            return Ok(Statement::AlterDatabase(parse_alter_database(tokens)?));
        }
        return Err(StatementError::Unsupported);
    }

    if tokens.peek().is_some_and(|t| t.is_keyword("DROP")) {
        return Err(StatementError::Unsupported);
    }

    Err(StatementError::Syntax(format!(
        "expected CREATE or ALTER, found {}",
        tokens
            .peek()
            .map_or_else(|| "end of statement".to_string(), |t| format!("'{}'", t.text()))
    )))
}

fn parse_create_table(tokens: &mut Tokens) -> Result<CreateTable, String> {
    tokens.eat_keywords(&["IF", "NOT", "EXISTS"]);
    let name = tokens.expect_ident()?;
    tokens.expect_op("(")?;

    let mut columns = Vec::new();
    let mut constraints = Vec::new();
    if !tokens.peek().is_some_and(|t| t.is_op(")")) {
        loop {
            if tokens.peek().is_some_and(|t| {
                t.is_keyword("CONSTRAINT") || t.is_keyword("FOREIGN") || t.is_keyword("CHECK")
            }) {
                constraints.push(parse_table_constraint(tokens)?);
            } else {
                columns.push(parse_column_def(tokens)?);
            }
            if !tokens.eat_op(",") {
                break;
            }
        }
    }
    tokens.expect_op(")")?;

    tokens.expect_keyword("PRIMARY")?;
    tokens.expect_keyword("KEY")?;
    let primary_key = format!("PRIMARY KEY{}", parse_key_parts(tokens)?);

    let mut interleave = None;
    let mut row_deletion_policy = None;
    while tokens.eat_op(",") {
        if tokens.eat_keyword("INTERLEAVE") {
            tokens.expect_keyword("IN")?;
            tokens.expect_keyword("PARENT")?;
            let parent = tokens.expect_ident()?;
            let on_delete = parse_on_delete(tokens)?.unwrap_or_default();
            interleave = Some(Interleave { parent, on_delete });
        } else if tokens.eat_keywords(&["ROW", "DELETION", "POLICY"]) {
            tokens.expect_op("(")?;
            row_deletion_policy = Some(RowDeletionPolicy(capture_balanced(tokens)?));
        } else {
            return Err(format!(
                "expected INTERLEAVE or ROW DELETION POLICY after ',', found {}",
                tokens
                    .peek()
                    .map_or_else(|| "end of statement".to_string(), |t| format!("'{}'", t.text()))
            ));
        }
    }
    tokens.expect_end()?;

    Ok(CreateTable {
        name,
        columns,
        constraints,
        primary_key,
        interleave,
        row_deletion_policy,
    })
}

fn parse_column_def(tokens: &mut Tokens) -> Result<ColumnDef, String> {
    let name = tokens.expect_ident()?;
    let ty = ColumnType::parse(tokens)?;

    let mut column = ColumnDef {
        name,
        ty,
        not_null: false,
        generation: None,
        default: None,
        options: IndexMap::new(),
    };

    loop {
        if tokens.eat_keywords(&["NOT", "NULL"]) {
            column.not_null = true;
        } else if tokens.eat_keyword("AS") {
            tokens.expect_op("(")?;
            let expr = capture_balanced(tokens)?;
            tokens.expect_keyword("STORED")?;
            column.generation = Some(format!("AS ({expr}) STORED"));
        } else if tokens.eat_keyword("DEFAULT") {
            tokens.expect_op("(")?;
            column.default = Some(capture_balanced(tokens)?);
        } else if tokens.eat_keyword("OPTIONS") {
            for (key, value) in parse_options_list(tokens)? {
                column.options.insert(key, value);
            }
        } else {
            break;
        }
    }

    Ok(column)
}

fn parse_table_constraint(tokens: &mut Tokens) -> Result<TableConstraint, String> {
    let name = if tokens.eat_keyword("CONSTRAINT") {
        Some(tokens.expect_ident()?)
    } else {
        None
    };

    if tokens.eat_keywords(&["FOREIGN", "KEY"]) {
        let columns = parse_ident_list(tokens)?;
        tokens.expect_keyword("REFERENCES")?;
        let referenced = tokens.expect_ident()?;
        let referenced_columns = parse_ident_list(tokens)?;
        let mut body = format!("FOREIGN KEY{columns} REFERENCES {referenced}{referenced_columns}");
        if let Some(action) = parse_on_delete(tokens)? {
            body.push_str(&format!(" ON DELETE {action}"));
        }
        return Ok(TableConstraint {
            name,
            body: ConstraintBody::ForeignKey(body),
        });
    }

    if tokens.eat_keyword("CHECK") {
        tokens.expect_op("(")?;
        let expr = capture_balanced(tokens)?;
        return Ok(TableConstraint {
            name,
            body: ConstraintBody::Check(expr),
        });
    }

    Err(format!(
        "expected FOREIGN KEY or CHECK, found {}",
        tokens
            .peek()
            .map_or_else(|| "end of statement".to_string(), |t| format!("'{}'", t.text()))
    ))
}

fn parse_create_index(tokens: &mut Tokens) -> Result<CreateIndex, String> {
    let unique = tokens.eat_keyword("UNIQUE");
    let null_filtered = tokens.eat_keyword("NULL_FILTERED");
    tokens.expect_keyword("INDEX")?;
    tokens.eat_keywords(&["IF", "NOT", "EXISTS"]);
    let name = tokens.expect_ident()?;
    tokens.expect_keyword("ON")?;
    let table = tokens.expect_ident()?;
    let key = parse_key_parts(tokens)?;

    let mut canonical = String::from("CREATE ");
    if unique {
        canonical.push_str("UNIQUE ");
    }
    if null_filtered {
        canonical.push_str("NULL_FILTERED ");
    }
    canonical.push_str(&format!("INDEX {name} ON {table}{key}"));

    if tokens.eat_keyword("STORING") {
        canonical.push_str(&format!(" STORING {}", parse_ident_list(tokens)?));
    }
    if tokens.eat_op(",") {
        tokens.expect_keyword("INTERLEAVE")?;
        tokens.expect_keyword("IN")?;
        let parent = tokens.expect_ident()?;
        canonical.push_str(&format!(", INTERLEAVE IN {parent}"));
    }
    tokens.expect_end()?;

    Ok(CreateIndex { name, canonical })
}

fn parse_alter_table(tokens: &mut Tokens) -> Result<AlterTable, StatementError> {
    let table = tokens.expect_ident()?;

    if !tokens.eat_keyword("ADD") {
        // ALTER TABLE ... SET / DROP / ALTER COLUMN are outputs, not inputs.
        return Err(StatementError::Unsupported);
    }

    if tokens.peek().is_some_and(|t| {
        t.is_keyword("CONSTRAINT") || t.is_keyword("FOREIGN") || t.is_keyword("CHECK")
    }) {
        let constraint = parse_table_constraint(tokens)?;
        tokens.expect_end()?;
        return Ok(AlterTable {
            table,
            op: AlterTableOp::AddConstraint(constraint),
        });
    }

    if tokens.eat_keywords(&["ROW", "DELETION", "POLICY"]) {
        tokens.expect_op("(")?;
        let policy = RowDeletionPolicy(capture_balanced(tokens)?);
        tokens.expect_end()?;
        return Ok(AlterTable {
            table,
            op: AlterTableOp::AddRowDeletionPolicy(policy),
        });
    }

    Err(StatementError::Unsupported)
}

fn parse_alter_database(tokens: &mut Tokens) -> Result<AlterDatabase, String> {
    let database = tokens.expect_ident()?;
    tokens.expect_keyword("SET")?;
    tokens.expect_keyword("OPTIONS")?;
    let options = parse_options_list(tokens)?;
    tokens.expect_end()?;
    Ok(AlterDatabase { database, options })
}

fn parse_create_change_stream(tokens: &mut Tokens) -> Result<CreateChangeStream, String> {
    let name = tokens.expect_ident()?;

    let mut for_clause = None;
    if tokens.eat_keyword("FOR") {
        if tokens.eat_keyword("ALL") {
            for_clause = Some("FOR ALL".to_string());
        } else {
            let mut targets = Vec::new();
            loop {
                let table = tokens.expect_ident()?;
                if tokens.peek().is_some_and(|t| t.is_op("(")) {
                    targets.push(format!("{table}{}", parse_ident_list(tokens)?));
                } else {
                    targets.push(table);
                }
                if !tokens.eat_op(",") {
                    break;
                }
            }
            for_clause = Some(format!("FOR {}", targets.join(", ")));
        }
    }

    let mut options_clause = None;
    if tokens.eat_keyword("OPTIONS") {
        let options = parse_options_list(tokens)?;
        let rendered = options
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join(", ");
        options_clause = Some(format!("OPTIONS ({rendered})"));
    }
    tokens.expect_end()?;

    Ok(CreateChangeStream {
        name,
        for_clause,
        options_clause,
    })
}

/// Parse `( name [ASC|DESC], ... )` and render it canonically, glued for
/// `table(part, ...)` style emission.
fn parse_key_parts(tokens: &mut Tokens) -> Result<String, String> {
    tokens.expect_op("(")?;
    let mut parts = Vec::new();
    if !tokens.peek().is_some_and(|t| t.is_op(")")) {
        loop {
            let column = tokens.expect_ident()?;
            if tokens.eat_keyword("ASC") {
                parts.push(format!("{column} ASC"));
            } else if tokens.eat_keyword("DESC") {
                parts.push(format!("{column} DESC"));
            } else {
                parts.push(column);
            }
            if !tokens.eat_op(",") {
                break;
            }
        }
    }
    tokens.expect_op(")")?;
    Ok(format!("({})", parts.join(", ")))
}

/// Parse `( name, ... )` into canonical `(a, b)` text.
fn parse_ident_list(tokens: &mut Tokens) -> Result<String, String> {
    tokens.expect_op("(")?;
    let mut names = Vec::new();
    if !tokens.peek().is_some_and(|t| t.is_op(")")) {
        loop {
            names.push(tokens.expect_ident()?);
            if !tokens.eat_op(",") {
                break;
            }
        }
    }
    tokens.expect_op(")")?;
    Ok(format!("({})", names.join(", ")))
}

/// Parse `( key = literal, ... )` keeping value literals verbatim.
fn parse_options_list(tokens: &mut Tokens) -> Result<Vec<(String, String)>, String> {
    tokens.expect_op("(")?;
    let mut options = Vec::new();
    if !tokens.peek().is_some_and(|t| t.is_op(")")) {
        loop {
            let key = tokens.expect_ident()?;
            tokens.expect_op("=")?;
            let value = parse_option_value(tokens)?;
            options.push((key, value));
            if !tokens.eat_op(",") {
                break;
            }
        }
    }
    tokens.expect_op(")")?;
    Ok(options)
}

fn parse_option_value(tokens: &mut Tokens) -> Result<String, String> {
    let negative = tokens.eat_op("-");
    let text = match tokens.next() {
        Some(Token::Str(s)) | Some(Token::Number(s)) | Some(Token::Ident(s)) => s,
        other => {
            return Err(format!(
                "expected option value, found {}",
                other.map_or_else(|| "end of statement".to_string(), |t| format!("'{}'", t.text()))
            ))
        }
    };
    Ok(if negative { format!("-{text}") } else { text })
}

fn parse_on_delete(tokens: &mut Tokens) -> Result<Option<OnDelete>, String> {
    if !tokens.eat_keywords(&["ON", "DELETE"]) {
        return Ok(None);
    }
    if tokens.eat_keyword("CASCADE") {
        Ok(Some(OnDelete::Cascade))
    } else if tokens.eat_keywords(&["NO", "ACTION"]) {
        Ok(Some(OnDelete::NoAction))
    } else {
        Err(format!(
            "expected CASCADE or NO ACTION, found {}",
            tokens
                .peek()
                .map_or_else(|| "end of statement".to_string(), |t| format!("'{}'", t.text()))
        ))
    }
}

/// Capture tokens up to the `)` matching an already-consumed `(`, returning
/// their canonical joined text. The closing parenthesis is consumed.
fn capture_balanced(tokens: &mut Tokens) -> Result<String, String> {
    let mut depth = 0usize;
    let mut captured: Vec<Token> = Vec::new();
    loop {
        match tokens.next() {
            Some(tok) if tok.is_op("(") => {
                depth += 1;
                captured.push(tok);
            }
            Some(tok) if tok.is_op(")") => {
                if depth == 0 {
                    return Ok(join_tokens(&captured));
                }
                depth -= 1;
                captured.push(tok);
            }
            Some(tok) => captured.push(tok),
            None => return Err("unbalanced parentheses".to_string()),
        }
    }
}
