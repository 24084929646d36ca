//! Column type tree for Spanner column definitions.
//!
//! Types are parsed into a recursive enum so the diff engine can reason
//! about the root type and array nesting depth when deciding whether a type
//! change is alterable in place.

use std::fmt;

use super::lexer::{Token, Tokens};

/// Length argument of `STRING` and `BYTES`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeLength {
    Max,
    Literal(u64),
}

impl fmt::Display for TypeLength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeLength::Max => f.write_str("MAX"),
            TypeLength::Literal(n) => write!(f, "{n}"),
        }
    }
}

/// A Spanner column type.
///
/// `Struct` carries its canonical field-list text rather than a parsed field
/// tree; struct types are compared as text and are never alterable in place.
/// `Path` covers dialect-prefixed names such as `PG.NUMERIC`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnType {
    Bool,
    Int64,
    Float32,
    Float64,
    Numeric,
    Date,
    Timestamp,
    Json,
    Tokenlist,
    String(TypeLength),
    Bytes(TypeLength),
    Array(Box<ColumnType>),
    Struct(String),
    Path(String),
}

impl ColumnType {
    /// Parse a type from the token stream.
    pub(crate) fn parse(tokens: &mut Tokens) -> Result<Self, String> {
        let name = tokens.expect_ident()?;

        // Dialect-prefixed dotted path, e.g. PG.NUMERIC.
        if tokens.peek().is_some_and(|t| t.is_op(".")) {
            let mut path = name.to_ascii_uppercase();
            while tokens.eat_op(".") {
                path.push('.');
                path.push_str(&tokens.expect_ident()?.to_ascii_uppercase());
            }
            return Ok(ColumnType::Path(path));
        }

        match name.to_ascii_uppercase().as_str() {
            "BOOL" => Ok(ColumnType::Bool),
            "INT64" => Ok(ColumnType::Int64),
            "FLOAT32" => Ok(ColumnType::Float32),
            "FLOAT64" => Ok(ColumnType::Float64),
            "NUMERIC" => Ok(ColumnType::Numeric),
            "DATE" => Ok(ColumnType::Date),
            "TIMESTAMP" => Ok(ColumnType::Timestamp),
            "JSON" => Ok(ColumnType::Json),
            "TOKENLIST" => Ok(ColumnType::Tokenlist),
            "STRING" => Ok(ColumnType::String(parse_length(tokens)?)),
            "BYTES" => Ok(ColumnType::Bytes(parse_length(tokens)?)),
            "ARRAY" => {
                tokens.expect_op("<")?;
                let inner = ColumnType::parse(tokens)?;
                tokens.expect_op(">")?;
                Ok(ColumnType::Array(Box::new(inner)))
            }
            "STRUCT" => parse_struct(tokens),
            other => Err(format!("unknown column type {other}")),
        }
    }

    /// Root type after peeling arrays, and the array nesting depth.
    pub fn root(&self) -> (&ColumnType, usize) {
        let mut ty = self;
        let mut depth = 0;
        while let ColumnType::Array(inner) = ty {
            ty = inner;
            depth += 1;
        }
        (ty, depth)
    }

    /// Upper-case type name, ignoring any length argument.
    pub fn name(&self) -> &str {
        match self {
            ColumnType::Bool => "BOOL",
            ColumnType::Int64 => "INT64",
            ColumnType::Float32 => "FLOAT32",
            ColumnType::Float64 => "FLOAT64",
            ColumnType::Numeric => "NUMERIC",
            ColumnType::Date => "DATE",
            ColumnType::Timestamp => "TIMESTAMP",
            ColumnType::Json => "JSON",
            ColumnType::Tokenlist => "TOKENLIST",
            ColumnType::String(_) => "STRING",
            ColumnType::Bytes(_) => "BYTES",
            ColumnType::Array(_) => "ARRAY",
            ColumnType::Struct(_) => "STRUCT",
            ColumnType::Path(path) => path,
        }
    }
}

fn parse_length(tokens: &mut Tokens) -> Result<TypeLength, String> {
    tokens.expect_op("(")?;
    let length = match tokens.next() {
        Some(Token::Ident(s)) if s.eq_ignore_ascii_case("MAX") => TypeLength::Max,
        Some(Token::Number(n)) => TypeLength::Literal(
            n.parse::<u64>().map_err(|_| format!("invalid length '{n}'"))?,
        ),
        other => {
            return Err(format!(
                "expected length or MAX, found {}",
                other.map_or_else(|| "end of statement".to_string(), |t| t.text().to_string())
            ))
        }
    };
    tokens.expect_op(")")?;
    Ok(length)
}

fn parse_struct(tokens: &mut Tokens) -> Result<ColumnType, String> {
    // STRUCT with no field list is valid.
    if tokens.eat_op("<>") {
        return Ok(ColumnType::Struct(String::new()));
    }
    tokens.expect_op("<")?;
    if tokens.eat_op(">") {
        return Ok(ColumnType::Struct(String::new()));
    }
    let mut fields = Vec::new();
    loop {
        let field = tokens.expect_ident()?;
        let ty = ColumnType::parse(tokens)?;
        fields.push(format!("{field} {ty}"));
        if !tokens.eat_op(",") {
            break;
        }
    }
    tokens.expect_op(">")?;
    Ok(ColumnType::Struct(fields.join(", ")))
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnType::String(len) => write!(f, "STRING({len})"),
            ColumnType::Bytes(len) => write!(f, "BYTES({len})"),
            ColumnType::Array(inner) => write!(f, "ARRAY<{inner}>"),
            ColumnType::Struct(fields) => write!(f, "STRUCT<{fields}>"),
            _ => f.write_str(self.name()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(input: &str) -> ColumnType {
        let mut tokens = Tokens::lex(input).unwrap();
        let ty = ColumnType::parse(&mut tokens).unwrap();
        tokens.expect_end().unwrap();
        ty
    }

    #[test]
    fn test_scalar_types() {
        assert_eq!(parse("INT64"), ColumnType::Int64);
        assert_eq!(parse("bool").to_string(), "BOOL");
        assert_eq!(parse("Timestamp").to_string(), "TIMESTAMP");
    }

    #[test]
    fn test_sized_types() {
        assert_eq!(parse("STRING(256)").to_string(), "STRING(256)");
        assert_eq!(parse("STRING(MAX)"), ColumnType::String(TypeLength::Max));
        assert_eq!(parse("bytes(max)").to_string(), "BYTES(MAX)");
    }

    #[test]
    fn test_nested_arrays() {
        let ty = parse("ARRAY<ARRAY<BYTES(MAX)>>");
        assert_eq!(ty.to_string(), "ARRAY<ARRAY<BYTES(MAX)>>");
        let (root, depth) = ty.root();
        assert_eq!(depth, 2);
        assert_eq!(root.name(), "BYTES");
    }

    #[test]
    fn test_struct_types() {
        assert_eq!(parse("STRUCT<>").to_string(), "STRUCT<>");
        assert_eq!(
            parse("STRUCT<a INT64, b STRING(10)>").to_string(),
            "STRUCT<a INT64, b STRING(10)>"
        );
    }

    #[test]
    fn test_dotted_path_type() {
        let ty = parse("pg.numeric");
        assert_eq!(ty, ColumnType::Path("PG.NUMERIC".to_string()));
        assert_eq!(ty.to_string(), "PG.NUMERIC");
    }

    #[test]
    fn test_unknown_type_is_rejected() {
        let mut tokens = Tokens::lex("VARCHAR(20)").unwrap();
        assert!(ColumnType::parse(&mut tokens).is_err());
    }

    #[test]
    fn test_missing_length_is_rejected() {
        let mut tokens = Tokens::lex("STRING").unwrap();
        assert!(ColumnType::parse(&mut tokens).is_err());
    }
}
