//! Free-text value coercion and the `column:value,column:value` mini-grammar.
//!
//! The grammar is deliberately line-simple: segments are split on `,`, each
//! segment on its first `:`. There is no quoting or escaping, so a value can
//! contain `:` but never `,`.

use lazy_regex::regex_is_match;
use std::fmt;

use crate::error::{DbToolError, DbToolResult};

/// A scalar produced from caller text or decoded from a result row.
#[derive(Debug, Clone, PartialEq)]
pub enum TypedValue {
    Null,
    Integer(i64),
    Float(f64),
    Text(String),
}

impl TypedValue {
    pub fn is_null(&self) -> bool {
        matches!(self, TypedValue::Null)
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, TypedValue::Integer(_) | TypedValue::Float(_))
    }
}

impl fmt::Display for TypedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypedValue::Null => f.write_str("NULL"),
            TypedValue::Integer(v) => write!(f, "{v}"),
            TypedValue::Float(v) if v.is_finite() && v.fract() == 0.0 => write!(f, "{v:.1}"),
            TypedValue::Float(v) => write!(f, "{v}"),
            TypedValue::Text(v) => f.write_str(v),
        }
    }
}

/// Convert one token into the narrowest matching scalar.
///
/// Precedence: `NULL` (any case), all digits, `digits.digits`, text.
/// Total: digit strings too large for `i64` stay text.
pub fn coerce(raw: &str) -> TypedValue {
    if raw.eq_ignore_ascii_case("null") {
        return TypedValue::Null;
    }
    if regex_is_match!(r"^[0-9]+$", raw) {
        return raw
            .parse()
            .map(TypedValue::Integer)
            .unwrap_or_else(|_| TypedValue::Text(raw.to_string()));
    }
    if regex_is_match!(r"^[0-9]+\.[0-9]+$", raw) {
        return raw
            .parse()
            .map(TypedValue::Float)
            .unwrap_or_else(|_| TypedValue::Text(raw.to_string()));
    }
    TypedValue::Text(raw.to_string())
}

/// Expected-format strings quoted back to the caller on malformed input.
pub const DATA_FORMAT: &str = "column1:value1,column2:value2";
pub const CONDITION_FORMAT: &str = "column:value (e.g., id:5)";
pub const COLUMNS_FORMAT: &str = "column1:type1,column2:type2 (types: text, number, float, date, bool, id)";

/// Splitter for `key<kv>value<sep>key<kv>value` lists.
#[derive(Debug, Clone, Copy)]
pub struct PairParser {
    pub separator: char,
    pub kv_separator: char,
    pub expected: &'static str,
}

impl PairParser {
    pub const DATA: PairParser = PairParser {
        separator: ',',
        kv_separator: ':',
        expected: DATA_FORMAT,
    };

    pub const COLUMNS: PairParser = PairParser {
        separator: ',',
        kv_separator: ':',
        expected: COLUMNS_FORMAT,
    };

    /// Split `raw` into trimmed `(key, value)` pairs. Any segment without the
    /// key/value separator, or with an empty key, rejects the whole input.
    pub fn parse<'a>(&self, raw: &'a str) -> DbToolResult<Vec<(&'a str, &'a str)>> {
        raw.split(self.separator)
            .map(|segment| self.parse_segment(raw, segment))
            .collect()
    }

    fn parse_segment<'a>(&self, raw: &str, segment: &'a str) -> DbToolResult<(&'a str, &'a str)> {
        match segment.split_once(self.kv_separator) {
            Some((key, value)) if !key.trim().is_empty() => Ok((key.trim(), value.trim())),
            _ => Err(self.malformed(raw)),
        }
    }

    fn malformed(&self, raw: &str) -> DbToolError {
        DbToolError::MalformedPairSyntax {
            input: raw.to_string(),
            expected: self.expected,
        }
    }
}

/// Parse `col:val,col:val` into columns with coerced values.
pub fn parse_column_value_pairs(raw: &str) -> DbToolResult<Vec<(String, TypedValue)>> {
    Ok(PairParser::DATA
        .parse(raw)?
        .into_iter()
        .map(|(column, value)| (column.to_string(), coerce(value)))
        .collect())
}

/// A single `column = value` filter.
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub column: String,
    pub value: TypedValue,
    /// Value as the caller wrote it, for messages.
    pub raw_value: String,
}

/// Parse a `column:value` condition. Only the first `:` separates.
pub fn parse_condition(raw: &str) -> DbToolResult<Condition> {
    match raw.split_once(':') {
        Some((column, value)) if !column.trim().is_empty() => {
            let value = value.trim();
            Ok(Condition {
                column: column.trim().to_string(),
                value: coerce(value),
                raw_value: value.to_string(),
            })
        }
        _ => Err(DbToolError::MalformedPairSyntax {
            input: raw.to_string(),
            expected: CONDITION_FORMAT,
        }),
    }
}
