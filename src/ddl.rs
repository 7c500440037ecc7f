//! Column specifications for `create_table`.

use lazy_regex::regex_is_match;

use crate::coerce::PairParser;
use crate::dialect::SqlDialect;
use crate::error::{DbToolError, DbToolResult};

/// Portable column type named by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalType {
    Text,
    Integer,
    Decimal,
    Date,
    Boolean,
    Identity,
}

impl LogicalType {
    /// Map a caller token. Unrecognized tokens fall back to text.
    pub fn parse(token: &str) -> Self {
        match token.trim().to_ascii_lowercase().as_str() {
            "text" | "string" | "str" => LogicalType::Text,
            "number" | "int" | "integer" => LogicalType::Integer,
            "float" | "decimal" | "money" => LogicalType::Decimal,
            "date" | "datetime" => LogicalType::Date,
            "bool" | "boolean" => LogicalType::Boolean,
            "id" => LogicalType::Identity,
            _ => LogicalType::Text,
        }
    }

    pub fn physical(self, dialect: &dyn SqlDialect) -> &'static str {
        match self {
            LogicalType::Text => dialect.text_type(),
            LogicalType::Integer => "INTEGER",
            LogicalType::Decimal => "DECIMAL(10,2)",
            LogicalType::Date => "DATE",
            LogicalType::Boolean => dialect.boolean_type(),
            LogicalType::Identity => dialect.identity_type(),
        }
    }
}

/// One column of a table to create.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSpec {
    pub name: String,
    pub logical: LogicalType,
}

impl ColumnSpec {
    /// `quoted_name PHYSICAL_TYPE`, with a plain `id` column promoted to the
    /// primary key.
    pub fn definition(&self, dialect: &dyn SqlDialect) -> String {
        let mut definition = format!("{} {}", dialect.quote_ident(&self.name), self.logical.physical(dialect));
        if self.name == "id" && self.logical != LogicalType::Identity {
            definition.push_str(" PRIMARY KEY");
        }
        definition
    }
}

/// Parse `name:type,name:type`, validating every column name.
pub fn parse_column_specs(raw: &str) -> DbToolResult<Vec<ColumnSpec>> {
    PairParser::COLUMNS
        .parse(raw)?
        .into_iter()
        .map(|(name, token)| {
            validate_identifier(name, "column")?;
            Ok(ColumnSpec {
                name: name.to_string(),
                logical: LogicalType::parse(token),
            })
        })
        .collect()
}

/// New table and column names must be plain identifiers.
pub fn validate_identifier(name: &str, what: &'static str) -> DbToolResult<()> {
    if regex_is_match!(r"^[A-Za-z_][A-Za-z0-9_]*$", name) {
        Ok(())
    } else {
        Err(DbToolError::InvalidIdentifier {
            name: name.to_string(),
            what,
        })
    }
}
