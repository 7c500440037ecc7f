//! Dialect resolution and per-dialect SQL fragments.
//!
//! The engine family is classified from the connection string alone. Every
//! construct that differs between engines (row limiting, placeholders,
//! identifier quoting, physical column types, catalog queries) is answered by
//! the dialect's [`SqlDialect`] implementation rather than by string checks at
//! the call site.

use std::fmt;

/// Engine family of a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dialect {
    Oracle,
    MySql,
    PostgreSql,
    Sqlite,
    SqlServer,
    Unknown,
}

/// URL substrings checked in priority order; the first hit wins.
const CLASSIFICATION_ORDER: &[(&[&str], Dialect)] = &[
    (&["oracle", "oracledb"], Dialect::Oracle),
    (&["mysql"], Dialect::MySql),
    (&["postgresql"], Dialect::PostgreSql),
    (&["sqlite"], Dialect::Sqlite),
    (&["mssql", "pymssql"], Dialect::SqlServer),
];

impl Dialect {
    /// Classify a connection string. Never fails; unmatched URLs are `Unknown`.
    pub fn classify(url: &str) -> Self {
        CLASSIFICATION_ORDER
            .iter()
            .find(|(needles, _)| needles.iter().any(|needle| url.contains(needle)))
            .map(|(_, dialect)| *dialect)
            .unwrap_or(Dialect::Unknown)
    }

    pub fn name(self) -> &'static str {
        match self {
            Dialect::Oracle => "Oracle",
            Dialect::MySql => "MySQL",
            Dialect::PostgreSql => "PostgreSQL",
            Dialect::Sqlite => "SQLite",
            Dialect::SqlServer => "SQLServer",
            Dialect::Unknown => "Unknown",
        }
    }

    /// Fragment generator for this dialect.
    pub fn sql(self) -> &'static dyn SqlDialect {
        match self {
            Dialect::Oracle => &OracleDialect,
            Dialect::MySql => &MySqlDialect,
            Dialect::PostgreSql => &PostgresDialect,
            Dialect::Sqlite => &SqliteDialect,
            Dialect::SqlServer => &SqlServerDialect,
            Dialect::Unknown => &GenericDialect,
        }
    }

    pub(crate) fn scheme_hint(self) -> &'static str {
        match self {
            Dialect::Oracle => "oracle",
            Dialect::MySql => "mysql",
            Dialect::PostgreSql => "postgresql",
            Dialect::Sqlite => "sqlite",
            Dialect::SqlServer => "mssql",
            Dialect::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The pieces of a single-table or join SELECT that pagination rearranges.
#[derive(Debug, Clone, Copy)]
pub struct SelectParts<'a> {
    pub projection: &'a str,
    pub from: &'a str,
    pub filter: Option<&'a str>,
}

impl SelectParts<'_> {
    fn where_clause(&self) -> String {
        self.filter
            .map(|filter| format!(" WHERE {filter}"))
            .unwrap_or_default()
    }
}

/// SQL fragments that vary by engine.
///
/// Default methods describe the common `LIMIT`/`?`/double-quote family;
/// each engine overrides what it does differently.
pub trait SqlDialect: Send + Sync {
    fn quote_ident(&self, ident: &str) -> String {
        format!("\"{}\"", ident.replace('"', "\"\""))
    }

    /// Positional parameter marker, `index` is 1-based.
    fn placeholder(&self, _index: usize) -> String {
        "?".to_string()
    }

    /// Parameter marker used where a value is compared with or assigned to a
    /// column of the given (introspected) type.
    fn value_slot(&self, index: usize, _column_type: Option<&str>) -> String {
        self.placeholder(index)
    }

    /// Left operand of a `LIKE` on an already-quoted column.
    fn like_target(&self, quoted_column: &str) -> String {
        quoted_column.to_string()
    }

    /// Complete SELECT returning at most `limit` rows.
    fn paginate(&self, select: &SelectParts<'_>, limit: u32) -> String {
        format!(
            "SELECT {} FROM {}{} LIMIT {limit}",
            select.projection,
            select.from,
            select.where_clause()
        )
    }

    fn identity_type(&self) -> &'static str {
        "INT AUTO_INCREMENT PRIMARY KEY"
    }

    fn text_type(&self) -> &'static str {
        "VARCHAR(255)"
    }

    fn boolean_type(&self) -> &'static str {
        "BOOLEAN"
    }

    /// Query returning one row per user table, first column is the name.
    fn tables_query(&self) -> String {
        "SELECT TABLE_NAME FROM INFORMATION_SCHEMA.TABLES \
         WHERE TABLE_TYPE = 'BASE TABLE' ORDER BY TABLE_NAME"
            .to_string()
    }

    /// Query returning `(column name, column type)` for the table bound to
    /// the first parameter, in declaration order.
    fn columns_query(&self) -> String {
        format!(
            "SELECT COLUMN_NAME, DATA_TYPE FROM INFORMATION_SCHEMA.COLUMNS \
             WHERE TABLE_NAME = {} ORDER BY ORDINAL_POSITION",
            self.placeholder(1)
        )
    }
}

pub struct OracleDialect;

impl SqlDialect for OracleDialect {
    fn placeholder(&self, index: usize) -> String {
        format!(":{index}")
    }

    fn paginate(&self, select: &SelectParts<'_>, limit: u32) -> String {
        let filter = match select.filter {
            Some(filter) => format!("({filter}) AND ROWNUM <= {limit}"),
            None => format!("ROWNUM <= {limit}"),
        };
        format!("SELECT {} FROM {} WHERE {filter}", select.projection, select.from)
    }

    fn identity_type(&self) -> &'static str {
        "NUMBER GENERATED BY DEFAULT AS IDENTITY PRIMARY KEY"
    }

    fn boolean_type(&self) -> &'static str {
        "NUMBER(1)"
    }

    fn tables_query(&self) -> String {
        "SELECT table_name FROM user_tables ORDER BY table_name".to_string()
    }

    fn columns_query(&self) -> String {
        "SELECT column_name, data_type FROM user_tab_columns \
         WHERE table_name = :1 ORDER BY column_id"
            .to_string()
    }
}

pub struct MySqlDialect;

impl SqlDialect for MySqlDialect {
    fn quote_ident(&self, ident: &str) -> String {
        format!("`{}`", ident.replace('`', "``"))
    }

    // information_schema reports names as binary strings on some servers.
    fn tables_query(&self) -> String {
        "SELECT CONVERT(TABLE_NAME USING utf8mb4) AS TABLE_NAME \
         FROM information_schema.TABLES \
         WHERE TABLE_SCHEMA = DATABASE() AND TABLE_TYPE = 'BASE TABLE' \
         ORDER BY TABLE_NAME"
            .to_string()
    }

    fn columns_query(&self) -> String {
        "SELECT CONVERT(COLUMN_NAME USING utf8mb4) AS COLUMN_NAME, \
                CONVERT(DATA_TYPE USING utf8mb4) AS DATA_TYPE \
         FROM information_schema.COLUMNS \
         WHERE TABLE_SCHEMA = DATABASE() AND TABLE_NAME = ? \
         ORDER BY ORDINAL_POSITION"
            .to_string()
    }
}

pub struct PostgresDialect;

impl SqlDialect for PostgresDialect {
    fn placeholder(&self, index: usize) -> String {
        format!("${index}")
    }

    // Parameters carry their own wire type, so they are cast to the column's.
    fn value_slot(&self, index: usize, column_type: Option<&str>) -> String {
        match column_type {
            Some(ty) if !ty.is_empty() => format!("CAST(${index} AS {})", self.quote_ident(ty)),
            _ => self.placeholder(index),
        }
    }

    fn like_target(&self, quoted_column: &str) -> String {
        format!("CAST({quoted_column} AS TEXT)")
    }

    fn identity_type(&self) -> &'static str {
        "SERIAL PRIMARY KEY"
    }

    fn text_type(&self) -> &'static str {
        "TEXT"
    }

    fn tables_query(&self) -> String {
        "SELECT table_name::text FROM information_schema.tables \
         WHERE table_schema = current_schema() AND table_type = 'BASE TABLE' \
         ORDER BY table_name"
            .to_string()
    }

    fn columns_query(&self) -> String {
        "SELECT column_name::text, udt_name::text FROM information_schema.columns \
         WHERE table_schema = current_schema() AND table_name = $1 \
         ORDER BY ordinal_position"
            .to_string()
    }
}

pub struct SqliteDialect;

impl SqlDialect for SqliteDialect {
    fn identity_type(&self) -> &'static str {
        "INTEGER PRIMARY KEY AUTOINCREMENT"
    }

    fn tables_query(&self) -> String {
        "SELECT name FROM sqlite_master \
         WHERE type = 'table' AND name NOT LIKE 'sqlite_%' \
         ORDER BY name"
            .to_string()
    }

    fn columns_query(&self) -> String {
        "SELECT name, type FROM pragma_table_info(?) ORDER BY cid".to_string()
    }
}

pub struct SqlServerDialect;

impl SqlDialect for SqlServerDialect {
    fn quote_ident(&self, ident: &str) -> String {
        format!("[{}]", ident.replace(']', "]]"))
    }

    fn placeholder(&self, index: usize) -> String {
        format!("@P{index}")
    }

    fn paginate(&self, select: &SelectParts<'_>, limit: u32) -> String {
        format!(
            "SELECT TOP {limit} {} FROM {}{}",
            select.projection,
            select.from,
            select.where_clause()
        )
    }

    fn identity_type(&self) -> &'static str {
        "INT IDENTITY(1,1) PRIMARY KEY"
    }

    fn boolean_type(&self) -> &'static str {
        "BIT"
    }
}

/// Fallback for URLs that match no known engine.
pub struct GenericDialect;

impl SqlDialect for GenericDialect {}
