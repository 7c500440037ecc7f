//! Live schema introspection and identifier resolution.
//!
//! Table and column names supplied by a caller are never spliced into SQL as
//! given. They are matched against what the database reports and the
//! database's own spelling is used from then on.

use crate::coerce::TypedValue;
use crate::dialect::Dialect;
use crate::error::{DbToolError, DbToolResult};
use crate::session::Session;
use crate::sql::Statement;

/// One column as reported by the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnInfo {
    pub name: String,
    /// Engine type name (`udt_name` on PostgreSQL), when reported.
    pub data_type: Option<String>,
}

/// Reads the catalog of one open session.
pub struct Introspector<'s> {
    session: &'s mut Session,
    dialect: Dialect,
    database: &'s str,
}

impl<'s> Introspector<'s> {
    pub fn new(session: &'s mut Session, dialect: Dialect, database: &'s str) -> Self {
        Self {
            session,
            dialect,
            database,
        }
    }

    /// User tables, sorted by the engine.
    pub async fn list_tables(&mut self) -> DbToolResult<Vec<String>> {
        let statement = Statement::new(self.dialect.sql().tables_query());
        let rows = self
            .session
            .fetch(&statement)
            .await
            .map_err(|e| DbToolError::connection(self.database, e))?;

        Ok(rows
            .rows
            .into_iter()
            .filter_map(|row| row.into_iter().next().and_then(text_of))
            .collect())
    }

    /// Columns of `table` in declaration order. `table` must already be the
    /// engine's spelling.
    pub async fn list_columns(&mut self, table: &str) -> DbToolResult<Vec<ColumnInfo>> {
        let statement = Statement::with_params(
            self.dialect.sql().columns_query(),
            vec![TypedValue::Text(table.to_string())],
        );
        let rows = self
            .session
            .fetch(&statement)
            .await
            .map_err(|e| DbToolError::connection(self.database, e))?;

        Ok(rows
            .rows
            .into_iter()
            .filter_map(|row| {
                let mut cells = row.into_iter();
                let name = cells.next().and_then(text_of)?;
                let data_type = cells.next().and_then(text_of).filter(|t| !t.is_empty());
                Some(ColumnInfo { name, data_type })
            })
            .collect())
    }

    /// Resolve a caller-supplied table name to the engine's spelling.
    pub async fn resolve_table(&mut self, requested: &str) -> DbToolResult<String> {
        let tables = self.list_tables().await?;
        let found = resolve_name(&tables, requested).map(str::to_string);
        match found {
            Some(found) => Ok(found),
            None => Err(DbToolError::UnknownTable {
                table: requested.to_string(),
                database: self.database.to_string(),
                available: tables,
            }),
        }
    }
}

fn text_of(value: TypedValue) -> Option<String> {
    match value {
        TypedValue::Null => None,
        other => Some(other.to_string()),
    }
}

/// Exact match first, then a case-insensitive match if it is unique.
pub fn resolve_name<'a, S: AsRef<str>>(candidates: &'a [S], requested: &str) -> Option<&'a str> {
    if let Some(exact) = candidates.iter().find(|c| c.as_ref() == requested) {
        return Some(exact.as_ref());
    }

    let mut folded = candidates
        .iter()
        .filter(|c| c.as_ref().eq_ignore_ascii_case(requested));
    match (folded.next(), folded.next()) {
        (Some(only), None) => Some(only.as_ref()),
        _ => None,
    }
}

/// Find a column by name in an introspected table.
pub fn resolve_column<'a>(
    columns: &'a [ColumnInfo],
    table: &str,
    requested: &str,
) -> DbToolResult<&'a ColumnInfo> {
    let names = column_names(columns);
    resolve_name(&names, requested)
        .and_then(|name| columns.iter().find(|c| c.name == name))
        .ok_or_else(|| DbToolError::UnknownColumn {
            column: requested.to_string(),
            table: table.to_string(),
            available: names.iter().map(|n| n.to_string()).collect(),
        })
}

pub fn column_names(columns: &[ColumnInfo]) -> Vec<&str> {
    columns.iter().map(|c| c.name.as_str()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn columns(names: &[&str]) -> Vec<ColumnInfo> {
        names
            .iter()
            .map(|name| ColumnInfo {
                name: name.to_string(),
                data_type: None,
            })
            .collect()
    }

    #[test]
    fn exact_match_wins_over_folded() {
        let names = ["Name", "name"];
        assert_eq!(resolve_name(&names, "name"), Some("name"));
        assert_eq!(resolve_name(&names, "Name"), Some("Name"));
    }

    #[test]
    fn folded_match_must_be_unique() {
        assert_eq!(resolve_name(&["Students"], "students"), Some("Students"));
        assert_eq!(resolve_name(&["Name", "name"], "NAME"), None);
        assert_eq!(resolve_name::<&str>(&[], "x"), None);
    }

    #[test]
    fn unknown_column_lists_available() {
        let cols = columns(&["id", "name"]);
        let err = resolve_column(&cols, "students", "email").unwrap_err();
        assert_eq!(err.kind(), "UnknownColumn");
        assert!(err.to_string().contains("id, name"), "{err}");

        assert_eq!(resolve_column(&cols, "students", "NAME").unwrap().name, "name");
    }

    #[test]
    fn hostile_names_never_resolve() {
        let cols = columns(&["id", "name"]);
        assert!(resolve_column(&cols, "t", "name; DROP TABLE t").is_err());
        assert!(resolve_column(&cols, "t", "name\"").is_err());
    }
}
