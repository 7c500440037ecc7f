use super::{Outcome, Target};
use crate::error::DbToolResult;
use crate::render::{CellStyle, grid, thousands};
use crate::schema;

pub(crate) const DEFAULT_LIMIT: u32 = 10;
pub(crate) const MAX_LIMIT: u32 = 100;

/// Rows returned by `search_data` at most.
pub(crate) const SEARCH_LIMIT: u32 = 20;

const TABLE_RULE_WIDTH: usize = 60;

/// Clamp a caller-supplied row limit into `[1, 100]`; non-positive means the
/// default of 10.
pub fn clamp_limit(limit: i64) -> u32 {
    if limit <= 0 {
        DEFAULT_LIMIT
    } else if limit > i64::from(MAX_LIMIT) {
        MAX_LIMIT
    } else {
        limit as u32
    }
}

pub(super) async fn list_tables(target: &mut Target<'_>) -> DbToolResult<Outcome> {
    let tables = target.introspector().list_tables().await?;
    if tables.is_empty() {
        return Ok(Outcome::Empty(format!("No tables found in {}", target.database())));
    }

    let mut out = format!("Tables in '{}' database:\n\n", target.database());
    for (idx, table) in tables.iter().enumerate() {
        let statement = target.sql().count(table, None);
        match target.session.fetch_count(&statement).await {
            Ok(count) => out.push_str(&format!("{}. {table}: {} records\n", idx + 1, thousands(count))),
            Err(e) => {
                log::warn!("Row count failed for '{table}' in '{}': {e}", target.database());
                out.push_str(&format!("{}. {table}\n", idx + 1));
            }
        }
    }
    Ok(Outcome::Report(out))
}

pub(super) async fn show_data(target: &mut Target<'_>, requested: &str, limit: u32) -> DbToolResult<Outcome> {
    const CONTEXT: &str = "Error reading data";

    let table = target.resolve_table(requested).await?;
    let total = target.count(&target.sql().count(&table, None), CONTEXT).await?;
    let rows = target.fetch(&target.sql().page(&table, None, limit), CONTEXT).await?;

    if rows.is_empty() {
        return Ok(Outcome::Empty(format!("The table '{table}' is empty (no data)")));
    }

    let mut out = format!(
        "Data from '{table}' table:\nShowing {} of {} total records\n\n",
        rows.len(),
        thousands(total)
    );
    out.push_str(&grid(&rows.headers, &rows.rows, CellStyle::Table, &"=".repeat(TABLE_RULE_WIDTH)));

    if total > i64::from(limit) {
        let remaining = total - rows.len() as i64;
        out.push_str(&format!(
            "\n{} more record(s) not shown. Ask for a larger limit (up to {MAX_LIMIT}) to see more.\n",
            thousands(remaining)
        ));
    }
    Ok(Outcome::Report(out))
}

pub(super) async fn search_data(
    target: &mut Target<'_>,
    requested_table: &str,
    requested_column: &str,
    value: &str,
) -> DbToolResult<Outcome> {
    let (table, columns) = target.table_with_columns(requested_table).await?;
    let column = schema::resolve_column(&columns, &table, requested_column)?;

    let statement = target.sql().search(&table, column, value, SEARCH_LIMIT);
    let rows = target.fetch(&statement, "Search error").await?;

    if rows.is_empty() {
        return Ok(Outcome::Empty(format!(
            "No results found for '{value}' in column '{}'",
            column.name
        )));
    }

    let mut out = format!(
        "Search Results:\nFound {} record(s) where '{}' contains '{value}'\n\n",
        rows.len(),
        column.name
    );
    out.push_str(&grid(&rows.headers, &rows.rows, CellStyle::Plain, &"=".repeat(TABLE_RULE_WIDTH)));
    Ok(Outcome::Report(out))
}
