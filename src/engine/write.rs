use super::{Outcome, Target, resolve_columns};
use crate::coerce::{Condition, TypedValue};
use crate::ddl::ColumnSpec;
use crate::error::{DbToolError, DbToolResult};
use crate::render::{CellStyle, grid};
use crate::schema::{self, ColumnInfo};
use crate::sql::Filter;

/// Rows shown before a delete.
const PREVIEW_ROWS: u32 = 5;

const PREVIEW_RULE_WIDTH: usize = 50;

pub(super) async fn add_data(
    target: &mut Target<'_>,
    requested: &str,
    pairs: &[(String, TypedValue)],
) -> DbToolResult<Outcome> {
    let (table, columns) = target.table_with_columns(requested).await?;
    let resolved = resolve_columns(&columns, &table, pairs.iter().map(|(c, _)| c.as_str()))?;
    let values: Vec<(&ColumnInfo, &TypedValue)> = resolved.into_iter().zip(pairs.iter().map(|(_, v)| v)).collect();

    let statement = target.sql().insert(&table, &values);
    target.execute(&statement, "Failed to add data").await?;
    log::info!("Inserted 1 row into '{table}' in '{}'", target.database());

    let mut out = format!("Successfully added new record to '{table}'\n\nAdded data:\n");
    for (column, value) in &values {
        out.push_str(&format!("  - {}: {value}\n", column.name));
    }
    out.push_str("\nUse show_data to see the updated table");
    Ok(Outcome::Report(out))
}

pub(super) async fn delete_data(target: &mut Target<'_>, requested: &str, condition: &Condition) -> DbToolResult<Outcome> {
    let (table, columns) = target.table_with_columns(requested).await?;
    let column = schema::resolve_column(&columns, &table, &condition.column)?;
    let filter = Filter {
        column,
        value: &condition.value,
    };

    // Preview first; it is the only check before rows disappear.
    let matched = target
        .count(&target.sql().count(&table, Some(&filter)), "Failed to preview delete")
        .await?;
    if matched == 0 {
        return Ok(no_match(column, condition));
    }
    let preview = target
        .fetch(&target.sql().page(&table, Some(&filter), PREVIEW_ROWS), "Failed to preview delete")
        .await?;

    let mut out = format!("About to delete {matched} record(s):\n\n");
    out.push_str(&grid(&preview.headers, &preview.rows, CellStyle::Table, &"-".repeat(PREVIEW_RULE_WIDTH)));
    let hidden = matched - preview.len() as i64;
    if hidden > 0 {
        out.push_str(&format!("... and {hidden} more records\n"));
    }

    let deleted = target
        .execute(&target.sql().delete(&table, &filter), "Failed to delete")
        .await?;
    log::info!("Deleted {deleted} row(s) from '{table}' in '{}'", target.database());

    out.push_str(&format!(
        "\nSuccessfully deleted {deleted} record(s) from '{table}'\nUse show_data to see the updated table"
    ));
    Ok(Outcome::Report(out))
}

pub(super) async fn update_data(
    target: &mut Target<'_>,
    requested: &str,
    assignments: &[(String, TypedValue)],
    condition: &Condition,
) -> DbToolResult<Outcome> {
    let (table, columns) = target.table_with_columns(requested).await?;
    let set_columns = resolve_columns(&columns, &table, assignments.iter().map(|(c, _)| c.as_str()))?;
    let column = schema::resolve_column(&columns, &table, &condition.column)?;
    let filter = Filter {
        column,
        value: &condition.value,
    };
    let set: Vec<(&ColumnInfo, &TypedValue)> = set_columns
        .into_iter()
        .zip(assignments.iter().map(|(_, v)| v))
        .collect();

    let matched = target
        .count(&target.sql().count(&table, Some(&filter)), "Failed to preview update")
        .await?;
    if matched == 0 {
        return Ok(no_match(column, condition));
    }

    target
        .execute(&target.sql().update(&table, &set, &filter), "Update error")
        .await?;
    log::info!("Updated {matched} row(s) in '{table}' in '{}'", target.database());

    let mut out = format!("Successfully updated {matched} record(s) in '{table}'\n\nUpdated fields:\n");
    for (column, value) in &set {
        out.push_str(&format!("  - {} -> {value}\n", column.name));
    }
    out.push_str(&format!(
        "\nCondition: {} = {}\nUse show_data to see the changes",
        column.name, condition.raw_value
    ));
    Ok(Outcome::Report(out))
}

pub(super) async fn create_table(target: &mut Target<'_>, table: &str, specs: &[ColumnSpec]) -> DbToolResult<Outcome> {
    let existing = target.introspector().list_tables().await?;
    if existing.iter().any(|t| t.eq_ignore_ascii_case(table)) {
        return Err(DbToolError::TableAlreadyExists {
            table: table.to_string(),
            database: target.database().to_string(),
        });
    }

    let statement = target.sql().create_table(table, specs);
    target.execute(&statement, "Create table error").await?;
    log::info!("Created table '{table}' in '{}'", target.database());

    let dialect = target.dialect().sql();
    let mut out = format!(
        "Successfully created table '{table}' in database '{}'\n\nTable structure:\n",
        target.database()
    );
    for spec in specs {
        out.push_str(&format!("  - {}: {}\n", spec.name, spec.logical.physical(dialect)));
    }
    out.push_str("\nUse show_data to view the table (initially empty)\nUse add_data to insert records");
    Ok(Outcome::Report(out))
}

fn no_match(column: &ColumnInfo, condition: &Condition) -> Outcome {
    Outcome::Empty(format!(
        "No records found with {} = '{}'",
        column.name, condition.raw_value
    ))
}
