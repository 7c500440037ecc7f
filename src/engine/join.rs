use super::{Outcome, Target};
use crate::error::{DbToolError, DbToolResult};
use crate::join::{JoinSpec, plan_join, select_columns, tag_headers};
use crate::render::{CellStyle, grid, thousands};
use crate::session::RowSet;
use crate::sql::JoinKind;

/// Joined rows fetched at most.
const JOIN_LIMIT: u32 = 20;

/// Joined rows rendered; the rest are only counted.
const JOIN_DISPLAY_ROWS: usize = 10;

const JOIN_RULE_WIDTH: usize = 80;

const JOIN_KEY_HINT: &str = "Try specifying join like: 'student_id=id' or 'course_id:id'";

pub(super) async fn join_tables(
    target: &mut Target<'_>,
    requested1: &str,
    requested2: &str,
    join_key: &str,
) -> DbToolResult<Outcome> {
    let (table1, columns1) = target.table_with_columns(requested1).await?;
    let (table2, columns2) = target.table_with_columns(requested2).await?;
    let names1: Vec<String> = columns1.into_iter().map(|c| c.name).collect();
    let names2: Vec<String> = columns2.into_iter().map(|c| c.name).collect();

    let spec = plan_join(&table1, &names1, &table2, &names2, join_key)?;
    log::debug!("Join planned: {}", spec.condition());

    // An inner join hides rows whose keys match nothing; fall back to a left
    // join so those rows are still shown.
    let mut kind = JoinKind::Inner;
    let mut rows = run_join(target, &spec, kind).await?;
    if rows.is_empty() {
        kind = JoinKind::Left;
        rows = run_join(target, &spec, kind).await?;
    }
    if rows.is_empty() {
        return Ok(Outcome::Empty(format!(
            "No data found in '{table1}' or the join produced no results"
        )));
    }

    let total1 = target.count(&target.sql().count(&table1, None), "Join error").await?;
    let total2 = target.count(&target.sql().count(&table2, None), "Join error").await?;

    let mut out = format!(
        "Join Result: {table1} <-> {table2}\n\
         Join Type: {}\n\
         Join Condition: {}\n\
         Tables: {table1} ({} rows) + {table2} ({} rows)\n\
         Showing {} joined record(s)\n{}\n\n",
        kind.keyword(),
        spec.condition(),
        thousands(total1),
        thousands(total2),
        rows.len(),
        "=".repeat(JOIN_RULE_WIDTH)
    );

    let tagged = tag_headers(&rows.headers, names1.len(), &table1, &table2);
    let shown = select_columns(&rows.headers, &table1, &table2);
    let headers: Vec<String> = shown.iter().map(|&idx| tagged[idx].clone()).collect();
    let visible: Vec<Vec<_>> = rows
        .rows
        .iter()
        .take(JOIN_DISPLAY_ROWS)
        .map(|row| shown.iter().filter_map(|&idx| row.get(idx).cloned()).collect())
        .collect();
    out.push_str(&grid(&headers, &visible, CellStyle::Join, &"-".repeat(JOIN_RULE_WIDTH)));

    if rows.len() > JOIN_DISPLAY_ROWS {
        out.push_str(&format!("\n... and {} more rows\n", rows.len() - JOIN_DISPLAY_ROWS));
    }

    out.push_str(&format!(
        "\nThis shows {table1} records with their related {table2} information\n\
         Each row combines data from both tables where {} matches {}",
        spec.left_key, spec.right_key
    ));
    Ok(Outcome::Report(out))
}

async fn run_join(target: &mut Target<'_>, spec: &JoinSpec, kind: JoinKind) -> DbToolResult<RowSet> {
    let statement = target.sql().join(spec, kind, JOIN_LIMIT);
    target.session.fetch(&statement).await.map_err(|e| {
        let message = e.to_string();
        if message.to_lowercase().contains("column") {
            DbToolError::engine("Column error", format!("{message}\n{JOIN_KEY_HINT}"))
        } else {
            DbToolError::engine("Join error", message)
        }
    })
}
