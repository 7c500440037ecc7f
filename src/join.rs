//! Join key parsing, join-column inference and wide-result column selection.
//!
//! Everything here works on introspected column lists, so a join that cannot
//! be planned is rejected before any join SQL is built.

use crate::error::{DbToolError, DbToolResult};
use crate::schema::resolve_name;

pub const JOIN_KEY_FORMAT: &str = "left_column=right_column or left_column:right_column (e.g., course_id=id)";

/// Joined results wider than this are narrowed for display.
pub const MAX_JOIN_COLUMNS: usize = 8;

/// Column names that are always worth showing in a narrowed join.
const PRIORITY_HINTS: &[&str] = &["id", "name", "title"];

/// What the caller asked for in `join_key`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JoinKey {
    /// Left column from the first table, right column from the second.
    Explicit { left: String, right: String },
    /// One column name present in both tables.
    Shared(String),
    /// No key given; infer from naming conventions.
    Infer,
}

/// A fully validated equi-join between two tables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinSpec {
    pub left_table: String,
    pub left_key: String,
    pub right_table: String,
    pub right_key: String,
}

impl JoinSpec {
    pub fn condition(&self) -> String {
        format!(
            "{}.{} = {}.{}",
            self.left_table, self.left_key, self.right_table, self.right_key
        )
    }
}

/// Parse `join_key` in one of its accepted forms: `a=b` (either side may be
/// qualified as `table.column`), `a:b`, a bare column, or empty.
pub fn parse_join_key(raw: &str, table1: &str, table2: &str) -> DbToolResult<JoinKey> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(JoinKey::Infer);
    }

    if let Some((left, right)) = raw.split_once('=') {
        let (left_table, left) = split_qualifier(left);
        let (right_table, right) = split_qualifier(right);
        if left.is_empty() || right.is_empty() || right.contains('=') {
            return Err(malformed(raw));
        }

        let reversed = !table1.eq_ignore_ascii_case(table2)
            && left_table.is_some_and(|t| t.eq_ignore_ascii_case(table2))
            && right_table.is_none_or(|t| t.eq_ignore_ascii_case(table1));
        let (left, right) = if reversed { (right, left) } else { (left, right) };

        return Ok(JoinKey::Explicit {
            left: left.to_string(),
            right: right.to_string(),
        });
    }

    if let Some((left, right)) = raw.split_once(':') {
        let (left, right) = (left.trim(), right.trim());
        if left.is_empty() || right.is_empty() {
            return Err(malformed(raw));
        }
        return Ok(JoinKey::Explicit {
            left: left.to_string(),
            right: right.to_string(),
        });
    }

    Ok(JoinKey::Shared(raw.to_string()))
}

fn split_qualifier(side: &str) -> (Option<&str>, &str) {
    let side = side.trim();
    match side.split_once('.') {
        Some((table, column)) => (Some(table.trim()), column.trim()),
        None => (None, side),
    }
}

fn malformed(raw: &str) -> DbToolError {
    DbToolError::MalformedPairSyntax {
        input: raw.to_string(),
        expected: JOIN_KEY_FORMAT,
    }
}

/// Naive singular form: one trailing `s` dropped.
pub fn singular(table: &str) -> &str {
    match table.strip_suffix('s').or_else(|| table.strip_suffix('S')) {
        Some(stem) if !stem.is_empty() => stem,
        _ => table,
    }
}

/// Work out which columns to join on and check both exist.
pub fn plan_join(
    table1: &str,
    columns1: &[String],
    table2: &str,
    columns2: &[String],
    join_key: &str,
) -> DbToolResult<JoinSpec> {
    let (left, right) = match parse_join_key(join_key, table1, table2)? {
        JoinKey::Explicit { left, right } => (left, right),
        JoinKey::Shared(column)
            if resolve_name(columns1, &column).is_some() && resolve_name(columns2, &column).is_some() =>
        {
            (column.clone(), column)
        }
        // A bare name that is not shared falls through to inference.
        JoinKey::Shared(_) | JoinKey::Infer => infer_join_columns(table1, columns1, table2, columns2)
            .ok_or_else(|| DbToolError::AmbiguousJoin {
                table1: table1.to_string(),
                table2: table2.to_string(),
            })?,
    };

    Ok(JoinSpec {
        left_table: table1.to_string(),
        left_key: existing_column(columns1, table1, &left)?,
        right_table: table2.to_string(),
        right_key: existing_column(columns2, table2, &right)?,
    })
}

fn existing_column(columns: &[String], table: &str, requested: &str) -> DbToolResult<String> {
    resolve_name(columns, requested)
        .map(str::to_string)
        .ok_or_else(|| DbToolError::UnknownJoinColumn {
            column: requested.to_string(),
            table: table.to_string(),
            available: columns.to_vec(),
        })
}

/// Foreign-key naming conventions, tried in order:
/// `table1.<table2>_id = table2.id`, `table1.id = table2.<table1>_id`, then
/// the first column name the tables share.
fn infer_join_columns(
    table1: &str,
    columns1: &[String],
    table2: &str,
    columns2: &[String],
) -> Option<(String, String)> {
    let has = |columns: &[String], name: &str| columns.iter().any(|c| c.eq_ignore_ascii_case(name));
    let foreign_keys = |table: &str| [format!("{table}_id"), format!("{}_id", singular(table))];

    for candidate in foreign_keys(table2) {
        if let Some(column) = columns1.iter().find(|c| c.eq_ignore_ascii_case(&candidate)) {
            return Some((column.clone(), "id".to_string()));
        }
    }

    if has(columns1, "id") {
        for candidate in foreign_keys(table1) {
            if let Some(column) = columns2.iter().find(|c| c.eq_ignore_ascii_case(&candidate)) {
                return Some(("id".to_string(), column.clone()));
            }
        }
    }

    columns1
        .iter()
        .find(|c| has(columns2, c.as_str()))
        .map(|c| (c.clone(), c.clone()))
}

/// Prefix each result column with the table it came from. The first
/// `left_width` columns belong to `table1`.
pub fn tag_headers(headers: &[String], left_width: usize, table1: &str, table2: &str) -> Vec<String> {
    headers
        .iter()
        .enumerate()
        .map(|(idx, header)| {
            let table = if idx < left_width { table1 } else { table2 };
            format!("{table}.{header}")
        })
        .collect()
}

/// Indices of the columns to display, in their original order.
///
/// Up to [`MAX_JOIN_COLUMNS`] are kept: identifying columns (names containing
/// `id`, `name`, `title` or either table's singular name) first, then the
/// remaining columns in order.
pub fn select_columns(bare_names: &[String], table1: &str, table2: &str) -> Vec<usize> {
    if bare_names.len() <= MAX_JOIN_COLUMNS {
        return (0..bare_names.len()).collect();
    }

    let hints: Vec<String> = PRIORITY_HINTS
        .iter()
        .map(|h| h.to_string())
        .chain([singular(table1).to_lowercase(), singular(table2).to_lowercase()])
        .collect();
    let is_priority = |name: &String| {
        let lowered = name.to_lowercase();
        hints.iter().any(|hint| lowered.contains(hint.as_str()))
    };

    let (priority, rest): (Vec<usize>, Vec<usize>) =
        (0..bare_names.len()).partition(|&idx| is_priority(&bare_names[idx]));

    let mut chosen: Vec<usize> = priority.into_iter().chain(rest).take(MAX_JOIN_COLUMNS).collect();
    chosen.sort_unstable();
    chosen
}
