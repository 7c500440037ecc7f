//! Plain-text rendering of result sets for agent consumption.

use crate::coerce::TypedValue;

/// Shown in place of SQL NULL in tabular output.
pub const NULL_MARKER: &str = "-";

pub const COLUMN_SEPARATOR: &str = " | ";

/// Text cells in `show_data` longer than this are shortened.
pub const TABLE_CELL_WIDTH: usize = 30;

/// Every cell in `join_tables` longer than this is shortened.
pub const JOIN_CELL_WIDTH: usize = 15;

/// How a cell is shortened for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellStyle {
    /// Full value.
    Plain,
    /// Text longer than [`TABLE_CELL_WIDTH`] is cut; numbers are never cut.
    Table,
    /// Any value longer than [`JOIN_CELL_WIDTH`] is cut.
    Join,
}

impl CellStyle {
    pub fn render(self, value: &TypedValue) -> String {
        if value.is_null() {
            return NULL_MARKER.to_string();
        }
        let text = value.to_string();
        match self {
            CellStyle::Plain => text,
            CellStyle::Table if value.is_numeric() => text,
            CellStyle::Table => truncate(&text, TABLE_CELL_WIDTH),
            CellStyle::Join => truncate(&text, JOIN_CELL_WIDTH),
        }
    }
}

/// Cut `text` to `max` characters, the last three being `...`.
pub fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let kept: String = text.chars().take(max.saturating_sub(3)).collect();
    format!("{kept}...")
}

/// Header line, a rule, then one line per row.
pub fn grid(headers: &[String], rows: &[Vec<TypedValue>], style: CellStyle, rule: &str) -> String {
    let mut out = String::new();
    out.push_str(&headers.join(COLUMN_SEPARATOR));
    out.push('\n');
    out.push_str(rule);
    out.push('\n');
    for row in rows {
        let cells: Vec<String> = row.iter().map(|value| style.render(value)).collect();
        out.push_str(&cells.join(COLUMN_SEPARATOR));
        out.push('\n');
    }
    out
}

/// `1234567` -> `1,234,567`
pub fn thousands(n: i64) -> String {
    let digits = n.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    for (idx, ch) in digits.chars().enumerate() {
        if idx > 0 && (digits.len() - idx) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if n < 0 {
        format!("-{grouped}")
    } else {
        grouped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_style_truncates_long_text_only() {
        let long = TypedValue::Text("a".repeat(40));
        let rendered = CellStyle::Table.render(&long);
        assert_eq!(rendered.chars().count(), 30);
        assert!(rendered.ends_with("..."));
        assert_eq!(&rendered[..27], "a".repeat(27));

        let exact = TypedValue::Text("b".repeat(30));
        assert_eq!(CellStyle::Table.render(&exact), "b".repeat(30));

        let big = TypedValue::Integer(1_234_567_890_123_456_789);
        assert_eq!(CellStyle::Table.render(&big), "1234567890123456789");
    }

    #[test]
    fn join_style_truncates_everything() {
        let rendered = CellStyle::Join.render(&TypedValue::Text("Introduction to Databases".into()));
        assert_eq!(rendered, "Introduction...");
        assert_eq!(CellStyle::Join.render(&TypedValue::Integer(12)), "12");
    }

    #[test]
    fn null_renders_as_marker() {
        for style in [CellStyle::Plain, CellStyle::Table, CellStyle::Join] {
            assert_eq!(style.render(&TypedValue::Null), NULL_MARKER);
        }
    }

    #[test]
    fn truncation_counts_characters() {
        let text = "é".repeat(20);
        assert_eq!(truncate(&text, 15), format!("{}...", "é".repeat(12)));
    }

    #[test]
    fn grid_layout() {
        let out = grid(
            &["id".into(), "name".into()],
            &[vec![TypedValue::Integer(1), TypedValue::Null]],
            CellStyle::Table,
            "==",
        );
        assert_eq!(out, "id | name\n==\n1 | -\n");
    }

    #[test]
    fn thousands_separator() {
        assert_eq!(thousands(0), "0");
        assert_eq!(thousands(999), "999");
        assert_eq!(thousands(1000), "1,000");
        assert_eq!(thousands(1234567), "1,234,567");
        assert_eq!(thousands(-45000), "-45,000");
    }
}
