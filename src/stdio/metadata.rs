//! Static tool metadata served by `list_tools`.
//!
//! Schemas are generated once from the argument types; no engine access is
//! needed to describe the tools.

use once_cell::sync::Lazy;
use rmcp::schemars::{JsonSchema, schema_for};
use serde_json::Value;

use crate::tools::{self, *};

/// Metadata for a single tool.
#[derive(Debug, Clone)]
pub struct ToolMetadata {
    pub name: &'static str,
    pub category: &'static str,
    pub description: &'static str,
    pub schema: Value,
}

impl ToolMetadata {
    pub fn is_mutation(&self) -> bool {
        tools::is_mutation(self.name)
    }
}

/// Helper to build schema from Args type.
fn build_schema<T: JsonSchema>() -> Value {
    serde_json::to_value(schema_for!(T)).unwrap_or(Value::Null)
}

static TOOL_METADATA: Lazy<Vec<ToolMetadata>> = Lazy::new(|| {
    vec![
        ToolMetadata {
            name: LIST_DATABASES,
            category: "catalog",
            description: "Show all available databases with their descriptions. Call this first to learn the database names the other tools accept.",
            schema: build_schema::<ListDatabasesArgs>(),
        },
        ToolMetadata {
            name: LIST_TABLES,
            category: "read",
            description: "Show all tables in a database with their row counts.",
            schema: build_schema::<ListTablesArgs>(),
        },
        ToolMetadata {
            name: SHOW_DATA,
            category: "read",
            description: "Show rows from a table. limit is clamped to 1-100 (default 10). Long text is shortened and NULL shows as '-'.",
            schema: build_schema::<ShowDataArgs>(),
        },
        ToolMetadata {
            name: SEARCH_DATA,
            category: "read",
            description: "Find rows whose column contains the given value (substring match, at most 20 rows).",
            schema: build_schema::<SearchDataArgs>(),
        },
        ToolMetadata {
            name: ADD_DATA,
            category: "write",
            description: "Add one row to a table. Format: column1:value1,column2:value2 (values cannot contain commas; NULL inserts a null).",
            schema: build_schema::<AddDataArgs>(),
        },
        ToolMetadata {
            name: DELETE_DATA,
            category: "write",
            description: "Delete the rows matching column:value (e.g. id:5). The matching rows are previewed in the result before they are removed.",
            schema: build_schema::<DeleteDataArgs>(),
        },
        ToolMetadata {
            name: UPDATE_DATA,
            category: "write",
            description: "Update rows matching condition column:value with set_data column1:value1,column2:value2. Nothing is changed when no row matches.",
            schema: build_schema::<UpdateDataArgs>(),
        },
        ToolMetadata {
            name: JOIN_TABLES,
            category: "read",
            description: "Join two tables to show related data together. join_key accepts course_id=id, students.course_id=courses.id, course_id:id, a shared column name, or empty to infer it from <table>_id columns.",
            schema: build_schema::<JoinTablesArgs>(),
        },
        ToolMetadata {
            name: CREATE_TABLE,
            category: "write",
            description: "Create a new table. Format: col1:type1,col2:type2 with types text, number, float, date, bool or id. A column named id becomes the primary key.",
            schema: build_schema::<CreateTableArgs>(),
        },
    ]
});

/// All tools, in the order they are listed to clients.
pub fn all_tool_metadata() -> &'static [ToolMetadata] {
    &TOOL_METADATA
}
