//! Tool names and their argument types.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

pub const LIST_DATABASES: &str = "list_databases";
pub const LIST_TABLES: &str = "list_tables";
pub const SHOW_DATA: &str = "show_data";
pub const SEARCH_DATA: &str = "search_data";
pub const ADD_DATA: &str = "add_data";
pub const DELETE_DATA: &str = "delete_data";
pub const UPDATE_DATA: &str = "update_data";
pub const JOIN_TABLES: &str = "join_tables";
pub const CREATE_TABLE: &str = "create_table";

/// Tools that change data or schema; hidden in read-only mode.
pub const MUTATION_TOOLS: &[&str] = &[ADD_DATA, DELETE_DATA, UPDATE_DATA, CREATE_TABLE];

pub fn is_mutation(tool: &str) -> bool {
    MUTATION_TOOLS.contains(&tool)
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct ListDatabasesArgs {}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ListTablesArgs {
    /// Database name as shown by list_databases
    pub database: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ShowDataArgs {
    /// Database name as shown by list_databases
    pub database: String,

    /// Table to read
    pub table: String,

    /// Rows to show (1-100, default 10)
    #[serde(default)]
    pub limit: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SearchDataArgs {
    /// Database name as shown by list_databases
    pub database: String,

    /// Table to search
    pub table: String,

    /// Column to match against
    pub column: String,

    /// Substring to look for (case sensitivity follows the database)
    pub value: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct AddDataArgs {
    /// Database name as shown by list_databases
    pub database: String,

    /// Table to insert into
    pub table: String,

    /// Values as `column1:value1,column2:value2`. `NULL` inserts a null,
    /// digits become numbers.
    pub data: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct DeleteDataArgs {
    /// Database name as shown by list_databases
    pub database: String,

    /// Table to delete from
    pub table: String,

    /// Rows to delete, as `column:value` (e.g. `id:5`)
    pub condition: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct UpdateDataArgs {
    /// Database name as shown by list_databases
    pub database: String,

    /// Table to update
    pub table: String,

    /// New values as `column1:value1,column2:value2`
    pub set_data: String,

    /// Rows to update, as `column:value`
    pub condition: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct JoinTablesArgs {
    /// Database name as shown by list_databases
    pub database: String,

    /// Left table
    pub table1: String,

    /// Right table
    pub table2: String,

    /// `left_col=right_col`, `table1.col=table2.col`, `left_col:right_col`,
    /// a column both tables share, or empty to infer from `<table>_id` naming
    #[serde(default)]
    pub join_key: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CreateTableArgs {
    /// Database name as shown by list_databases
    pub database: String,

    /// Name of the new table (letters, digits, underscores)
    pub table_name: String,

    /// Columns as `name:type,...` with types text, number, float, date,
    /// bool or id
    pub columns: String,
}
