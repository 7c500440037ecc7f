//! Error taxonomy shared by every database tool.
//!
//! Validation failures are raised before any statement reaches an engine and
//! carry enough context (expected format, available names) for the calling
//! agent to correct itself. Engine failures keep the driver's message verbatim.

use thiserror::Error;

/// Result alias used throughout the crate.
pub type DbToolResult<T> = Result<T, DbToolError>;

#[derive(Debug, Error)]
pub enum DbToolError {
    #[error("Database '{name}' not found. Available databases: {}", join_or_none(.available))]
    DatabaseNotFound { name: String, available: Vec<String> },

    #[error("Cannot connect to database '{database}': {message}")]
    ConnectionFailure { database: String, message: String },

    #[error("Invalid format in '{input}'. Use: {expected}")]
    MalformedPairSyntax { input: String, expected: &'static str },

    #[error("Table '{table}' already exists in database '{database}'")]
    TableAlreadyExists { table: String, database: String },

    #[error(
        "Cannot find join columns between '{table1}' and '{table2}'. Please specify like 'course_id=id' or 'course_id:id'"
    )]
    AmbiguousJoin { table1: String, table2: String },

    #[error("Column '{column}' not found in table '{table}'\nAvailable columns: {}", join_or_none(.available))]
    UnknownJoinColumn {
        column: String,
        table: String,
        available: Vec<String>,
    },

    #[error("Table '{table}' not found in database '{database}'. Available tables: {}", join_or_none(.available))]
    UnknownTable {
        table: String,
        database: String,
        available: Vec<String>,
    },

    #[error("Column '{column}' not found in table '{table}'. Available columns: {}", join_or_none(.available))]
    UnknownColumn {
        column: String,
        table: String,
        available: Vec<String>,
    },

    #[error("'{name}' is not a valid {what} name (use letters, digits and underscores, not starting with a digit)")]
    InvalidIdentifier { name: String, what: &'static str },

    #[error("{context}: {message}")]
    EngineExecution { context: String, message: String },
}

impl DbToolError {
    /// Taxonomy name of the failure, stable across message wording changes.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::DatabaseNotFound { .. } => "DatabaseNotFound",
            Self::ConnectionFailure { .. } => "ConnectionFailure",
            Self::MalformedPairSyntax { .. } => "MalformedPairSyntax",
            Self::TableAlreadyExists { .. } => "TableAlreadyExists",
            Self::AmbiguousJoin { .. } => "AmbiguousJoin",
            Self::UnknownJoinColumn { .. } => "UnknownJoinColumn",
            Self::UnknownTable { .. } => "UnknownTable",
            Self::UnknownColumn { .. } => "UnknownColumn",
            Self::InvalidIdentifier { .. } => "InvalidIdentifier",
            Self::EngineExecution { .. } => "EngineExecutionError",
        }
    }

    pub(crate) fn engine(context: impl Into<String>, err: impl std::fmt::Display) -> Self {
        Self::EngineExecution {
            context: context.into(),
            message: err.to_string(),
        }
    }

    pub(crate) fn connection(database: &str, err: impl std::fmt::Display) -> Self {
        Self::ConnectionFailure {
            database: database.to_string(),
            message: err.to_string(),
        }
    }
}

fn join_or_none(names: &[String]) -> String {
    if names.is_empty() {
        "(none)".to_string()
    } else {
        names.join(", ")
    }
}
