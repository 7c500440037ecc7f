//! The query engine: the nine database operations.
//!
//! Every call resolves its database in the catalog before anything else,
//! opens one session, and closes it before returning. Parse and validation
//! failures are raised before the first statement reaches the engine.

mod join;
mod read;
mod write;

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::catalog::{Catalog, ConnectionDescriptor};
use crate::dialect::Dialect;
use crate::error::{DbToolError, DbToolResult};
use crate::schema::{self, ColumnInfo, Introspector};
use crate::session::{RowSet, Session};
use crate::sql::{SqlBuilder, Statement};

pub use read::clamp_limit;

/// Successful result of an operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Rendered data or a confirmation.
    Report(String),
    /// A defined no-match outcome: nothing to show, nothing changed.
    Empty(String),
}

impl Outcome {
    pub fn text(&self) -> &str {
        match self {
            Outcome::Report(text) | Outcome::Empty(text) => text,
        }
    }

    pub fn into_text(self) -> String {
        match self {
            Outcome::Report(text) | Outcome::Empty(text) => text,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Outcome::Empty(_))
    }
}

/// Runs operations against the databases of one immutable catalog.
pub struct QueryEngine {
    catalog: Arc<Catalog>,
    connections_opened: AtomicUsize,
}

impl QueryEngine {
    pub fn new(catalog: Arc<Catalog>) -> Self {
        Self {
            catalog,
            connections_opened: AtomicUsize::new(0),
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Number of connection attempts made so far.
    pub fn connections_opened(&self) -> usize {
        self.connections_opened.load(Ordering::Relaxed)
    }

    fn resolve(&self, database: &str) -> DbToolResult<&ConnectionDescriptor> {
        self.catalog.resolve(database)
    }

    async fn connect<'e>(&self, descriptor: &'e ConnectionDescriptor) -> DbToolResult<Target<'e>> {
        self.connections_opened.fetch_add(1, Ordering::Relaxed);
        let session = Session::open(descriptor).await?;
        Ok(Target {
            descriptor,
            session,
        })
    }

    /// Catalog entries with their descriptions. Never connects.
    pub fn list_databases(&self) -> Outcome {
        if self.catalog.is_empty() {
            return Outcome::Empty("No databases found".to_string());
        }

        let mut out = String::from("Available databases:\n\n");
        for (idx, descriptor) in self.catalog.iter().enumerate() {
            out.push_str(&format!("{}. {} ({})\n", idx + 1, descriptor.name, descriptor.dialect()));
            if !descriptor.description.is_empty() {
                out.push_str(&format!("   Description: {}\n", descriptor.description));
            }
            out.push('\n');
        }
        Outcome::Report(out)
    }

    pub async fn list_tables(&self, database: &str) -> DbToolResult<Outcome> {
        log::info!("list_tables database={database}");
        let descriptor = self.resolve(database)?;
        let mut target = self.connect(descriptor).await?;
        let result = read::list_tables(&mut target).await;
        target.close().await;
        result
    }

    pub async fn show_data(&self, database: &str, table: &str, limit: i64) -> DbToolResult<Outcome> {
        log::info!("show_data database={database} table={table} limit={limit}");
        let descriptor = self.resolve(database)?;
        let mut target = self.connect(descriptor).await?;
        let result = read::show_data(&mut target, table, clamp_limit(limit)).await;
        target.close().await;
        result
    }

    pub async fn search_data(&self, database: &str, table: &str, column: &str, value: &str) -> DbToolResult<Outcome> {
        log::info!("search_data database={database} table={table} column={column}");
        let descriptor = self.resolve(database)?;
        let mut target = self.connect(descriptor).await?;
        let result = read::search_data(&mut target, table, column, value).await;
        target.close().await;
        result
    }

    pub async fn add_data(&self, database: &str, table: &str, data: &str) -> DbToolResult<Outcome> {
        log::info!("add_data database={database} table={table}");
        let descriptor = self.resolve(database)?;
        let pairs = crate::coerce::parse_column_value_pairs(data)?;
        let mut target = self.connect(descriptor).await?;
        let result = write::add_data(&mut target, table, &pairs).await;
        target.close().await;
        result
    }

    pub async fn delete_data(&self, database: &str, table: &str, condition: &str) -> DbToolResult<Outcome> {
        log::info!("delete_data database={database} table={table}");
        let descriptor = self.resolve(database)?;
        let condition = crate::coerce::parse_condition(condition)?;
        let mut target = self.connect(descriptor).await?;
        let result = write::delete_data(&mut target, table, &condition).await;
        target.close().await;
        result
    }

    pub async fn update_data(
        &self,
        database: &str,
        table: &str,
        set_data: &str,
        condition: &str,
    ) -> DbToolResult<Outcome> {
        log::info!("update_data database={database} table={table}");
        let descriptor = self.resolve(database)?;
        let assignments = crate::coerce::parse_column_value_pairs(set_data)?;
        let condition = crate::coerce::parse_condition(condition)?;
        let mut target = self.connect(descriptor).await?;
        let result = write::update_data(&mut target, table, &assignments, &condition).await;
        target.close().await;
        result
    }

    pub async fn join_tables(&self, database: &str, table1: &str, table2: &str, join_key: &str) -> DbToolResult<Outcome> {
        log::info!("join_tables database={database} table1={table1} table2={table2} join_key={join_key:?}");
        let descriptor = self.resolve(database)?;
        let mut target = self.connect(descriptor).await?;
        let result = join::join_tables(&mut target, table1, table2, join_key).await;
        target.close().await;
        result
    }

    pub async fn create_table(&self, database: &str, table_name: &str, columns: &str) -> DbToolResult<Outcome> {
        log::info!("create_table database={database} table={table_name}");
        let descriptor = self.resolve(database)?;
        crate::ddl::validate_identifier(table_name, "table")?;
        let specs = crate::ddl::parse_column_specs(columns)?;
        let mut target = self.connect(descriptor).await?;
        let result = write::create_table(&mut target, table_name, &specs).await;
        target.close().await;
        result
    }
}

/// An open session plus the descriptor it was opened for.
struct Target<'e> {
    descriptor: &'e ConnectionDescriptor,
    session: Session,
}

impl Target<'_> {
    fn database(&self) -> &str {
        &self.descriptor.name
    }

    fn dialect(&self) -> Dialect {
        self.descriptor.dialect()
    }

    fn sql(&self) -> SqlBuilder {
        SqlBuilder::new(self.dialect())
    }

    fn introspector(&mut self) -> Introspector<'_> {
        Introspector::new(&mut self.session, self.descriptor.dialect(), &self.descriptor.name)
    }

    async fn resolve_table(&mut self, requested: &str) -> DbToolResult<String> {
        self.introspector().resolve_table(requested).await
    }

    async fn columns(&mut self, table: &str) -> DbToolResult<Vec<ColumnInfo>> {
        self.introspector().list_columns(table).await
    }

    /// Resolve `table` and return its spelling with its columns.
    async fn table_with_columns(&mut self, requested: &str) -> DbToolResult<(String, Vec<ColumnInfo>)> {
        let table = self.resolve_table(requested).await?;
        let columns = self.columns(&table).await?;
        Ok((table, columns))
    }

    async fn fetch(&mut self, statement: &Statement, context: &str) -> DbToolResult<RowSet> {
        self.session
            .fetch(statement)
            .await
            .map_err(|e| DbToolError::engine(context, e))
    }

    async fn count(&mut self, statement: &Statement, context: &str) -> DbToolResult<i64> {
        self.session
            .fetch_count(statement)
            .await
            .map_err(|e| DbToolError::engine(context, e))
    }

    async fn execute(&mut self, statement: &Statement, context: &str) -> DbToolResult<u64> {
        match self.session.execute_in_transaction(statement).await {
            Ok(affected) => Ok(affected),
            Err(e) => {
                log::warn!("{context} on '{}': {e}", self.database());
                Err(DbToolError::engine(context, e))
            }
        }
    }

    async fn close(self) {
        self.session.close().await;
    }
}

/// Look up several caller-named columns at once.
fn resolve_columns<'c, 'n>(
    columns: &'c [ColumnInfo],
    table: &str,
    requested: impl IntoIterator<Item = &'n str>,
) -> DbToolResult<Vec<&'c ColumnInfo>> {
    requested
        .into_iter()
        .map(|name| schema::resolve_column(columns, table, name))
        .collect()
}
