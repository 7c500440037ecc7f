//! Per-call database sessions over the concrete sqlx drivers.
//!
//! A [`Session`] is opened for one tool call and closed before the call
//! returns; nothing is pooled or cached across calls. Reads run in autocommit
//! mode, each mutation runs in its own transaction.

use sqlx::query::Query;
use sqlx::{Column, ColumnIndex, Connection, Database, Decode, Encode, Row, Type, TypeInfo, ValueRef};
use thiserror::Error;

#[cfg(feature = "mysql")]
use sqlx::mysql::{MySqlConnection, MySqlRow};
#[cfg(feature = "postgres")]
use sqlx::postgres::{PgConnection, PgRow};
#[cfg(feature = "sqlite")]
use sqlx::sqlite::{SqliteConnection, SqliteRow};

use crate::catalog::ConnectionDescriptor;
use crate::coerce::TypedValue;
use crate::dialect::Dialect;
use crate::error::{DbToolError, DbToolResult};
use crate::sql::Statement;

/// Column headers plus decoded rows of one result.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RowSet {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<TypedValue>>,
}

impl RowSet {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    fn from_rows<R: DecodeCells>(rows: &[R]) -> Self {
        let headers = rows
            .first()
            .map(|row| row.columns().iter().map(|c| c.name().to_string()).collect())
            .unwrap_or_default();

        let rows = rows
            .iter()
            .map(|row| (0..row.len()).map(|idx| row.cell(idx)).collect())
            .collect();

        Self { headers, rows }
    }
}

/// How a transactional statement failed. The engine's own message is always
/// part of the rendered text.
#[derive(Debug, Error)]
pub enum MutationError {
    #[error("could not start transaction: {0}")]
    Begin(sqlx::Error),

    #[error("{0} (transaction rolled back)")]
    RolledBack(sqlx::Error),

    #[error("{cause} (rollback also failed: {rollback})")]
    RollbackFailed { cause: sqlx::Error, rollback: sqlx::Error },

    #[error("commit failed: {0}")]
    Commit(sqlx::Error),
}

/// One open connection to a catalog database.
pub enum Session {
    #[cfg(feature = "sqlite")]
    Sqlite(SqliteConnection),
    #[cfg(feature = "postgres")]
    Postgres(PgConnection),
    #[cfg(feature = "mysql")]
    MySql(MySqlConnection),
}

/// Run the same body against whichever driver connection the session holds.
macro_rules! with_connection {
    ($session:expr, $conn:ident => $body:expr) => {
        match $session {
            #[cfg(feature = "sqlite")]
            Session::Sqlite($conn) => $body,
            #[cfg(feature = "postgres")]
            Session::Postgres($conn) => $body,
            #[cfg(feature = "mysql")]
            Session::MySql($conn) => $body,
        }
    };
}

impl Session {
    /// Connect to the descriptor's database with the driver for its dialect.
    pub async fn open(descriptor: &ConnectionDescriptor) -> DbToolResult<Self> {
        let url = descriptor.driver_url();
        log::debug!(
            "Opening {} session for '{}' at {}",
            descriptor.dialect(),
            descriptor.name,
            descriptor.redacted_url()
        );

        let connected = match descriptor.dialect() {
            #[cfg(feature = "sqlite")]
            Dialect::Sqlite => SqliteConnection::connect(&url).await.map(Session::Sqlite),
            #[cfg(feature = "postgres")]
            Dialect::PostgreSql => PgConnection::connect(&url).await.map(Session::Postgres),
            #[cfg(feature = "mysql")]
            Dialect::MySql => MySqlConnection::connect(&url).await.map(Session::MySql),
            other => {
                return Err(DbToolError::connection(
                    &descriptor.name,
                    format!("no driver available for {other} connections"),
                ));
            }
        };

        connected.map_err(|e| DbToolError::connection(&descriptor.name, e))
    }

    /// Run a query and decode every returned row.
    pub async fn fetch(&mut self, statement: &Statement) -> Result<RowSet, sqlx::Error> {
        log::debug!("fetch: {}", statement.sql);
        with_connection!(self, conn => {
            let rows = bind_params(sqlx::query(&statement.sql), &statement.params)
                .fetch_all(&mut *conn)
                .await?;
            Ok(RowSet::from_rows(&rows))
        })
    }

    /// Run a single-value query such as `COUNT(*)`.
    pub async fn fetch_count(&mut self, statement: &Statement) -> Result<i64, sqlx::Error> {
        let result = self.fetch(statement).await?;
        let value = result.rows.into_iter().next().and_then(|row| row.into_iter().next());
        count_value(value)
    }

    /// Run a statement in its own transaction: commit on success, roll back
    /// on any execution error. Returns the affected row count.
    pub async fn execute_in_transaction(&mut self, statement: &Statement) -> Result<u64, MutationError> {
        log::debug!("execute: {}", statement.sql);
        with_connection!(self, conn => {
            let mut tx = conn.begin().await.map_err(MutationError::Begin)?;
            let executed = bind_params(sqlx::query(&statement.sql), &statement.params)
                .execute(&mut *tx)
                .await;

            match executed {
                Ok(done) => {
                    tx.commit().await.map_err(MutationError::Commit)?;
                    Ok(done.rows_affected())
                }
                Err(cause) => match tx.rollback().await {
                    Ok(()) => Err(MutationError::RolledBack(cause)),
                    Err(rollback) => Err(MutationError::RollbackFailed { cause, rollback }),
                },
            }
        })
    }

    /// Close the connection. Failures are only logged; the call's result is
    /// already decided.
    pub async fn close(self) {
        let closed = with_connection!(self, conn => conn.close().await);
        if let Err(e) = closed {
            log::debug!("Error while closing session: {e}");
        }
    }
}

/// The first cell of a count query as an integer. Anything else is a decode
/// failure, never zero.
fn count_value(value: Option<TypedValue>) -> Result<i64, sqlx::Error> {
    match value {
        Some(TypedValue::Integer(n)) => Ok(n),
        Some(TypedValue::Text(text)) => text
            .trim()
            .parse()
            .map_err(|_| sqlx::Error::Decode(format!("count returned non-integer value '{text}'").into())),
        Some(other) => Err(sqlx::Error::Decode(
            format!("count returned non-integer value '{other}'").into(),
        )),
        None => Err(sqlx::Error::RowNotFound),
    }
}

fn bind_params<'q, DB>(
    mut query: Query<'q, DB, <DB as Database>::Arguments<'q>>,
    params: &[TypedValue],
) -> Query<'q, DB, <DB as Database>::Arguments<'q>>
where
    DB: Database,
    i64: Encode<'q, DB> + Type<DB>,
    f64: Encode<'q, DB> + Type<DB>,
    String: Encode<'q, DB> + Type<DB>,
    Option<String>: Encode<'q, DB> + Type<DB>,
{
    for param in params {
        query = match param {
            TypedValue::Null => query.bind(None::<String>),
            TypedValue::Integer(v) => query.bind(*v),
            TypedValue::Float(v) => query.bind(*v),
            TypedValue::Text(v) => query.bind(v.clone()),
        };
    }
    query
}

/// Typed decode of one column; `None` when the column's type is incompatible.
fn decode<'r, R, T>(row: &'r R, idx: usize) -> Option<Option<T>>
where
    R: Row,
    usize: ColumnIndex<R>,
    T: Decode<'r, R::Database> + Type<R::Database>,
{
    row.try_get::<Option<T>, usize>(idx).ok()
}

/// Try each type in order and map the first compatible decode.
macro_rules! first_decoded {
    ($row:expr, $idx:expr; $($ty:ty => $map:expr),+ $(,)?) => {
        $(
            if let Some(decoded) = decode::<_, $ty>($row, $idx) {
                return match decoded {
                    Some(value) => ($map)(value),
                    None => TypedValue::Null,
                };
            }
        )+
    };
}

fn text<T: ToString>(value: T) -> TypedValue {
    TypedValue::Text(value.to_string())
}

fn bytes(value: Vec<u8>) -> TypedValue {
    let len = value.len();
    String::from_utf8(value)
        .map(TypedValue::Text)
        .unwrap_or_else(|_| TypedValue::Text(format!("<{len} bytes>")))
}

fn unsigned(value: u64) -> TypedValue {
    i64::try_from(value)
        .map(TypedValue::Integer)
        .unwrap_or_else(|_| TypedValue::Text(value.to_string()))
}

/// Driver rows that can be rendered cell by cell.
trait DecodeCells: Row {
    fn cell(&self, idx: usize) -> TypedValue;

    fn is_null_at(&self, idx: usize) -> bool
    where
        usize: ColumnIndex<Self>,
    {
        self.try_get_raw(idx).map(|value| value.is_null()).unwrap_or(false)
    }

    fn undecodable(&self, idx: usize) -> TypedValue {
        let type_name = self
            .columns()
            .get(idx)
            .map(|column| column.type_info().name().to_string())
            .unwrap_or_else(|| "UNKNOWN".to_string());
        TypedValue::Text(format!("<{type_name}>"))
    }
}

#[cfg(feature = "sqlite")]
impl DecodeCells for SqliteRow {
    fn cell(&self, idx: usize) -> TypedValue {
        if self.is_null_at(idx) {
            return TypedValue::Null;
        }
        first_decoded!(self, idx;
            i64 => TypedValue::Integer,
            f64 => TypedValue::Float,
            String => TypedValue::Text,
            Vec<u8> => bytes,
        );
        self.undecodable(idx)
    }
}

#[cfg(feature = "postgres")]
impl DecodeCells for PgRow {
    fn cell(&self, idx: usize) -> TypedValue {
        if self.is_null_at(idx) {
            return TypedValue::Null;
        }
        first_decoded!(self, idx;
            i64 => TypedValue::Integer,
            i32 => |v: i32| TypedValue::Integer(v.into()),
            i16 => |v: i16| TypedValue::Integer(v.into()),
            f64 => TypedValue::Float,
            f32 => |v: f32| TypedValue::Float(v.into()),
            rust_decimal::Decimal => text,
            bool => text,
            String => TypedValue::Text,
            chrono::NaiveDate => text,
            chrono::NaiveDateTime => text,
            chrono::DateTime<chrono::Utc> => text,
            chrono::NaiveTime => text,
            uuid::Uuid => text,
            serde_json::Value => text,
            Vec<u8> => bytes,
        );
        self.undecodable(idx)
    }
}

#[cfg(feature = "mysql")]
impl DecodeCells for MySqlRow {
    fn cell(&self, idx: usize) -> TypedValue {
        if self.is_null_at(idx) {
            return TypedValue::Null;
        }
        first_decoded!(self, idx;
            i64 => TypedValue::Integer,
            u64 => unsigned,
            f64 => TypedValue::Float,
            f32 => |v: f32| TypedValue::Float(v.into()),
            rust_decimal::Decimal => text,
            String => TypedValue::Text,
            chrono::NaiveDateTime => text,
            chrono::NaiveDate => text,
            chrono::NaiveTime => text,
            chrono::DateTime<chrono::Utc> => text,
            serde_json::Value => text,
            Vec<u8> => bytes,
        );
        self.undecodable(idx)
    }
}
