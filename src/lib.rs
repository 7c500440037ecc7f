//! Database tools for tool-calling agents.
//!
//! A fixed set of string-driven operations (list, read, search, join, insert,
//! update, delete, create table) over a catalog of named SQLite, PostgreSQL
//! and MySQL connections, served as an MCP tool server over stdio.

pub mod catalog;
pub mod coerce;
pub mod ddl;
pub mod dialect;
pub mod engine;
pub mod error;
pub mod join;
pub mod render;
pub mod schema;
pub mod session;
pub mod sql;
pub mod stdio;
pub mod tools;

pub use catalog::{Catalog, ConnectionDescriptor};
pub use engine::{Outcome, QueryEngine};
pub use error::{DbToolError, DbToolResult};
