#![allow(dead_code)]

use database_mcp::{Catalog, ConnectionDescriptor, Outcome, QueryEngine};
use sqlx::{Connection, SqliteConnection};
use std::sync::Arc;
use tempfile::TempDir;

pub const SCHOOL: &[&str] = &[
    "CREATE TABLE courses (id INTEGER PRIMARY KEY, title TEXT NOT NULL)",
    "CREATE TABLE students (id INTEGER PRIMARY KEY, name TEXT NOT NULL, course_id INTEGER)",
    "INSERT INTO courses (id, title) VALUES (1, 'Databases'), (2, 'Compilers')",
    "INSERT INTO students (id, name, course_id) VALUES (1, 'Alice', 1)",
];

/// A SQLite file registered in the catalog as `school`.
pub struct Fixture {
    _dir: TempDir,
    pub url: String,
    pub engine: QueryEngine,
}

impl Fixture {
    pub async fn new(setup: &[&str]) -> Self {
        let dir = tempfile::Builder::new().prefix("dbtools").tempdir().unwrap();
        let url = format!("sqlite://{}?mode=rwc", dir.path().join("school.db").display());

        let mut conn = SqliteConnection::connect(&url).await.unwrap();
        for statement in setup {
            sqlx::query(statement).execute(&mut conn).await.unwrap();
        }
        conn.close().await.unwrap();

        let catalog = Catalog::new([ConnectionDescriptor::new("school", url.clone(), "Students and courses")]);
        Self {
            _dir: dir,
            url,
            engine: QueryEngine::new(Arc::new(catalog)),
        }
    }

    pub async fn school() -> Self {
        Self::new(SCHOOL).await
    }

    /// Run setup SQL directly, bypassing the engine.
    pub async fn exec(&self, sql: &str) {
        let mut conn = SqliteConnection::connect(&self.url).await.unwrap();
        sqlx::query(sql).execute(&mut conn).await.unwrap();
        conn.close().await.unwrap();
    }

    /// Single integer read directly from the file.
    pub async fn scalar(&self, sql: &str) -> i64 {
        let mut conn = SqliteConnection::connect(&self.url).await.unwrap();
        let value: i64 = sqlx::query_scalar(sql).fetch_one(&mut conn).await.unwrap();
        conn.close().await.unwrap();
        value
    }

    pub async fn text(&self, sql: &str) -> String {
        let mut conn = SqliteConnection::connect(&self.url).await.unwrap();
        let value: String = sqlx::query_scalar(sql).fetch_one(&mut conn).await.unwrap();
        conn.close().await.unwrap();
        value
    }
}

pub fn report(outcome: Outcome) -> String {
    match outcome {
        Outcome::Report(text) => text,
        Outcome::Empty(text) => panic!("expected a report, got empty outcome: {text}"),
    }
}

pub fn empty(outcome: Outcome) -> String {
    match outcome {
        Outcome::Empty(text) => text,
        Outcome::Report(text) => panic!("expected an empty outcome, got: {text}"),
    }
}

/// Data lines of a rendered grid: everything after the first rule line up to
/// the next blank line.
pub fn grid_rows(text: &str, rule: char) -> Vec<String> {
    text.lines()
        .skip_while(|line| !(line.len() >= 10 && line.chars().all(|c| c == rule)))
        .skip(1)
        .take_while(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}
