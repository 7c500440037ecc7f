mod common;

use common::{Fixture, SCHOOL, empty, grid_rows, report};
use database_mcp::{Catalog, ConnectionDescriptor, DbToolError, QueryEngine};
use std::sync::Arc;

#[tokio::test]
async fn list_databases_shows_catalog_in_order() {
    let catalog = Catalog::new([
        ConnectionDescriptor::new("school", "sqlite:///tmp/school.db", "Students and courses"),
        ConnectionDescriptor::new("shop", "mysql://app:secret@db/shop", "Orders"),
    ]);
    let engine = QueryEngine::new(Arc::new(catalog));

    let text = report(engine.list_databases());
    let school = text.find("1. school").unwrap();
    let shop = text.find("2. shop").unwrap();
    assert!(school < shop);
    assert!(text.contains("Students and courses"));
    assert!(!text.contains("secret"));
    assert_eq!(engine.connections_opened(), 0);
}

#[tokio::test]
async fn empty_catalog_is_not_an_error() {
    let engine = QueryEngine::new(Arc::new(Catalog::default()));
    assert_eq!(empty(engine.list_databases()), "No databases found");
}

#[tokio::test]
async fn list_tables_with_counts() {
    let fx = Fixture::school().await;
    let text = report(fx.engine.list_tables("school").await.unwrap());
    assert!(text.starts_with("Tables in 'school' database:"));
    assert!(text.contains("1. courses: 2 records"), "{text}");
    assert!(text.contains("2. students: 1 records"), "{text}");
}

#[tokio::test]
async fn list_tables_keeps_tables_whose_count_fails() {
    let mut setup = SCHOOL.to_vec();
    setup.extend([
        "PRAGMA writable_schema=ON",
        "INSERT INTO sqlite_master (type, name, tbl_name, rootpage, sql) \
         VALUES ('table', 'ghost', 'ghost', 0, 'CREATE VIRTUAL TABLE ghost USING nosuchmod(x)')",
    ]);
    let fx = Fixture::new(&setup).await;

    let text = report(fx.engine.list_tables("school").await.unwrap());
    let lines: Vec<&str> = text.lines().skip(2).collect();
    assert_eq!(
        lines,
        vec!["1. courses: 2 records", "2. ghost", "3. students: 1 records"],
        "{text}"
    );
}

#[tokio::test]
async fn list_tables_on_empty_database() {
    let fx = Fixture::new(&[]).await;
    assert_eq!(empty(fx.engine.list_tables("school").await.unwrap()), "No tables found in school");
}

#[tokio::test]
async fn show_data_clamps_and_hints() {
    let fx = Fixture::new(&["CREATE TABLE notes (id INTEGER PRIMARY KEY, body TEXT)"]).await;
    for n in 1..=15 {
        fx.exec(&format!("INSERT INTO notes (id, body) VALUES ({n}, 'note {n}')")).await;
    }

    let text = report(fx.engine.show_data("school", "notes", 0).await.unwrap());
    assert!(text.contains("Showing 10 of 15 total records"), "{text}");
    assert_eq!(grid_rows(&text, '=').len(), 10);
    assert!(text.contains("5 more record(s) not shown"), "{text}");

    let text = report(fx.engine.show_data("school", "notes", 500).await.unwrap());
    assert!(text.contains("Showing 15 of 15 total records"));
    assert_eq!(grid_rows(&text, '=').len(), 15);
    assert!(!text.contains("not shown"));

    let text = report(fx.engine.show_data("school", "notes", 3).await.unwrap());
    assert_eq!(grid_rows(&text, '=').len(), 3);
}

#[tokio::test]
async fn show_data_truncates_text_and_marks_null() {
    let fx = Fixture::new(&[
        "CREATE TABLE posts (id INTEGER PRIMARY KEY, title TEXT, views INTEGER)",
        "INSERT INTO posts VALUES (1, 'A title that is clearly longer than thirty characters', NULL)",
        "INSERT INTO posts VALUES (2, 'Short', 12345678901234)",
    ])
    .await;

    let text = report(fx.engine.show_data("school", "posts", 10).await.unwrap());
    let rows = grid_rows(&text, '=');
    assert_eq!(text.lines().nth(3), Some("id | title | views"));
    assert_eq!(rows[0], "1 | A title that is clearly lon... | -");
    assert_eq!(rows[1], "2 | Short | 12345678901234");
}

#[tokio::test]
async fn show_data_on_empty_table() {
    let fx = Fixture::new(&["CREATE TABLE drafts (id INTEGER PRIMARY KEY)"]).await;
    assert_eq!(
        empty(fx.engine.show_data("school", "drafts", 10).await.unwrap()),
        "The table 'drafts' is empty (no data)"
    );
}

#[tokio::test]
async fn show_data_rejects_unknown_table() {
    let fx = Fixture::school().await;
    let err = fx.engine.show_data("school", "teachers", 10).await.unwrap_err();
    match err {
        DbToolError::UnknownTable { table, available, .. } => {
            assert_eq!(table, "teachers");
            assert_eq!(available, vec!["courses".to_string(), "students".to_string()]);
        }
        other => panic!("unexpected {other:?}"),
    }

    let err = fx
        .engine
        .show_data("school", "students; DROP TABLE students", 10)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "UnknownTable");
    assert_eq!(fx.scalar("SELECT COUNT(*) FROM students").await, 1);
}

#[tokio::test]
async fn table_names_resolve_case_insensitively() {
    let fx = Fixture::school().await;
    let text = report(fx.engine.show_data("school", "STUDENTS", 10).await.unwrap());
    assert!(text.starts_with("Data from 'students' table:"));
}

#[tokio::test]
async fn search_data_matches_substrings() {
    let fx = Fixture::school().await;
    fx.exec("INSERT INTO students (id, name, course_id) VALUES (2, 'Malik', 2), (3, 'Bob', 2)").await;

    let text = report(fx.engine.search_data("school", "students", "name", "li").await.unwrap());
    assert!(text.contains("Found 2 record(s) where 'name' contains 'li'"), "{text}");
    let rows = grid_rows(&text, '=');
    assert_eq!(rows, vec!["1 | Alice | 1", "2 | Malik | 2"]);

    let text = report(fx.engine.search_data("school", "students", "course_id", "2").await.unwrap());
    assert_eq!(grid_rows(&text, '=').len(), 2);
}

#[tokio::test]
async fn search_data_without_matches() {
    let fx = Fixture::school().await;
    assert_eq!(
        empty(fx.engine.search_data("school", "students", "name", "Zed").await.unwrap()),
        "No results found for 'Zed' in column 'name'"
    );

    // the value is bound, never spliced into the statement
    let outcome = fx
        .engine
        .search_data("school", "students", "name", "' OR '1'='1")
        .await
        .unwrap();
    assert!(outcome.is_empty());
}

#[tokio::test]
async fn search_data_rejects_unknown_column() {
    let fx = Fixture::school().await;
    let err = fx.engine.search_data("school", "students", "email", "x").await.unwrap_err();
    assert_eq!(err.kind(), "UnknownColumn");
    assert!(err.to_string().contains("id, name, course_id"), "{err}");
}

#[tokio::test]
async fn search_data_uses_engine_like_semantics() {
    let fx = Fixture::school().await;
    fx.exec("INSERT INTO students (id, name, course_id) VALUES (2, 'Bob', 2), (3, '50% off', 2)").await;

    // SQLite LIKE folds ASCII case
    let text = report(fx.engine.search_data("school", "students", "name", "alice").await.unwrap());
    assert_eq!(grid_rows(&text, '='), vec!["1 | Alice | 1"]);

    // wildcards in the value are not escaped
    let text = report(fx.engine.search_data("school", "students", "name", "%").await.unwrap());
    assert_eq!(grid_rows(&text, '=').len(), 3);
    let text = report(fx.engine.search_data("school", "students", "name", "B_b").await.unwrap());
    assert_eq!(grid_rows(&text, '='), vec!["2 | Bob | 2"]);

    assert_eq!(fx.scalar("SELECT COUNT(*) FROM students").await, 3);
}

#[tokio::test]
async fn search_data_caps_results() {
    let fx = Fixture::new(&["CREATE TABLE logs (id INTEGER PRIMARY KEY, line TEXT)"]).await;
    for n in 1..=30 {
        fx.exec(&format!("INSERT INTO logs (id, line) VALUES ({n}, 'event {n}')")).await;
    }
    let text = report(fx.engine.search_data("school", "logs", "line", "event").await.unwrap());
    assert!(text.contains("Found 20 record(s)"));
    assert_eq!(grid_rows(&text, '=').len(), 20);
}

#[tokio::test]
async fn reads_are_idempotent() {
    let fx = Fixture::school().await;
    let engine = &fx.engine;

    assert_eq!(engine.list_tables("school").await.unwrap(), engine.list_tables("school").await.unwrap());
    assert_eq!(
        engine.show_data("school", "courses", 10).await.unwrap(),
        engine.show_data("school", "courses", 10).await.unwrap()
    );
    assert_eq!(
        engine.search_data("school", "courses", "title", "o").await.unwrap(),
        engine.search_data("school", "courses", "title", "o").await.unwrap()
    );
}

#[tokio::test]
async fn unknown_database_never_connects() {
    let fx = Fixture::school().await;
    let engine = &fx.engine;

    let results = vec![
        engine.list_tables("hr").await,
        engine.show_data("hr", "students", 10).await,
        engine.search_data("hr", "students", "name", "A").await,
        engine.add_data("hr", "students", "name:Zoe").await,
        engine.delete_data("hr", "students", "id:1").await,
        engine.update_data("hr", "students", "name:Zoe", "id:1").await,
        engine.join_tables("hr", "students", "courses", "").await,
        engine.create_table("hr", "teachers", "id:id").await,
    ];
    for result in results {
        let err = result.unwrap_err();
        assert_eq!(err.kind(), "DatabaseNotFound");
        assert!(err.to_string().contains("Available databases: school"), "{err}");
    }
    assert_eq!(engine.connections_opened(), 0);
}

#[tokio::test]
async fn dialect_without_driver_reports_connection_failure() {
    let catalog = Catalog::new([ConnectionDescriptor::new(
        "legacy",
        "oracle+oracledb://scott:tiger@db:1521/?service_name=orcl",
        "Old ERP",
    )]);
    let engine = QueryEngine::new(Arc::new(catalog));

    let err = engine.list_tables("legacy").await.unwrap_err();
    assert_eq!(err.kind(), "ConnectionFailure");
    assert!(err.to_string().contains("no driver available for Oracle"), "{err}");
    assert!(!err.to_string().contains("tiger"));
    assert_eq!(engine.connections_opened(), 1);
}

#[tokio::test]
async fn unreachable_sqlite_file_is_a_connection_failure() {
    let catalog = Catalog::new([ConnectionDescriptor::new(
        "missing",
        "sqlite:///nonexistent-dir/for/tests/school.db",
        "",
    )]);
    let engine = QueryEngine::new(Arc::new(catalog));
    let err = engine.show_data("missing", "students", 5).await.unwrap_err();
    assert_eq!(err.kind(), "ConnectionFailure");
}

#[tokio::test]
async fn bare_postgres_scheme_has_no_driver() {
    let catalog = Catalog::new([ConnectionDescriptor::new(
        "archive",
        "postgres://reader:pw@pg.internal/archive",
        "Old orders",
    )]);
    let engine = QueryEngine::new(Arc::new(catalog));

    assert!(report(engine.list_databases()).contains("1. archive (Unknown)"));

    let err = engine.list_tables("archive").await.unwrap_err();
    assert_eq!(err.kind(), "ConnectionFailure");
    assert!(err.to_string().contains("no driver available for Unknown"), "{err}");
}
