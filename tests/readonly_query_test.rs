//! Integration tests for the read_query tool against real SQLite files.
//!
//! Databases are created through a writable sqlx connection inside the test;
//! the tool itself only ever sees the read-only path.

use sqlite_explorer_mcp::db::{ConnectionManager, QueryExecutor};
use sqlite_explorer_mcp::error::ExplorerError;
use sqlite_explorer_mcp::models::QueryParamInput;
use sqlite_explorer_mcp::tools::query::{QueryToolHandler, ReadQueryInput};
use sqlx::sqlite::SqliteConnectOptions;
use sqlx::{Connection, SqliteConnection};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tempfile::NamedTempFile;

/// Create a SQLite database file seeded with the given statements.
async fn setup_db(statements: &[&str]) -> PathBuf {
    let temp_file = NamedTempFile::new().unwrap();
    // Keep the temp file alive - prevent deletion when the handle drops
    let db_path = temp_file.into_temp_path().keep().unwrap();

    let options = SqliteConnectOptions::new()
        .filename(&db_path)
        .create_if_missing(true);
    let mut conn = SqliteConnection::connect_with(&options).await.unwrap();
    for sql in statements {
        sqlx::query(sql).execute(&mut conn).await.unwrap();
    }
    conn.close().await.unwrap();

    db_path
}

fn handler_for(path: &Path) -> QueryToolHandler {
    let connections = Arc::new(ConnectionManager::for_path(path));
    let executor = QueryExecutor::with_limits(100, 5000, Duration::from_secs(30));
    QueryToolHandler::new(connections, executor)
}

fn input(sql: &str) -> ReadQueryInput {
    ReadQueryInput {
        sql: sql.to_string(),
        params: vec![],
        row_limit: None,
    }
}

async fn stocks_db() -> PathBuf {
    setup_db(&[
        "CREATE TABLE stocks (symbol TEXT NOT NULL, price REAL, volume INTEGER)",
        "INSERT INTO stocks VALUES ('AAPL', 187.5, 1000)",
        "INSERT INTO stocks VALUES ('MSFT', 402.3, 2000)",
        "INSERT INTO stocks VALUES ('NVDA', NULL, NULL)",
    ])
    .await
}

#[tokio::test]
async fn test_reads_rows_with_columns() {
    let db = stocks_db().await;
    let handler = handler_for(&db);

    let output = handler
        .read_query(input("SELECT symbol, price, volume FROM stocks"))
        .await
        .unwrap();

    assert_eq!(output.row_count, 3);
    assert!(!output.truncated);
    let names: Vec<&str> = output.columns.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["symbol", "price", "volume"]);
    assert_eq!(output.rows[0]["symbol"], serde_json::json!("AAPL"));
    assert_eq!(output.rows[0]["price"], serde_json::json!(187.5));
    assert_eq!(output.rows[0]["volume"], serde_json::json!(1000));
}

#[tokio::test]
async fn test_null_values_decode_as_json_null() {
    let db = stocks_db().await;
    let handler = handler_for(&db);

    let output = handler
        .read_query(input("SELECT price, volume FROM stocks WHERE symbol = 'NVDA'"))
        .await
        .unwrap();

    assert_eq!(output.row_count, 1);
    assert_eq!(output.rows[0]["price"], serde_json::Value::Null);
    assert_eq!(output.rows[0]["volume"], serde_json::Value::Null);
}

#[tokio::test]
async fn test_row_maps_preserve_column_order() {
    let db = stocks_db().await;
    let handler = handler_for(&db);

    // Select in an order that differs from the table definition
    let output = handler
        .read_query(input("SELECT volume, symbol FROM stocks LIMIT 1"))
        .await
        .unwrap();

    let keys: Vec<&String> = output.rows[0].keys().collect();
    assert_eq!(keys, vec!["volume", "symbol"]);
}

#[tokio::test]
async fn test_parameter_binding() {
    let db = stocks_db().await;
    let handler = handler_for(&db);

    let request = ReadQueryInput {
        sql: "SELECT price FROM stocks WHERE symbol = ?".to_string(),
        params: vec![QueryParamInput::String("MSFT".to_string())],
        row_limit: None,
    };
    let output = handler.read_query(request).await.unwrap();

    assert_eq!(output.row_count, 1);
    assert_eq!(output.rows[0]["price"], serde_json::json!(402.3));
}

#[tokio::test]
async fn test_hostile_parameter_stays_data() {
    let db = stocks_db().await;
    let handler = handler_for(&db);

    // The classic injection payload arrives as a bound value and matches nothing
    let request = ReadQueryInput {
        sql: "SELECT * FROM stocks WHERE symbol = ?".to_string(),
        params: vec![QueryParamInput::String(
            "'; DROP TABLE stocks; --".to_string(),
        )],
        row_limit: None,
    };
    let output = handler.read_query(request).await.unwrap();
    assert_eq!(output.row_count, 0);

    // Table is intact
    let output = handler
        .read_query(input("SELECT COUNT(*) AS n FROM stocks"))
        .await
        .unwrap();
    assert_eq!(output.rows[0]["n"], serde_json::json!(3));
}

#[tokio::test]
async fn test_blob_columns_decode() {
    let db = setup_db(&[
        "CREATE TABLE files (name TEXT, data BLOB)",
        "INSERT INTO files VALUES ('raw', X'DEADBEEF')",
        "INSERT INTO files VALUES ('text', X'68656C6C6F')",
    ])
    .await;
    let handler = handler_for(&db);

    let output = handler
        .read_query(input("SELECT name, data FROM files"))
        .await
        .unwrap();

    // Non-UTF-8 blob falls back to base64; UTF-8 blob decodes as text
    assert_eq!(output.rows[0]["data"], serde_json::json!("3q2+7w=="));
    assert_eq!(output.rows[1]["data"], serde_json::json!("hello"));
}

#[tokio::test]
async fn test_row_limit_truncates() {
    let mut statements = vec!["CREATE TABLE seq (n INTEGER PRIMARY KEY)".to_string()];
    for i in 0..10 {
        statements.push(format!("INSERT INTO seq (n) VALUES ({i})"));
    }
    let refs: Vec<&str> = statements.iter().map(String::as_str).collect();
    let db = setup_db(&refs).await;
    let handler = handler_for(&db);

    let request = ReadQueryInput {
        sql: "SELECT n FROM seq".to_string(),
        params: vec![],
        row_limit: Some(5),
    };
    let output = handler.read_query(request).await.unwrap();

    assert_eq!(output.row_count, 5);
    assert!(output.truncated);
    assert!(output.warning.is_none());
}

#[tokio::test]
async fn test_exact_limit_is_not_truncated() {
    let db = stocks_db().await;
    let handler = handler_for(&db);

    let request = ReadQueryInput {
        sql: "SELECT * FROM stocks".to_string(),
        params: vec![],
        row_limit: Some(3),
    };
    let output = handler.read_query(request).await.unwrap();

    assert_eq!(output.row_count, 3);
    assert!(!output.truncated);
}

#[tokio::test]
async fn test_oversized_limit_clamped_with_warning() {
    let mut statements = vec!["CREATE TABLE seq (n INTEGER PRIMARY KEY)".to_string()];
    for i in 0..10 {
        statements.push(format!("INSERT INTO seq (n) VALUES ({i})"));
    }
    let refs: Vec<&str> = statements.iter().map(String::as_str).collect();
    let db = setup_db(&refs).await;

    let connections = Arc::new(ConnectionManager::for_path(&db));
    let executor = QueryExecutor::with_limits(5, 5, Duration::from_secs(30));
    let handler = QueryToolHandler::new(connections, executor);

    let request = ReadQueryInput {
        sql: "SELECT n FROM seq".to_string(),
        params: vec![],
        row_limit: Some(10_000_000),
    };
    let output = handler.read_query(request).await.unwrap();

    assert_eq!(output.row_count, 5);
    assert!(output.truncated);
    let warning = output.warning.expect("clamping should produce a warning");
    assert!(warning.contains("5"));
}

#[tokio::test]
async fn test_invalid_row_limits_rejected() {
    let db = stocks_db().await;
    let handler = handler_for(&db);

    for limit in [0i64, -5] {
        let request = ReadQueryInput {
            sql: "SELECT 1".to_string(),
            params: vec![],
            row_limit: Some(limit),
        };
        let err = handler.read_query(request).await.unwrap_err();
        assert!(
            matches!(err, ExplorerError::InvalidRowLimit { .. }),
            "limit {limit} should be rejected, got {err:?}"
        );
    }
}

#[tokio::test]
async fn test_write_rejected_before_connection() {
    // A nonexistent database proves validation runs before acquisition
    let connections = Arc::new(ConnectionManager::for_path("/nonexistent/nope.db"));
    let executor = QueryExecutor::with_limits(100, 5000, Duration::from_secs(30));
    let handler = QueryToolHandler::new(connections, executor);

    let err = handler
        .read_query(input("DROP TABLE stocks"))
        .await
        .unwrap_err();
    assert!(matches!(err, ExplorerError::NonReadOnlyStatement { .. }));

    let err = handler
        .read_query(input("SELECT 1; SELECT 2"))
        .await
        .unwrap_err();
    assert!(matches!(err, ExplorerError::MultipleStatements { .. }));
}

#[tokio::test]
async fn test_missing_database_is_connection_error() {
    let connections = Arc::new(ConnectionManager::for_path("/nonexistent/nope.db"));
    let executor = QueryExecutor::with_limits(100, 5000, Duration::from_secs(30));
    let handler = QueryToolHandler::new(connections, executor);

    let err = handler.read_query(input("SELECT 1")).await.unwrap_err();
    assert!(matches!(err, ExplorerError::Connection { .. }));
}

#[tokio::test]
async fn test_non_database_file_is_connection_error() {
    let mut temp_file = NamedTempFile::new().unwrap();
    temp_file
        .write_all(b"this is definitely not a SQLite database")
        .unwrap();
    let path = temp_file.into_temp_path().keep().unwrap();

    let handler = handler_for(&path);
    let err = handler.read_query(input("SELECT 1")).await.unwrap_err();
    assert!(matches!(err, ExplorerError::Connection { .. }));
}

#[tokio::test]
async fn test_engine_errors_surface_as_query_execution() {
    let db = stocks_db().await;
    let handler = handler_for(&db);

    let err = handler
        .read_query(input("SELECT * FROM no_such_table"))
        .await
        .unwrap_err();
    assert!(matches!(err, ExplorerError::QueryExecution { .. }));
}

#[tokio::test]
async fn test_repeated_reads_are_idempotent() {
    let db = stocks_db().await;
    let handler = handler_for(&db);

    let first = handler
        .read_query(input("SELECT symbol, price FROM stocks ORDER BY symbol"))
        .await
        .unwrap();
    let second = handler
        .read_query(input("SELECT symbol, price FROM stocks ORDER BY symbol"))
        .await
        .unwrap();

    assert_eq!(first.rows, second.rows);
    assert_eq!(first.row_count, second.row_count);
    assert_eq!(first.truncated, second.truncated);
}

#[tokio::test]
async fn test_concurrent_reads_each_get_a_connection() {
    let db = stocks_db().await;
    let handler = Arc::new(handler_for(&db));

    let mut joins = Vec::new();
    for _ in 0..8 {
        let handler = handler.clone();
        joins.push(tokio::spawn(async move {
            handler
                .read_query(input("SELECT COUNT(*) AS n FROM stocks"))
                .await
        }));
    }

    for join in joins {
        let output = join.await.unwrap().unwrap();
        assert_eq!(output.rows[0]["n"], serde_json::json!(3));
    }
}
