//! Query execution engine.
//!
//! This module runs validated read-only statements with bounded resource
//! consumption:
//! - Parameters are bound positionally through sqlx; user-supplied values
//!   never reach the SQL text itself.
//! - Row limits are enforced via streaming - at most `limit + 1` rows are
//!   fetched, so truncation is detected without materializing the full
//!   result.
//! - A statement timeout aborts long-running queries.

use crate::config::Config;
use crate::db::types::RowToJson;
use crate::error::{ExplorerError, ExplorerResult};
use crate::models::{QueryParam, QueryResult};
use futures_util::StreamExt;
use sqlx::SqliteConnection;
use sqlx::sqlite::{SqliteArguments, SqliteRow};
use std::time::{Duration, Instant};
use tokio::time::timeout;
use tracing::{debug, warn};

/// Query executor that handles statement execution against a scoped
/// connection.
#[derive(Debug, Clone)]
pub struct QueryExecutor {
    default_limit: u32,
    max_limit: u32,
    query_timeout: Duration,
}

impl QueryExecutor {
    /// Create a query executor from the server configuration.
    pub fn new(config: &Config) -> Self {
        Self {
            default_limit: config.default_row_limit,
            max_limit: config.max_row_limit,
            query_timeout: config.query_timeout(),
        }
    }

    /// Create a query executor with explicit settings (useful for testing).
    pub fn with_limits(default_limit: u32, max_limit: u32, query_timeout: Duration) -> Self {
        Self {
            default_limit: default_limit.min(max_limit),
            max_limit,
            query_timeout,
        }
    }

    /// The configured row-limit ceiling.
    pub fn max_limit(&self) -> u32 {
        self.max_limit
    }

    /// Resolve a requested row limit against the configured bounds.
    ///
    /// Absent limits fall back to the configured default; zero or negative
    /// limits are rejected; limits above the ceiling are clamped to it.
    pub fn resolve_row_limit(&self, requested: Option<i64>) -> ExplorerResult<u32> {
        match requested {
            None => Ok(self.default_limit),
            Some(limit) if limit <= 0 => Err(ExplorerError::invalid_row_limit(format!(
                "row_limit must be a positive integer, got {limit}"
            ))),
            Some(limit) => Ok(u32::try_from(limit).unwrap_or(self.max_limit).min(self.max_limit)),
        }
    }

    /// Execute a validated read-only statement and materialize the result.
    ///
    /// `row_limit` must come from [`Self::resolve_row_limit`]. Reads up to
    /// `row_limit + 1` rows; the extra row only signals truncation and is
    /// never returned.
    pub async fn execute(
        &self,
        conn: &mut SqliteConnection,
        sql: &str,
        params: &[QueryParam],
        row_limit: u32,
    ) -> ExplorerResult<QueryResult> {
        let start = Instant::now();

        debug!(
            params = params.len(),
            limit = row_limit,
            timeout_ms = self.query_timeout.as_millis() as u64,
            "Executing query"
        );

        let fetch_limit = row_limit as usize + 1;
        let rows_future = if params.is_empty() {
            // Raw SQL path avoids an unnecessary prepared statement
            use sqlx::Executor;
            let stream = (&mut *conn).fetch(sql);
            stream.take(fetch_limit).collect::<Vec<_>>()
        } else {
            let mut query = sqlx::query(sql);
            for param in params {
                query = bind_param(query, param);
            }
            let stream = query.fetch(&mut *conn);
            stream.take(fetch_limit).collect::<Vec<_>>()
        };

        let results = match timeout(self.query_timeout, rows_future).await {
            Ok(results) => results,
            Err(_) => {
                return Err(ExplorerError::query_timeout(
                    self.query_timeout.as_millis() as u64
                ));
            }
        };

        let mut rows = Vec::with_capacity(results.len());
        for result in results {
            rows.push(result.map_err(ExplorerError::from)?);
        }

        Ok(process_rows(rows, row_limit, start))
    }
}

/// Bind a parameter value to the query positionally.
fn bind_param<'q>(
    query: sqlx::query::Query<'q, sqlx::Sqlite, SqliteArguments<'q>>,
    param: &'q QueryParam,
) -> sqlx::query::Query<'q, sqlx::Sqlite, SqliteArguments<'q>> {
    match param {
        QueryParam::Null => query.bind(None::<String>),
        QueryParam::Bool(v) => query.bind(*v),
        QueryParam::Int(v) => query.bind(*v),
        QueryParam::Float(v) => query.bind(*v),
        QueryParam::String(v) => query.bind(v.as_str()),
        QueryParam::Bytes(v) => query.bind(v.as_slice()),
    }
}

/// Materialize fetched rows into a QueryResult, marking truncation when more
/// rows were available than the limit.
fn process_rows(rows: Vec<SqliteRow>, row_limit: u32, start: Instant) -> QueryResult {
    let execution_time_ms = start.elapsed().as_millis() as u64;

    if rows.is_empty() {
        return QueryResult::empty(execution_time_ms);
    }

    let columns = rows[0].get_column_metadata();
    let total_rows = rows.len();
    let truncated = total_rows > row_limit as usize;
    let rows_to_take = (row_limit as usize).min(total_rows);

    let json_rows: Vec<serde_json::Map<String, serde_json::Value>> = rows
        .iter()
        .take(rows_to_take)
        .map(|r| r.to_json_map())
        .collect();

    if truncated {
        warn!(limit = row_limit, "Query result truncated");
    }

    QueryResult {
        columns,
        rows: json_rows,
        truncated,
        execution_time_ms,
    }
}
