//! Query execution tool.
//!
//! This module implements the `read_query` MCP tool. The untrusted SQL text
//! passes both validation stages (multi-statement detection, read-only
//! classification) before a connection is acquired; the connection is
//! released on every exit path.

use crate::db::{ConnectionManager, QueryExecutor};
use crate::error::ExplorerResult;
use crate::models::{ColumnMetadata, QueryParam, QueryParamInput};
use crate::tools::sql_validator;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::sync::Arc;
use tracing::info;

/// Input for the read_query tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct ReadQueryInput {
    /// SQL SELECT statement to execute. Write operations (INSERT/UPDATE/DELETE/DDL) are blocked.
    pub sql: String,
    /// Positional parameters for parameterized queries (use ? placeholders in SQL)
    #[serde(default)]
    pub params: Vec<QueryParamInput>,
    /// Maximum rows to return. Must be positive; values above the configured ceiling are clamped.
    #[serde(default)]
    pub row_limit: Option<i64>,
}

/// Output from the read_query tool.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct ReadQueryOutput {
    /// Column metadata (name, type, nullable) in result-set order
    pub columns: Vec<ColumnMetadata>,
    /// Query result rows as key-value maps
    pub rows: Vec<serde_json::Map<String, JsonValue>>,
    /// True if more rows were available than the applied row limit
    pub truncated: bool,
    /// Number of rows returned
    pub row_count: usize,
    /// Query execution time in milliseconds
    pub execution_time_ms: u64,
    /// Warning message if the requested limit was clamped
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

/// Handler for read-only query execution.
pub struct QueryToolHandler {
    connections: Arc<ConnectionManager>,
    executor: QueryExecutor,
}

impl QueryToolHandler {
    /// Create a new query tool handler.
    pub fn new(connections: Arc<ConnectionManager>, executor: QueryExecutor) -> Self {
        Self {
            connections,
            executor,
        }
    }

    /// Handle the read_query tool call.
    ///
    /// Validation happens strictly before connection acquisition: the
    /// multi-statement detector runs first, then the read-only classifier,
    /// then the row limit is resolved. Only a fully validated request opens
    /// a connection.
    pub async fn read_query(&self, input: ReadQueryInput) -> ExplorerResult<ReadQueryOutput> {
        sql_validator::validate(&input.sql)?;

        let row_limit = self.executor.resolve_row_limit(input.row_limit)?;

        let warning = input.row_limit.and_then(|requested| {
            if requested > i64::from(self.executor.max_limit()) {
                Some(format!(
                    "Requested row_limit {} exceeds maximum allowed ({}). Results capped to {} rows.",
                    requested,
                    self.executor.max_limit(),
                    self.executor.max_limit()
                ))
            } else {
                None
            }
        });

        let params: Vec<QueryParam> = input.params.into_iter().map(Into::into).collect();

        let mut conn = self.connections.acquire().await?;
        let result = self
            .executor
            .execute(&mut conn, input.sql.trim(), &params, row_limit)
            .await;
        self.connections.release(conn).await;
        let result = result?;

        info!(
            row_count = result.rows.len(),
            truncated = result.truncated,
            execution_time_ms = result.execution_time_ms,
            "Query executed"
        );

        let row_count = result.rows.len();
        Ok(ReadQueryOutput {
            columns: result.columns,
            rows: result.rows,
            truncated: result.truncated,
            row_count,
            execution_time_ms: result.execution_time_ms,
            warning,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_query_input_deserialization() {
        let json = r#"{
            "sql": "SELECT * FROM users WHERE id = ?",
            "params": [42],
            "row_limit": 100
        }"#;

        let input: ReadQueryInput = serde_json::from_str(json).unwrap();
        assert_eq!(input.sql, "SELECT * FROM users WHERE id = ?");
        assert_eq!(input.params.len(), 1);
        assert_eq!(input.row_limit, Some(100));
    }

    #[test]
    fn test_read_query_input_defaults() {
        let json = r#"{ "sql": "SELECT 1" }"#;
        let input: ReadQueryInput = serde_json::from_str(json).unwrap();
        assert!(input.params.is_empty());
        assert!(input.row_limit.is_none());
    }

    #[test]
    fn test_read_query_input_negative_limit_accepted_by_serde() {
        // Rejection happens in the executor, not at deserialization
        let json = r#"{ "sql": "SELECT 1", "row_limit": -5 }"#;
        let input: ReadQueryInput = serde_json::from_str(json).unwrap();
        assert_eq!(input.row_limit, Some(-5));
    }

    #[test]
    fn test_read_query_output_serialization() {
        let mut row = serde_json::Map::new();
        row.insert("id".to_string(), JsonValue::Number(1.into()));

        let output = ReadQueryOutput {
            columns: vec![ColumnMetadata::new("id", "INTEGER", false)],
            rows: vec![row],
            truncated: false,
            row_count: 1,
            execution_time_ms: 10,
            warning: None,
        };

        let json = serde_json::to_string(&output).unwrap();
        assert!(json.contains("\"row_count\":1"));
        assert!(json.contains("\"truncated\":false"));
        assert!(json.contains("\"id\":1"));
        assert!(!json.contains("warning"));
    }
}
