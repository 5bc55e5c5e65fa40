//! Error types for the SQLite Explorer MCP server.
//!
//! This module defines all error types using `thiserror` for ergonomic error
//! handling. Every error carries a machine-distinguishable kind plus a
//! human-readable detail so an AI caller can decide whether to correct the
//! query and retry. Validation errors are always produced before a database
//! connection is opened.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExplorerError {
    #[error("Read-only violation: only SELECT queries (including WITH clauses) are allowed, got: {statement}")]
    NonReadOnlyStatement { statement: String },

    #[error("Multiple SQL statements are not allowed: {detail}")]
    MultipleStatements { detail: String },

    #[error("Invalid row limit: {message}")]
    InvalidRowLimit { message: String },

    #[error("Connection failed: {message}")]
    Connection { message: String },

    #[error("Unknown table '{table}'. Call list_tables to see available tables.")]
    UnknownTable { table: String },

    #[error("Invalid identifier '{identifier}': {reason}")]
    InvalidIdentifier { identifier: String, reason: String },

    #[error("Query execution failed: {message}")]
    QueryExecution { message: String },

    #[error("Query timed out after {elapsed_ms}ms")]
    QueryTimeout { elapsed_ms: u64 },
}

impl ExplorerError {
    /// Create a read-only violation error naming the offending statement.
    pub fn non_read_only(statement: impl Into<String>) -> Self {
        Self::NonReadOnlyStatement {
            statement: statement.into(),
        }
    }

    /// Create a multiple-statements error.
    pub fn multiple_statements(detail: impl Into<String>) -> Self {
        Self::MultipleStatements {
            detail: detail.into(),
        }
    }

    /// Create an invalid row limit error.
    pub fn invalid_row_limit(message: impl Into<String>) -> Self {
        Self::InvalidRowLimit {
            message: message.into(),
        }
    }

    /// Create a connection error.
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Create an unknown table error.
    pub fn unknown_table(table: impl Into<String>) -> Self {
        Self::UnknownTable {
            table: table.into(),
        }
    }

    /// Create an invalid identifier error.
    pub fn invalid_identifier(identifier: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidIdentifier {
            identifier: identifier.into(),
            reason: reason.into(),
        }
    }

    /// Create a query execution error.
    pub fn query_execution(message: impl Into<String>) -> Self {
        Self::QueryExecution {
            message: message.into(),
        }
    }

    /// Create a query timeout error.
    pub fn query_timeout(elapsed_ms: u64) -> Self {
        Self::QueryTimeout { elapsed_ms }
    }

    /// True when the caller can fix the request and retry (validation errors).
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::NonReadOnlyStatement { .. }
                | Self::MultipleStatements { .. }
                | Self::InvalidRowLimit { .. }
                | Self::UnknownTable { .. }
                | Self::InvalidIdentifier { .. }
        )
    }
}

/// Convert sqlx errors to ExplorerError.
///
/// Engine messages are passed through (they rarely contain secrets), but
/// decode/internal failures are normalized so no driver internals leak.
impl From<sqlx::Error> for ExplorerError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Database(db_err) => ExplorerError::query_execution(db_err.message()),
            sqlx::Error::Configuration(msg) => {
                ExplorerError::connection(format!("invalid connection options: {msg}"))
            }
            sqlx::Error::Io(io_err) => {
                ExplorerError::connection(format!("I/O error: {}", io_err.kind()))
            }
            sqlx::Error::RowNotFound => ExplorerError::query_execution("no rows returned"),
            sqlx::Error::ColumnNotFound(col) => {
                ExplorerError::query_execution(format!("column not found: {col}"))
            }
            sqlx::Error::ColumnIndexOutOfBounds { index, len } => ExplorerError::query_execution(
                format!("column index {index} out of bounds (len: {len})"),
            ),
            sqlx::Error::ColumnDecode { index, .. } => {
                ExplorerError::query_execution(format!("failed to decode column {index}"))
            }
            sqlx::Error::Decode(_) => ExplorerError::query_execution("failed to decode result row"),
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed => {
                ExplorerError::connection("connection unavailable")
            }
            sqlx::Error::WorkerCrashed => ExplorerError::connection("database worker crashed"),
            _ => ExplorerError::query_execution("unexpected database error"),
        }
    }
}

/// Result type alias for explorer operations.
pub type ExplorerResult<T> = Result<T, ExplorerError>;

/// Convert ExplorerError to MCP ErrorData for semantic error categorization.
///
/// Validation failures map to `invalid_params` (the caller sent a bad
/// request); connection, timeout, and engine failures map to
/// `internal_error`.
impl From<ExplorerError> for rmcp::ErrorData {
    fn from(err: ExplorerError) -> Self {
        let kind = match &err {
            ExplorerError::NonReadOnlyStatement { .. } => "non_read_only_statement",
            ExplorerError::MultipleStatements { .. } => "multiple_statements",
            ExplorerError::InvalidRowLimit { .. } => "invalid_row_limit",
            ExplorerError::Connection { .. } => "connection_error",
            ExplorerError::UnknownTable { .. } => "unknown_table",
            ExplorerError::InvalidIdentifier { .. } => "invalid_identifier",
            ExplorerError::QueryExecution { .. } => "query_execution_error",
            ExplorerError::QueryTimeout { .. } => "query_timeout",
        };
        let data = Some(serde_json::json!({ "kind": kind }));

        if err.is_validation() {
            rmcp::ErrorData::invalid_params(err.to_string(), data)
        } else {
            rmcp::ErrorData::internal_error(err.to_string(), data)
        }
    }
}
