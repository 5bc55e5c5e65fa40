//! Configuration handling for the SQLite Explorer MCP server.
//!
//! Configuration is provided via CLI arguments and environment variables and
//! parsed once at startup. The resulting [`Config`] is immutable and passed
//! by reference into each component constructor.

use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_HTTP_HOST: &str = "127.0.0.1";
pub const DEFAULT_HTTP_PORT: u16 = 8080;
pub const DEFAULT_MCP_ENDPOINT: &str = "/";
pub const DEFAULT_ROW_LIMIT: u32 = 1000;
pub const DEFAULT_MAX_ROW_LIMIT: u32 = 10_000;
pub const DEFAULT_QUERY_TIMEOUT_MS: u64 = 30_000;

/// Transport mode for the MCP server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum TransportMode {
    /// Standard input/output (for CLI integration)
    #[default]
    Stdio,
    /// HTTP with Server-Sent Events (for web clients)
    Http,
}

impl std::fmt::Display for TransportMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Stdio => write!(f, "stdio"),
            Self::Http => write!(f, "http"),
        }
    }
}

/// Configuration for the SQLite Explorer MCP server.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "sqlite-explorer-mcp",
    about = "MCP server exposing read-only, validated SQL query access to a SQLite database",
    version,
    author
)]
pub struct Config {
    /// Path to the SQLite database file (required; opened read-only).
    #[arg(long = "db-path", value_name = "PATH", env = "DB_PATH")]
    pub db_path: PathBuf,

    /// Row limit applied when a query does not specify one
    #[arg(
        long,
        default_value_t = DEFAULT_ROW_LIMIT,
        env = "DEFAULT_ROW_LIMIT"
    )]
    pub default_row_limit: u32,

    /// Ceiling for per-query row limits; larger requests are clamped
    #[arg(
        long,
        default_value_t = DEFAULT_MAX_ROW_LIMIT,
        env = "MAX_ROW_LIMIT"
    )]
    pub max_row_limit: u32,

    /// Maximum statement execution time in milliseconds
    #[arg(
        long,
        default_value_t = DEFAULT_QUERY_TIMEOUT_MS,
        env = "QUERY_TIMEOUT_MS"
    )]
    pub query_timeout_ms: u64,

    /// Transport mode (stdio or http)
    #[arg(
        short,
        long,
        value_enum,
        default_value = "stdio",
        env = "MCP_TRANSPORT"
    )]
    pub transport: TransportMode,

    /// HTTP host to bind to (only used with http transport)
    #[arg(
        long,
        default_value = DEFAULT_HTTP_HOST,
        env = "MCP_HTTP_HOST"
    )]
    pub http_host: String,

    /// HTTP port to bind to (only used with http transport)
    #[arg(
        long,
        default_value_t = DEFAULT_HTTP_PORT,
        env = "MCP_HTTP_PORT"
    )]
    pub http_port: u16,

    /// MCP endpoint path (only used with http transport)
    #[arg(
        long,
        default_value = DEFAULT_MCP_ENDPOINT,
        env = "MCP_ENDPOINT"
    )]
    pub mcp_endpoint: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", env = "MCP_LOG_LEVEL")]
    pub log_level: String,

    /// Enable JSON logging format
    #[arg(long, env = "MCP_JSON_LOGS")]
    pub json_logs: bool,
}

impl Config {
    /// Parse configuration from command line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Create a configuration for a given database path with defaults
    /// everywhere else (useful for testing).
    pub fn for_database(db_path: impl Into<PathBuf>) -> Self {
        Self {
            db_path: db_path.into(),
            default_row_limit: DEFAULT_ROW_LIMIT,
            max_row_limit: DEFAULT_MAX_ROW_LIMIT,
            query_timeout_ms: DEFAULT_QUERY_TIMEOUT_MS,
            transport: TransportMode::Stdio,
            http_host: DEFAULT_HTTP_HOST.to_string(),
            http_port: DEFAULT_HTTP_PORT,
            mcp_endpoint: DEFAULT_MCP_ENDPOINT.to_string(),
            log_level: "info".to_string(),
            json_logs: false,
        }
    }

    /// Validate limit and timeout settings, returning an error message if invalid.
    pub fn validate(&self) -> Result<(), String> {
        if self.default_row_limit == 0 {
            return Err("default_row_limit must be greater than 0".to_string());
        }
        if self.max_row_limit == 0 {
            return Err("max_row_limit must be greater than 0".to_string());
        }
        if self.default_row_limit > self.max_row_limit {
            return Err(format!(
                "default_row_limit ({}) cannot exceed max_row_limit ({})",
                self.default_row_limit, self.max_row_limit
            ));
        }
        if self.query_timeout_ms == 0 {
            return Err("query_timeout_ms must be greater than 0".to_string());
        }
        Ok(())
    }

    /// Get the HTTP bind address.
    pub fn http_bind_addr(&self) -> String {
        format!("{}:{}", self.http_host, self.http_port)
    }

    /// Get the query timeout as a Duration.
    pub fn query_timeout(&self) -> Duration {
        Duration::from_millis(self.query_timeout_ms)
    }
}
