//! SQLite Explorer MCP Server - Main entry point.
//!
//! This server provides MCP (Model Context Protocol) tools for AI assistants
//! to run validated, read-only SQL queries against a SQLite database.

use clap::Parser;
use sqlite_explorer_mcp::config::{Config, TransportMode};
use sqlite_explorer_mcp::db::ConnectionManager;
use sqlite_explorer_mcp::transport::{HttpTransport, StdioTransport, Transport};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Initialize the tracing subscriber for logging.
fn init_tracing(config: &Config) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let subscriber = tracing_subscriber::registry().with(filter);

    if config.json_logs {
        subscriber.with(fmt::layer().json()).init();
    } else {
        subscriber
            .with(fmt::layer().with_target(true).with_thread_ids(false))
            .init();
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Parse configuration from command line and environment
    let config = Config::parse();

    // Initialize logging
    init_tracing(&config);

    if let Err(e) = config.validate() {
        eprintln!("Error: invalid configuration: {e}");
        std::process::exit(1);
    }

    info!(
        transport = %config.transport,
        "Starting SQLite Explorer MCP Server v{}",
        env!("CARGO_PKG_VERSION")
    );

    // Probe the database once so a missing or corrupt file fails at startup
    // rather than on the first tool call.
    let connections = ConnectionManager::new(&config);
    match connections.acquire().await {
        Ok(conn) => {
            connections.release(conn).await;
            info!("Database probe succeeded");
        }
        Err(e) => {
            error!(error = %e, "Database probe failed");
            eprintln!("Error: {e}");
            eprintln!();
            eprintln!("Usage: sqlite-explorer-mcp --db-path <PATH>");
            eprintln!("       DB_PATH=<PATH> sqlite-explorer-mcp");
            std::process::exit(1);
        }
    }

    let config = Arc::new(config);

    // Run the appropriate transport
    let result = match config.transport {
        TransportMode::Stdio => {
            info!("Using stdio transport");
            let transport = StdioTransport::new(config.clone());
            transport.run().await
        }
        TransportMode::Http => {
            info!(
                host = %config.http_host,
                port = config.http_port,
                endpoint = %config.mcp_endpoint,
                "Using HTTP transport"
            );
            let transport = HttpTransport::new(config.clone());
            transport.run().await
        }
    };

    if let Err(e) = result {
        error!(error = %e, "Server error");
        return Err(e.into());
    }

    info!("Server shutdown complete");
    Ok(())
}
