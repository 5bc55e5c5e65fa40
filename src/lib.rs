//! SQLite Explorer MCP Server Library
//!
//! This library provides MCP (Model Context Protocol) tools for AI assistants
//! to run validated, read-only SQL queries against a SQLite database.

pub mod config;
pub mod db;
pub mod error;
pub mod mcp;
pub mod models;
pub mod tools;
pub mod transport;

pub use config::Config;
pub use error::ExplorerError;
pub use mcp::ExplorerService;
