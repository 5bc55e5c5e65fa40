//! Database access layer.
//!
//! This module provides database access functionality:
//! - Scoped per-request connections (no pooling)
//! - Read-only query execution with row limits and timeouts
//! - Schema introspection
//! - SQLite type mappings

pub mod connection;
pub mod executor;
pub mod schema;
pub mod types;

pub use connection::ConnectionManager;
pub use executor::QueryExecutor;
pub use schema::SchemaInspector;
