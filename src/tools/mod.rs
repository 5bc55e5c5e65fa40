//! MCP tool implementations.
//!
//! This module contains the tool handlers:
//! - `read_query`: Execute a validated read-only SELECT query
//! - `list_tables`: List user tables in the database
//! - `describe_table`: Get table schema information
//! - `sql_validator`: SQL statement validation for read-only enforcement

pub mod query;
pub mod schema;
pub mod sql_validator;

pub use query::{QueryToolHandler, ReadQueryInput, ReadQueryOutput};
pub use schema::{DescribeTableInput, DescribeTableOutput, ListTablesOutput, SchemaToolHandler};
