//! Schema introspection tools.
//!
//! This module implements the `list_tables` and `describe_table` MCP tools.

use crate::db::{ConnectionManager, SchemaInspector};
use crate::error::ExplorerResult;
use crate::models::ColumnDescriptor;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

/// Output from the list_tables tool.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct ListTablesOutput {
    /// User table names in catalog declaration order
    pub tables: Vec<String>,
    /// Total number of tables returned
    pub count: usize,
}

/// Input for the describe_table tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct DescribeTableInput {
    /// Name of the table to describe (letters, digits, and underscores only)
    pub table_name: String,
}

/// Output from the describe_table tool.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct DescribeTableOutput {
    /// Table name as found in the catalog
    pub table: String,
    /// Columns in declaration order
    pub columns: Vec<ColumnDescriptor>,
    /// Total number of columns
    pub column_count: usize,
}

/// Handler for schema introspection.
pub struct SchemaToolHandler {
    connections: Arc<ConnectionManager>,
}

impl SchemaToolHandler {
    /// Create a new schema tool handler.
    pub fn new(connections: Arc<ConnectionManager>) -> Self {
        Self { connections }
    }

    /// Handle the list_tables tool call.
    pub async fn list_tables(&self) -> ExplorerResult<ListTablesOutput> {
        let mut conn = self.connections.acquire().await?;
        let result = SchemaInspector::list_tables(&mut conn).await;
        self.connections.release(conn).await;
        let tables = result?;

        info!(count = tables.len(), "Listed tables");
        let count = tables.len();
        Ok(ListTablesOutput { tables, count })
    }

    /// Handle the describe_table tool call.
    ///
    /// The identifier is validated before the connection is opened, so a
    /// hostile table_name never reaches the engine.
    pub async fn describe_table(
        &self,
        input: DescribeTableInput,
    ) -> ExplorerResult<DescribeTableOutput> {
        crate::db::schema::validate_identifier(&input.table_name)?;

        let mut conn = self.connections.acquire().await?;
        let result = SchemaInspector::describe_table(&mut conn, &input.table_name).await;
        self.connections.release(conn).await;
        let descriptor = result?;

        info!(
            table = %descriptor.name,
            columns = descriptor.columns.len(),
            "Described table"
        );
        let column_count = descriptor.columns.len();
        Ok(DescribeTableOutput {
            table: descriptor.name,
            columns: descriptor.columns,
            column_count,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describe_table_input_deserialization() {
        let json = r#"{ "table_name": "stocks" }"#;
        let input: DescribeTableInput = serde_json::from_str(json).unwrap();
        assert_eq!(input.table_name, "stocks");
    }

    #[test]
    fn test_list_tables_output_serialization() {
        let output = ListTablesOutput {
            tables: vec!["stocks".to_string(), "transactions".to_string()],
            count: 2,
        };
        let json = serde_json::to_string(&output).unwrap();
        assert!(json.contains("\"count\":2"));
        assert!(json.contains("stocks"));
    }
}
