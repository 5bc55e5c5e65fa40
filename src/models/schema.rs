//! Schema-related data models.
//!
//! This module defines types for database schema introspection.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Description of a single table column, built from the SQLite catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ColumnDescriptor {
    pub name: String,
    /// Declared type from the table definition (e.g., "INTEGER", "VARCHAR(20)")
    pub declared_type: String,
    pub nullable: bool,
    pub is_primary_key: bool,
    /// Default value expression as recorded in the catalog, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,
}

impl ColumnDescriptor {
    /// Create a new column descriptor.
    pub fn new(name: impl Into<String>, declared_type: impl Into<String>, nullable: bool) -> Self {
        Self {
            name: name.into(),
            declared_type: declared_type.into(),
            nullable,
            is_primary_key: false,
            default_value: None,
        }
    }

    /// Mark the column as part of the primary key.
    pub fn with_primary_key(mut self, is_pk: bool) -> Self {
        self.is_primary_key = is_pk;
        self
    }

    /// Set the default value expression.
    pub fn with_default(mut self, default_value: impl Into<String>) -> Self {
        self.default_value = Some(default_value.into());
        self
    }
}

/// Full description of a table: its name plus ordered column metadata.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct TableDescriptor {
    pub name: String,
    /// Columns in declaration order
    pub columns: Vec<ColumnDescriptor>,
}

impl TableDescriptor {
    /// Create a new table descriptor.
    pub fn new(name: impl Into<String>, columns: Vec<ColumnDescriptor>) -> Self {
        Self {
            name: name.into(),
            columns,
        }
    }

    /// Names of the primary key columns, in declaration order.
    pub fn primary_key(&self) -> Vec<&str> {
        self.columns
            .iter()
            .filter(|c| c.is_primary_key)
            .map(|c| c.name.as_str())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_descriptor_builder() {
        let col = ColumnDescriptor::new("id", "INTEGER", false)
            .with_primary_key(true)
            .with_default("0");
        assert_eq!(col.name, "id");
        assert_eq!(col.declared_type, "INTEGER");
        assert!(!col.nullable);
        assert!(col.is_primary_key);
        assert_eq!(col.default_value.as_deref(), Some("0"));
    }

    #[test]
    fn test_table_descriptor_primary_key() {
        let table = TableDescriptor::new(
            "orders",
            vec![
                ColumnDescriptor::new("id", "INTEGER", false).with_primary_key(true),
                ColumnDescriptor::new("total", "REAL", true),
            ],
        );
        assert_eq!(table.primary_key(), vec!["id"]);
    }
}
