//! Schema introspection module.
//!
//! Lists user tables and describes column metadata using the SQLite catalog.
//! Internal tables maintained by the engine itself (the `sqlite_` prefix is
//! reserved, e.g. `sqlite_sequence`) are never reported.

use crate::error::{ExplorerError, ExplorerResult};
use crate::models::{ColumnDescriptor, TableDescriptor};
use sqlx::{Row, SqliteConnection};
use tracing::debug;

// Catalog queries. Table listing intentionally has no ORDER BY: callers get
// declaration order as recorded in sqlite_master.
mod queries {
    pub const LIST_TABLES: &str = r#"
        SELECT name FROM sqlite_master
        WHERE type = 'table'
        AND name NOT LIKE 'sqlite_%'
        "#;

    pub const TABLE_EXISTS: &str = r#"
        SELECT name FROM sqlite_master
        WHERE type = 'table'
        AND name NOT LIKE 'sqlite_%'
        AND name = ?
        "#;
}

/// Schema inspector for database introspection.
pub struct SchemaInspector;

impl SchemaInspector {
    /// List all user table names in catalog declaration order.
    pub async fn list_tables(conn: &mut SqliteConnection) -> ExplorerResult<Vec<String>> {
        let rows = sqlx::query(queries::LIST_TABLES)
            .fetch_all(&mut *conn)
            .await?;

        let tables: Vec<String> = rows.iter().map(|row| row.get("name")).collect();
        debug!(count = tables.len(), "Listed tables");
        Ok(tables)
    }

    /// Describe a table's columns from the catalog.
    ///
    /// The name is validated as a safe identifier before it is interpolated
    /// into `PRAGMA table_info` - PRAGMA arguments cannot be parameter-bound,
    /// so the identifier itself is an injection surface. Unknown (or
    /// internal) tables are rejected before the PRAGMA is issued.
    pub async fn describe_table(
        conn: &mut SqliteConnection,
        table_name: &str,
    ) -> ExplorerResult<TableDescriptor> {
        validate_identifier(table_name)?;

        let exists = sqlx::query(queries::TABLE_EXISTS)
            .bind(table_name)
            .fetch_optional(&mut *conn)
            .await?;
        if exists.is_none() {
            return Err(ExplorerError::unknown_table(table_name));
        }

        let pragma_query = format!("PRAGMA table_info('{table_name}')");
        let rows = sqlx::query(&pragma_query).fetch_all(&mut *conn).await?;

        let columns = rows
            .iter()
            .map(|row| {
                let name: String = row.get("name");
                let declared_type: String = row.get("type");
                let notnull: i32 = row.get("notnull");
                let default_value: Option<String> = row.try_get("dflt_value").ok().flatten();
                let pk: i32 = row.get("pk");

                let mut col = ColumnDescriptor::new(&name, &declared_type, notnull == 0)
                    .with_primary_key(pk > 0);
                if let Some(ref def) = default_value {
                    col = col.with_default(def);
                }
                col
            })
            .collect::<Vec<_>>();

        debug!(table = table_name, columns = columns.len(), "Described table");
        Ok(TableDescriptor::new(table_name, columns))
    }
}

/// Validate a table name as a safe identifier.
///
/// Accepts `[A-Za-z_][A-Za-z0-9_]*` only; quotes, semicolons, whitespace,
/// and dots are all rejected so the name can be safely embedded in a PRAGMA.
pub fn validate_identifier(name: &str) -> ExplorerResult<()> {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return Err(ExplorerError::invalid_identifier(
            name,
            "table name must not be empty",
        ));
    };
    if !(first.is_ascii_alphabetic() || first == '_') {
        return Err(ExplorerError::invalid_identifier(
            name,
            "table name must start with a letter or underscore",
        ));
    }
    if !chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(ExplorerError::invalid_identifier(
            name,
            "table name may only contain letters, digits, and underscores",
        ));
    }
    Ok(())
}
