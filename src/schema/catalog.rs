//! Catalog introspection: enumerate tables and their ordered columns.
//!
//! Both implementations read `information_schema`; Greenplum additionally
//! hides its system schemas and only describes base tables, so external
//! tables and views are never mocked.

use super::{ColumnDescriptor, SqlDialect, TableDescriptor};
use crate::error::MockError;
use duckdb::{params, Connection};

/// Enumerates tables and columns for one catalog flavor.
pub trait ColumnSource {
    /// All base tables, ordered by schema then name
    fn tables(&self) -> Result<Vec<TableDescriptor>, MockError>;

    /// Columns of `table` in ordinal order
    fn columns(&self, table: &TableDescriptor) -> Result<Vec<ColumnDescriptor>, MockError>;
}

/// Select the catalog implementation for a dialect.
pub fn catalog_for<'a>(dialect: SqlDialect, conn: &'a Connection) -> Box<dyn ColumnSource + 'a> {
    match dialect {
        SqlDialect::Postgres => Box::new(PostgresCatalog::new(conn)),
        SqlDialect::Greenplum => Box::new(GreenplumCatalog::new(conn)),
    }
}

const POSTGRES_TABLES: &str = "\
SELECT table_schema, table_name
FROM information_schema.tables
WHERE table_type = 'BASE TABLE'
  AND table_schema NOT IN ('pg_catalog', 'information_schema')
ORDER BY table_schema, table_name";

const POSTGRES_COLUMNS: &str = "\
SELECT column_name, data_type, column_default,
       character_maximum_length, numeric_precision, numeric_scale
FROM information_schema.columns
WHERE table_schema = ? AND table_name = ?
ORDER BY ordinal_position";

const GREENPLUM_TABLES: &str = "\
SELECT table_schema, table_name
FROM information_schema.tables
WHERE table_type = 'BASE TABLE'
  AND table_schema NOT IN ('pg_catalog', 'information_schema', 'gp_toolkit', 'pg_aoseg', 'pg_bitmapindex')
ORDER BY table_schema, table_name";

const GREENPLUM_COLUMNS: &str = "\
SELECT c.column_name, c.data_type, c.column_default,
       c.character_maximum_length, c.numeric_precision, c.numeric_scale
FROM information_schema.columns c
JOIN information_schema.tables t
  ON t.table_schema = c.table_schema AND t.table_name = c.table_name
WHERE c.table_schema = ? AND c.table_name = ?
  AND t.table_type = 'BASE TABLE'
ORDER BY c.ordinal_position";

/// PostgreSQL catalog
pub struct PostgresCatalog<'a> {
    conn: &'a Connection,
}

impl<'a> PostgresCatalog<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }
}

impl ColumnSource for PostgresCatalog<'_> {
    fn tables(&self) -> Result<Vec<TableDescriptor>, MockError> {
        query_tables(self.conn, POSTGRES_TABLES)
    }

    fn columns(&self, table: &TableDescriptor) -> Result<Vec<ColumnDescriptor>, MockError> {
        query_columns(self.conn, POSTGRES_COLUMNS, table)
    }
}

/// Greenplum catalog
pub struct GreenplumCatalog<'a> {
    conn: &'a Connection,
}

impl<'a> GreenplumCatalog<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }
}

impl ColumnSource for GreenplumCatalog<'_> {
    fn tables(&self) -> Result<Vec<TableDescriptor>, MockError> {
        query_tables(self.conn, GREENPLUM_TABLES)
    }

    fn columns(&self, table: &TableDescriptor) -> Result<Vec<ColumnDescriptor>, MockError> {
        query_columns(self.conn, GREENPLUM_COLUMNS, table)
    }
}

fn query_tables(conn: &Connection, sql: &str) -> Result<Vec<TableDescriptor>, MockError> {
    let run = || -> duckdb::Result<Vec<TableDescriptor>> {
        let mut stmt = conn.prepare(sql)?;
        let rows = stmt.query_map([], |row| {
            Ok(TableDescriptor::new(
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
            ))
        })?;
        rows.collect()
    };
    run().map_err(|e| MockError::introspection("database", e))
}

fn query_columns(
    conn: &Connection,
    sql: &str,
    table: &TableDescriptor,
) -> Result<Vec<ColumnDescriptor>, MockError> {
    let run = || -> duckdb::Result<Vec<ColumnDescriptor>> {
        let mut stmt = conn.prepare(sql)?;
        let rows = stmt.query_map(params![table.schema, table.table], |row| {
            let name: String = row.get(0)?;
            let data_type: String = row.get(1)?;
            let default: Option<String> = row.get(2)?;
            let char_length: Option<i64> = row.get(3)?;
            let precision: Option<i64> = row.get(4)?;
            let scale: Option<i64> = row.get(5)?;
            Ok(ColumnDescriptor {
                name,
                datatype: render_datatype(&data_type, char_length, precision, scale),
                default,
            })
        })?;
        rows.collect()
    };
    run().map_err(|e| MockError::introspection(table.qualified_name(), e))
}

/// Re-attach size modifiers the catalog reports in separate columns.
fn render_datatype(
    data_type: &str,
    char_length: Option<i64>,
    precision: Option<i64>,
    scale: Option<i64>,
) -> String {
    if data_type.contains('(') {
        return data_type.to_string();
    }

    let lower = data_type.to_lowercase();
    if lower.starts_with("char") || lower.starts_with("varchar") {
        if let Some(len) = char_length {
            return format!("{}({})", data_type, len);
        }
    }
    if lower == "numeric" || lower == "decimal" {
        if let Some(p) = precision {
            return format!("{}({},{})", data_type, p, scale.unwrap_or(0));
        }
    }
    data_type.to_string()
}
