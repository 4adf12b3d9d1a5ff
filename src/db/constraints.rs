//! Constraint lifecycle around a mocking run: back up DDL, drop a table's
//! indexes before it is loaded, recreate them once every table is done.
//!
//! DuckDB keeps primary keys, NOT NULL and CHECK constraints inside the
//! table definition and cannot alter them, so only indexes are relaxed.

use crate::error::MockError;
use crate::schema::{quote_ident, TableDescriptor};
use duckdb::Connection;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Removes and restores constraints around data loading.
pub trait ConstraintManager {
    /// Persist current schema definitions before anything is changed
    fn backup(&mut self) -> Result<(), MockError>;

    /// Remove constraints that would reject mock rows in `table`
    fn remove(&mut self, table: &TableDescriptor) -> Result<(), MockError>;

    /// Put back everything removed so far
    fn restore(&mut self) -> Result<(), MockError>;
}

#[derive(Debug, Clone)]
struct SavedIndex {
    table: TableDescriptor,
    name: String,
    sql: String,
}

/// Index-based constraint handling for DuckDB
pub struct IndexConstraints<'a> {
    conn: &'a Connection,
    backup_dir: PathBuf,
    backup_file: Option<PathBuf>,
    saved: Vec<SavedIndex>,
    removed: Vec<SavedIndex>,
}

impl<'a> IndexConstraints<'a> {
    pub fn new(conn: &'a Connection, backup_dir: impl Into<PathBuf>) -> Self {
        Self {
            conn,
            backup_dir: backup_dir.into(),
            backup_file: None,
            saved: Vec::new(),
            removed: Vec::new(),
        }
    }

    /// Path of the DDL backup, once written
    pub fn backup_file(&self) -> Option<&Path> {
        self.backup_file.as_deref()
    }

    fn read_indexes(&self) -> duckdb::Result<Vec<SavedIndex>> {
        let mut stmt = self.conn.prepare(
            "SELECT schema_name, table_name, index_name, sql FROM duckdb_indexes() \
             WHERE sql IS NOT NULL ORDER BY schema_name, table_name, index_name",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(SavedIndex {
                table: TableDescriptor::new(row.get::<_, String>(0)?, row.get::<_, String>(1)?),
                name: row.get(2)?,
                sql: row.get(3)?,
            })
        })?;
        rows.collect()
    }

    fn read_table_ddl(&self) -> duckdb::Result<Vec<String>> {
        let mut stmt = self.conn.prepare(
            "SELECT sql FROM duckdb_tables() WHERE NOT internal AND sql IS NOT NULL \
             ORDER BY schema_name, table_name",
        )?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
        rows.collect()
    }

    fn backup_hint(&self) -> String {
        match &self.backup_file {
            Some(path) => format!("DDL backup is at {}", path.display()),
            None => "no DDL backup was written".to_string(),
        }
    }
}

impl ConstraintManager for IndexConstraints<'_> {
    fn backup(&mut self) -> Result<(), MockError> {
        let tables = self
            .read_table_ddl()
            .map_err(|e| MockError::Backup { source: e.into() })?;
        self.saved = self
            .read_indexes()
            .map_err(|e| MockError::Backup { source: e.into() })?;

        let mut ddl = String::new();
        for statement in tables.iter().chain(self.saved.iter().map(|i| &i.sql)) {
            ddl.push_str(statement.trim_end().trim_end_matches(';'));
            ddl.push_str(";\n");
        }

        fs::create_dir_all(&self.backup_dir).map_err(|e| MockError::Backup { source: e.into() })?;
        let stamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
        let path = self.backup_dir.join(format!("ddl_{}.sql", stamp));
        fs::write(&path, ddl).map_err(|e| MockError::Backup { source: e.into() })?;

        info!(
            "Saved DDL of {} tables and {} indexes to {}",
            tables.len(),
            self.saved.len(),
            path.display()
        );
        self.backup_file = Some(path);
        Ok(())
    }

    fn remove(&mut self, table: &TableDescriptor) -> Result<(), MockError> {
        let (matching, rest): (Vec<_>, Vec<_>) =
            self.saved.drain(..).partition(|i| &i.table == table);
        self.saved = rest;

        for index in matching {
            let sql = format!(
                "DROP INDEX {}.{}",
                quote_ident(&index.table.schema),
                quote_ident(&index.name)
            );
            debug!("Removing index {} on {}", index.name, table);
            self.conn.execute(&sql, []).map_err(|e| {
                MockError::constraint(
                    table.qualified_name(),
                    format!("drop index {}", index.name),
                    e,
                )
            })?;
            self.removed.push(index);
        }
        Ok(())
    }

    fn restore(&mut self) -> Result<(), MockError> {
        let hint = self.backup_hint();
        for index in std::mem::take(&mut self.removed) {
            debug!("Restoring index {} on {}", index.name, index.table);
            self.conn.execute(&index.sql, []).map_err(|e| {
                MockError::constraint(
                    index.table.qualified_name(),
                    format!("restore index {} ({})", index.name, hint),
                    e,
                )
            })?;
        }
        Ok(())
    }
}
