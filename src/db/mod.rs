//! DuckDB target database: per-table sessions, bulk COPY, default-row
//! inserts and index constraint handling.

mod constraints;

pub use constraints::{ConstraintManager, IndexConstraints};

use crate::error::MockError;
use crate::mocker::{CopyPayload, DELIMITER, QUOTE};
use crate::schema::{quote_ident, TableDescriptor};
use duckdb::Connection;
use std::io::Write;
use std::path::Path;
use tracing::debug;

/// A database that can be loaded with mock rows.
pub trait Target {
    /// Acquire a session for one table's load. Dropping it releases it.
    fn open_session(&self) -> Result<Box<dyn Session + '_>, MockError>;

    /// Insert one row made only of default values.
    fn insert_default_row(&self, table: &TableDescriptor) -> Result<(), MockError>;
}

/// Table-scoped connection used for bulk loading.
pub trait Session {
    /// Load `payload` into `columns` of `table`. Columns and payload
    /// values are positionally aligned.
    fn bulk_commit(
        &mut self,
        table: &TableDescriptor,
        columns: &[String],
        payload: &CopyPayload,
    ) -> Result<(), MockError>;
}

/// Build the COPY statement loading `source` into `columns` of `table`.
pub fn copy_statement(table: &TableDescriptor, columns: &[String], source: &Path) -> String {
    let columns = columns
        .iter()
        .map(|c| quote_ident(c))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "COPY {} ({}) FROM '{}' (FORMAT csv, HEADER false, DELIMITER '{}', QUOTE '{}', ESCAPE '{}')",
        table.qualified_name(),
        columns,
        source.display().to_string().replace('\'', "''"),
        DELIMITER,
        QUOTE,
        QUOTE
    )
}

/// An embedded DuckDB database
pub struct Database {
    conn: Connection,
    location: String,
}

impl Database {
    /// Open (or create) a database file
    pub fn open(path: &Path) -> Result<Self, MockError> {
        let location = path.display().to_string();
        let conn = Connection::open(path).map_err(|e| MockError::connection(&location, e))?;
        Ok(Self { conn, location })
    }

    /// Open a private in-memory database
    pub fn open_in_memory() -> Result<Self, MockError> {
        let conn =
            Connection::open_in_memory().map_err(|e| MockError::connection(":memory:", e))?;
        Ok(Self {
            conn,
            location: ":memory:".to_string(),
        })
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    pub fn location(&self) -> &str {
        &self.location
    }
}

impl Target for Database {
    fn open_session(&self) -> Result<Box<dyn Session + '_>, MockError> {
        let conn = self
            .conn
            .try_clone()
            .map_err(|e| MockError::connection(&self.location, e))?;
        Ok(Box::new(DuckDbSession { conn }))
    }

    fn insert_default_row(&self, table: &TableDescriptor) -> Result<(), MockError> {
        let sql = format!("INSERT INTO {} DEFAULT VALUES", table.qualified_name());
        self.conn
            .execute(&sql, [])
            .map(|_| ())
            .map_err(|e| MockError::insert(table.qualified_name(), e))
    }
}

/// Session owning its own connection to the database
pub struct DuckDbSession {
    conn: Connection,
}

impl Session for DuckDbSession {
    fn bulk_commit(
        &mut self,
        table: &TableDescriptor,
        columns: &[String],
        payload: &CopyPayload,
    ) -> Result<(), MockError> {
        if payload.is_empty() {
            return Ok(());
        }

        let commit_error = |statement: String, source: crate::error::BoxError| MockError::Commit {
            table: table.qualified_name(),
            statement,
            payload: payload.describe(),
            source,
        };

        let mut file = tempfile::Builder::new()
            .prefix("sql-mocker-")
            .suffix(".csv")
            .tempfile()
            .map_err(|e| commit_error("<write payload>".to_string(), e.into()))?;
        file.write_all(payload.as_str().as_bytes())
            .and_then(|_| file.flush())
            .map_err(|e| commit_error("<write payload>".to_string(), e.into()))?;

        let statement = copy_statement(table, columns, file.path());
        debug!(table = %table, payload = %payload.describe(), "{}", statement);

        self.conn
            .execute(&statement, [])
            .map_err(|e| commit_error(statement.clone(), e.into()))?;
        Ok(())
    }
}
