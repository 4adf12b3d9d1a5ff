//! Schema model for mocking: table and column descriptors, the catalog
//! dialect, and table selection.
//!
//! This module provides:
//! - `TableDescriptor` / `ColumnDescriptor` as read from the catalog
//! - `SqlDialect` routing column enumeration to a `ColumnSource`
//! - `TableSelection` for narrowing the enumerated tables

mod catalog;

pub use catalog::{catalog_for, ColumnSource, GreenplumCatalog, PostgresCatalog};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Quote an identifier with double quotes, doubling embedded quotes.
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// A relational table, identified by schema and name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TableDescriptor {
    pub schema: String,
    pub table: String,
}

impl TableDescriptor {
    pub fn new(schema: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
            table: table.into(),
        }
    }

    /// `"schema"."table"`, ready to embed in SQL.
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", quote_ident(&self.schema), quote_ident(&self.table))
    }
}

impl fmt::Display for TableDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.qualified_name())
    }
}

/// A column as declared in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDescriptor {
    /// Column name
    pub name: String,
    /// Declared datatype, including modifiers such as `varchar(20)`
    pub datatype: String,
    /// Default-value expression, if any
    pub default: Option<String>,
}

impl ColumnDescriptor {
    pub fn new(name: impl Into<String>, datatype: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            datatype: datatype.into(),
            default: None,
        }
    }

    pub fn with_default(mut self, expression: impl Into<String>) -> Self {
        self.default = Some(expression.into());
        self
    }
}

/// Catalog flavor used to enumerate tables and columns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SqlDialect {
    #[default]
    Postgres,
    Greenplum,
}

impl fmt::Display for SqlDialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SqlDialect::Postgres => write!(f, "postgres"),
            SqlDialect::Greenplum => write!(f, "greenplum"),
        }
    }
}

impl FromStr for SqlDialect {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "postgres" | "postgresql" | "pg" => Ok(SqlDialect::Postgres),
            "greenplum" | "gpdb" | "gp" => Ok(SqlDialect::Greenplum),
            _ => Err(format!(
                "Unknown dialect: {}. Use: postgres, greenplum",
                s
            )),
        }
    }
}

/// Which of the enumerated tables a run should mock
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TableSelection {
    /// Every base table in the database
    #[default]
    All,
    /// Every table in one schema
    Schema(String),
    /// Named tables, either `table` or `schema.table`
    Tables(Vec<String>),
}

impl TableSelection {
    /// Check whether `table` is selected. Names compare case-insensitively.
    pub fn matches(&self, table: &TableDescriptor) -> bool {
        match self {
            TableSelection::All => true,
            TableSelection::Schema(schema) => table.schema.eq_ignore_ascii_case(schema),
            TableSelection::Tables(names) => names.iter().any(|n| name_matches(n, table)),
        }
    }

    /// Keep selected tables in catalog order, dropping anything in `exclude`.
    pub fn apply(&self, tables: Vec<TableDescriptor>, exclude: &[String]) -> Vec<TableDescriptor> {
        tables
            .into_iter()
            .filter(|t| self.matches(t))
            .filter(|t| !exclude.iter().any(|e| name_matches(e, t)))
            .collect()
    }
}

fn name_matches(pattern: &str, table: &TableDescriptor) -> bool {
    match pattern.split_once('.') {
        Some((schema, name)) => {
            table.schema.eq_ignore_ascii_case(schema.trim())
                && table.table.eq_ignore_ascii_case(name.trim())
        }
        None => table.table.eq_ignore_ascii_case(pattern.trim()),
    }
}
