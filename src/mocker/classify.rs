//! Column classification: split sequence-backed columns from columns that
//! need synthesized values.
//!
//! Classification is a pure function of the column descriptors and never
//! touches the database.

use crate::schema::{ColumnDescriptor, TableDescriptor};
use serde::Serialize;

/// Prefix of a default expression that draws from a sequence
pub const SEQUENCE_DEFAULT_PREFIX: &str = "nextval";

/// Whether a column's value comes from a sequence. Case-sensitive prefix
/// match on the default expression, no normalization.
pub fn is_sequence_backed(column: &ColumnDescriptor) -> bool {
    column
        .default
        .as_deref()
        .is_some_and(|d| d.starts_with(SEQUENCE_DEFAULT_PREFIX))
}

/// A table together with the columns mock values are written to, in
/// the order values are generated and encoded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableCollection {
    pub table: TableDescriptor,
    pub columns: Vec<ColumnDescriptor>,
}

impl TableCollection {
    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }
}

/// How one table will be loaded
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    /// Load literal values into the remaining columns
    Load(TableCollection),
    /// Only column is sequence-backed: insert default rows
    SequenceOnly(TableDescriptor),
    /// Nothing left to write
    Excluded(TableDescriptor),
}

/// Classify one table from its full, ordered column list.
pub fn classify_table(table: &TableDescriptor, columns: &[ColumnDescriptor]) -> Classification {
    if let [only] = columns {
        if is_sequence_backed(only) {
            return Classification::SequenceOnly(table.clone());
        }
    }

    let columns: Vec<ColumnDescriptor> = columns
        .iter()
        .filter(|c| !is_sequence_backed(c))
        .cloned()
        .collect();

    if columns.is_empty() {
        Classification::Excluded(table.clone())
    } else {
        Classification::Load(TableCollection {
            table: table.clone(),
            columns,
        })
    }
}

/// Classification of every table in a run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassifiedTables {
    /// Tables to load, in input order
    pub collections: Vec<TableCollection>,
    /// Single sequence-backed column tables
    pub sequence_only: Vec<TableDescriptor>,
    /// Tables that receive no data
    pub excluded: Vec<TableDescriptor>,
}

impl ClassifiedTables {
    pub fn add(&mut self, table: &TableDescriptor, columns: &[ColumnDescriptor]) {
        match classify_table(table, columns) {
            Classification::Load(collection) => self.collections.push(collection),
            Classification::SequenceOnly(t) => self.sequence_only.push(t),
            Classification::Excluded(t) => self.excluded.push(t),
        }
    }
}

/// Classify a batch of tables, keeping their order.
pub fn classify_tables<'a, I>(tables: I) -> ClassifiedTables
where
    I: IntoIterator<Item = (&'a TableDescriptor, &'a [ColumnDescriptor])>,
{
    let mut classified = ClassifiedTables::default();
    for (table, columns) in tables {
        classified.add(table, columns);
    }
    classified
}
