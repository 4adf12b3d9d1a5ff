//! Row synthesis: one literal per column, one row at a time.

use super::classify::TableCollection;
use crate::datagen::ValueSynthesizer;
use crate::error::{MockError, SynthError};
use std::iter::FusedIterator;

/// Literal values for one row, aligned with `TableCollection::columns`
pub type Row = Vec<String>;

/// Synthesis stopped while building a row
#[derive(Debug)]
pub struct SynthFailure {
    /// 0-based index of the row being built
    pub row: usize,
    pub column: String,
    pub datatype: String,
    pub error: SynthError,
}

impl SynthFailure {
    pub fn is_unsupported(&self) -> bool {
        self.error.is_unsupported()
    }

    pub fn into_mock_error(self, collection: &TableCollection) -> MockError {
        MockError::Synthesis {
            table: collection.table.qualified_name(),
            column: self.column,
            datatype: self.datatype,
            source: self.error,
        }
    }
}

/// Yields `rows` rows for a table, in column order.
///
/// The first failure is yielded once and ends the iteration: no further
/// rows are produced for the table.
pub struct RowSynthesizer<'a, S: ValueSynthesizer + ?Sized> {
    collection: &'a TableCollection,
    synth: &'a mut S,
    rows: usize,
    next_row: usize,
    done: bool,
}

impl<'a, S: ValueSynthesizer + ?Sized> RowSynthesizer<'a, S> {
    pub fn new(collection: &'a TableCollection, synth: &'a mut S, rows: usize) -> Self {
        Self {
            collection,
            synth,
            rows,
            next_row: 0,
            done: false,
        }
    }

    fn build_row(&mut self) -> Result<Row, SynthFailure> {
        let mut row = Vec::with_capacity(self.collection.columns.len());
        for column in &self.collection.columns {
            match self.synth.synthesize(&column.datatype) {
                Ok(value) => row.push(value),
                Err(error) => {
                    return Err(SynthFailure {
                        row: self.next_row,
                        column: column.name.clone(),
                        datatype: column.datatype.clone(),
                        error,
                    })
                }
            }
        }
        Ok(row)
    }
}

impl<S: ValueSynthesizer + ?Sized> Iterator for RowSynthesizer<'_, S> {
    type Item = Result<Row, SynthFailure>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done || self.next_row >= self.rows {
            return None;
        }

        let result = self.build_row();
        match result {
            Ok(_) => self.next_row += 1,
            Err(_) => self.done = true,
        }
        Some(result)
    }
}

impl<S: ValueSynthesizer + ?Sized> FusedIterator for RowSynthesizer<'_, S> {}
