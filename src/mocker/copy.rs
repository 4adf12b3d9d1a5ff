//! Bulk-load encoding and per-table commit.
//!
//! Rows are encoded as CSV records: values joined by [`DELIMITER`],
//! records terminated by `\n`. A value containing the delimiter, the
//! quote, a line break, or nothing at all is wrapped in [`QUOTE`] with
//! embedded quotes doubled, so no synthesized literal can shift columns
//! or split a record.

use super::classify::TableCollection;
use super::config::SkipPolicy;
use super::synth::RowSynthesizer;
use crate::datagen::ValueSynthesizer;
use crate::db::{Session, Target};
use crate::error::MockError;
use crate::schema::TableDescriptor;
use indicatif::ProgressBar;
use serde::Serialize;
use tracing::debug;

/// Value separator within a record
pub const DELIMITER: char = '$';

/// Quote character; also escapes itself by doubling
pub const QUOTE: char = '"';

/// Encoded rows waiting to be committed
#[derive(Debug, Clone, Default)]
pub struct CopyPayload {
    data: String,
    rows: usize,
}

impl CopyPayload {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one record. Values must be in payload column order.
    pub fn push_row(&mut self, row: &[String]) {
        for (i, value) in row.iter().enumerate() {
            if i > 0 {
                self.data.push(DELIMITER);
            }
            push_value(&mut self.data, value);
        }
        self.data.push('\n');
        self.rows += 1;
    }

    pub fn as_str(&self) -> &str {
        &self.data
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    pub fn clear(&mut self) {
        self.data.clear();
        self.rows = 0;
    }

    /// Short description for error messages and logs
    pub fn describe(&self) -> String {
        format!("{} rows, {} bytes", self.rows, self.data.len())
    }
}

fn needs_quoting(value: &str) -> bool {
    value.is_empty() || value.contains([DELIMITER, QUOTE, '\n', '\r'])
}

fn push_value(out: &mut String, value: &str) {
    if !needs_quoting(value) {
        out.push_str(value);
        return;
    }
    out.push(QUOTE);
    for ch in value.chars() {
        if ch == QUOTE {
            out.push(QUOTE);
        }
        out.push(ch);
    }
    out.push(QUOTE);
}

/// Accumulates rows for one table and commits them in batches through a
/// session it owns. Dropping the committer releases the session.
pub struct TableCommitter<'a> {
    session: Box<dyn Session + 'a>,
    table: &'a TableDescriptor,
    columns: Vec<String>,
    pending: CopyPayload,
    batch_rows: usize,
    committed: usize,
}

impl<'a> TableCommitter<'a> {
    pub fn new(
        session: Box<dyn Session + 'a>,
        table: &'a TableDescriptor,
        columns: Vec<String>,
        batch_rows: usize,
    ) -> Self {
        Self {
            session,
            table,
            columns,
            pending: CopyPayload::new(),
            batch_rows: batch_rows.max(1),
            committed: 0,
        }
    }

    /// Queue a row, committing the batch once it is full.
    pub fn push(&mut self, row: &[String]) -> Result<(), MockError> {
        debug_assert_eq!(row.len(), self.columns.len());
        self.pending.push_row(row);
        if self.pending.rows() >= self.batch_rows {
            self.flush()?;
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<(), MockError> {
        if self.pending.is_empty() {
            return Ok(());
        }
        self.session
            .bulk_commit(self.table, &self.columns, &self.pending)?;
        self.committed += self.pending.rows();
        self.pending.clear();
        Ok(())
    }

    /// Commit what is pending and return the number of committed rows.
    pub fn finish(mut self) -> Result<usize, MockError> {
        self.flush()?;
        Ok(self.committed)
    }

    /// Drop pending rows and return the number already committed.
    pub fn discard(self) -> usize {
        self.committed
    }
}

/// Result of loading one table
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TableLoad {
    Loaded {
        rows: usize,
    },
    Skipped {
        /// Rows left in the table
        committed: usize,
        /// Row being built when synthesis failed
        row: usize,
        column: String,
        datatype: String,
    },
}

impl TableLoad {
    pub fn committed(&self) -> usize {
        match self {
            TableLoad::Loaded { rows } => *rows,
            TableLoad::Skipped { committed, .. } => *committed,
        }
    }
}

/// Row-loop settings for one table
#[derive(Debug, Clone, Copy)]
pub struct LoadOptions {
    pub rows: usize,
    pub batch_rows: usize,
    pub skip_policy: SkipPolicy,
}

/// Synthesize and commit `options.rows` rows into one table.
///
/// An unsupported datatype ends the table's load and is reported as
/// [`TableLoad::Skipped`]; with [`SkipPolicy::KeepPartial`] the rows built
/// before the failing one stay committed, with [`SkipPolicy::Atomic`]
/// nothing is committed. Every other failure is returned as an error.
pub fn load_table(
    collection: &TableCollection,
    synth: &mut dyn ValueSynthesizer,
    target: &dyn Target,
    options: &LoadOptions,
    bar: &ProgressBar,
) -> Result<TableLoad, MockError> {
    let table = &collection.table;
    let batch_rows = match options.skip_policy {
        SkipPolicy::KeepPartial => options.batch_rows,
        SkipPolicy::Atomic => usize::MAX,
    };

    let session = target.open_session()?;
    let mut committer = TableCommitter::new(session, table, collection.column_names(), batch_rows);

    for row in RowSynthesizer::new(collection, synth, options.rows) {
        let failure = match row {
            Ok(row) => {
                committer.push(&row)?;
                bar.inc(1);
                continue;
            }
            Err(failure) => failure,
        };

        if !failure.is_unsupported() {
            return Err(failure.into_mock_error(collection));
        }

        let committed = match options.skip_policy {
            SkipPolicy::KeepPartial => committer.finish()?,
            SkipPolicy::Atomic => committer.discard(),
        };
        debug!(
            "Table {} skipped, since the column {}, had unknown data type {}: {}",
            table, failure.column, failure.datatype, failure.error
        );
        return Ok(TableLoad::Skipped {
            committed,
            row: failure.row,
            column: failure.column,
            datatype: failure.datatype,
        });
    }

    let rows = committer.finish()?;
    Ok(TableLoad::Loaded { rows })
}
