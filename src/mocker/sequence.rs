//! Loader for tables whose only column is sequence-backed.
//!
//! Such tables have nothing to synthesize, so every row is its own
//! `DEFAULT VALUES` insert.

use crate::db::Target;
use crate::error::MockError;
use crate::progress::Progress;
use crate::schema::TableDescriptor;
use tracing::debug;

/// Insert `rows` default-valued rows into each table. Returns the total
/// number of rows inserted.
pub fn load_sequence_only(
    tables: &[TableDescriptor],
    rows: usize,
    target: &dyn Target,
    progress: &Progress,
) -> Result<u64, MockError> {
    let mut inserted = 0u64;
    for table in tables {
        debug!("Loading data for one column serial data type table {}", table);
        let bar = progress.bar(rows as u64, format!("Mocking Table {}", table));
        for _ in 0..rows {
            target.insert_default_row(table)?;
            inserted += 1;
            bar.inc(1);
        }
        bar.finish();
    }
    Ok(inserted)
}
