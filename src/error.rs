//! Error types shared by the mocking pipeline and its collaborators.
//!
//! Only [`SynthError::Unsupported`] is recoverable (the table is skipped).
//! Every [`MockError`] ends the run.

use thiserror::Error;

/// Boxed source error carried by [`MockError`] variants.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Failure to synthesize a literal for a declared datatype.
#[derive(Debug, Error)]
pub enum SynthError {
    /// No generator exists for the datatype.
    #[error("unsupported datatypes found: {datatype}")]
    Unsupported { datatype: String },

    /// The datatype is known but its declaration cannot be satisfied.
    #[error("invalid datatype {datatype}: {reason}")]
    Invalid { datatype: String, reason: String },
}

impl SynthError {
    pub fn is_unsupported(&self) -> bool {
        matches!(self, SynthError::Unsupported { .. })
    }
}

/// Run-scoped, unrecoverable failure.
#[derive(Debug, Error)]
pub enum MockError {
    #[error("failed to open database session for {target}: {source}")]
    Connection {
        target: String,
        #[source]
        source: BoxError,
    },

    #[error("failed to read schema information for {table}: {source}")]
    Introspection {
        table: String,
        #[source]
        source: BoxError,
    },

    #[error("failed to back up schema definitions: {source}")]
    Backup {
        #[source]
        source: BoxError,
    },

    #[error("failed to {operation} on {table}: {source}")]
    Constraint {
        table: String,
        operation: String,
        #[source]
        source: BoxError,
    },

    #[error("error when building data for table {table}, column {column} ({datatype}): {source}")]
    Synthesis {
        table: String,
        column: String,
        datatype: String,
        #[source]
        source: SynthError,
    },

    #[error("error during committing data to {table} ({payload}) with `{statement}`: {source}")]
    Commit {
        table: String,
        statement: String,
        payload: String,
        #[source]
        source: BoxError,
    },

    #[error("error when loading the serial datatype for table {table}: {source}")]
    Insert {
        table: String,
        #[source]
        source: BoxError,
    },

    #[error("confirmation prompt failed: {source}")]
    Prompt {
        #[source]
        source: BoxError,
    },

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl MockError {
    pub fn connection(target: impl Into<String>, source: impl Into<BoxError>) -> Self {
        MockError::Connection {
            target: target.into(),
            source: source.into(),
        }
    }

    pub fn introspection(table: impl Into<String>, source: impl Into<BoxError>) -> Self {
        MockError::Introspection {
            table: table.into(),
            source: source.into(),
        }
    }

    pub fn constraint(
        table: impl Into<String>,
        operation: impl Into<String>,
        source: impl Into<BoxError>,
    ) -> Self {
        MockError::Constraint {
            table: table.into(),
            operation: operation.into(),
            source: source.into(),
        }
    }

    pub fn insert(table: impl Into<String>, source: impl Into<BoxError>) -> Self {
        MockError::Insert {
            table: table.into(),
            source: source.into(),
        }
    }
}
