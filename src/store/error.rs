use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::models::RecordType;

/// Failures surfaced by the CSV record store and the schema registry.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("unknown record type `{0}` (expected books or magazines)")]
    UnknownType(String),

    /// The backing file could not be opened, read, or appended to.
    #[error("record store {} is unavailable: {source}", path.display())]
    StoreUnavailable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{}:{line}: expected {expected} fields, found {found}", path.display())]
    MalformedRow {
        path: PathBuf,
        line: usize,
        expected: usize,
        found: usize,
    },

    #[error("{record_type} records need fields [{}], got [{}]", expected.join(", "), found.join(", "))]
    SchemaMismatch {
        record_type: RecordType,
        expected: Vec<String>,
        found: Vec<String>,
    },
}

impl StoreError {
    pub(crate) fn unavailable(path: impl Into<PathBuf>, source: io::Error) -> Self {
        StoreError::StoreUnavailable {
            path: path.into(),
            source,
        }
    }
}
