//! Error types for index operations.
//!
//! Absence of a record is never an error; lookups return `Ok(None)` and the
//! HTTP layer renders null fields. Errors here are the failures worth a 400:
//! malformed input, upstream chain failures, storage faults, and data
//! integrity conditions.

use thiserror::Error;

/// Errors that can occur during index operations.
#[derive(Debug, Error)]
pub enum IndexError {
    /// Malformed caller-supplied parameter (non-integer index, etc.).
    #[error("invalid parameter: {0}")]
    InvalidParam(String),

    /// Remote chain client failure. Propagated unchanged; retry policy, if
    /// any, belongs to the client.
    #[error("upstream chain error: {0}")]
    Upstream(String),

    /// A batch declared more children than the store returned. The store
    /// invariant (abutting ranges, no gaps) does not hold; surfaced, never
    /// masked by truncation.
    #[error("batch {batch_index} declares {expected} children, store returned {actual}")]
    IncompleteBatch {
        /// Index of the offending batch.
        batch_index: u64,
        /// `size` declared by the batch.
        expected: u64,
        /// Number of children the range scan returned.
        actual: u64,
    },

    /// A batch's declared child range extends past the end of the index
    /// space. Stored data, not caller input; surfaced like any other
    /// integrity condition.
    #[error("batch {0} declares a child range beyond the index space")]
    BatchRangeOverflow(u64),

    /// Attempt to reassign an already-set `ctc_index`.
    #[error("ctc index for queue element {0} is already set")]
    CtcIndexAlreadySet(u64),

    /// Storage error.
    #[error("storage error: {0}")]
    Storage(String),

    /// SQLite database error.
    #[error("sqlite error: {0}")]
    Sqlite(String),
}

impl From<rusqlite::Error> for IndexError {
    fn from(err: rusqlite::Error) -> Self {
        IndexError::Sqlite(err.to_string())
    }
}

impl From<serde_json::Error> for IndexError {
    fn from(err: serde_json::Error) -> Self {
        IndexError::Storage(err.to_string())
    }
}

/// Result type for index operations.
pub type IndexResult<T> = Result<T, IndexError>;
