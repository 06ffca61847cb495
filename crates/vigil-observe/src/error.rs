use thiserror::Error;
use vigil_schema::{ErrorCode, ErrorEntry, SchemaError};

/// Failures of observed-tree operations.
///
/// `Rejected` carries a data violation raised under a strict schema; the
/// remaining variants are API misuse and never reach the error sink.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum Error {
    #[error("schema error: {0}")]
    Schema(#[from] SchemaError),

    #[error("{0}")]
    Rejected(ErrorEntry),

    #[error("no value at path '{path}'")]
    NotFound { path: String },

    #[error("value at path '{path}' is not an observed container")]
    NotAContainer { path: String },

    #[error("'{path}' is not an array")]
    NotAnArray { path: String },

    #[error("key '{key}' is not an array index at path '{path}'")]
    NotAnIndex { key: String, path: String },

    #[error("index {index} is out of bounds for length {len} at path '{path}'")]
    IndexOutOfBounds { index: usize, len: usize, path: String },

    #[error("cannot merge into a scalar value of type '{kind}'")]
    ScalarMerge { kind: String },
}

impl Error {
    /// Taxonomy code for errors that have one.
    pub fn code(&self) -> Option<ErrorCode> {
        match self {
            Error::Schema(_) => Some(ErrorCode::Schema),
            Error::Rejected(entry) => Some(entry.code),
            _ => None,
        }
    }

    pub fn entry(&self) -> Option<&ErrorEntry> {
        match self {
            Error::Rejected(entry) => Some(entry),
            _ => None,
        }
    }
}

impl From<vigil_schema::Error> for Error {
    fn from(err: vigil_schema::Error) -> Self {
        match err {
            vigil_schema::Error::Schema(err) => Error::Schema(err),
            vigil_schema::Error::Rejected(entry) => Error::Rejected(entry),
        }
    }
}
