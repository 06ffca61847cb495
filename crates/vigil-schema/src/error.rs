//! Error taxonomy shared by the compiler, the validator and the observation
//! layer.
//!
//! Two categories:
//! - `SchemaError`: malformed schema input. Always fatal.
//! - `Violation`: data-quality problems. Recorded as an `ErrorEntry` in the
//!   sink, or turned into `Error::Rejected` under strict mode.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::kind::Kind;

// =============================================================================
// ErrorCode
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ErrorCode {
    Schema,
    Listeners,
    Required,
    Type,
    Invalid,
    Unexpected,
}

impl ErrorCode {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::Schema => "SCHEMA",
            ErrorCode::Listeners => "LISTENERS",
            ErrorCode::Required => "REQUIRED",
            ErrorCode::Type => "TYPE",
            ErrorCode::Invalid => "INVALID",
            ErrorCode::Unexpected => "UNEXPECTED",
        }
    }

    /// Codes that abort regardless of the `strict` option.
    pub fn is_always_fatal(self) -> bool {
        matches!(self, ErrorCode::Schema | ErrorCode::Listeners)
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Violation (data errors)
// =============================================================================

/// A data-quality problem found while validating or mutating a value.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum Violation {
    #[error("data validation error: missing required property '{name}'")]
    Required { name: String },

    #[error("data validation error: expected a value of type '{expected}', but '{actual}' was given")]
    Type { expected: Kind, actual: String },

    #[error("data validation error: {}", invalid_message(.validator))]
    Invalid { validator: Option<String> },

    #[error("data validation error: unexpected property '{name}' is not defined in schema")]
    Unexpected { name: String },
}

fn invalid_message(validator: &Option<String>) -> String {
    match validator {
        Some(name) => format!("value rejected by validator '{name}'"),
        None => "given value is invalid".to_string(),
    }
}

impl Violation {
    pub fn code(&self) -> ErrorCode {
        match self {
            Violation::Required { .. } => ErrorCode::Required,
            Violation::Type { .. } => ErrorCode::Type,
            Violation::Invalid { .. } => ErrorCode::Invalid,
            Violation::Unexpected { .. } => ErrorCode::Unexpected,
        }
    }
}

// =============================================================================
// ErrorEntry
// =============================================================================

/// One recorded error, addressed by its dotted path from the observation root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorEntry {
    pub code: ErrorCode,
    pub message: String,
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_number: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column_number: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack: Option<Vec<String>>,
}

impl ErrorEntry {
    pub fn new(violation: &Violation, path: impl Into<String>) -> Self {
        Self {
            code: violation.code(),
            message: violation.to_string(),
            path: path.into(),
            file_name: None,
            line_number: None,
            column_number: None,
            stack: None,
        }
    }

    pub fn with_location(mut self, file_name: impl Into<String>, line: u32, column: u32) -> Self {
        self.file_name = Some(file_name.into());
        self.line_number = Some(line);
        self.column_number = Some(column);
        self
    }

    pub fn with_stack(mut self, stack: Vec<String>) -> Self {
        self.stack = Some(stack);
        self
    }
}

impl fmt::Display for ErrorEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            write!(f, "[{}] {}", self.code, self.message)
        } else {
            write!(f, "[{}] {} at path '{}'", self.code, self.message, self.path)
        }
    }
}

// =============================================================================
// SchemaError (fatal)
// =============================================================================

/// Malformed schema input. Reported with code SCHEMA regardless of `strict`.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum SchemaError {
    #[error("unknown type '{name}'")]
    UnknownType { name: String },

    #[error("type '{kind}' at '{path}' requires the strictNumbers option")]
    StrictNumbersRequired { kind: Kind, path: String },

    #[error("'items' given for non-array type '{kind}' at '{path}'")]
    ItemsOnNonArray { kind: Kind, path: String },

    #[error("'properties' given for non-object type '{kind}' at '{path}'")]
    PropertiesOnNonObject { kind: Kind, path: String },

    #[error("default value of type '{actual}' does not match type '{kind}' at '{path}'")]
    DefaultTypeMismatch { kind: Kind, actual: String, path: String },

    #[error("schema node at '{path}' has no type")]
    MissingType { path: String },

    #[error("unknown validator '{name}' at '{path}'")]
    UnknownValidator { name: String, path: String },

    #[error("keyword '{keyword}' at '{path}' is malformed: {reason}")]
    InvalidKeyword {
        keyword: String,
        path: String,
        reason: String,
    },
}

impl SchemaError {
    pub fn code(&self) -> ErrorCode {
        ErrorCode::Schema
    }
}

// =============================================================================
// Error
// =============================================================================

#[derive(Debug, Clone, Error, PartialEq)]
pub enum Error {
    #[error("schema error: {0}")]
    Schema(#[from] SchemaError),

    /// A violation raised as a failure because the schema is strict.
    #[error("{0}")]
    Rejected(ErrorEntry),
}

impl Error {
    pub fn code(&self) -> ErrorCode {
        match self {
            Error::Schema(err) => err.code(),
            Error::Rejected(entry) => entry.code,
        }
    }

    pub fn entry(&self) -> Option<&ErrorEntry> {
        match self {
            Error::Rejected(entry) => Some(entry),
            Error::Schema(_) => None,
        }
    }
}
