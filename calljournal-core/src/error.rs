//! Error types and result codes for call journal operations

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Terminal outcome of a journal operation.
///
/// The numeric values are what failure trace events carry, so they are
/// explicit and must not be reordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResultCode {
    Ok = 0,
    /// The store rejected the request as malformed.
    InvalidRequest = 1,
    /// Empty prefix scan, or the store reported the row missing.
    NotFound = 2,
    /// The store is up but cannot serve the request right now.
    Unavailable = 3,
    /// No usable connection to the store.
    ConnectionError = 4,
    /// Anything the store raised that does not map onto the codes above.
    Unknown = 5,
}

impl ResultCode {
    /// Numeric value reported in trace events.
    pub fn code(&self) -> u64 {
        *self as u64
    }

    /// Recover the result code of a finished call.
    pub fn of<T>(result: &JournalResult<T>) -> ResultCode {
        match result {
            Ok(_) => ResultCode::Ok,
            Err(e) => e.code,
        }
    }

    /// Whether a retry against the same store could plausibly succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, ResultCode::Unavailable | ResultCode::ConnectionError)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ResultCode::Ok => "OK",
            ResultCode::InvalidRequest => "INVALID_REQUEST",
            ResultCode::NotFound => "NOT_FOUND",
            ResultCode::Unavailable => "UNAVAILABLE",
            ResultCode::ConnectionError => "CONNECTION_ERROR",
            ResultCode::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for ResultCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A failed journal call as seen by synchronous and async callers.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{code}: {description}")]
pub struct JournalError {
    pub code: ResultCode,
    pub description: String,
}

impl JournalError {
    pub fn new(code: ResultCode, description: impl Into<String>) -> Self {
        Self {
            code,
            description: description.into(),
        }
    }
}

/// Result type alias for journal calls.
pub type JournalResult<T> = Result<T, JournalError>;

/// Column key decode failures.
///
/// These never surface as operation errors; a read skips the column and
/// carries on with the rest of the partition.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("Column name {key:?} does not start with {prefix:?}")]
    MissingPrefix { key: String, prefix: &'static str },

    #[error("Column name {key:?} has {found} tokens, expected 3")]
    WrongTokenCount { key: String, found: usize },

    #[error("Column name {key:?} has unrecognised fragment type {token:?}")]
    UnknownType { key: String, token: String },
}

/// Fragment contract violations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Invalid timestamp {value:?}: {reason}")]
    InvalidTimestamp { value: String, reason: String },

    #[error("Call id {id:?} contains the key delimiter {delimiter:?}")]
    IdContainsDelimiter { id: String, delimiter: char },
}

/// Configuration errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing required configuration field: {field}")]
    MissingRequired { field: String },

    #[error("Invalid value for {field}: {value} - {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },
}

// =============================================================================
// TESTS
// =============================================================================
