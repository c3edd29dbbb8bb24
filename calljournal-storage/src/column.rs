//! Column store interface.
//!
//! The journal needs three primitives from the underlying wide-column store.
//! Connection pooling, host resolution, replica failover and consistency
//! levels all live behind this trait.

use calljournal_core::ResultCode;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A column returned by a slice query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub value: String,
}

impl Column {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Columns to tombstone in one row of one table.
///
/// Values are ignored by deletions; they are kept so a row can be described
/// with the same map shape as a write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowColumns {
    pub table: String,
    pub key: String,
    pub columns: BTreeMap<String, String>,
}

impl RowColumns {
    pub fn new(
        table: impl Into<String>,
        key: impl Into<String>,
        columns: BTreeMap<String, String>,
    ) -> Self {
        Self {
            table: table.into(),
            key: key.into(),
            columns,
        }
    }
}

/// Failures raised by the column store.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum StoreFailure {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Row {key} not present in table {table}")]
    RowNotFound { table: String, key: String },

    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Unexpected store error: {0}")]
    Unknown(String),
}

impl StoreFailure {
    /// Map onto the result-code taxonomy.
    pub fn result_code(&self) -> ResultCode {
        match self {
            StoreFailure::InvalidRequest(_) => ResultCode::InvalidRequest,
            StoreFailure::RowNotFound { .. } => ResultCode::NotFound,
            StoreFailure::Unavailable(_) => ResultCode::Unavailable,
            StoreFailure::Connection(_) => ResultCode::ConnectionError,
            StoreFailure::Unknown(_) => ResultCode::Unknown,
        }
    }
}

/// The column store primitives the journal is written against.
///
/// Timestamps are the store's last-write-wins tokens (conventionally
/// microseconds since the epoch). A `ttl` of 0 means the column never
/// expires.
pub trait ColumnStore: Send + Sync {
    /// Keyspace this handle is bound to.
    fn keyspace(&self) -> &str;

    /// Upsert `columns` into every row in `keys`.
    fn put_columns(
        &self,
        table: &str,
        keys: &[String],
        columns: &BTreeMap<String, String>,
        timestamp: i64,
        ttl: i32,
    ) -> Result<(), StoreFailure>;

    /// All live columns in row `key` whose name starts with `prefix`, in
    /// byte order of the column name. Names are returned in full.
    fn get_columns_with_prefix(
        &self,
        table: &str,
        key: &str,
        prefix: &str,
    ) -> Result<Vec<Column>, StoreFailure>;

    /// Tombstone every listed column in a single batch.
    fn batched_delete(&self, rows: &[RowColumns], timestamp: i64) -> Result<(), StoreFailure>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_failure_result_codes() {
        assert_eq!(
            StoreFailure::InvalidRequest("x".into()).result_code(),
            ResultCode::InvalidRequest
        );
        assert_eq!(
            StoreFailure::RowNotFound {
                table: "call_lists".into(),
                key: "kermit".into()
            }
            .result_code(),
            ResultCode::NotFound
        );
        assert_eq!(
            StoreFailure::Unavailable("x".into()).result_code(),
            ResultCode::Unavailable
        );
        assert_eq!(
            StoreFailure::Connection("x".into()).result_code(),
            ResultCode::ConnectionError
        );
        assert_eq!(StoreFailure::Unknown("x".into()).result_code(), ResultCode::Unknown);
    }

    #[test]
    fn test_store_failure_display() {
        let failure = StoreFailure::RowNotFound {
            table: "call_lists".into(),
            key: "kermit".into(),
        };
        let msg = failure.to_string();
        assert!(msg.contains("kermit"));
        assert!(msg.contains("call_lists"));
    }
}
