//! Call fragment types

use crate::error::ValidationError;
use crate::schema::{
    KEY_DELIMITER, TIMESTAMP_FORMAT, TIMESTAMP_WIDTH, TOKEN_BEGIN, TOKEN_END, TOKEN_REJECTED,
};
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

// ============================================================================
// FRAGMENT TYPE
// ============================================================================

/// Kind of event a fragment records.
///
/// The discriminants are reported in trace events, so every variant carries
/// an explicit value. Ordering between fragments never uses these values;
/// it follows the column key token (see [`FragmentType::as_str`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FragmentType {
    Begin = 0,
    End = 1,
    Rejected = 2,
}

impl FragmentType {
    pub const ALL: [FragmentType; 3] = [FragmentType::Begin, FragmentType::End, FragmentType::Rejected];

    /// Token encoded into the column key.
    pub fn as_str(&self) -> &'static str {
        match self {
            FragmentType::Begin => TOKEN_BEGIN,
            FragmentType::End => TOKEN_END,
            FragmentType::Rejected => TOKEN_REJECTED,
        }
    }

    /// Parse a column key token. Exact match only; the stored tokens are
    /// always lowercase.
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            TOKEN_BEGIN => Some(FragmentType::Begin),
            TOKEN_END => Some(FragmentType::End),
            TOKEN_REJECTED => Some(FragmentType::Rejected),
            _ => None,
        }
    }

    /// Numeric value reported in trace events.
    pub fn code(&self) -> u64 {
        *self as u64
    }
}

impl fmt::Display for FragmentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for FragmentType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_token(s).ok_or_else(|| format!("Invalid FragmentType: {}", s))
    }
}

// ============================================================================
// FRAGMENT KEY
// ============================================================================

/// The identity of a fragment: everything that goes into its column key.
///
/// Two fragments with the same key occupy the same column, so the later
/// write (by write-timestamp) replaces the earlier one.
///
/// `Ord` is the byte order of the encoded column key, which is the order the
/// store returns columns in. For fixed-width timestamps and ids of equal
/// length that is timestamp, then id, then type token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FragmentKey {
    pub timestamp: String,
    pub id: String,
    #[serde(rename = "type")]
    pub fragment_type: FragmentType,
}

impl FragmentKey {
    pub fn new(
        timestamp: impl Into<String>,
        id: impl Into<String>,
        fragment_type: FragmentType,
    ) -> Self {
        Self {
            timestamp: timestamp.into(),
            id: id.into(),
            fragment_type,
        }
    }

    /// Attach contents read from the store.
    pub fn into_fragment(self, contents: impl Into<String>) -> CallFragment {
        CallFragment {
            timestamp: self.timestamp,
            id: self.id,
            fragment_type: self.fragment_type,
            contents: contents.into(),
        }
    }

    // Bytes of the key after the column prefix, without allocating.
    fn key_bytes(&self) -> impl Iterator<Item = u8> + '_ {
        let delimiter = KEY_DELIMITER as u8;
        self.timestamp
            .bytes()
            .chain(std::iter::once(delimiter))
            .chain(self.id.bytes())
            .chain(std::iter::once(delimiter))
            .chain(self.fragment_type.as_str().bytes())
    }
}

impl Ord for FragmentKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key_bytes().cmp(other.key_bytes())
    }
}

impl PartialOrd for FragmentKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for FragmentKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for FragmentKey {}

// ============================================================================
// CALL FRAGMENT
// ============================================================================

/// One event in a call's lifecycle, as stored in an identity's partition.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CallFragment {
    /// Time the call started, `YYYYMMDDHHMMSS`.
    pub timestamp: String,
    /// Caller-assigned call id. Must not contain the key delimiter.
    pub id: String,
    #[serde(rename = "type")]
    pub fragment_type: FragmentType,
    /// Opaque record body.
    pub contents: String,
}

impl CallFragment {
    pub fn new(
        timestamp: impl Into<String>,
        id: impl Into<String>,
        fragment_type: FragmentType,
        contents: impl Into<String>,
    ) -> Self {
        Self {
            timestamp: timestamp.into(),
            id: id.into(),
            fragment_type,
            contents: contents.into(),
        }
    }

    /// The identity part of this fragment.
    pub fn key(&self) -> FragmentKey {
        FragmentKey::new(self.timestamp.clone(), self.id.clone(), self.fragment_type)
    }

    /// Column key this fragment is stored under.
    pub fn column_key(&self) -> String {
        crate::codec::encode_column_key(self)
    }

    /// Check the timestamp format and the id alphabet.
    ///
    /// Nothing in the journal calls this implicitly: a fragment that fails
    /// it can still be written, it just cannot be read back.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_timestamp(&self.timestamp)?;
        if self.id.contains(KEY_DELIMITER) {
            return Err(ValidationError::IdContainsDelimiter {
                id: self.id.clone(),
                delimiter: KEY_DELIMITER,
            });
        }
        Ok(())
    }

    /// Whether this fragment started strictly before `cutoff`.
    pub fn is_before(&self, cutoff: &str) -> bool {
        self.timestamp.as_str() < cutoff
    }
}

/// Render a time as a fragment timestamp.
pub fn format_timestamp(time: DateTime<Utc>) -> String {
    time.format(TIMESTAMP_FORMAT).to_string()
}

/// Check that `value` is a well-formed `YYYYMMDDHHMMSS` timestamp.
pub fn validate_timestamp(value: &str) -> Result<(), ValidationError> {
    if value.len() != TIMESTAMP_WIDTH || !value.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ValidationError::InvalidTimestamp {
            value: value.to_string(),
            reason: format!("expected {} digits", TIMESTAMP_WIDTH),
        });
    }
    NaiveDateTime::parse_from_str(value, TIMESTAMP_FORMAT).map_err(|e| {
        ValidationError::InvalidTimestamp {
            value: value.to_string(),
            reason: e.to_string(),
        }
    })?;
    Ok(())
}

/// Generate a call id: fixed-width lowercase hex, time-ordered, delimiter-free.
pub fn new_call_id() -> String {
    Uuid::now_v7().simple().to_string()
}

/// Fragments from `fragments` that started before `cutoff`.
///
/// Helper for building a trim set from a history the caller has just read;
/// choosing the cutoff is up to the caller.
pub fn fragments_before(fragments: &[CallFragment], cutoff: &str) -> Vec<CallFragment> {
    fragments
        .iter()
        .filter(|f| f.is_before(cutoff))
        .cloned()
        .collect()
}

// ============================================================================
// TESTS
// ============================================================================
