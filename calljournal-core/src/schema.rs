//! On-disk schema constants.
//!
//! These names are baked into every partition the journal has ever written.
//! Changing any of them orphans existing call history, so they only move
//! together with a data migration.

/// Keyspace the call journal lives in.
pub const KEYSPACE: &str = "memento";

/// Table (column family) holding one partition per subscriber identity.
pub const CALL_LIST_TABLE: &str = "call_lists";

/// Prefix carried by every call fragment column.
///
/// Other column kinds (e.g. per-identity metadata) can share the partition
/// as long as they use a different prefix.
pub const CALL_COLUMN_PREFIX: &str = "call_";

/// Separator between the timestamp, id and type tokens of a column key.
pub const KEY_DELIMITER: char = '_';

/// Column key token for a `Begin` fragment.
pub const TOKEN_BEGIN: &str = "begin";

/// Column key token for an `End` fragment.
pub const TOKEN_END: &str = "end";

/// Column key token for a `Rejected` fragment.
pub const TOKEN_REJECTED: &str = "rejected";

/// Width of a fragment timestamp (`YYYYMMDDHHMMSS`).
pub const TIMESTAMP_WIDTH: usize = 14;

/// chrono format string producing [`TIMESTAMP_WIDTH`] digits.
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M%S";
