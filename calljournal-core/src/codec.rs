//! Column key codec.
//!
//! A fragment is stored in its identity's partition under
//!
//! ```text
//! call_<timestamp>_<id>_<type>
//! call_20140722120000_12345_begin
//! ```
//!
//! with the fragment contents as the column value. The store keeps columns in
//! byte order of their keys, so a prefix scan returns fragments ordered by
//! timestamp, then id, then type token.

use crate::error::DecodeError;
use crate::fragment::{CallFragment, FragmentKey, FragmentType};
use crate::schema::{CALL_COLUMN_PREFIX, KEY_DELIMITER};

/// Column key for `fragment`.
pub fn encode_column_key(fragment: &CallFragment) -> String {
    encode_key_parts(&fragment.timestamp, &fragment.id, fragment.fragment_type)
}

/// Column key for a [`FragmentKey`].
pub fn encode_fragment_key(key: &FragmentKey) -> String {
    encode_key_parts(&key.timestamp, &key.id, key.fragment_type)
}

fn encode_key_parts(timestamp: &str, id: &str, fragment_type: FragmentType) -> String {
    let token = fragment_type.as_str();
    let mut key =
        String::with_capacity(CALL_COLUMN_PREFIX.len() + timestamp.len() + id.len() + token.len() + 2);
    key.push_str(CALL_COLUMN_PREFIX);
    key.push_str(timestamp);
    key.push(KEY_DELIMITER);
    key.push_str(id);
    key.push(KEY_DELIMITER);
    key.push_str(token);
    key
}

/// Parse a column key back into the fragment identity it encodes.
pub fn decode_column_key(key: &str) -> Result<FragmentKey, DecodeError> {
    let rest = key
        .strip_prefix(CALL_COLUMN_PREFIX)
        .ok_or_else(|| DecodeError::MissingPrefix {
            key: key.to_string(),
            prefix: CALL_COLUMN_PREFIX,
        })?;

    let tokens: Vec<&str> = rest.split(KEY_DELIMITER).collect();
    let [timestamp, id, token] = tokens.as_slice() else {
        return Err(DecodeError::WrongTokenCount {
            key: key.to_string(),
            found: tokens.len(),
        });
    };

    let fragment_type = FragmentType::from_token(token).ok_or_else(|| DecodeError::UnknownType {
        key: key.to_string(),
        token: token.to_string(),
    })?;

    Ok(FragmentKey::new(*timestamp, *id, fragment_type))
}

/// Rebuild a whole fragment from a stored column.
pub fn decode_column(key: &str, value: &str) -> Result<CallFragment, DecodeError> {
    decode_column_key(key).map(|k| k.into_fragment(value))
}

// ============================================================================
// TESTS
// ============================================================================


// ============================================================================
// PROPERTY-BASED TESTS
// ============================================================================
