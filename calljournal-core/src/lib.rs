//! CALLJOURNAL Core - Call Fragment Types
//!
//! Value types shared by every journal crate: the call fragment, the column
//! key codec that maps fragments onto sortable column names, result codes and
//! configuration. No I/O happens here.

pub mod codec;
pub mod config;
pub mod error;
pub mod fragment;
pub mod schema;

pub use codec::{decode_column, decode_column_key, encode_column_key, encode_fragment_key};
pub use config::JournalConfig;
pub use error::{ConfigError, DecodeError, JournalError, JournalResult, ResultCode, ValidationError};
pub use fragment::{
    format_timestamp, fragments_before, new_call_id, validate_timestamp, CallFragment,
    FragmentKey, FragmentType,
};
