//! Trace event identifiers and payloads.

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::{Read, Write};

/// Correlates every event emitted on behalf of one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TrailId(pub u64);

impl fmt::Display for TrailId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

/// Identifies what happened. The collector's resource bundle keys off these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EventId(pub u32);

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#08x}", self.0)
    }
}

/// Event ids for call list store operations.
///
/// Each operation kind owns a started/ok/failed triple; no id is shared
/// between kinds or phases.
pub mod ids {
    use super::EventId;

    pub const CALL_LIST_EVENT_BASE: u32 = 0x0086_0000;

    pub const CALL_LIST_WRITE_STARTED: EventId = EventId(CALL_LIST_EVENT_BASE + 0x200);
    pub const CALL_LIST_WRITE_OK: EventId = EventId(CALL_LIST_EVENT_BASE + 0x201);
    pub const CALL_LIST_WRITE_FAILED: EventId = EventId(CALL_LIST_EVENT_BASE + 0x202);
    pub const CALL_LIST_READ_STARTED: EventId = EventId(CALL_LIST_EVENT_BASE + 0x203);
    pub const CALL_LIST_READ_OK: EventId = EventId(CALL_LIST_EVENT_BASE + 0x204);
    pub const CALL_LIST_READ_FAILED: EventId = EventId(CALL_LIST_EVENT_BASE + 0x205);
    pub const CALL_LIST_TRIM_STARTED: EventId = EventId(CALL_LIST_EVENT_BASE + 0x206);
    pub const CALL_LIST_TRIM_OK: EventId = EventId(CALL_LIST_EVENT_BASE + 0x207);
    pub const CALL_LIST_TRIM_FAILED: EventId = EventId(CALL_LIST_EVENT_BASE + 0x208);

    /// Every started event.
    pub const STARTED: [EventId; 3] = [
        CALL_LIST_WRITE_STARTED,
        CALL_LIST_READ_STARTED,
        CALL_LIST_TRIM_STARTED,
    ];

    /// Every terminal (ok or failed) event.
    pub const TERMINAL: [EventId; 6] = [
        CALL_LIST_WRITE_OK,
        CALL_LIST_WRITE_FAILED,
        CALL_LIST_READ_OK,
        CALL_LIST_READ_FAILED,
        CALL_LIST_TRIM_OK,
        CALL_LIST_TRIM_FAILED,
    ];
}

/// A single trace record.
///
/// Parameters are positional: the collector's resource bundle decides how
/// static (numeric), var (string) and compressed (gzip) params render.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceEvent {
    pub trail: TrailId,
    pub event_id: EventId,
    pub instance_id: u32,
    pub static_params: Vec<u64>,
    pub var_params: Vec<String>,
    pub compressed_params: Vec<Vec<u8>>,
}

impl TraceEvent {
    pub fn new(trail: TrailId, event_id: EventId) -> Self {
        Self::with_instance(trail, event_id, 0)
    }

    pub fn with_instance(trail: TrailId, event_id: EventId, instance_id: u32) -> Self {
        Self {
            trail,
            event_id,
            instance_id,
            static_params: Vec::new(),
            var_params: Vec::new(),
            compressed_params: Vec::new(),
        }
    }

    pub fn add_static_param(&mut self, value: u64) -> &mut Self {
        self.static_params.push(value);
        self
    }

    pub fn add_var_param(&mut self, value: impl Into<String>) -> &mut Self {
        self.var_params.push(value.into());
        self
    }

    /// Gzip `value` at `level` (0-9, clamped) and append it.
    pub fn add_compressed_param(&mut self, value: &[u8], level: u32) -> &mut Self {
        self.compressed_params.push(compress(value, level));
        self
    }

    /// Inflate the compressed param at `index`.
    pub fn decompressed_param(&self, index: usize) -> Option<Vec<u8>> {
        self.compressed_params
            .get(index)
            .and_then(|data| decompress(data).ok())
    }
}

fn compress(value: &[u8], level: u32) -> Vec<u8> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::new(level.min(9)));
    // Writing into a Vec cannot fail; fall back to an empty param if it ever does.
    if encoder.write_all(value).is_err() {
        return Vec::new();
    }
    encoder.finish().unwrap_or_default()
}

fn decompress(data: &[u8]) -> std::io::Result<Vec<u8>> {
    let mut decoder = GzDecoder::new(data);
    let mut out = Vec::new();
    decoder.read_to_end(&mut out)?;
    Ok(out)
}

// ============================================================================
// TESTS
// ============================================================================
