//! CALLJOURNAL Test Utilities
//!
//! Shared test infrastructure for the CALLJOURNAL workspace:
//! - Proptest generators for fragments and fragment sets
//! - Test fixtures for the canonical call list scenarios
//! - Custom assertions for results and trace event sequences

// Re-export core types for convenience
pub use calljournal_core::{
    CallFragment, FragmentKey, FragmentType, JournalConfig, JournalError, JournalResult,
    ResultCode,
};
pub use calljournal_events::{ids, EventId, RecordingSink, TraceEvent, TrailId};

use std::collections::BTreeMap;

// ============================================================================
// GENERATORS
// ============================================================================

pub mod generators {
    //! Proptest strategies for call list types.

    use super::*;
    use calljournal_core::format_timestamp;
    use chrono::DateTime;
    use proptest::prelude::*;

    /// 2000-01-01T00:00:00Z.
    const EPOCH_2000: i64 = 946_684_800;
    /// Roughly forty years of seconds.
    const SPAN_SECS: i64 = 40 * 365 * 24 * 3600;

    /// A well-formed `YYYYMMDDHHMMSS` timestamp.
    pub fn arb_timestamp() -> impl Strategy<Value = String> {
        (0..SPAN_SECS).prop_filter_map("timestamp out of range", |offset| {
            DateTime::from_timestamp(EPOCH_2000 + offset, 0).map(format_timestamp)
        })
    }

    /// A fixed-width, delimiter-free call id.
    ///
    /// Fixed width keeps `(timestamp, id, type)` order identical to the byte
    /// order of the encoded column key.
    pub fn arb_call_id() -> impl Strategy<Value = String> {
        "[0-9A-Za-z]{8}"
    }

    pub fn arb_fragment_type() -> impl Strategy<Value = FragmentType> {
        prop_oneof![
            Just(FragmentType::Begin),
            Just(FragmentType::End),
            Just(FragmentType::Rejected),
        ]
    }

    /// Opaque contents, delimiters and markup included.
    pub fn arb_contents() -> impl Strategy<Value = String> {
        "[ -~]{0,64}"
    }

    /// A public identity.
    pub fn arb_impu() -> impl Strategy<Value = String> {
        "sip:[a-z]{1,8}@example\\.com"
    }

    /// A fragment that survives an encode/decode round trip.
    pub fn arb_fragment() -> impl Strategy<Value = CallFragment> {
        (arb_timestamp(), arb_call_id(), arb_fragment_type(), arb_contents())
            .prop_map(|(timestamp, id, fragment_type, contents)| {
                CallFragment::new(timestamp, id, fragment_type, contents)
            })
    }

    /// Fragments with distinct keys, in stored (key) order.
    pub fn arb_fragment_set(max: usize) -> impl Strategy<Value = Vec<CallFragment>> {
        prop::collection::vec(arb_fragment(), 0..=max).prop_map(sort_unique)
    }

    /// Like [`arb_fragment_set`], with every fragment drawn from only a few
    /// timestamps and ids so keys collide and interleave.
    pub fn arb_dense_fragment_set(max: usize) -> impl Strategy<Value = Vec<CallFragment>> {
        let timestamp = prop::sample::select(vec![
            "20140101130100".to_string(),
            "20140101130101".to_string(),
            "20140723150400".to_string(),
        ]);
        let id = prop::sample::select(vec!["0000".to_string(), "0001".to_string(), "a0a0".to_string()]);
        prop::collection::vec((timestamp, id, arb_fragment_type(), arb_contents()), 0..=max).prop_map(
            |raw| {
                sort_unique(
                    raw.into_iter()
                        .map(|(t, i, ty, c)| CallFragment::new(t, i, ty, c))
                        .collect(),
                )
            },
        )
    }
}

/// Keep the last fragment per key and sort by key.
pub fn sort_unique(fragments: Vec<CallFragment>) -> Vec<CallFragment> {
    let by_key: BTreeMap<FragmentKey, CallFragment> =
        fragments.into_iter().map(|f| (f.key(), f)).collect();
    by_key.into_values().collect()
}

// ============================================================================
// TEST FIXTURES
// ============================================================================

pub mod fixtures {
    //! Canonical call list scenarios.

    use super::*;

    /// Identity used throughout the scenarios.
    pub const KERMIT: &str = "kermit";

    pub const FAKE_TRAIL: TrailId = TrailId(0x123456);

    /// The single-fragment write scenario.
    pub fn write_scenario_fragment() -> CallFragment {
        CallFragment::new("20140723150400", "0123456789ABCDEF", FragmentType::Begin, "<xml>")
    }

    /// Column key the write scenario must produce.
    pub const WRITE_SCENARIO_KEY: &str = "call_20140723150400_0123456789ABCDEF_begin";

    /// Raw columns for the three-column read scenario, deliberately unsorted.
    pub fn read_scenario_columns() -> Vec<(&'static str, &'static str)> {
        vec![
            ("call_20140101130101_0001_rejected", "<rejected/>"),
            ("call_20140101130101_0000_begin", "<begin/>"),
            ("call_20140101130101_0000_end", "<end/>"),
        ]
    }

    /// What the read scenario must return, in order.
    pub fn read_scenario_fragments() -> Vec<CallFragment> {
        vec![
            CallFragment::new("20140101130101", "0000", FragmentType::Begin, "<begin/>"),
            CallFragment::new("20140101130101", "0000", FragmentType::End, "<end/>"),
            CallFragment::new("20140101130101", "0001", FragmentType::Rejected, "<rejected/>"),
        ]
    }

    /// The fragment named by the delete scenario.
    pub fn delete_scenario_fragment() -> CallFragment {
        CallFragment::new("20020530093010", "a", FragmentType::Rejected, "")
    }

    pub const DELETE_SCENARIO_KEY: &str = "call_20020530093010_a_rejected";

    /// A begin/end pair for one answered call.
    pub fn answered_call(timestamp: &str, id: &str) -> Vec<CallFragment> {
        vec![
            CallFragment::new(timestamp, id, FragmentType::Begin, format!("<begin id=\"{}\"/>", id)),
            CallFragment::new(timestamp, id, FragmentType::End, format!("<end id=\"{}\"/>", id)),
        ]
    }
}

// ============================================================================
// CUSTOM ASSERTIONS
// ============================================================================

pub mod assertions {
    //! Assertions for journal results and trace event sequences.

    use super::*;

    /// Assert that a JournalResult is Ok.
    #[track_caller]
    pub fn assert_ok<T: std::fmt::Debug>(result: &JournalResult<T>) {
        assert!(result.is_ok(), "Expected Ok, got Err: {:?}", result);
    }

    /// Assert that a JournalResult carries `expected` as its result code.
    #[track_caller]
    pub fn assert_result_code<T: std::fmt::Debug>(result: &JournalResult<T>, expected: ResultCode) {
        assert_eq!(
            ResultCode::of(result),
            expected,
            "Wrong result code for {:?}",
            result
        );
    }

    /// Index of the operation kind an event belongs to (write, read, trim)
    /// and whether it is a started event.
    fn classify(event_id: EventId) -> Option<(u32, bool)> {
        let offset = event_id.0.checked_sub(ids::CALL_LIST_EVENT_BASE + 0x200)?;
        (offset < 9).then_some((offset / 3, offset % 3 == 0))
    }

    /// Assert that `events` is a sequence of (started, terminal) pairs, each
    /// terminal of the same kind as the started event it follows.
    ///
    /// Only valid for operations run one after another.
    #[track_caller]
    pub fn assert_paired_events(events: &[TraceEvent]) {
        assert!(
            events.len() % 2 == 0,
            "Odd number of events: {:?}",
            events.iter().map(|e| e.event_id).collect::<Vec<_>>()
        );
        for pair in events.chunks(2) {
            let started = classify(pair[0].event_id);
            let terminal = classify(pair[1].event_id);
            match (started, terminal) {
                (Some((kind, true)), Some((terminal_kind, false))) => {
                    assert_eq!(
                        kind, terminal_kind,
                        "Started {} followed by terminal {} of another kind",
                        pair[0].event_id, pair[1].event_id
                    );
                }
                _ => panic!(
                    "Expected started then terminal, got {} then {}",
                    pair[0].event_id, pair[1].event_id
                ),
            }
        }
    }

    /// Assert exactly one started and exactly one terminal event per
    /// operation, regardless of interleaving between operations.
    #[track_caller]
    pub fn assert_balanced_events(events: &[TraceEvent], operations: usize) {
        let started = events
            .iter()
            .filter(|e| ids::STARTED.contains(&e.event_id))
            .count();
        let terminal = events
            .iter()
            .filter(|e| ids::TERMINAL.contains(&e.event_id))
            .count();
        assert_eq!(started, operations, "Wrong number of started events");
        assert_eq!(terminal, operations, "Wrong number of terminal events");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_scenario_fixtures_agree() {
        assert_eq!(
            fixtures::write_scenario_fragment().column_key(),
            fixtures::WRITE_SCENARIO_KEY
        );
        assert_eq!(
            fixtures::delete_scenario_fragment().column_key(),
            fixtures::DELETE_SCENARIO_KEY
        );
        let mut columns = fixtures::read_scenario_columns();
        columns.sort();
        let decoded: Vec<CallFragment> = columns
            .into_iter()
            .map(|(k, v)| calljournal_core::decode_column(k, v).unwrap())
            .collect();
        assert_eq!(decoded, fixtures::read_scenario_fragments());
    }

    #[test]
    fn test_paired_events_accepts_sequential_ops() {
        let events = vec![
            TraceEvent::new(fixtures::FAKE_TRAIL, ids::CALL_LIST_WRITE_STARTED),
            TraceEvent::new(fixtures::FAKE_TRAIL, ids::CALL_LIST_WRITE_OK),
            TraceEvent::new(fixtures::FAKE_TRAIL, ids::CALL_LIST_READ_STARTED),
            TraceEvent::new(fixtures::FAKE_TRAIL, ids::CALL_LIST_READ_FAILED),
        ];
        assertions::assert_paired_events(&events);
        assertions::assert_balanced_events(&events, 2);
    }

    #[test]
    #[should_panic]
    fn test_paired_events_rejects_mismatched_kind() {
        let events = vec![
            TraceEvent::new(fixtures::FAKE_TRAIL, ids::CALL_LIST_WRITE_STARTED),
            TraceEvent::new(fixtures::FAKE_TRAIL, ids::CALL_LIST_TRIM_OK),
        ];
        assertions::assert_paired_events(&events);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(50))]

        #[test]
        fn prop_generated_fragments_validate(fragment in generators::arb_fragment()) {
            prop_assert!(fragment.validate().is_ok());
        }

        #[test]
        fn prop_fragment_sets_are_sorted_and_unique(set in generators::arb_fragment_set(20)) {
            for pair in set.windows(2) {
                prop_assert!(pair[0].key() < pair[1].key());
            }
        }
    }
}
