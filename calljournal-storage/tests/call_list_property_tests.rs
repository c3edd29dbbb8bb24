//! Property-Based Tests for the Call List Store
//!
//! For any set of well-formed fragments written to one identity:
//! - a read returns exactly that set, ordered by (timestamp, id, type)
//! - fragments with an earlier timestamp precede all later ones
//! - deleting a subset leaves exactly the rest
//! - every operation emits one started and one terminal event

use calljournal_core::fragments_before;
use calljournal_storage::{CallListStore, MockColumnStore, StoreFailure};
use calljournal_test_utils::{
    assertions, generators, ids, CallFragment, JournalConfig, RecordingSink, ResultCode, TrailId,
};
use proptest::prelude::*;
use std::sync::Arc;

// ============================================================================
// TEST CONFIGURATION
// ============================================================================

const TRAIL: TrailId = TrailId(0x123456);

fn new_store() -> (CallListStore, Arc<MockColumnStore>, Arc<RecordingSink>) {
    let client = Arc::new(MockColumnStore::new());
    let sink = Arc::new(RecordingSink::new());
    let store = CallListStore::new(client.clone(), sink.clone(), JournalConfig::default())
        .expect("default config is valid");
    (store, client, sink)
}

fn write_all(store: &CallListStore, impu: &str, fragments: &[CallFragment]) -> Result<(), TestCaseError> {
    for (i, fragment) in fragments.iter().enumerate() {
        store
            .write_call_fragment_sync(impu, fragment.clone(), i as i64 + 1, 0, TRAIL)
            .map_err(|e| TestCaseError::fail(format!("write failed: {}", e)))?;
    }
    Ok(())
}

/// Strategy for a failure the store might raise.
fn store_failure_strategy() -> impl Strategy<Value = (StoreFailure, ResultCode)> {
    prop_oneof![
        Just((StoreFailure::InvalidRequest("rejected".into()), ResultCode::InvalidRequest)),
        Just((
            StoreFailure::RowNotFound {
                table: "call_lists".into(),
                key: "kermit".into()
            },
            ResultCode::NotFound
        )),
        Just((StoreFailure::Unavailable("no replicas".into()), ResultCode::Unavailable)),
        Just((StoreFailure::Connection("reset".into()), ResultCode::ConnectionError)),
        Just((StoreFailure::Unknown("boom".into()), ResultCode::Unknown)),
    ]
}

// ============================================================================
// PROPERTY TESTS
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn prop_write_then_read_returns_sorted_set(
        impu in generators::arb_impu(),
        fragments in generators::arb_fragment_set(24),
    ) {
        prop_assume!(!fragments.is_empty());
        let (store, _client, _sink) = new_store();

        // Write in reverse to show order comes from the keys, not the writes.
        let mut reversed = fragments.clone();
        reversed.reverse();
        write_all(&store, &impu, &reversed)?;

        let read = store.get_call_fragments_sync(&impu, TRAIL)
            .map_err(|e| TestCaseError::fail(format!("read failed: {}", e)))?;
        prop_assert_eq!(read, fragments);
    }

    #[test]
    fn prop_dense_sets_keep_tuple_order(fragments in generators::arb_dense_fragment_set(30)) {
        prop_assume!(!fragments.is_empty());
        let (store, _client, _sink) = new_store();
        write_all(&store, "kermit", &fragments)?;

        let read = store.get_call_fragments_sync("kermit", TRAIL)
            .map_err(|e| TestCaseError::fail(format!("read failed: {}", e)))?;
        for pair in read.windows(2) {
            let a = (&pair[0].timestamp, &pair[0].id, pair[0].fragment_type.as_str());
            let b = (&pair[1].timestamp, &pair[1].id, pair[1].fragment_type.as_str());
            prop_assert!(a < b, "{:?} should precede {:?}", a, b);
        }
        prop_assert_eq!(read, fragments);
    }

    #[test]
    fn prop_earlier_timestamps_come_first(fragments in generators::arb_fragment_set(24)) {
        prop_assume!(fragments.len() >= 2);
        let (store, _client, _sink) = new_store();
        write_all(&store, "kermit", &fragments)?;

        let read = store.get_call_fragments_sync("kermit", TRAIL)
            .map_err(|e| TestCaseError::fail(format!("read failed: {}", e)))?;
        for (i, earlier) in read.iter().enumerate() {
            for later in &read[i + 1..] {
                prop_assert!(earlier.timestamp <= later.timestamp);
            }
        }
    }

    #[test]
    fn prop_delete_removes_exactly_the_subset(
        fragments in generators::arb_fragment_set(24),
        mask in prop::collection::vec(any::<bool>(), 24),
    ) {
        prop_assume!(!fragments.is_empty());
        let (store, _client, _sink) = new_store();
        write_all(&store, "kermit", &fragments)?;

        let (doomed, kept): (Vec<_>, Vec<_>) = fragments
            .iter()
            .cloned()
            .enumerate()
            .partition(|(i, _)| mask[*i]);
        let doomed: Vec<CallFragment> = doomed.into_iter().map(|(_, f)| f).collect();
        let kept: Vec<CallFragment> = kept.into_iter().map(|(_, f)| f).collect();

        store.delete_old_call_fragments_sync("kermit", doomed, 1_000, TRAIL)
            .map_err(|e| TestCaseError::fail(format!("delete failed: {}", e)))?;

        let result = store.get_call_fragments_sync("kermit", TRAIL);
        if kept.is_empty() {
            prop_assert_eq!(ResultCode::of(&result), ResultCode::NotFound);
        } else {
            prop_assert_eq!(result.ok(), Some(kept));
        }
    }

    #[test]
    fn prop_trim_before_cutoff(
        fragments in generators::arb_fragment_set(24),
        cutoff in generators::arb_timestamp(),
    ) {
        prop_assume!(!fragments.is_empty());
        let (store, _client, _sink) = new_store();
        write_all(&store, "kermit", &fragments)?;

        let history = store.get_call_fragments_sync("kermit", TRAIL)
            .map_err(|e| TestCaseError::fail(format!("read failed: {}", e)))?;
        let old = fragments_before(&history, &cutoff);
        store.delete_old_call_fragments_sync("kermit", old, 1_000, TRAIL)
            .map_err(|e| TestCaseError::fail(format!("delete failed: {}", e)))?;

        let remaining = store.get_call_fragments_sync("kermit", TRAIL).unwrap_or_default();
        prop_assert!(remaining.iter().all(|f| f.timestamp >= cutoff));
        let expected: Vec<CallFragment> =
            fragments.into_iter().filter(|f| f.timestamp >= cutoff).collect();
        prop_assert_eq!(remaining, expected);
    }

    #[test]
    fn prop_failures_emit_one_failed_event(
        (failure, expected) in store_failure_strategy(),
        fragment in generators::arb_fragment(),
        op in 0u8..3,
    ) {
        let (store, client, sink) = new_store();
        client.fail_next(failure);

        let (result, started, failed) = match op {
            0 => (
                store.write_call_fragment_sync("kermit", fragment, 1, 0, TRAIL),
                ids::CALL_LIST_WRITE_STARTED,
                ids::CALL_LIST_WRITE_FAILED,
            ),
            1 => (
                store.get_call_fragments_sync("kermit", TRAIL).map(|_| ()),
                ids::CALL_LIST_READ_STARTED,
                ids::CALL_LIST_READ_FAILED,
            ),
            _ => (
                store.delete_old_call_fragments_sync("kermit", vec![fragment], 1, TRAIL),
                ids::CALL_LIST_TRIM_STARTED,
                ids::CALL_LIST_TRIM_FAILED,
            ),
        };

        prop_assert_eq!(ResultCode::of(&result), expected);
        prop_assert_eq!(sink.event_ids(), vec![started, failed]);
        let event = &sink.find(failed)[0];
        prop_assert_eq!(&event.static_params, &vec![expected.code()]);
        prop_assert_eq!(event.var_params.len(), 1);
    }

    #[test]
    fn prop_every_operation_is_paired(
        fragments in generators::arb_fragment_set(8),
        reads in 1usize..4,
    ) {
        let (store, _client, sink) = new_store();
        write_all(&store, "kermit", &fragments)?;
        for _ in 0..reads {
            let _ = store.get_call_fragments_sync("kermit", TRAIL);
        }
        let _ = store.delete_old_call_fragments_sync("kermit", fragments.clone(), 1_000, TRAIL);

        let events = sink.events();
        assertions::assert_paired_events(&events);
        assertions::assert_balanced_events(&events, fragments.len() + reads + 1);
        prop_assert!(events.iter().all(|e| e.trail == TRAIL));
    }
}
