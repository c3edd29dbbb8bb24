//! Get all the call fragments for an identity.

use super::{log_failure, Operation, OperationKind};
use crate::column::{ColumnStore, StoreFailure};
use crate::metrics::JournalMetrics;
use calljournal_core::schema::{CALL_COLUMN_PREFIX, CALL_LIST_TABLE};
use calljournal_core::{decode_column, CallFragment, ResultCode};
use calljournal_events::{ids, Trail};

/// Reads an identity's whole call history.
///
/// Fragments come back in the store's column order: by timestamp, then id,
/// then type token. Columns whose names do not decode are skipped with a
/// warning. An identity with no call columns at all is `NotFound`.
#[derive(Debug, Clone)]
pub struct GetCallFragments {
    impu: String,
    fragments: Vec<CallFragment>,
    skipped: usize,
}

impl GetCallFragments {
    pub fn new(impu: impl Into<String>) -> Self {
        Self {
            impu: impu.into(),
            fragments: Vec::new(),
            skipped: 0,
        }
    }

    pub fn impu(&self) -> &str {
        &self.impu
    }

    /// The fetched fragments, ordered by timestamp, then id, then type.
    pub fn fragments(&self) -> &[CallFragment] {
        &self.fragments
    }

    pub fn into_fragments(self) -> Vec<CallFragment> {
        self.fragments
    }

    /// Columns that carried the call prefix but did not decode.
    pub fn skipped_columns(&self) -> usize {
        self.skipped
    }

    /// Total size of the fetched contents.
    pub fn contents_bytes(&self) -> usize {
        self.fragments.iter().map(|f| f.contents.len()).sum()
    }
}

impl Operation for GetCallFragments {
    fn kind(&self) -> OperationKind {
        OperationKind::ReadAll
    }

    fn perform(&mut self, store: &dyn ColumnStore, trail: &Trail<'_>) -> Result<(), StoreFailure> {
        tracing::debug!(impu = %self.impu, "Get call fragments");
        self.fragments.clear();
        self.skipped = 0;

        let mut ev = trail.event(ids::CALL_LIST_READ_STARTED);
        ev.add_var_param(self.impu.as_str());
        trail.report(ev);

        let columns = store.get_columns_with_prefix(CALL_LIST_TABLE, &self.impu, CALL_COLUMN_PREFIX)?;

        let (Some(first), Some(last)) = (columns.first(), columns.last()) else {
            return Err(StoreFailure::RowNotFound {
                table: CALL_LIST_TABLE.to_string(),
                key: self.impu.clone(),
            });
        };

        for column in &columns {
            match decode_column(&column.name, &column.value) {
                Ok(fragment) => self.fragments.push(fragment),
                Err(e) => {
                    tracing::warn!(column = %column.name, error = %e, "Invalid column name");
                    self.skipped += 1;
                }
            }
        }

        tracing::debug!(
            count = self.fragments.len(),
            skipped = self.skipped,
            "Retrieved call fragments from the store"
        );

        let mut ev = trail.event(ids::CALL_LIST_READ_OK);
        ev.add_static_param(self.fragments.len() as u64)
            .add_var_param(first.name.as_str())
            .add_var_param(last.name.as_str());
        trail.report(ev);

        Ok(())
    }

    fn handle_failure(&mut self, status: ResultCode, description: &str, trail: &Trail<'_>) {
        log_failure(self.kind(), &self.impu, status, description, trail);
    }

    fn record_stats(&self, metrics: &JournalMetrics) {
        metrics.record_read(self.fragments.len(), self.contents_bytes());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MockColumnStore, StoreCall};
    use calljournal_core::FragmentType;
    use calljournal_events::{RecordingSink, TrailId};

    #[test]
    fn test_scans_call_prefix_of_call_lists() {
        let store = MockColumnStore::new();
        store.seed_columns("call_lists", "kermit", [("call_20140101130100_0_begin", "b")], 1);
        let sink = RecordingSink::new();
        let trail = Trail::new(TrailId(1), &sink);

        let mut op = GetCallFragments::new("kermit");
        op.perform(&store, &trail).unwrap();

        assert_eq!(
            store.calls(),
            vec![StoreCall::GetWithPrefix {
                table: "call_lists".to_string(),
                key: "kermit".to_string(),
                prefix: "call_".to_string(),
            }]
        );
        assert_eq!(op.fragments().len(), 1);
    }

    #[test]
    fn test_empty_scan_is_row_not_found() {
        let store = MockColumnStore::new();
        let sink = RecordingSink::new();
        let trail = Trail::new(TrailId(1), &sink);

        let mut op = GetCallFragments::new("kermit");
        let err = op.perform(&store, &trail).unwrap_err();
        assert_eq!(err.result_code(), ResultCode::NotFound);
        assert_eq!(sink.event_ids(), vec![ids::CALL_LIST_READ_STARTED]);
    }

    #[test]
    fn test_malformed_columns_are_skipped() {
        let store = MockColumnStore::new();
        store.seed_columns(
            "call_lists",
            "kermit",
            [
                ("call_20140101130100_0000_begin", "<begin>"),
                ("call_20140101130100_0000_paused", "<unknown type>"),
                ("call_20140101130100_bad_id_end", "<too many tokens>"),
                ("call_20140101130200_0001_end", "<end>"),
            ],
            1,
        );
        let sink = RecordingSink::new();
        let trail = Trail::new(TrailId(1), &sink);

        let mut op = GetCallFragments::new("kermit");
        op.perform(&store, &trail).unwrap();

        assert_eq!(op.skipped_columns(), 2);
        let fragments = op.fragments();
        assert_eq!(fragments.len(), 2);
        assert_eq!(fragments[0].fragment_type, FragmentType::Begin);
        assert_eq!(fragments[1].fragment_type, FragmentType::End);

        // The ok event counts decoded fragments but names the raw first/last
        // columns the scan returned.
        let ok = &sink.find(ids::CALL_LIST_READ_OK)[0];
        assert_eq!(ok.static_params, vec![2]);
        assert_eq!(
            ok.var_params,
            vec![
                "call_20140101130100_0000_begin".to_string(),
                "call_20140101130200_0001_end".to_string()
            ]
        );
    }

    #[test]
    fn test_perform_again_replaces_previous_result() {
        let store = MockColumnStore::new();
        store.seed_columns(
            "call_lists",
            "kermit",
            [("call_20140101130100_0000_begin", "<b>"), ("call_bad", "x")],
            1,
        );
        let sink = RecordingSink::new();
        let trail = Trail::new(TrailId(1), &sink);

        let mut op = GetCallFragments::new("kermit");
        op.perform(&store, &trail).unwrap();
        op.perform(&store, &trail).unwrap();

        assert_eq!(op.fragments().len(), 1);
        assert_eq!(op.skipped_columns(), 1);
        assert_eq!(op.contents_bytes(), 3);
    }

    #[test]
    fn test_all_columns_malformed_is_empty_success() {
        let store = MockColumnStore::new();
        store.seed_columns("call_lists", "kermit", [("call_garbage", "x")], 1);
        let sink = RecordingSink::new();
        let trail = Trail::new(TrailId(1), &sink);

        let mut op = GetCallFragments::new("kermit");
        op.perform(&store, &trail).unwrap();

        assert!(op.fragments().is_empty());
        assert_eq!(op.skipped_columns(), 1);
        assert!(sink.contains(ids::CALL_LIST_READ_OK));
    }
}
