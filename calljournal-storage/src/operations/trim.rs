//! Delete old call fragments for an identity.

use super::{log_failure, Operation, OperationKind};
use crate::column::{ColumnStore, RowColumns, StoreFailure};
use calljournal_core::schema::CALL_LIST_TABLE;
use calljournal_core::{CallFragment, ResultCode};
use calljournal_events::{ids, Trail};
use std::collections::BTreeMap;

/// Tombstones an explicit set of fragments in one batch.
///
/// The caller names complete fragments (typically from a read it just did)
/// and picks a `cass_timestamp` at or after the write timestamps it means to
/// supersede; an older delete loses to the write.
#[derive(Debug, Clone)]
pub struct DeleteOldCallFragments {
    impu: String,
    fragments: Vec<CallFragment>,
    cass_timestamp: i64,
}

impl DeleteOldCallFragments {
    pub fn new(impu: impl Into<String>, fragments: Vec<CallFragment>, cass_timestamp: i64) -> Self {
        Self {
            impu: impu.into(),
            fragments,
            cass_timestamp,
        }
    }

    pub fn impu(&self) -> &str {
        &self.impu
    }

    pub fn fragments(&self) -> &[CallFragment] {
        &self.fragments
    }

    /// The single batch covering every fragment.
    fn rows(&self) -> Vec<RowColumns> {
        let columns: BTreeMap<String, String> = self
            .fragments
            .iter()
            .map(|f| (f.column_key(), String::new()))
            .collect();
        vec![RowColumns::new(CALL_LIST_TABLE, self.impu.as_str(), columns)]
    }
}

impl Operation for DeleteOldCallFragments {
    fn kind(&self) -> OperationKind {
        OperationKind::DeleteSet
    }

    fn perform(&mut self, store: &dyn ColumnStore, trail: &Trail<'_>) -> Result<(), StoreFailure> {
        tracing::debug!(
            count = self.fragments.len(),
            impu = %self.impu,
            "Deleting call fragments"
        );

        let mut ev = trail.event(ids::CALL_LIST_TRIM_STARTED);
        ev.add_var_param(self.impu.as_str())
            .add_static_param(self.fragments.len() as u64);
        trail.report(ev);

        if self.fragments.is_empty() {
            tracing::debug!(impu = %self.impu, "Nothing to delete");
        } else {
            store.batched_delete(&self.rows(), self.cass_timestamp)?;
            tracing::debug!("Successfully deleted call fragments");
        }

        trail.report(trail.event(ids::CALL_LIST_TRIM_OK));
        Ok(())
    }

    fn handle_failure(&mut self, status: ResultCode, description: &str, trail: &Trail<'_>) {
        log_failure(self.kind(), &self.impu, status, description, trail);
    }
}
