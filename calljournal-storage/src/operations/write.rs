//! Write a new call fragment.

use super::{log_failure, Operation, OperationKind};
use crate::column::{ColumnStore, StoreFailure};
use calljournal_core::schema::{CALL_LIST_TABLE, KEY_DELIMITER};
use calljournal_core::{CallFragment, ResultCode};
use calljournal_events::{ids, Trail};
use std::collections::BTreeMap;

/// Adds one fragment to an identity's partition.
///
/// Writing the same fragment again at the same `cass_timestamp` is an
/// identical overwrite; only a higher timestamp replaces the contents.
#[derive(Debug, Clone)]
pub struct WriteCallFragment {
    impu: String,
    fragment: CallFragment,
    cass_timestamp: i64,
    ttl: i32,
    /// gzip level for the traced contents, `None` to leave them out.
    contents_trace_level: Option<u32>,
}

impl WriteCallFragment {
    /// `ttl` is in seconds; `cass_timestamp` is the store write timestamp.
    pub fn new(impu: impl Into<String>, fragment: CallFragment, cass_timestamp: i64, ttl: i32) -> Self {
        Self {
            impu: impu.into(),
            fragment,
            cass_timestamp,
            ttl,
            contents_trace_level: Some(6),
        }
    }

    /// Choose whether (and how hard) the started event compresses contents.
    pub fn with_contents_trace(mut self, level: Option<u32>) -> Self {
        self.contents_trace_level = level;
        self
    }

    pub fn impu(&self) -> &str {
        &self.impu
    }

    pub fn fragment(&self) -> &CallFragment {
        &self.fragment
    }
}

impl Operation for WriteCallFragment {
    fn kind(&self) -> OperationKind {
        OperationKind::Write
    }

    fn perform(&mut self, store: &dyn ColumnStore, trail: &Trail<'_>) -> Result<(), StoreFailure> {
        tracing::debug!(
            fragment_type = %self.fragment.fragment_type,
            impu = %self.impu,
            "Writing call fragment"
        );

        if self.fragment.id.contains(KEY_DELIMITER) {
            tracing::warn!(
                id = %self.fragment.id,
                impu = %self.impu,
                "Call id contains the key delimiter, fragment will not be readable"
            );
        }

        let mut ev = trail.event(ids::CALL_LIST_WRITE_STARTED);
        ev.add_static_param(self.fragment.fragment_type.code())
            .add_var_param(self.impu.as_str())
            .add_var_param(self.fragment.timestamp.as_str());
        if let Some(level) = self.contents_trace_level {
            ev.add_compressed_param(self.fragment.contents.as_bytes(), level);
        }
        trail.report(ev);

        let mut columns = BTreeMap::new();
        columns.insert(self.fragment.column_key(), self.fragment.contents.clone());

        store.put_columns(
            CALL_LIST_TABLE,
            std::slice::from_ref(&self.impu),
            &columns,
            self.cass_timestamp,
            self.ttl,
        )?;

        trail.report(trail.event(ids::CALL_LIST_WRITE_OK));
        Ok(())
    }

    fn handle_failure(&mut self, status: ResultCode, description: &str, trail: &Trail<'_>) {
        log_failure(self.kind(), &self.impu, status, description, trail);
    }
}
