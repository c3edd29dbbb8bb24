//! Async call journal facade.
//!
//! Column store calls block, so each operation runs on tokio's blocking pool
//! and the finished operation is handed back to the caller.

use crate::operations::CallListOperation;
use crate::store::CallListStore;
use ::async_trait::async_trait;
use calljournal_core::{CallFragment, JournalError, JournalResult, ResultCode};
use calljournal_events::TrailId;
use std::sync::Arc;

/// Async counterpart of the synchronous [`CallListStore`] calls.
#[async_trait]
pub trait AsyncCallJournal: Send + Sync {
    /// Run any operation to completion and return it, so reads can be
    /// inspected afterwards.
    async fn execute(&self, op: CallListOperation, trail: TrailId) -> JournalResult<CallListOperation>;

    /// Write one fragment.
    async fn write_call_fragment(
        &self,
        impu: &str,
        fragment: CallFragment,
        cass_timestamp: i64,
        ttl: i32,
        trail: TrailId,
    ) -> JournalResult<()>;

    /// Read the identity's full history.
    async fn get_call_fragments(&self, impu: &str, trail: TrailId) -> JournalResult<Vec<CallFragment>>;

    /// Delete an explicit set of fragments.
    async fn delete_old_call_fragments(
        &self,
        impu: &str,
        fragments: Vec<CallFragment>,
        cass_timestamp: i64,
        trail: TrailId,
    ) -> JournalResult<()>;
}

#[async_trait]
impl AsyncCallJournal for Arc<CallListStore> {
    async fn execute(&self, op: CallListOperation, trail: TrailId) -> JournalResult<CallListOperation> {
        let store = Arc::clone(self);
        tokio::task::spawn_blocking(move || {
            let mut op = op;
            store.do_sync(&mut op, trail).map(|()| op)
        })
        .await
        .map_err(|e| JournalError::new(ResultCode::Unknown, format!("operation task failed: {}", e)))?
    }

    async fn write_call_fragment(
        &self,
        impu: &str,
        fragment: CallFragment,
        cass_timestamp: i64,
        ttl: i32,
        trail: TrailId,
    ) -> JournalResult<()> {
        let op = self.new_write_call_fragment_op(impu, fragment, cass_timestamp, ttl);
        self.execute(op.into(), trail).await.map(|_| ())
    }

    async fn get_call_fragments(&self, impu: &str, trail: TrailId) -> JournalResult<Vec<CallFragment>> {
        let op = self.new_get_call_fragments_op(impu);
        let done = self.execute(op.into(), trail).await?;
        Ok(done.into_fragments().unwrap_or_default())
    }

    async fn delete_old_call_fragments(
        &self,
        impu: &str,
        fragments: Vec<CallFragment>,
        cass_timestamp: i64,
        trail: TrailId,
    ) -> JournalResult<()> {
        let op = self.new_delete_old_call_fragments_op(impu, fragments, cass_timestamp);
        self.execute(op.into(), trail).await.map(|_| ())
    }
}
