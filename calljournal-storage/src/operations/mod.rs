//! Call list store operations.
//!
//! Each operation is a single-use unit of work. An executor calls
//! [`Operation::perform`] exactly once; if that raises a [`StoreFailure`] the
//! executor maps it to a [`ResultCode`] and calls
//! [`Operation::handle_failure`] exactly once. Between them the operation
//! emits exactly one started event and exactly one of ok/failed.

mod read;
mod trim;
mod write;

pub use read::GetCallFragments;
pub use trim::DeleteOldCallFragments;
pub use write::WriteCallFragment;

use crate::column::{ColumnStore, StoreFailure};
use crate::metrics::JournalMetrics;
use calljournal_core::{CallFragment, ResultCode};
use calljournal_events::{report_failure, EventId, Trail};
use std::fmt;

/// The two capabilities every operation offers its executor.
pub trait Operation: Send {
    fn kind(&self) -> OperationKind;

    /// Talk to the store. Emits the started event and, on success, the ok
    /// event. Store failures are returned, not handled.
    fn perform(&mut self, store: &dyn ColumnStore, trail: &Trail<'_>) -> Result<(), StoreFailure>;

    /// Called once after `perform` failed, with the mapped status.
    fn handle_failure(&mut self, status: ResultCode, description: &str, trail: &Trail<'_>);

    /// Record what a successful `perform` produced.
    fn record_stats(&self, _metrics: &JournalMetrics) {}
}

/// Which operation an instance is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    Write,
    ReadAll,
    DeleteSet,
}

impl OperationKind {
    /// Event reported when an operation of this kind fails.
    pub fn failed_event(&self) -> EventId {
        use calljournal_events::ids;
        match self {
            OperationKind::Write => ids::CALL_LIST_WRITE_FAILED,
            OperationKind::ReadAll => ids::CALL_LIST_READ_FAILED,
            OperationKind::DeleteSet => ids::CALL_LIST_TRIM_FAILED,
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = match self {
            OperationKind::Write => "write",
            OperationKind::ReadAll => "read",
            OperationKind::DeleteSet => "trim",
        };
        write!(f, "{}", value)
    }
}

/// Shared failure handling: warn, then emit the kind's failed event.
pub(crate) fn log_failure(
    kind: OperationKind,
    impu: &str,
    status: ResultCode,
    description: &str,
    trail: &Trail<'_>,
) {
    tracing::warn!(
        operation = %kind,
        impu = %impu,
        rc = %status,
        "Call list {} failed for IMPU {} because '{}'",
        kind,
        impu,
        description
    );
    report_failure(trail, kind.failed_event(), status, description);
}

/// Any of the three operations, for executors that hold them by value.
#[derive(Debug, Clone)]
pub enum CallListOperation {
    Write(WriteCallFragment),
    ReadAll(GetCallFragments),
    DeleteSet(DeleteOldCallFragments),
}

impl CallListOperation {
    /// Fragments retrieved by a read. `None` for other kinds.
    pub fn into_fragments(self) -> Option<Vec<CallFragment>> {
        match self {
            CallListOperation::ReadAll(op) => Some(op.into_fragments()),
            _ => None,
        }
    }
}

impl Operation for CallListOperation {
    fn kind(&self) -> OperationKind {
        match self {
            CallListOperation::Write(op) => op.kind(),
            CallListOperation::ReadAll(op) => op.kind(),
            CallListOperation::DeleteSet(op) => op.kind(),
        }
    }

    fn perform(&mut self, store: &dyn ColumnStore, trail: &Trail<'_>) -> Result<(), StoreFailure> {
        match self {
            CallListOperation::Write(op) => op.perform(store, trail),
            CallListOperation::ReadAll(op) => op.perform(store, trail),
            CallListOperation::DeleteSet(op) => op.perform(store, trail),
        }
    }

    fn handle_failure(&mut self, status: ResultCode, description: &str, trail: &Trail<'_>) {
        match self {
            CallListOperation::Write(op) => op.handle_failure(status, description, trail),
            CallListOperation::ReadAll(op) => op.handle_failure(status, description, trail),
            CallListOperation::DeleteSet(op) => op.handle_failure(status, description, trail),
        }
    }

    fn record_stats(&self, metrics: &JournalMetrics) {
        match self {
            CallListOperation::Write(op) => op.record_stats(metrics),
            CallListOperation::ReadAll(op) => op.record_stats(metrics),
            CallListOperation::DeleteSet(op) => op.record_stats(metrics),
        }
    }
}

impl From<WriteCallFragment> for CallListOperation {
    fn from(op: WriteCallFragment) -> Self {
        CallListOperation::Write(op)
    }
}

impl From<GetCallFragments> for CallListOperation {
    fn from(op: GetCallFragments) -> Self {
        CallListOperation::ReadAll(op)
    }
}

impl From<DeleteOldCallFragments> for CallListOperation {
    fn from(op: DeleteOldCallFragments) -> Self {
        CallListOperation::DeleteSet(op)
    }
}
