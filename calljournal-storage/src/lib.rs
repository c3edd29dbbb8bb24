//! CALLJOURNAL Storage - Call List Store
//!
//! Reads and writes call-history fragments in a wide-column store. Each
//! identity (IMPU) owns one row of the `call_lists` table; each fragment is
//! one column whose name encodes timestamp, call id and fragment type.
//!
//! ```text
//! CallListStore ──► Operation::perform ──► ColumnStore
//!        │                  │
//!        │                  └──► TraceSink (started / ok)
//!        └── on StoreFailure ──► Operation::handle_failure (failed)
//! ```
//!
//! Every finished operation is counted in the store's [`JournalMetrics`].
//!
//! The production column store client lives outside this crate;
//! [`MockColumnStore`] stands in for it in tests and the smoke binary.

pub mod async_journal;
pub mod column;
pub mod metrics;
pub mod mock;
pub mod operations;
pub mod store;

pub use async_journal::AsyncCallJournal;
pub use column::{Column, ColumnStore, RowColumns, StoreFailure};
pub use metrics::JournalMetrics;
pub use mock::{MockColumnStore, StoreCall};
pub use operations::{
    CallListOperation, DeleteOldCallFragments, GetCallFragments, Operation, OperationKind,
    WriteCallFragment,
};
pub use store::{CallListStore, StoreInitError};
