//! CALLJOURNAL Events - Trace Events and Sinks
//!
//! Every journal operation reports its progress as trace events on the
//! caller's trail:
//!
//! ```text
//! started ──► store call ──► ok
//!                       └──► failed (status, description)
//! ```
//!
//! Exactly one terminal event follows each started event. This crate defines
//! the event ids, the event payload and the sink the events are sent to; the
//! collector behind the sink is out of scope.

mod event;
mod sink;

pub use event::{ids, EventId, TraceEvent, TrailId};
pub use sink::{report_failure, RecordingSink, TeeSink, TraceSink, Trail, TracingSink};
