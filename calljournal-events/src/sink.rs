//! Trace sinks.

use crate::event::{EventId, TraceEvent, TrailId};
use calljournal_core::ResultCode;
use std::sync::{Arc, Mutex};

/// Destination for trace events.
///
/// Implementations must not block for long: operations report events inline
/// while holding no locks of their own.
pub trait TraceSink: Send + Sync {
    fn report_event(&self, event: TraceEvent);
}

impl<S: TraceSink + ?Sized> TraceSink for Arc<S> {
    fn report_event(&self, event: TraceEvent) {
        (**self).report_event(event)
    }
}

/// A trail id bound to the sink its events go to.
#[derive(Clone, Copy)]
pub struct Trail<'a> {
    id: TrailId,
    sink: &'a dyn TraceSink,
}

impl<'a> Trail<'a> {
    pub fn new(id: TrailId, sink: &'a dyn TraceSink) -> Self {
        Self { id, sink }
    }

    pub fn id(&self) -> TrailId {
        self.id
    }

    /// Start an event on this trail.
    pub fn event(&self, event_id: EventId) -> TraceEvent {
        TraceEvent::new(self.id, event_id)
    }

    pub fn report(&self, event: TraceEvent) {
        self.sink.report_event(event);
    }
}

impl std::fmt::Debug for Trail<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Trail").field("id", &self.id).finish()
    }
}

/// Emit the standard failure event: status as a static param, description
/// as a var param.
pub fn report_failure(trail: &Trail<'_>, event_id: EventId, status: ResultCode, description: &str) {
    let mut ev = trail.event(event_id);
    ev.add_static_param(status.code());
    ev.add_var_param(description);
    trail.report(ev);
}

// ============================================================================
// SINK IMPLEMENTATIONS
// ============================================================================

/// Forwards events to `tracing` at debug level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl TraceSink for TracingSink {
    fn report_event(&self, event: TraceEvent) {
        tracing::debug!(
            trail = %event.trail,
            event_id = %event.event_id,
            static_params = ?event.static_params,
            var_params = ?event.var_params,
            compressed_params = event.compressed_params.len(),
            "trace event"
        );
    }
}

/// Keeps every event in memory, in report order.
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<TraceEvent>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the recorded events.
    pub fn events(&self) -> Vec<TraceEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    /// Ids of the recorded events, in report order.
    pub fn event_ids(&self) -> Vec<EventId> {
        self.events().iter().map(|e| e.event_id).collect()
    }

    /// Recorded events with the given id.
    pub fn find(&self, event_id: EventId) -> Vec<TraceEvent> {
        self.events()
            .into_iter()
            .filter(|e| e.event_id == event_id)
            .collect()
    }

    pub fn contains(&self, event_id: EventId) -> bool {
        self.event_ids().contains(&event_id)
    }

    /// Drop everything recorded so far.
    pub fn clear(&self) {
        if let Ok(mut events) = self.events.lock() {
            events.clear();
        }
    }

    /// Return and drop everything recorded so far.
    pub fn take(&self) -> Vec<TraceEvent> {
        self.events
            .lock()
            .map(|mut events| std::mem::take(&mut *events))
            .unwrap_or_default()
    }
}

impl TraceSink for RecordingSink {
    fn report_event(&self, event: TraceEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}

/// Sends each event to both sinks.
#[derive(Debug, Clone)]
pub struct TeeSink<A, B> {
    first: A,
    second: B,
}

impl<A: TraceSink, B: TraceSink> TeeSink<A, B> {
    pub fn new(first: A, second: B) -> Self {
        Self { first, second }
    }
}

impl<A: TraceSink, B: TraceSink> TraceSink for TeeSink<A, B> {
    fn report_event(&self, event: TraceEvent) {
        self.first.report_event(event.clone());
        self.second.report_event(event);
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::ids;

    #[test]
    fn test_trail_reports_to_sink() {
        let sink = RecordingSink::new();
        let trail = Trail::new(TrailId(0x123456), &sink);

        let mut ev = trail.event(ids::CALL_LIST_READ_STARTED);
        ev.add_var_param("kermit");
        trail.report(ev);

        let events = sink.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].trail, TrailId(0x123456));
        assert_eq!(events[0].event_id, ids::CALL_LIST_READ_STARTED);
        assert_eq!(events[0].var_params, vec!["kermit".to_string()]);
    }

    #[test]
    fn test_report_failure_layout() {
        let sink = RecordingSink::new();
        let trail = Trail::new(TrailId(7), &sink);

        report_failure(
            &trail,
            ids::CALL_LIST_TRIM_FAILED,
            ResultCode::InvalidRequest,
            "bad batch",
        );

        let failed = sink.find(ids::CALL_LIST_TRIM_FAILED);
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].static_params, vec![ResultCode::InvalidRequest.code()]);
        assert_eq!(failed[0].var_params, vec!["bad batch".to_string()]);
    }

    #[test]
    fn test_recording_sink_take_and_clear() {
        let sink = RecordingSink::new();
        sink.report_event(TraceEvent::new(TrailId(1), ids::CALL_LIST_WRITE_STARTED));
        sink.report_event(TraceEvent::new(TrailId(1), ids::CALL_LIST_WRITE_OK));

        assert!(sink.contains(ids::CALL_LIST_WRITE_OK));
        let taken = sink.take();
        assert_eq!(taken.len(), 2);
        assert!(sink.events().is_empty());

        sink.report_event(TraceEvent::new(TrailId(1), ids::CALL_LIST_WRITE_STARTED));
        sink.clear();
        assert!(sink.event_ids().is_empty());
    }

    #[test]
    fn test_tee_sink_duplicates() {
        let a = Arc::new(RecordingSink::new());
        let b = Arc::new(RecordingSink::new());
        let tee = TeeSink::new(a.clone(), b.clone());

        tee.report_event(TraceEvent::new(TrailId(1), ids::CALL_LIST_READ_OK));

        assert_eq!(a.event_ids(), vec![ids::CALL_LIST_READ_OK]);
        assert_eq!(b.event_ids(), vec![ids::CALL_LIST_READ_OK]);
    }

    #[test]
    fn test_tracing_sink_accepts_events() {
        TracingSink.report_event(TraceEvent::new(TrailId(1), ids::CALL_LIST_READ_OK));
    }
}
