//! Synchronous call list store facade.
//!
//! `CallListStore` builds operations and runs them to completion on the
//! calling thread, doing the failure mapping an asynchronous executor would
//! otherwise do.

use crate::column::{ColumnStore, StoreFailure};
use crate::metrics::JournalMetrics;
use crate::operations::{DeleteOldCallFragments, GetCallFragments, Operation, WriteCallFragment};
use calljournal_core::{CallFragment, ConfigError, JournalConfig, JournalError, JournalResult, ResultCode};
use calljournal_events::{TraceSink, Trail, TrailId};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;

/// Reasons a store cannot be built.
#[derive(Debug, Error)]
pub enum StoreInitError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Failed to register metrics: {0}")]
    Metrics(#[from] prometheus::Error),
}

/// Entry point for call list reads and writes.
#[derive(Clone)]
pub struct CallListStore {
    client: Arc<dyn ColumnStore>,
    sink: Arc<dyn TraceSink>,
    config: JournalConfig,
    metrics: JournalMetrics,
}

impl CallListStore {
    /// Create a store over `client`, reporting events to `sink`.
    ///
    /// The client must be bound to the configured keyspace.
    pub fn new(
        client: Arc<dyn ColumnStore>,
        sink: Arc<dyn TraceSink>,
        config: JournalConfig,
    ) -> Result<Self, StoreInitError> {
        config.validate()?;
        if client.keyspace() != config.keyspace {
            return Err(ConfigError::InvalidValue {
                field: "keyspace".to_string(),
                value: config.keyspace.clone(),
                reason: format!("store handle is bound to keyspace {}", client.keyspace()),
            }
            .into());
        }
        let metrics = JournalMetrics::new()?;
        tracing::info!(
            keyspace = %config.keyspace,
            default_ttl_secs = config.default_ttl_secs,
            trace_contents = config.trace_contents,
            "Call list store configured"
        );
        Ok(Self {
            client,
            sink,
            config,
            metrics,
        })
    }

    pub fn config(&self) -> &JournalConfig {
        &self.config
    }

    pub fn metrics(&self) -> &JournalMetrics {
        &self.metrics
    }

    // ========================================================================
    // OPERATION FACTORIES
    // ========================================================================

    pub fn new_write_call_fragment_op(
        &self,
        impu: &str,
        fragment: CallFragment,
        cass_timestamp: i64,
        ttl: i32,
    ) -> WriteCallFragment {
        let level = self
            .config
            .trace_contents
            .then_some(self.config.trace_compression_level);
        WriteCallFragment::new(impu, fragment, cass_timestamp, ttl).with_contents_trace(level)
    }

    pub fn new_get_call_fragments_op(&self, impu: &str) -> GetCallFragments {
        GetCallFragments::new(impu)
    }

    pub fn new_delete_old_call_fragments_op(
        &self,
        impu: &str,
        fragments: Vec<CallFragment>,
        cass_timestamp: i64,
    ) -> DeleteOldCallFragments {
        DeleteOldCallFragments::new(impu, fragments, cass_timestamp)
    }

    // ========================================================================
    // EXECUTION
    // ========================================================================

    /// Run `op` to completion.
    ///
    /// `perform` is called once. A store failure, or a panic while talking to
    /// the store, is mapped to its result code and handed to `handle_failure`
    /// once before being returned.
    pub fn do_sync(&self, op: &mut dyn Operation, trail: TrailId) -> JournalResult<()> {
        let trail = Trail::new(trail, self.sink.as_ref());
        let kind = op.kind();
        let start = Instant::now();
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| op.perform(self.client.as_ref(), &trail)))
            .unwrap_or_else(|payload| Err(StoreFailure::Unknown(panic_message(&*payload))));
        let elapsed = start.elapsed().as_secs_f64();

        match outcome {
            Ok(()) => {
                self.metrics.record_operation(kind, ResultCode::Ok, elapsed);
                op.record_stats(&self.metrics);
                Ok(())
            }
            Err(failure) => {
                let code = failure.result_code();
                let description = failure.to_string();
                self.metrics.record_operation(kind, code, elapsed);
                op.handle_failure(code, &description, &trail);
                Err(JournalError::new(code, description))
            }
        }
    }

    /// Write one fragment. Callers sequence dependent fragments themselves.
    pub fn write_call_fragment_sync(
        &self,
        impu: &str,
        fragment: CallFragment,
        cass_timestamp: i64,
        ttl: i32,
        trail: TrailId,
    ) -> JournalResult<()> {
        let mut op = self.new_write_call_fragment_op(impu, fragment, cass_timestamp, ttl);
        self.do_sync(&mut op, trail)
    }

    /// Write one fragment with the configured default TTL.
    pub fn write_call_fragment_with_default_ttl(
        &self,
        impu: &str,
        fragment: CallFragment,
        cass_timestamp: i64,
        trail: TrailId,
    ) -> JournalResult<()> {
        let ttl = self.config.default_ttl_secs;
        self.write_call_fragment_sync(impu, fragment, cass_timestamp, ttl, trail)
    }

    /// Read the identity's full history, oldest first.
    pub fn get_call_fragments_sync(&self, impu: &str, trail: TrailId) -> JournalResult<Vec<CallFragment>> {
        let mut op = self.new_get_call_fragments_op(impu);
        self.do_sync(&mut op, trail)?;
        Ok(op.into_fragments())
    }

    pub fn delete_old_call_fragments_sync(
        &self,
        impu: &str,
        fragments: Vec<CallFragment>,
        cass_timestamp: i64,
        trail: TrailId,
    ) -> JournalResult<()> {
        let mut op = self.new_delete_old_call_fragments_op(impu, fragments, cass_timestamp);
        self.do_sync(&mut op, trail)
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    let detail = payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string());
    format!("store call panicked: {}", detail)
}

impl std::fmt::Debug for CallListStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallListStore")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// TESTS
// ============================================================================
