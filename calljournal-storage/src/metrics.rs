//! Prometheus metrics for call list operations.
//!
//! Each store owns its own registry; a service exposing `/metrics` gathers
//! from [`JournalMetrics::registry`] or renders [`JournalMetrics::encode_text`].

use crate::operations::OperationKind;
use calljournal_core::ResultCode;
use prometheus::{
    Encoder, Histogram, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder,
};

/// Store call latency buckets (seconds)
const STORE_LATENCY_BUCKETS: &[f64] = &[
    0.0005, 0.001, 0.005, 0.010, 0.025, 0.050, 0.100, 0.250, 0.500, 1.0, 2.5,
];

/// Fragments returned by one read
const RECORD_LENGTH_BUCKETS: &[f64] = &[0.0, 1.0, 2.0, 5.0, 10.0, 25.0, 50.0, 100.0, 250.0, 500.0];

/// Total contents bytes returned by one read
const RECORD_SIZE_BUCKETS: &[f64] = &[
    64.0, 256.0, 1024.0, 4096.0, 16384.0, 65536.0, 262144.0, 1048576.0,
];

/// Container for the journal's metrics.
#[derive(Clone)]
pub struct JournalMetrics {
    registry: Registry,

    /// Operation counter - labels: operation, status
    pub store_operations_total: IntCounterVec,

    /// Operation duration histogram - labels: operation
    pub store_operation_duration_seconds: HistogramVec,

    /// Fragments per successful read
    pub read_record_length: Histogram,

    /// Contents bytes per successful read
    pub read_record_size: Histogram,
}

impl JournalMetrics {
    /// Create the metrics and register them with a fresh registry.
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let store_operations_total = IntCounterVec::new(
            Opts::new(
                "calljournal_store_operations_total",
                "Total number of call list operations",
            ),
            &["operation", "status"],
        )?;
        registry.register(Box::new(store_operations_total.clone()))?;

        let store_operation_duration_seconds = HistogramVec::new(
            HistogramOpts::new(
                "calljournal_store_operation_duration_seconds",
                "Call list operation duration in seconds, store call included",
            )
            .buckets(STORE_LATENCY_BUCKETS.to_vec()),
            &["operation"],
        )?;
        registry.register(Box::new(store_operation_duration_seconds.clone()))?;

        let read_record_length = Histogram::with_opts(
            HistogramOpts::new(
                "calljournal_read_record_length",
                "Number of call fragments returned by a read",
            )
            .buckets(RECORD_LENGTH_BUCKETS.to_vec()),
        )?;
        registry.register(Box::new(read_record_length.clone()))?;

        let read_record_size = Histogram::with_opts(
            HistogramOpts::new(
                "calljournal_read_record_size_bytes",
                "Total size of the call fragment contents returned by a read",
            )
            .buckets(RECORD_SIZE_BUCKETS.to_vec()),
        )?;
        registry.register(Box::new(read_record_size.clone()))?;

        Ok(Self {
            registry,
            store_operations_total,
            store_operation_duration_seconds,
            read_record_length,
            read_record_size,
        })
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Record a finished operation.
    pub fn record_operation(&self, kind: OperationKind, status: ResultCode, duration_secs: f64) {
        let operation = kind.to_string();
        self.store_operations_total
            .with_label_values(&[operation.as_str(), status.as_str()])
            .inc();
        self.store_operation_duration_seconds
            .with_label_values(&[operation.as_str()])
            .observe(duration_secs);
    }

    /// Record what a successful read returned.
    pub fn record_read(&self, fragments: usize, bytes: usize) {
        self.read_record_length.observe(fragments as f64);
        self.read_record_size.observe(bytes as f64);
    }

    /// Number of finished operations of `kind` that ended with `status`.
    pub fn operation_count(&self, kind: OperationKind, status: ResultCode) -> u64 {
        self.store_operations_total
            .with_label_values(&[kind.to_string().as_str(), status.as_str()])
            .get()
    }

    /// Prometheus text exposition of every metric.
    pub fn encode_text(&self) -> Result<String, prometheus::Error> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}

impl std::fmt::Debug for JournalMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JournalMetrics").finish_non_exhaustive()
    }
}
