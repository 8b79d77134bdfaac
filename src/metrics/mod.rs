use prometheus::{Encoder, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder};

// ============================================================================
// Metrics Module - Prometheus metrics for observability
// ============================================================================
//
// Provides metrics for:
// - Document store operations (count by collection/operation/outcome)
// - Store round-trip latency
// - Schema validation failures
//
// All metrics are registered with Prometheus and can be scraped via /metrics
// ============================================================================

/// Outcome label for a store operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Ok,
    Unavailable,
}

impl Outcome {
    fn as_str(self) -> &'static str {
        match self {
            Outcome::Ok => "ok",
            Outcome::Unavailable => "unavailable",
        }
    }
}

pub struct Metrics {
    registry: Registry,

    pub store_operations: IntCounterVec,
    pub store_operation_duration: HistogramVec,
    pub validation_failures: IntCounterVec,
}

impl Metrics {
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        let store_operations = IntCounterVec::new(
            Opts::new("store_operations_total", "Total document store operations"),
            &["collection", "operation", "outcome"],
        )?;
        registry.register(Box::new(store_operations.clone()))?;

        let store_operation_duration = HistogramVec::new(
            HistogramOpts::new("store_operation_duration_seconds", "Document store round-trip duration")
                .buckets(vec![0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0]),
            &["operation"],
        )?;
        registry.register(Box::new(store_operation_duration.clone()))?;

        let validation_failures = IntCounterVec::new(
            Opts::new("validation_failures_total", "Payloads rejected by schema validation"),
            &["schema"],
        )?;
        registry.register(Box::new(validation_failures.clone()))?;

        Ok(Self {
            registry,
            store_operations,
            store_operation_duration,
            validation_failures,
        })
    }

    /// Get the Prometheus registry for exposing metrics via HTTP
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Helper to record one store round trip
    pub fn record_store_operation(&self, collection: &str, operation: &str, outcome: Outcome, duration_secs: f64) {
        self.store_operations
            .with_label_values(&[collection, operation, outcome.as_str()])
            .inc();
        self.store_operation_duration
            .with_label_values(&[operation])
            .observe(duration_secs);
    }

    /// Helper to record a rejected payload
    pub fn record_validation_failure(&self, schema: &str) {
        self.validation_failures.with_label_values(&[schema]).inc();
    }

    /// Render every registered metric in the Prometheus text format
    pub fn render(&self) -> anyhow::Result<String> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}
