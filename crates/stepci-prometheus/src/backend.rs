use std::sync::Arc;

use prometheus::{Counter, CounterVec, Opts, Registry, TextEncoder, proto::MetricFamily};

use stepci_core::{ImageLookup, MetricsBackend};
use stepci_model::TaskOrder;

const NAMESPACE: &str = "stepci";

/// Prometheus metrics backend.
///
/// ## Label cardinality
/// - `from`/`to`: order values, bounded by the longest task (`-1`, `0`, `1..N`);
/// - `result`: `hit`, `miss`;
/// - `error_kind`: see [`stepci_core::CoreError::kind`].
#[derive(Clone)]
pub struct PrometheusMetrics {
    units_created: Counter,
    transitions: CounterVec,
    image_lookups: CounterVec,
    build_errors: CounterVec,
    registry: Arc<Registry>,
}

impl PrometheusMetrics {
    /// Create a backend registering its collectors in `registry`.
    pub fn new_with_registry(registry: Arc<Registry>) -> Result<Self, prometheus::Error> {
        let units_created = Counter::with_opts(
            Opts::new("units_created_total", "Workload units created").namespace(NAMESPACE),
        )?;
        registry.register(Box::new(units_created.clone()))?;

        let transitions = CounterVec::new(
            Opts::new("order_transitions_total", "Persisted order annotation changes")
                .namespace(NAMESPACE),
            &["from", "to"],
        )?;
        registry.register(Box::new(transitions.clone()))?;

        let image_lookups = CounterVec::new(
            Opts::new("image_lookups_total", "Image command lookups by cache result")
                .namespace(NAMESPACE),
            &["result"],
        )?;
        registry.register(Box::new(image_lookups.clone()))?;

        let build_errors = CounterVec::new(
            Opts::new("build_errors_total", "Failed builds by error kind").namespace(NAMESPACE),
            &["error_kind"],
        )?;
        registry.register(Box::new(build_errors.clone()))?;

        Ok(Self {
            units_created,
            transitions,
            image_lookups,
            build_errors,
            registry,
        })
    }

    /// Create a backend with its own registry.
    pub fn new() -> Result<Self, prometheus::Error> {
        Self::new_with_registry(Arc::new(Registry::new()))
    }

    pub fn gather(&self) -> Vec<MetricFamily> {
        self.registry.gather()
    }

    /// Render all metrics in the text exposition format.
    pub fn encode(&self) -> Result<String, prometheus::Error> {
        TextEncoder::new().encode_to_string(&self.gather())
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }
}

impl MetricsBackend for PrometheusMetrics {
    fn record_unit_created(&self) {
        self.units_created.inc();
    }

    fn record_transition(&self, from: TaskOrder, to: TaskOrder) {
        let (from, to) = (from.to_string(), to.to_string());
        self.transitions
            .with_label_values(&[from.as_str(), to.as_str()])
            .inc();
    }

    fn record_image_lookup(&self, lookup: ImageLookup) {
        self.image_lookups
            .with_label_values(&[lookup.as_label()])
            .inc();
    }

    fn record_build_error(&self, error_kind: &str) {
        self.build_errors.with_label_values(&[error_kind]).inc();
    }
}
