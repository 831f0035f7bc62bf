//! Prometheus metrics backend for stepci builds.
//!
//! [`PrometheusMetrics`] implements [`stepci_core::MetricsBackend`]; inject it through
//! [`stepci_core::BuildContext::with_metrics`].
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use stepci_core::BuildContext;
//! use stepci_prometheus::PrometheusMetrics;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let metrics = PrometheusMetrics::new()?;
//! let ctx = BuildContext::default().with_metrics(Arc::new(metrics.clone()));
//!
//! // after some builds:
//! let text = metrics.encode()?;
//! # let _ = (ctx, text);
//! # Ok(())
//! # }
//! ```
//!
//! ## Metrics
//! - `stepci_units_created_total` - Counter
//! - `stepci_order_transitions_total{from, to}` - Counter
//! - `stepci_image_lookups_total{result}` - Counter
//! - `stepci_build_errors_total{error_kind}` - Counter
//!
//! No HTTP endpoint is provided; serve [`PrometheusMetrics::encode`] from the host
//! application.

mod backend;
pub use backend::PrometheusMetrics;

pub use prometheus::{Encoder, Registry, TextEncoder};
