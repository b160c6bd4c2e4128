//! Metrics and observability module
//!
//! Provides Prometheus-compatible metrics for the console client.
//!
//! Key metrics exposed:
//! - Offers received, overwritten and decided
//! - Progress notifications per direction
//! - Backend request outcomes and latency
//! - Actions refused by local validation

pub mod exporter;
pub mod recorder;

pub use exporter::{render_metrics, start_metrics_server, MetricsConfig, MetricsError};
pub use recorder::{init_metrics, RequestTimer};
