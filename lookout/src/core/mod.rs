//! Core pipeline state: metrics aggregation and its text exposition
//!
//! Nothing in here performs I/O.

pub mod exposition;
pub mod metrics;

pub use exposition::render_prometheus;
pub use metrics::{Histogram, LatencyKey, LookupKey, Metrics, MetricsSnapshot, SuccessRatio};
