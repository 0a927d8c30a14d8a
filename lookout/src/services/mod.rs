//! Real I/O implementations used by the binary

pub mod metrics_server;
pub mod ticker;

pub use metrics_server::MetricsServer;
pub use ticker::IntervalTicker;
