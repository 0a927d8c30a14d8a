//! Lookout: periodically checks that popular content is discoverable through
//! IPNI indexers and exports the outcome as metrics
//!
//! The [`Lookout`] orchestrator drives samplers and checkers from the `probes`
//! crate (or any other implementation of the `shared` traits) and records the
//! results in a [`Metrics`] aggregator served by [`MetricsServer`].

pub mod config;
pub mod core;
pub mod error;
pub mod orchestrator;
pub mod services;
pub mod traits;

// Re-export commonly used types
pub use crate::core::{render_prometheus, Metrics, MetricsSnapshot};
pub use config::{Config, LookoutConfig};
pub use error::{LookoutError, LookoutResult};
pub use orchestrator::Lookout;
pub use services::{IntervalTicker, MetricsServer};
pub use traits::Ticker;
