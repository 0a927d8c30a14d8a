//! Checkers probing indexing backends

pub mod ipni;

pub use ipni::{IpniCheckerConfig, IpniNonStreamingChecker};
