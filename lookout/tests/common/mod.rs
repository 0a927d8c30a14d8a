//! Common test utilities and infrastructure
//!
//! Fakes, fixtures and a builder shared by the lookout integration suites.

#![allow(dead_code)]

pub mod fixtures;
pub mod helpers;

pub use fixtures::TestFixtures;
pub use helpers::{FakeChecker, FakeSampler, LookoutBuilder, ManualTicker, TestHelpers};
