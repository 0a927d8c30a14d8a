//! Shared building blocks for the lookout workspace
//!
//! Contains the data model exchanged between samplers, checkers and the
//! orchestrator, the bounded parallel executor both pipeline stages run on,
//! and the collaborator traits.

pub mod dedup;
pub mod errors;
pub mod logging;
pub mod perform;
pub mod traits;
pub mod types;

pub use dedup::IdentifierSet;
pub use errors::*;
pub use perform::in_parallel;
pub use traits::{Checker, MockChecker, MockSampler, Sampler};
pub use types::*;
