//! Collaborator contracts consumed by the orchestrator
//!
//! A sampler turns some outside listing of popular content into a sample set;
//! a checker asks one indexing backend about every identifier of such a set.
//! The orchestrator only ever sees these traits, so new sources and backends
//! are added by implementing them.
//!
//! Both traits carry mockall annotations so the orchestrator can be tested
//! without any network.

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::errors::SharedResult;
use crate::types::{CheckResults, SampleSet};

/// Produces a sample set from some external listing of popular content
#[mockall::automock]
#[async_trait]
pub trait Sampler: Send + Sync {
    /// Draw one sample set.
    ///
    /// Network I/O must stop when `token` is cancelled. An error discards this
    /// sampler's contribution for the current cycle only.
    ///
    /// # Parameters
    /// - `token`: Cancellation signal of the running pipeline
    ///
    /// # Returns
    /// The deduplicated sample set named after this sampler, or
    /// `SharedError::Cancelled` if `token` fired first
    async fn sample(&self, token: &CancellationToken) -> SharedResult<SampleSet>;
}

/// Probes whether an indexing backend can resolve a set of identifiers
#[mockall::automock]
#[async_trait]
pub trait Checker: Send + Sync {
    /// Check every identifier of `set` and return one batch of results.
    ///
    /// Never fails as a whole; per-identifier failures are recorded in the
    /// individual results. Each probe must be bounded by its own timeout.
    ///
    /// # Parameters
    /// - `token`: Cancellation signal; no new lookups start once it fires
    /// - `set`: Sample set whose identifiers are looked up
    ///
    /// # Returns
    /// Results tagged with this checker's name and the set's name. After
    /// cancellation the batch may hold fewer results than `set` has
    /// identifiers.
    async fn check(&self, token: &CancellationToken, set: &SampleSet) -> CheckResults;
}
