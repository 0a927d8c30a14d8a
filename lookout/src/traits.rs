//! Trait definitions with mockall annotations for testing
//!
//! Samplers and checkers are defined in `shared`; this module holds the seams
//! owned by the orchestrator itself.

use async_trait::async_trait;

/// Source of sampling cycle ticks
///
/// Production code uses a wall-clock interval; tests drive cycles by hand.
#[mockall::automock]
#[async_trait]
pub trait Ticker: Send {
    /// Wait for the next tick.
    ///
    /// # Returns
    /// Once the next sampling cycle is due. Callers race this against
    /// cancellation, so an implementation may wait indefinitely.
    async fn tick(&mut self);
}
