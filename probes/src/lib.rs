//! Concrete samplers and checkers for the lookout pipeline
//!
//! Samplers draw popular content identifiers from public listings; checkers
//! probe indexing backends for them. Both implement the collaborator traits
//! from `shared` and share one `reqwest::Client`.

pub mod checkers;
pub mod samplers;

pub use checkers::{IpniCheckerConfig, IpniNonStreamingChecker};
pub use samplers::{
    AwesomeIpfsDatasetsSampler, InternetArchiveTopCidsSampler, SamplerOptions,
    SaturnTopCidsSampler,
};
