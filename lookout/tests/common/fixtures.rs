//! Test fixtures and data for lookout tests

use shared::ContentId;

/// Standard test data and fixtures
pub struct TestFixtures;

impl TestFixtures {
    pub const SAMPLER: &'static str = "orchestrator.strn.pl/top-cids";
    pub const OTHER_SAMPLER: &'static str = "awesome-ipfs-datasets";
    pub const FAILING_SAMPLER: &'static str = "broken-listing";
    pub const CHECKER: &'static str = "cid_contact";
    pub const OTHER_CHECKER: &'static str = "cid_contact_with_cascade";

    /// Ratio comparisons
    pub const EPSILON: f64 = 1e-9;

    /// A distinct fake sha2-256 multihash per seed
    pub fn identifier(seed: u8) -> ContentId {
        let mut bytes = vec![0x12, 0x20];
        bytes.extend(std::iter::repeat(seed).take(32));
        ContentId::new(bytes)
    }

    pub fn identifiers(count: u8) -> Vec<ContentId> {
        (0..count).map(Self::identifier).collect()
    }
}
