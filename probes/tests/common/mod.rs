//! Test fixtures shared by the probe integration tests

#![allow(dead_code)]

use shared::{ContentId, SampleSet};
use url::Url;
use wiremock::MockServer;

/// Well-known CIDv0 strings; their base58 form equals the multihash's
pub const CID_HELLO: &str = "QmT78zSuBmuS4z925WZfrqQ1qHaJ56DQaTfyMUF7F8ff5o";
pub const CID_README: &str = "QmYwAPJzv5CZsnA625s3Xf2nemtYgPpHdWEz79ojWnPbdG";
pub const CID_QUICKSTART: &str = "QmPZ9gcCEpqKTo6aq61g2nXGUhM4iCL3ewB6LDXZCtioEB";

/// A CIDv1 and the CIDv0 spelling of the same multihash
pub const CID_V1: &str = "bafybeigdyrzt5sfp7udm7hu76uh7y26nf3efuylqabf3oclgtqy55fbzdi";
pub const CID_V1_AS_V0: &str = "QmbWqxBEKC3P8tqsKc98xmWNzrzDtRLMiMPL8wBuTGsMnR";

pub fn id(cid: &str) -> ContentId {
    ContentId::from_cid_str(cid).expect("fixture CID must decode")
}

pub fn sample_set(name: &str, cids: &[&str]) -> SampleSet {
    SampleSet::new(name, cids.iter().map(|c| id(c)).collect())
}

pub fn endpoint(server: &MockServer, path: &str) -> Url {
    Url::parse(&format!("{}{}", server.uri(), path)).expect("mock server URI must parse")
}
