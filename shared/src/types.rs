//! Core data model shared by samplers, checkers and the orchestrator

use std::fmt;
use std::time::Duration;

use cid::Cid;
use thiserror::Error;

use crate::errors::{SharedError, SharedResult};

/// Multihash bytes naming a piece of content.
///
/// Compared by exact byte value. The textual form is base58btc, which for a
/// sha2-256 multihash is the same string as the equivalent CIDv0.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContentId(Vec<u8>);

impl ContentId {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    /// Decode a textual CID (v0 or v1) and keep only its multihash
    pub fn from_cid_str(input: &str) -> SharedResult<Self> {
        let cid: Cid = input
            .parse()
            .map_err(|_| SharedError::InvalidIdentifier { input: input.to_string() })?;
        Ok(Self(cid.hash().to_bytes()))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn to_base58(&self) -> String {
        bs58::encode(&self.0).into_string()
    }
}

impl From<Vec<u8>> for ContentId {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl AsRef<[u8]> for ContentId {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for ContentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_base58())
    }
}

impl fmt::Debug for ContentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentId({})", self.to_base58())
    }
}

/// A named, deduplicated, ordered collection of identifiers produced by one
/// sampler for one cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleSet {
    pub name: String,
    pub identifiers: Vec<ContentId>,
}

impl SampleSet {
    pub fn new(name: impl Into<String>, identifiers: Vec<ContentId>) -> Self {
        Self {
            name: name.into(),
            identifiers,
        }
    }

    pub fn len(&self) -> usize {
        self.identifiers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.identifiers.is_empty()
    }
}

/// Why a single identifier probe did not produce an HTTP response
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProbeFailure {
    #[error("probe timed out after {timeout:?}")]
    Timeout { timeout: Duration },

    #[error("probe cancelled")]
    Cancelled,

    #[error("transport error: {0}")]
    Transport(String),

    #[error("failed to build request: {0}")]
    Request(String),
}

/// Outcome of probing one identifier against one backend
#[derive(Debug, Clone)]
pub struct CheckResult {
    pub identifier: ContentId,
    pub error: Option<ProbeFailure>,
    /// HTTP status; left at zero when no response was received
    pub status_code: u16,
    pub timeout: Duration,
    pub elapsed: Duration,
    pub streaming: bool,
}

impl CheckResult {
    pub const SUCCESS_STATUS: u16 = 200;

    /// Create a result with no outcome recorded yet
    pub fn new(identifier: ContentId, timeout: Duration) -> Self {
        Self {
            identifier,
            error: None,
            status_code: 0,
            timeout,
            elapsed: Duration::ZERO,
            streaming: false,
        }
    }

    pub fn with_status(mut self, status_code: u16) -> Self {
        self.status_code = status_code;
        self
    }

    pub fn with_error(mut self, error: ProbeFailure) -> Self {
        self.error = Some(error);
        self
    }

    pub fn with_elapsed(mut self, elapsed: Duration) -> Self {
        self.elapsed = elapsed;
        self
    }

    /// No error and a success status code
    pub fn is_success(&self) -> bool {
        self.error.is_none() && self.status_code == Self::SUCCESS_STATUS
    }
}

/// All results produced by one checker against one sample set
#[derive(Debug, Clone)]
pub struct CheckResults {
    pub checker_name: String,
    pub sample_set_name: String,
    pub results: Vec<CheckResult>,
}

impl CheckResults {
    pub fn new(checker_name: impl Into<String>, sample_set_name: impl Into<String>) -> Self {
        Self {
            checker_name: checker_name.into(),
            sample_set_name: sample_set_name.into(),
            results: Vec::new(),
        }
    }

    pub fn with_capacity(
        checker_name: impl Into<String>,
        sample_set_name: impl Into<String>,
        capacity: usize,
    ) -> Self {
        Self {
            results: Vec::with_capacity(capacity),
            ..Self::new(checker_name, sample_set_name)
        }
    }

    pub fn success_count(&self) -> usize {
        self.results.iter().filter(|r| r.is_success()).count()
    }
}
