//! Non-streaming IPNI lookup checker
//!
//! Resolves each identifier with a plain `GET /multihash/<b58>` against an
//! IPNI endpoint and records the HTTP status, latency and failure (if any).

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::header::ACCEPT;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, Span};
use url::Url;

use shared::logging::component_span;
use shared::{
    in_parallel, CheckResult, CheckResults, Checker, ContentId, ProbeFailure, SampleSet,
    SharedError, SharedResult,
};

/// Checker configuration, validated by [`IpniNonStreamingChecker::new`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IpniCheckerConfig {
    /// Metrics label; defaults to the endpoint host
    pub name: Option<String>,
    pub ipni_endpoint: String,
    /// Upper bound on a single lookup
    pub timeout: Duration,
    /// Lookups in flight per sample set
    pub parallelism: usize,
    /// Sent as repeated `cascade` query parameters
    pub cascade_labels: Vec<String>,
}

impl IpniCheckerConfig {
    pub const DEFAULT_ENDPOINT: &'static str = "https://cid.contact";
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
    pub const DEFAULT_PARALLELISM: usize = 10;

    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.ipni_endpoint = endpoint.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_parallelism(mut self, parallelism: usize) -> Self {
        self.parallelism = parallelism;
        self
    }

    pub fn with_cascade_labels(mut self, labels: Vec<String>) -> Self {
        self.cascade_labels = labels;
        self
    }
}

impl Default for IpniCheckerConfig {
    fn default() -> Self {
        Self {
            name: None,
            ipni_endpoint: Self::DEFAULT_ENDPOINT.to_string(),
            timeout: Self::DEFAULT_TIMEOUT,
            parallelism: Self::DEFAULT_PARALLELISM,
            cascade_labels: Vec::new(),
        }
    }
}

/// Everything a single lookup needs, shared by the executor's workers
struct Lookup {
    client: reqwest::Client,
    endpoint: Url,
    timeout: Duration,
    cascade_labels: Vec<String>,
}

pub struct IpniNonStreamingChecker {
    name: String,
    parallelism: usize,
    lookup: Arc<Lookup>,
    span: Span,
}

impl IpniNonStreamingChecker {
    pub fn new(config: IpniCheckerConfig, client: reqwest::Client) -> SharedResult<Self> {
        if config.parallelism < 1 {
            return Err(SharedError::invalid_config(
                "checker.parallelism",
                config.parallelism,
            ));
        }
        if config.timeout.is_zero() {
            return Err(SharedError::invalid_config("checker.timeout", "0s"));
        }
        let endpoint = Url::parse(&config.ipni_endpoint)
            .ok()
            .filter(|url| !url.cannot_be_a_base())
            .ok_or_else(|| {
                SharedError::invalid_config("checker.ipni_endpoint", &config.ipni_endpoint)
            })?;

        let name = match config.name {
            Some(name) if !name.trim().is_empty() => name,
            _ => endpoint_authority(&endpoint),
        };
        if name.is_empty() {
            return Err(SharedError::invalid_config("checker.name", "<empty>"));
        }

        Ok(Self {
            span: component_span("checker", &name),
            name,
            parallelism: config.parallelism,
            lookup: Arc::new(Lookup {
                client,
                endpoint,
                timeout: config.timeout,
                cascade_labels: config.cascade_labels,
            }),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn timeout(&self) -> Duration {
        self.lookup.timeout
    }
}

impl Lookup {
    fn url_for(&self, id: &ContentId) -> Result<Url, ProbeFailure> {
        let mut url = self.endpoint.clone();
        url.path_segments_mut()
            .map_err(|_| ProbeFailure::Request(format!("endpoint cannot be a base: {}", self.endpoint)))?
            .pop_if_empty()
            .push("multihash")
            .push(&id.to_base58());
        if !self.cascade_labels.is_empty() {
            let mut query = url.query_pairs_mut();
            for label in &self.cascade_labels {
                query.append_pair("cascade", label);
            }
        }
        Ok(url)
    }

    async fn run(&self, token: &CancellationToken, id: ContentId) -> CheckResult {
        let result = CheckResult::new(id, self.timeout);
        if token.is_cancelled() {
            return result.with_error(ProbeFailure::Cancelled);
        }

        let url = match self.url_for(&result.identifier) {
            Ok(url) => url,
            Err(failure) => {
                tracing::error!(err = %failure, "Failed to instantiate HTTP request");
                return result.with_error(failure);
            }
        };

        let start = Instant::now();
        let request = self
            .client
            .get(url)
            .header(ACCEPT, "application/json")
            .send();

        let outcome = tokio::select! {
            biased;
            _ = token.cancelled() => Err(ProbeFailure::Cancelled),
            response = tokio::time::timeout(self.timeout, request) => match response {
                Ok(Ok(response)) => Ok(response.status().as_u16()),
                Ok(Err(e)) if e.is_timeout() => Err(ProbeFailure::Timeout { timeout: self.timeout }),
                Ok(Err(e)) => Err(ProbeFailure::Transport(e.to_string())),
                Err(_) => Err(ProbeFailure::Timeout { timeout: self.timeout }),
            },
        };

        let result = result.with_elapsed(start.elapsed());
        match outcome {
            Ok(status) => result.with_status(status),
            Err(failure) => {
                tracing::warn!(id = %result.identifier, err = %failure, "Failed to perform HTTP call");
                result.with_error(failure)
            }
        }
    }
}

#[async_trait]
impl Checker for IpniNonStreamingChecker {
    async fn check(&self, token: &CancellationToken, set: &SampleSet) -> CheckResults {
        async {
            let mut results = CheckResults::with_capacity(&self.name, &set.name, set.len());

            let lookup = Arc::clone(&self.lookup);
            let mut rx = in_parallel(
                token.clone(),
                self.parallelism,
                set.identifiers.clone(),
                move |token, id| {
                    let lookup = Arc::clone(&lookup);
                    async move { lookup.run(&token, id).await }
                },
            );

            loop {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => {
                        tracing::warn!(gathered = results.results.len(), "Check interrupted by cancellation");
                        break;
                    }
                    result = rx.recv() => match result {
                        Some(result) => results.results.push(result),
                        None => break,
                    },
                }
            }
            results
        }
        .instrument(self.span.clone())
        .await
    }
}

/// `host[:port]` of the endpoint, used as the default checker name
fn endpoint_authority(endpoint: &Url) -> String {
    let host = endpoint.host_str().unwrap_or_default();
    match endpoint.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    }
}
