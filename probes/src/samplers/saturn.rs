//! Sampler over the Saturn orchestrator's most requested CIDs

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, Span};
use url::Url;

use shared::logging::component_span;
use shared::{ContentId, IdentifierSet, SampleSet, Sampler, SharedError, SharedResult};

use super::{fetch_body, parse_endpoint, SamplerOptions};

/// Reads a JSON array of `"<cid>[/<path>]"` strings
pub struct SaturnTopCidsSampler {
    options: SamplerOptions,
    client: reqwest::Client,
    endpoint: Url,
    span: Span,
}

impl SaturnTopCidsSampler {
    pub const DEFAULT_NAME: &'static str = "orchestrator.strn.pl/top-cids";
    pub const ENDPOINT: &'static str = "https://orchestrator.strn.pl/top-cids";

    pub fn new(options: SamplerOptions, client: reqwest::Client) -> SharedResult<Self> {
        let endpoint = parse_endpoint("saturn.endpoint", Self::ENDPOINT)?;
        let span = component_span("sampler", &options.name);
        Ok(Self {
            options,
            client,
            endpoint,
            span,
        })
    }

    /// Read the listing from another location
    pub fn with_endpoint(mut self, endpoint: Url) -> Self {
        self.endpoint = endpoint;
        self
    }

    fn parse(&self, body: &str) -> SharedResult<IdentifierSet> {
        let entries: Vec<String> =
            serde_json::from_str(body).map_err(|e| SharedError::DecodeError {
                url: self.endpoint.to_string(),
                message: e.to_string(),
            })?;

        let mut ids = IdentifierSet::new();
        for entry in &entries {
            let cid = entry.split('/').next().unwrap_or_default();
            match ContentId::from_cid_str(cid) {
                Ok(id) => {
                    ids.put_if_absent(id);
                }
                Err(e) => {
                    tracing::warn!(cid, original_value = %entry, err = %e, "Invalid CID from saturn orchestrator");
                }
            }
        }
        Ok(ids)
    }
}

#[async_trait]
impl Sampler for SaturnTopCidsSampler {
    async fn sample(&self, token: &CancellationToken) -> SharedResult<SampleSet> {
        async {
            let body = fetch_body(&self.client, token, &self.endpoint).await?;
            let ids = self.parse(&body)?;
            if ids.is_empty() {
                tracing::warn!("No CIDs were found from saturn orchestrator");
            }
            Ok(SampleSet::new(self.options.name.clone(), ids.into_vec()))
        }
        .instrument(self.span.clone())
        .await
    }
}
