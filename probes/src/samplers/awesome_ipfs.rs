//! Sampler over the datasets linked from the Awesome IPFS page

use async_trait::async_trait;
use regex::Regex;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, Span};
use url::Url;

use shared::logging::component_span;
use shared::{ContentId, IdentifierSet, SampleSet, Sampler, SharedError, SharedResult};

use super::{fetch_body, parse_endpoint, SamplerOptions};

const CID_HREF_PATTERN: &str = r#"href="?https://ipfs.io/ipfs/(\w+)"?"#;

/// Scrapes gateway links out of an HTML page
pub struct AwesomeIpfsDatasetsSampler {
    options: SamplerOptions,
    client: reqwest::Client,
    endpoint: Url,
    cid_href: Regex,
    span: Span,
}

impl AwesomeIpfsDatasetsSampler {
    pub const ENDPOINT: &'static str = "https://awesome.ipfs.io/datasets/";

    pub fn new(options: SamplerOptions, client: reqwest::Client) -> SharedResult<Self> {
        let endpoint = parse_endpoint("awesome_ipfs.endpoint", Self::ENDPOINT)?;
        let cid_href = Regex::new(CID_HREF_PATTERN)
            .map_err(|_| SharedError::invalid_config("awesome_ipfs.pattern", CID_HREF_PATTERN))?;
        let span = component_span("sampler", &options.name);
        Ok(Self {
            options,
            client,
            endpoint,
            cid_href,
            span,
        })
    }

    pub fn with_endpoint(mut self, endpoint: Url) -> Self {
        self.endpoint = endpoint;
        self
    }

    fn parse(&self, html: &str) -> IdentifierSet {
        let mut ids = IdentifierSet::new();
        for captures in self.cid_href.captures_iter(html) {
            let Some(cid) = captures.get(1) else { continue };
            match ContentId::from_cid_str(cid.as_str()) {
                Ok(id) => {
                    ids.put_if_absent(id);
                }
                Err(e) => {
                    tracing::warn!(value = cid.as_str(), err = %e, "Failed to decode match as CID");
                }
            }
        }
        ids
    }
}

#[async_trait]
impl Sampler for AwesomeIpfsDatasetsSampler {
    async fn sample(&self, token: &CancellationToken) -> SharedResult<SampleSet> {
        async {
            let html = fetch_body(&self.client, token, &self.endpoint).await?;
            let ids = self.parse(&html);
            if ids.is_empty() {
                tracing::warn!("No CIDs were found from IPFS Awesome Datasets");
            }
            Ok(SampleSet::new(self.options.name.clone(), ids.into_vec()))
        }
        .instrument(self.span.clone())
        .await
    }
}
