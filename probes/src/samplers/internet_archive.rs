//! Sampler over the most downloaded Internet Archive items that carry a CID

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, Span};
use url::Url;

use shared::logging::component_span;
use shared::{ContentId, IdentifierSet, SampleSet, Sampler, SharedResult};

use super::{fetch_body, parse_endpoint, SamplerOptions};

const CID_FIELD: &str = "identifier-cid";

/// Reads a single-column CSV export of the advanced search API
pub struct InternetArchiveTopCidsSampler {
    options: SamplerOptions,
    client: reqwest::Client,
    endpoint: Url,
    span: Span,
}

impl InternetArchiveTopCidsSampler {
    pub const ENDPOINT: &'static str = "https://archive.org/advancedsearch.php?q=_exists_:identifier-cid&output=csv&fl=identifier-cid&rows=300&sort=downloads:desc";

    pub fn new(options: SamplerOptions, client: reqwest::Client) -> SharedResult<Self> {
        let endpoint = parse_endpoint("internet_archive.endpoint", Self::ENDPOINT)?;
        let span = component_span("sampler", &options.name);
        Ok(Self {
            options,
            client,
            endpoint,
            span,
        })
    }

    pub fn with_endpoint(mut self, endpoint: Url) -> Self {
        self.endpoint = endpoint;
        self
    }

    fn parse(&self, csv: &str) -> IdentifierSet {
        let mut ids = IdentifierSet::new();
        for record in csv.lines().map(str::trim).filter(|line| !line.is_empty()) {
            let fields: Vec<&str> = record.split(',').collect();
            if fields.len() != 1 {
                tracing::warn!(record, "Inconsistent field count in Internet Archive records; skipping");
                continue;
            }
            let value = fields[0].trim_matches('"');
            if value == CID_FIELD {
                continue;
            }
            match ContentId::from_cid_str(value) {
                Ok(id) => {
                    ids.put_if_absent(id);
                }
                Err(e) => {
                    tracing::warn!(value, err = %e, "Invalid CID from Internet Archive");
                }
            }
        }
        ids
    }
}

#[async_trait]
impl Sampler for InternetArchiveTopCidsSampler {
    async fn sample(&self, token: &CancellationToken) -> SharedResult<SampleSet> {
        async {
            let csv = fetch_body(&self.client, token, &self.endpoint).await?;
            let ids = self.parse(&csv);
            if ids.is_empty() {
                tracing::warn!("No CIDs were found from Internet Archive");
            }
            Ok(SampleSet::new(self.options.name.clone(), ids.into_vec()))
        }
        .instrument(self.span.clone())
        .await
    }
}
