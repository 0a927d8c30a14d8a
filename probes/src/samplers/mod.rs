//! Samplers drawing popular content identifiers from public listings

pub mod awesome_ipfs;
pub mod internet_archive;
pub mod saturn;

pub use awesome_ipfs::AwesomeIpfsDatasetsSampler;
pub use internet_archive::InternetArchiveTopCidsSampler;
pub use saturn::SaturnTopCidsSampler;

use reqwest::StatusCode;
use tokio_util::sync::CancellationToken;
use url::Url;

use shared::{SharedError, SharedResult};

/// Options common to every sampler
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SamplerOptions {
    /// Name of the produced sample sets; used as the metrics label
    pub name: String,
}

impl SamplerOptions {
    pub fn new(name: impl Into<String>) -> SharedResult<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(SharedError::invalid_config("sampler.name", "<empty>"));
        }
        Ok(Self { name })
    }
}

pub(crate) fn parse_endpoint(field: &str, endpoint: &str) -> SharedResult<Url> {
    Url::parse(endpoint).map_err(|_| SharedError::invalid_config(field, endpoint))
}

/// GET `url`, racing `token`, and return the body of a 200 response
pub(crate) async fn fetch_body(
    client: &reqwest::Client,
    token: &CancellationToken,
    url: &Url,
) -> SharedResult<String> {
    let http_error = |source| SharedError::HttpError {
        url: url.to_string(),
        source,
    };

    let response = tokio::select! {
        biased;
        _ = token.cancelled() => return Err(SharedError::Cancelled),
        response = client.get(url.clone()).send() => response.map_err(http_error)?,
    };

    if response.status() != StatusCode::OK {
        return Err(SharedError::UnexpectedStatus {
            url: url.to_string(),
            status: response.status().as_u16(),
        });
    }

    tokio::select! {
        biased;
        _ = token.cancelled() => Err(SharedError::Cancelled),
        body = response.text() => body.map_err(http_error),
    }
}
