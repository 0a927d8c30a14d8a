//! Runtime configuration
//!
//! [`LookoutConfig`] parametrizes the pipeline itself. [`Config`] is the TOML
//! file read by the binary: pipeline settings plus the samplers and checkers
//! to instantiate, keyed by name.

use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Deserializer};
use url::Url;

use probes::{
    AwesomeIpfsDatasetsSampler, InternetArchiveTopCidsSampler, IpniCheckerConfig,
    IpniNonStreamingChecker, SamplerOptions, SaturnTopCidsSampler,
};
use shared::{Checker, Sampler};

use crate::error::{LookoutError, LookoutResult};

pub const DEFAULT_METRICS_LISTEN_ADDR: &str = "0.0.0.0:40080";

/// Pipeline settings, checked by [`LookoutConfig::validate`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookoutConfig {
    /// Time between sampling cycles
    pub check_interval: Duration,
    /// Checkers run concurrently against one sample set
    pub checkers_parallelism: usize,
    /// Samplers run concurrently in one cycle
    pub samplers_parallelism: usize,
}

impl LookoutConfig {
    pub const DEFAULT_CHECK_INTERVAL: Duration = Duration::from_secs(5 * 60);
    pub const DEFAULT_PARALLELISM: usize = 10;

    pub fn validate(&self) -> LookoutResult<()> {
        if self.check_interval.is_zero() {
            return Err(LookoutError::config("check_interval", "must be greater than zero"));
        }
        if self.checkers_parallelism == 0 {
            return Err(LookoutError::config("checkers_parallelism", "must be at least 1"));
        }
        if self.samplers_parallelism == 0 {
            return Err(LookoutError::config("samplers_parallelism", "must be at least 1"));
        }
        Ok(())
    }
}

impl Default for LookoutConfig {
    fn default() -> Self {
        Self {
            check_interval: Self::DEFAULT_CHECK_INTERVAL,
            checkers_parallelism: Self::DEFAULT_PARALLELISM,
            samplers_parallelism: Self::DEFAULT_PARALLELISM,
        }
    }
}

/// Configuration file contents
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default = "default_check_interval", deserialize_with = "human_duration")]
    pub check_interval: Duration,
    #[serde(default = "default_parallelism")]
    pub checkers_parallelism: usize,
    #[serde(default = "default_parallelism")]
    pub samplers_parallelism: usize,
    #[serde(default = "default_metrics_listen_addr")]
    pub metrics_listen_addr: String,
    #[serde(default)]
    pub checkers: BTreeMap<String, CheckerConfig>,
    #[serde(default)]
    pub samplers: BTreeMap<String, SamplerConfig>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case", deny_unknown_fields)]
pub enum CheckerConfig {
    IpniNonStreaming {
        #[serde(default, deserialize_with = "optional_human_duration")]
        timeout: Option<Duration>,
        ipni_endpoint: Option<String>,
        #[serde(default)]
        cascade_labels: Vec<String>,
        parallelism: Option<usize>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case", deny_unknown_fields)]
pub enum SamplerConfig {
    SaturnOrchTopCids { endpoint: Option<String> },
    AwesomeIpfsDatasets { endpoint: Option<String> },
    InternetArchiveTopCids { endpoint: Option<String> },
}

fn default_check_interval() -> Duration {
    LookoutConfig::DEFAULT_CHECK_INTERVAL
}

fn default_parallelism() -> usize {
    LookoutConfig::DEFAULT_PARALLELISM
}

fn default_metrics_listen_addr() -> String {
    DEFAULT_METRICS_LISTEN_ADDR.to_string()
}

fn human_duration<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
    let raw = String::deserialize(deserializer)?;
    humantime::parse_duration(&raw).map_err(serde::de::Error::custom)
}

fn optional_human_duration<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<Duration>, D::Error> {
    human_duration(deserializer).map(Some)
}

impl Config {
    pub fn load(path: impl AsRef<Path>) -> LookoutResult<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| LookoutError::ConfigReadError {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&raw)
    }

    pub fn from_toml_str(raw: &str) -> LookoutResult<Self> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// What the binary runs when no configuration file is given: the
    /// cid.contact indexer with and without DHT cascading, fed by the Saturn
    /// top CIDs, checked every ten minutes.
    pub fn default_set() -> Self {
        let cid_contact = |cascade_labels: Vec<String>| CheckerConfig::IpniNonStreaming {
            timeout: Some(Duration::from_secs(30)),
            ipni_endpoint: Some(IpniCheckerConfig::DEFAULT_ENDPOINT.to_string()),
            cascade_labels,
            parallelism: None,
        };

        let mut checkers = BTreeMap::new();
        checkers.insert(
            "cid_contact_with_cascade".to_string(),
            cid_contact(vec!["ipfs-dht".to_string()]),
        );
        checkers.insert("cid_contact".to_string(), cid_contact(Vec::new()));

        let mut samplers = BTreeMap::new();
        samplers.insert(
            SaturnTopCidsSampler::DEFAULT_NAME.to_string(),
            SamplerConfig::SaturnOrchTopCids { endpoint: None },
        );

        Self {
            check_interval: Duration::from_secs(10 * 60),
            checkers_parallelism: LookoutConfig::DEFAULT_PARALLELISM,
            samplers_parallelism: LookoutConfig::DEFAULT_PARALLELISM,
            metrics_listen_addr: default_metrics_listen_addr(),
            checkers,
            samplers,
        }
    }

    pub fn validate(&self) -> LookoutResult<()> {
        self.lookout_config().validate()?;
        if self.checkers.is_empty() {
            return Err(LookoutError::config("checkers", "at least one checker is required"));
        }
        if self.samplers.is_empty() {
            return Err(LookoutError::config("samplers", "at least one sampler is required"));
        }
        self.metrics_listen_addr()?;
        Ok(())
    }

    pub fn lookout_config(&self) -> LookoutConfig {
        LookoutConfig {
            check_interval: self.check_interval,
            checkers_parallelism: self.checkers_parallelism,
            samplers_parallelism: self.samplers_parallelism,
        }
    }

    pub fn metrics_listen_addr(&self) -> LookoutResult<SocketAddr> {
        self.metrics_listen_addr
            .parse()
            .map_err(|source| LookoutError::AddrParseError {
                value: self.metrics_listen_addr.clone(),
                source,
            })
    }

    /// Instantiate the configured checkers in name order.
    pub fn build_checkers(&self, client: &reqwest::Client) -> LookoutResult<Vec<Arc<dyn Checker>>> {
        let mut checkers: Vec<Arc<dyn Checker>> = Vec::with_capacity(self.checkers.len());
        for (name, checker) in &self.checkers {
            match checker {
                CheckerConfig::IpniNonStreaming {
                    timeout,
                    ipni_endpoint,
                    cascade_labels,
                    parallelism,
                } => {
                    let mut config = IpniCheckerConfig::named(name)
                        .with_cascade_labels(cascade_labels.clone());
                    if let Some(timeout) = timeout {
                        config = config.with_timeout(*timeout);
                    }
                    if let Some(endpoint) = ipni_endpoint {
                        config = config.with_endpoint(endpoint.clone());
                    }
                    if let Some(parallelism) = parallelism {
                        config = config.with_parallelism(*parallelism);
                    }
                    checkers.push(Arc::new(IpniNonStreamingChecker::new(config, client.clone())?));
                }
            }
        }
        Ok(checkers)
    }

    /// Instantiate the configured samplers in name order.
    pub fn build_samplers(&self, client: &reqwest::Client) -> LookoutResult<Vec<Arc<dyn Sampler>>> {
        let mut samplers: Vec<Arc<dyn Sampler>> = Vec::with_capacity(self.samplers.len());
        for (name, sampler) in &self.samplers {
            let options = SamplerOptions::new(name.clone())?;
            let client = client.clone();
            let sampler: Arc<dyn Sampler> = match sampler {
                SamplerConfig::SaturnOrchTopCids { endpoint } => {
                    let mut sampler = SaturnTopCidsSampler::new(options, client)?;
                    if let Some(endpoint) = endpoint_override(name, endpoint)? {
                        sampler = sampler.with_endpoint(endpoint);
                    }
                    Arc::new(sampler)
                }
                SamplerConfig::AwesomeIpfsDatasets { endpoint } => {
                    let mut sampler = AwesomeIpfsDatasetsSampler::new(options, client)?;
                    if let Some(endpoint) = endpoint_override(name, endpoint)? {
                        sampler = sampler.with_endpoint(endpoint);
                    }
                    Arc::new(sampler)
                }
                SamplerConfig::InternetArchiveTopCids { endpoint } => {
                    let mut sampler = InternetArchiveTopCidsSampler::new(options, client)?;
                    if let Some(endpoint) = endpoint_override(name, endpoint)? {
                        sampler = sampler.with_endpoint(endpoint);
                    }
                    Arc::new(sampler)
                }
            };
            samplers.push(sampler);
        }
        Ok(samplers)
    }
}

fn endpoint_override(name: &str, endpoint: &Option<String>) -> LookoutResult<Option<Url>> {
    endpoint
        .as_deref()
        .map(|raw| {
            Url::parse(raw).map_err(|e| {
                LookoutError::config(format!("samplers.{name}.endpoint"), e.to_string())
            })
        })
        .transpose()
}
