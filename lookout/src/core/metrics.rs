//! In-memory metrics state shared by the pipeline loops and the scraper
//!
//! Writers take the exclusive lock for exactly one update; readers copy the
//! whole state under the shared lock and render from the copy.

use std::collections::BTreeMap;
use std::time::Duration;

use tokio::sync::RwLock;

use shared::{CheckResults, SampleSet};

/// Upper bounds of the latency histogram buckets, in milliseconds
pub const LATENCY_BUCKETS_MS: [f64; 15] = [
    0.0, 5.0, 10.0, 25.0, 50.0, 75.0, 100.0, 250.0, 500.0, 750.0, 1000.0, 2500.0, 5000.0,
    7500.0, 10000.0,
];

/// Identifies one checker's results against one sampler's set
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LookupKey {
    pub checker: String,
    pub sample: String,
}

impl LookupKey {
    pub fn new(checker: impl Into<String>, sample: impl Into<String>) -> Self {
        Self {
            checker: checker.into(),
            sample: sample.into(),
        }
    }
}

/// Dimensions a check latency is recorded under
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LatencyKey {
    pub lookup: LookupKey,
    pub status: u16,
    pub error: bool,
    pub timeout: Duration,
    pub streaming: bool,
}

/// Last success ratio of a lookup pair and the number of results behind it
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SuccessRatio {
    pub ratio: f64,
    pub total: usize,
}

/// Cumulative latency distribution
#[derive(Debug, Clone, PartialEq)]
pub struct Histogram {
    /// Observations at or below each bound of [`LATENCY_BUCKETS_MS`]
    pub buckets: [u64; LATENCY_BUCKETS_MS.len()],
    pub count: u64,
    pub sum: f64,
}

impl Histogram {
    pub fn observe(&mut self, value_ms: f64) {
        for (bucket, bound) in self.buckets.iter_mut().zip(LATENCY_BUCKETS_MS) {
            if value_ms <= bound {
                *bucket += 1;
            }
        }
        self.count += 1;
        self.sum += value_ms;
    }
}

impl Default for Histogram {
    fn default() -> Self {
        Self {
            buckets: [0; LATENCY_BUCKETS_MS.len()],
            count: 0,
            sum: 0.0,
        }
    }
}

/// Point-in-time copy of everything the aggregator holds
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetricsSnapshot {
    pub sample_set_sizes: BTreeMap<String, usize>,
    pub success_ratios: BTreeMap<LookupKey, SuccessRatio>,
    pub latencies: BTreeMap<LatencyKey, Histogram>,
}

/// Concurrency-safe metrics aggregator
#[derive(Debug, Default)]
pub struct Metrics {
    observables: RwLock<MetricsSnapshot>,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the size of the latest set drawn by a sampler.
    pub async fn notify_sample_set(&self, set: &SampleSet) {
        let mut observables = self.observables.write().await;
        observables
            .sample_set_sizes
            .insert(set.name.clone(), set.identifiers.len());
    }

    /// Record latencies of a batch and replace its lookup pair's success ratio.
    ///
    /// An empty batch stores a ratio of zero with a total of zero.
    pub async fn notify_check_results(&self, batch: &CheckResults) {
        let lookup = LookupKey::new(&batch.checker_name, &batch.sample_set_name);
        let total = batch.results.len();
        let successes = batch.success_count();
        let ratio = if total > 0 {
            successes as f64 / total as f64
        } else {
            0.0
        };

        let mut observables = self.observables.write().await;
        for result in &batch.results {
            let key = LatencyKey {
                lookup: lookup.clone(),
                status: result.status_code,
                error: result.error.is_some(),
                timeout: result.timeout,
                streaming: result.streaming,
            };
            observables
                .latencies
                .entry(key)
                .or_default()
                .observe(result.elapsed.as_millis() as f64);
        }
        observables
            .success_ratios
            .insert(lookup, SuccessRatio { ratio, total });
    }

    pub async fn snapshot(&self) -> MetricsSnapshot {
        self.observables.read().await.clone()
    }

    pub async fn sample_set_size(&self, sampler: &str) -> Option<usize> {
        self.observables
            .read()
            .await
            .sample_set_sizes
            .get(sampler)
            .copied()
    }

    pub async fn success_ratio(&self, checker: &str, sample: &str) -> Option<SuccessRatio> {
        self.observables
            .read()
            .await
            .success_ratios
            .get(&LookupKey::new(checker, sample))
            .copied()
    }
}
