//! Fakes, builders and helpers for lookout tests
//!
//! The fakes are hand-written where tests need delays or call counters; the
//! mockall mocks cover the rest.

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use lookout::core::SuccessRatio;
use lookout::{Lookout, LookoutConfig, LookoutResult, Metrics, Ticker};
use shared::{
    CheckResult, CheckResults, Checker, ContentId, SampleSet, Sampler, SharedError, SharedResult,
};

/// Sampler returning a fixed list after an optional delay
pub struct FakeSampler {
    name: String,
    identifiers: Vec<ContentId>,
    delay: Duration,
    draws: Arc<AtomicUsize>,
}

impl FakeSampler {
    pub fn new(name: &str, identifiers: Vec<ContentId>) -> Self {
        Self {
            name: name.to_string(),
            identifiers,
            delay: Duration::ZERO,
            draws: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Shared counter of completed and attempted draws
    pub fn draws(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.draws)
    }
}

#[async_trait]
impl Sampler for FakeSampler {
    async fn sample(&self, token: &CancellationToken) -> SharedResult<SampleSet> {
        self.draws.fetch_add(1, Ordering::SeqCst);
        tokio::select! {
            _ = token.cancelled() => return Err(SharedError::Cancelled),
            _ = tokio::time::sleep(self.delay) => {}
        }
        Ok(SampleSet::new(&self.name, self.identifiers.clone()))
    }
}

/// Checker reporting 200 for every identifier except the failing ones
pub struct FakeChecker {
    name: String,
    failing: HashSet<ContentId>,
    delay: Duration,
    empty: bool,
    checks: Arc<AtomicUsize>,
}

impl FakeChecker {
    pub const TIMEOUT: Duration = Duration::from_secs(30);

    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            failing: HashSet::new(),
            delay: Duration::ZERO,
            empty: false,
            checks: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn failing(mut self, identifiers: impl IntoIterator<Item = ContentId>) -> Self {
        self.failing.extend(identifiers);
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Return batches without any results
    pub fn returning_nothing(mut self) -> Self {
        self.empty = true;
        self
    }

    pub fn checks(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.checks)
    }
}

#[async_trait]
impl Checker for FakeChecker {
    async fn check(&self, token: &CancellationToken, set: &SampleSet) -> CheckResults {
        self.checks.fetch_add(1, Ordering::SeqCst);
        let mut batch = CheckResults::new(&self.name, &set.name);
        tokio::select! {
            _ = token.cancelled() => return batch,
            _ = tokio::time::sleep(self.delay) => {}
        }
        if self.empty {
            return batch;
        }
        for id in &set.identifiers {
            let status = if self.failing.contains(id) { 404 } else { 200 };
            batch.results.push(
                CheckResult::new(id.clone(), Self::TIMEOUT)
                    .with_status(status)
                    .with_elapsed(Duration::from_millis(12)),
            );
        }
        batch
    }
}

/// Ticker fired by hand through the paired sender
pub struct ManualTicker {
    ticks: mpsc::Receiver<()>,
}

impl ManualTicker {
    pub fn new() -> (mpsc::Sender<()>, Self) {
        let (tx, rx) = mpsc::channel(8);
        (tx, Self { ticks: rx })
    }
}

#[async_trait]
impl Ticker for ManualTicker {
    async fn tick(&mut self) {
        if self.ticks.recv().await.is_none() {
            // No more ticks will ever come
            std::future::pending::<()>().await;
        }
    }
}

/// Builder for test pipelines with sensible defaults
pub struct LookoutBuilder {
    config: LookoutConfig,
    samplers: Vec<Arc<dyn Sampler>>,
    checkers: Vec<Arc<dyn Checker>>,
}

impl LookoutBuilder {
    pub fn new() -> Self {
        Self {
            config: LookoutConfig {
                check_interval: Duration::from_millis(50),
                ..LookoutConfig::default()
            },
            samplers: Vec::new(),
            checkers: Vec::new(),
        }
    }

    pub fn with_config(mut self, config: LookoutConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_sampler(mut self, sampler: impl Sampler + 'static) -> Self {
        self.samplers.push(Arc::new(sampler));
        self
    }

    pub fn with_checker(mut self, checker: impl Checker + 'static) -> Self {
        self.checkers.push(Arc::new(checker));
        self
    }

    pub fn build(self) -> (Arc<Lookout>, Arc<Metrics>) {
        let metrics = Arc::new(Metrics::new());
        let lookout = Lookout::new(self.config, self.samplers, self.checkers, Arc::clone(&metrics))
            .expect("test configuration must be valid")
            .with_span(tracing::info_span!("test_lookout"));
        (Arc::new(lookout), metrics)
    }
}

/// Shared test helpers
pub struct TestHelpers;

impl TestHelpers {
    pub const WAIT: Duration = Duration::from_secs(2);

    /// Poll until `checker`/`sample` has a ratio, or give up after [`Self::WAIT`].
    pub async fn wait_for_ratio(metrics: &Metrics, checker: &str, sample: &str) -> SuccessRatio {
        tokio::time::timeout(Self::WAIT, async {
            loop {
                if let Some(ratio) = metrics.success_ratio(checker, sample).await {
                    return ratio;
                }
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("success ratio was never reported")
    }

    /// Poll until `counter` reaches `at_least`, or give up after [`Self::WAIT`].
    pub async fn wait_for_count(counter: &AtomicUsize, at_least: usize) {
        tokio::time::timeout(Self::WAIT, async {
            while counter.load(Ordering::SeqCst) < at_least {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("counter never reached the expected value");
    }

    /// Cancel the pipeline and require it to wind down promptly.
    pub async fn stop(lookout: &Lookout, run: JoinHandle<LookoutResult<()>>) {
        lookout.shutdown();
        tokio::time::timeout(Duration::from_secs(1), run)
            .await
            .expect("pipeline did not stop after cancellation")
            .expect("pipeline task panicked")
            .expect("pipeline returned an error");
    }
}
