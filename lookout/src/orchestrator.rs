//! The lookout pipeline
//!
//! Two long-lived loops share one cancellation token. The sampling loop draws
//! sample sets on every tick and hands them over a single-slot channel to the
//! checking loop, which runs every checker against each set and feeds the
//! results into [`Metrics`]. A publish blocks until the checking loop has
//! taken the previous set, so stale sets never queue up.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, info_span, warn, Instrument, Span};

use shared::logging::component_span;
use shared::{in_parallel, Checker, SampleSet, Sampler, SharedError};

use crate::config::LookoutConfig;
use crate::core::metrics::Metrics;
use crate::error::{LookoutError, LookoutResult};
use crate::traits::Ticker;

pub struct Lookout {
    config: LookoutConfig,
    samplers: Vec<Arc<dyn Sampler>>,
    checkers: Vec<Arc<dyn Checker>>,
    metrics: Arc<Metrics>,
    shutdown: CancellationToken,
    span: Span,
}

impl Lookout {
    pub fn new(
        config: LookoutConfig,
        samplers: Vec<Arc<dyn Sampler>>,
        checkers: Vec<Arc<dyn Checker>>,
        metrics: Arc<Metrics>,
    ) -> LookoutResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            samplers,
            checkers,
            metrics,
            shutdown: CancellationToken::new(),
            span: component_span("orchestrator", "lookout"),
        })
    }

    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    /// Root token; cancelling it stops both loops and every probe they started.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    pub fn metrics(&self) -> &Arc<Metrics> {
        &self.metrics
    }

    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }

    /// Run both loops until the root token is cancelled.
    ///
    /// The first sampling cycle starts immediately; later ones follow `ticker`.
    pub async fn run<T>(self: Arc<Self>, ticker: T) -> LookoutResult<()>
    where
        T: Ticker + 'static,
    {
        if self.samplers.is_empty() || self.checkers.is_empty() {
            warn!(
                parent: &self.span,
                samplers = self.samplers.len(),
                checkers = self.checkers.len(),
                "Pipeline has nothing to sample or nothing to check with"
            );
        }

        let (sets_tx, sets_rx) = mpsc::channel::<Arc<SampleSet>>(1);

        let mut sampling = tokio::spawn(
            Arc::clone(&self)
                .sample_loop(ticker, sets_tx)
                .instrument(self.span.clone()),
        );
        let mut checking = tokio::spawn(
            Arc::clone(&self)
                .check_loop(sets_rx)
                .instrument(self.span.clone()),
        );

        let (sampled, checked) = tokio::select! {
            joined = &mut sampling => (Some(joined), None),
            joined = &mut checking => (None, Some(joined)),
        };
        // Whichever loop stops first takes the other one down with it
        self.shutdown.cancel();
        let sampling = match sampled {
            Some(joined) => joined,
            None => sampling.await,
        };
        let checking = match checked {
            Some(joined) => joined,
            None => checking.await,
        };

        for (lane, joined) in [("sampling", sampling), ("checking", checking)] {
            if let Err(e) = joined {
                error!(parent: &self.span, lane, err = %e, "Pipeline loop terminated abnormally");
                return Err(LookoutError::TaskError {
                    message: format!("{lane} loop: {e}"),
                });
            }
        }
        Ok(())
    }

    async fn sample_loop<T: Ticker>(self: Arc<Self>, mut ticker: T, sets: mpsc::Sender<Arc<SampleSet>>) {
        info!(interval = ?self.config.check_interval, "🔭 Sampling started");
        self.run_sampling_cycle(&sets).await;
        loop {
            tokio::select! {
                biased;
                _ = self.shutdown.cancelled() => {
                    info!("Sampling stopped");
                    return;
                }
                _ = ticker.tick() => self.run_sampling_cycle(&sets).await,
            }
        }
    }

    /// Draw from every sampler and publish each usable set.
    async fn run_sampling_cycle(&self, sets_tx: &mpsc::Sender<Arc<SampleSet>>) {
        let mut sets = in_parallel(
            self.shutdown.clone(),
            self.config.samplers_parallelism,
            self.samplers.clone(),
            |token: CancellationToken, sampler: Arc<dyn Sampler>| async move {
                match sampler.sample(&token).await {
                    Ok(set) => Some(set),
                    Err(SharedError::Cancelled) => None,
                    Err(e) => {
                        error!(err = %e, "Failed to sample");
                        None
                    }
                }
            },
        );

        loop {
            let set = tokio::select! {
                biased;
                _ = self.shutdown.cancelled() => return,
                set = sets.recv() => match set {
                    Some(Some(set)) => set,
                    Some(None) => continue,
                    None => return,
                },
            };

            if set.is_empty() {
                warn!(name = %set.name, "Skipping empty sample set");
                continue;
            }
            info!(name = %set.name, size = set.len(), "Selected samples");
            self.metrics.notify_sample_set(&set).await;

            tokio::select! {
                biased;
                _ = self.shutdown.cancelled() => return,
                sent = sets_tx.send(Arc::new(set)) => {
                    if sent.is_err() {
                        warn!("Checking loop is gone; dropping sample set");
                        return;
                    }
                }
            }
        }
    }

    async fn check_loop(self: Arc<Self>, mut sets: mpsc::Receiver<Arc<SampleSet>>) {
        info!(checkers = self.checkers.len(), "🔎 Checking started");
        loop {
            let set = tokio::select! {
                biased;
                _ = self.shutdown.cancelled() => {
                    info!("Checking stopped");
                    return;
                }
                set = sets.recv() => match set {
                    Some(set) => set,
                    None => {
                        info!("Checking stopped; no more work");
                        return;
                    }
                },
            };

            let span = info_span!("checks", name = %set.name, size = set.len());
            if !self.run_checks(set).instrument(span).await {
                return;
            }
        }
    }

    /// Run every checker against `set`; false when interrupted by shutdown.
    async fn run_checks(&self, set: Arc<SampleSet>) -> bool {
        info!("Running checks on sample set...");
        let mut batches = in_parallel(
            self.shutdown.clone(),
            self.config.checkers_parallelism,
            self.checkers.clone(),
            move |token: CancellationToken, checker: Arc<dyn Checker>| {
                let set = Arc::clone(&set);
                async move { checker.check(&token, &set).await }
            },
        );

        loop {
            tokio::select! {
                biased;
                _ = self.shutdown.cancelled() => {
                    warn!("Check cycle stopped while performing checks");
                    return false;
                }
                batch = batches.recv() => match batch {
                    Some(batch) => {
                        info!(
                            checker = %batch.checker_name,
                            results = batch.results.len(),
                            successes = batch.success_count(),
                            "Checker finished"
                        );
                        self.metrics.notify_check_results(&batch).await;
                    }
                    None => break,
                },
            }
        }
        info!("✅ Checks finished");
        true
    }
}
