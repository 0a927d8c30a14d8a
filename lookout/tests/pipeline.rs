//! End-to-end tests of the sampling and checking loops with fake collaborators

mod common;

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use common::{FakeChecker, FakeSampler, LookoutBuilder, ManualTicker, TestFixtures, TestHelpers};
use async_trait::async_trait;
use lookout::{LookoutConfig, LookoutError, Ticker};
use shared::{MockSampler, SharedError};

#[tokio::test]
async fn test_cycle_round_trip() {
    let (_ticks, ticker) = ManualTicker::new();
    let (lookout, metrics) = LookoutBuilder::new()
        .with_sampler(FakeSampler::new(TestFixtures::SAMPLER, TestFixtures::identifiers(3)))
        .with_checker(FakeChecker::new(TestFixtures::CHECKER))
        .build();

    let run = tokio::spawn(Arc::clone(&lookout).run(ticker));

    let ratio = TestHelpers::wait_for_ratio(&metrics, TestFixtures::CHECKER, TestFixtures::SAMPLER).await;
    assert!((ratio.ratio - 1.0).abs() < TestFixtures::EPSILON);
    assert_eq!(ratio.total, 3);
    assert_eq!(metrics.sample_set_size(TestFixtures::SAMPLER).await, Some(3));

    TestHelpers::stop(&lookout, run).await;
}

#[tokio::test]
async fn test_partial_failure_ratio() {
    let (_ticks, ticker) = ManualTicker::new();
    let (lookout, metrics) = LookoutBuilder::new()
        .with_sampler(FakeSampler::new(TestFixtures::SAMPLER, TestFixtures::identifiers(3)))
        .with_checker(
            FakeChecker::new(TestFixtures::CHECKER).failing([TestFixtures::identifier(1)]),
        )
        .build();

    let run = tokio::spawn(Arc::clone(&lookout).run(ticker));

    let ratio = TestHelpers::wait_for_ratio(&metrics, TestFixtures::CHECKER, TestFixtures::SAMPLER).await;
    assert!((ratio.ratio - 2.0 / 3.0).abs() < TestFixtures::EPSILON);
    assert_eq!(ratio.total, 3);

    TestHelpers::stop(&lookout, run).await;
}

#[tokio::test]
async fn test_zero_result_batch_stores_zero_ratio() {
    let (_ticks, ticker) = ManualTicker::new();
    let (lookout, metrics) = LookoutBuilder::new()
        .with_sampler(FakeSampler::new(TestFixtures::SAMPLER, TestFixtures::identifiers(3)))
        .with_checker(FakeChecker::new(TestFixtures::CHECKER).returning_nothing())
        .build();

    let run = tokio::spawn(Arc::clone(&lookout).run(ticker));

    let ratio = TestHelpers::wait_for_ratio(&metrics, TestFixtures::CHECKER, TestFixtures::SAMPLER).await;
    assert_eq!(ratio.ratio, 0.0);
    // Told apart from "all failed" by the result count
    assert_eq!(ratio.total, 0);

    TestHelpers::stop(&lookout, run).await;
}

#[tokio::test]
async fn test_every_checker_sees_every_set() {
    let (_ticks, ticker) = ManualTicker::new();
    let (lookout, metrics) = LookoutBuilder::new()
        .with_sampler(FakeSampler::new(TestFixtures::SAMPLER, TestFixtures::identifiers(3)))
        .with_sampler(FakeSampler::new(TestFixtures::OTHER_SAMPLER, TestFixtures::identifiers(5)))
        .with_checker(FakeChecker::new(TestFixtures::CHECKER))
        .with_checker(
            FakeChecker::new(TestFixtures::OTHER_CHECKER).failing(TestFixtures::identifiers(5)),
        )
        .build();

    let run = tokio::spawn(Arc::clone(&lookout).run(ticker));

    for sample in [TestFixtures::SAMPLER, TestFixtures::OTHER_SAMPLER] {
        let ok = TestHelpers::wait_for_ratio(&metrics, TestFixtures::CHECKER, sample).await;
        assert!((ok.ratio - 1.0).abs() < TestFixtures::EPSILON);
        let failed = TestHelpers::wait_for_ratio(&metrics, TestFixtures::OTHER_CHECKER, sample).await;
        assert_eq!(failed.ratio, 0.0);
        assert!(failed.total > 0);
    }
    assert_eq!(metrics.sample_set_size(TestFixtures::OTHER_SAMPLER).await, Some(5));

    TestHelpers::stop(&lookout, run).await;
}

#[tokio::test]
async fn test_failing_sampler_is_skipped() {
    let mut failing = MockSampler::new();
    failing.expect_sample().returning(|_| {
        Err(SharedError::UnexpectedStatus {
            url: "https://listing.example/top".to_string(),
            status: 503,
        })
    });

    let (_ticks, ticker) = ManualTicker::new();
    let (lookout, metrics) = LookoutBuilder::new()
        .with_sampler(failing)
        .with_sampler(FakeSampler::new(TestFixtures::SAMPLER, TestFixtures::identifiers(2)))
        .with_checker(FakeChecker::new(TestFixtures::CHECKER))
        .build();

    let run = tokio::spawn(Arc::clone(&lookout).run(ticker));

    let ratio = TestHelpers::wait_for_ratio(&metrics, TestFixtures::CHECKER, TestFixtures::SAMPLER).await;
    assert_eq!(ratio.total, 2);
    let snapshot = metrics.snapshot().await;
    assert_eq!(snapshot.sample_set_sizes.len(), 1);
    assert!(!snapshot
        .sample_set_sizes
        .contains_key(TestFixtures::FAILING_SAMPLER));

    TestHelpers::stop(&lookout, run).await;
}

#[tokio::test]
async fn test_ticks_drive_further_cycles() {
    let sampler = FakeSampler::new(TestFixtures::SAMPLER, TestFixtures::identifiers(3));
    let draws = sampler.draws();
    let checker = FakeChecker::new(TestFixtures::CHECKER);
    let checks = checker.checks();

    let (ticks, ticker) = ManualTicker::new();
    let (lookout, _metrics) = LookoutBuilder::new()
        .with_sampler(sampler)
        .with_checker(checker)
        .build();

    let run = tokio::spawn(Arc::clone(&lookout).run(ticker));

    // The first cycle runs without waiting for a tick
    TestHelpers::wait_for_count(&checks, 1).await;
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(draws.load(Ordering::SeqCst), 1);

    ticks.send(()).await.unwrap();
    TestHelpers::wait_for_count(&checks, 2).await;
    assert_eq!(draws.load(Ordering::SeqCst), 2);

    TestHelpers::stop(&lookout, run).await;
}

#[tokio::test]
async fn test_stalled_checking_throttles_sampling() {
    let samplers: Vec<FakeSampler> = (0..3)
        .map(|n| FakeSampler::new(&format!("sampler-{n}"), TestFixtures::identifiers(2)))
        .collect();
    let draws: Vec<_> = samplers.iter().map(FakeSampler::draws).collect();
    let checker = FakeChecker::new(TestFixtures::CHECKER).with_delay(Duration::from_secs(60));
    let checks = checker.checks();

    let (ticks, ticker) = ManualTicker::new();
    let mut builder = LookoutBuilder::new().with_checker(checker);
    for sampler in samplers {
        builder = builder.with_sampler(sampler);
    }
    let (lookout, metrics) = builder.build();

    let run = tokio::spawn(Arc::clone(&lookout).run(ticker));

    // One set is being checked, one waits in the handoff, the third cannot be published
    TestHelpers::wait_for_count(&checks, 1).await;
    for _ in 0..3 {
        ticks.send(()).await.unwrap();
    }
    tokio::time::sleep(Duration::from_millis(200)).await;

    for counter in &draws {
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }
    assert_eq!(checks.load(Ordering::SeqCst), 1);
    assert!(metrics.snapshot().await.success_ratios.is_empty());

    // Cancellation still gets through the blocked publish and the stalled check
    TestHelpers::stop(&lookout, run).await;
}

#[tokio::test]
async fn test_shutdown_liveness() {
    let (ticks, ticker) = ManualTicker::new();
    let (lookout, metrics) = LookoutBuilder::new()
        .with_sampler(
            FakeSampler::new(TestFixtures::SAMPLER, TestFixtures::identifiers(3))
                .with_delay(Duration::from_millis(5)),
        )
        .with_checker(FakeChecker::new(TestFixtures::CHECKER).with_delay(Duration::from_millis(5)))
        .build();

    let run = tokio::spawn(Arc::clone(&lookout).run(ticker));
    TestHelpers::wait_for_ratio(&metrics, TestFixtures::CHECKER, TestFixtures::SAMPLER).await;
    let _ = ticks.send(()).await;

    TestHelpers::stop(&lookout, run).await;
    assert!(lookout.shutdown_token().is_cancelled());
}

#[tokio::test]
async fn test_shutdown_during_slow_sampling() {
    let sampler = FakeSampler::new(TestFixtures::SAMPLER, TestFixtures::identifiers(3))
        .with_delay(Duration::from_secs(60));
    let draws = sampler.draws();
    let (_ticks, ticker) = ManualTicker::new();
    let (lookout, metrics) = LookoutBuilder::new()
        .with_sampler(sampler)
        .with_checker(FakeChecker::new(TestFixtures::CHECKER))
        .build();

    let run = tokio::spawn(Arc::clone(&lookout).run(ticker));
    TestHelpers::wait_for_count(&draws, 1).await;

    TestHelpers::stop(&lookout, run).await;
    assert_eq!(metrics.sample_set_size(TestFixtures::SAMPLER).await, None);
}

/// Ticker whose task dies on the first scheduled tick
struct BrokenTicker;

#[async_trait]
impl Ticker for BrokenTicker {
    async fn tick(&mut self) {
        panic!("ticker broke");
    }
}

#[tokio::test]
async fn test_dead_loop_stops_the_pipeline() {
    let (lookout, _metrics) = LookoutBuilder::new()
        .with_sampler(FakeSampler::new(TestFixtures::SAMPLER, TestFixtures::identifiers(3)))
        .with_checker(FakeChecker::new(TestFixtures::CHECKER).with_delay(Duration::from_secs(60)))
        .build();

    let run = tokio::spawn(Arc::clone(&lookout).run(BrokenTicker));

    // Checking may still be stalled on the first set when sampling dies
    let result = tokio::time::timeout(Duration::from_secs(2), run)
        .await
        .expect("run should return once a loop dies")
        .unwrap();
    assert!(matches!(result, Err(LookoutError::TaskError { .. })));
    assert!(lookout.shutdown_token().is_cancelled());
}

#[tokio::test]
async fn test_invalid_config_is_rejected() {
    let config = LookoutConfig {
        checkers_parallelism: 0,
        ..LookoutConfig::default()
    };
    let result = lookout::Lookout::new(
        config,
        Vec::new(),
        Vec::new(),
        Arc::new(lookout::Metrics::new()),
    );
    assert!(matches!(result, Err(LookoutError::ConfigurationError { .. })));
}
