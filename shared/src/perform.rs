//! Bounded fan-out/fan-in over a list of inputs
//!
//! Both the admission queue and the result queue hold a single item, so a
//! slow consumer throttles the workers and the workers throttle the feeder.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

/// Run `for_each` over `items` with at most `parallelism` invocations in
/// flight, streaming results in completion order.
///
/// Once `token` is cancelled no further items are admitted and results of
/// work still in flight are discarded. An invocation already running is left
/// to observe `token` itself. The returned receiver yields `None` only after
/// every worker has exited.
///
/// Must be called from within a tokio runtime.
///
/// # Parameters
/// - `token`: Stops admission of further items when cancelled
/// - `parallelism`: Maximum number of concurrent invocations; 0 acts as 1
/// - `items`: Inputs, admitted in order
/// - `for_each`: Invoked once per admitted item with a clone of `token`
///
/// # Returns
/// Receiver of results in completion order. It holds one result at a time,
/// so workers wait while the consumer is busy.
pub fn in_parallel<K, V, F, Fut>(
    token: CancellationToken,
    parallelism: usize,
    items: Vec<K>,
    for_each: F,
) -> mpsc::Receiver<V>
where
    K: Send + 'static,
    V: Send + 'static,
    F: Fn(CancellationToken, K) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = V> + Send + 'static,
{
    let (results_tx, results_rx) = mpsc::channel(1);

    tokio::spawn(
        async move {
            let (targets_tx, targets_rx) = mpsc::channel::<K>(1);
            let targets_rx = Arc::new(Mutex::new(targets_rx));
            let for_each = Arc::new(for_each);

            let mut workers = JoinSet::new();
            for _ in 0..parallelism.max(1) {
                workers.spawn(
                    worker(
                        token.clone(),
                        Arc::clone(&targets_rx),
                        results_tx.clone(),
                        Arc::clone(&for_each),
                    )
                    .in_current_span(),
                );
            }
            // Workers hold the only result senders and target receivers from here on
            drop(results_tx);
            drop(targets_rx);

            for item in items {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => break,
                    sent = targets_tx.send(item) => {
                        if sent.is_err() {
                            break;
                        }
                    }
                }
            }
            drop(targets_tx);

            while let Some(joined) = workers.join_next().await {
                if let Err(e) = joined {
                    tracing::error!(err = %e, "Parallel worker terminated abnormally");
                }
            }
        }
        .in_current_span(),
    );

    results_rx
}

async fn worker<K, V, F, Fut>(
    token: CancellationToken,
    targets: Arc<Mutex<mpsc::Receiver<K>>>,
    results: mpsc::Sender<V>,
    for_each: Arc<F>,
) where
    F: Fn(CancellationToken, K) -> Fut,
    Fut: Future<Output = V>,
{
    loop {
        let target = tokio::select! {
            biased;
            _ = token.cancelled() => return,
            target = next_target(&targets) => match target {
                Some(target) => target,
                None => return,
            },
        };

        let result = for_each(token.clone(), target).await;

        tokio::select! {
            biased;
            _ = token.cancelled() => return,
            sent = results.send(result) => {
                if sent.is_err() {
                    return;
                }
            }
        }
    }
}

async fn next_target<K>(targets: &Mutex<mpsc::Receiver<K>>) -> Option<K> {
    targets.lock().await.recv().await
}
