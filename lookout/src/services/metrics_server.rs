//! HTTP endpoint serving the metrics for scraping

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::State;
use axum::http::header;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use crate::core::exposition::{render_prometheus, CONTENT_TYPE};
use crate::core::metrics::Metrics;
use crate::error::{LookoutError, LookoutResult};

/// Metrics listener, bound eagerly so that a taken port fails startup
pub struct MetricsServer {
    listener: TcpListener,
    metrics: Arc<Metrics>,
}

impl MetricsServer {
    pub async fn bind(addr: SocketAddr, metrics: Arc<Metrics>) -> LookoutResult<Self> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| LookoutError::ServerError {
                message: format!("failed to bind {addr}: {e}"),
            })?;
        Ok(Self { listener, metrics })
    }

    pub fn local_addr(&self) -> LookoutResult<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    pub fn router(metrics: Arc<Metrics>) -> Router {
        Router::new()
            .route("/metrics", get(serve_metrics))
            .with_state(metrics)
    }

    /// Serve until `shutdown` is cancelled, then drain open connections.
    pub async fn serve(self, shutdown: CancellationToken) -> LookoutResult<()> {
        axum::serve(self.listener, Self::router(self.metrics))
            .with_graceful_shutdown(async move { shutdown.cancelled().await })
            .await
            .map_err(|e| LookoutError::ServerError {
                message: e.to_string(),
            })
    }
}

async fn serve_metrics(State(metrics): State<Arc<Metrics>>) -> impl IntoResponse {
    let snapshot = metrics.snapshot().await;
    (
        [(header::CONTENT_TYPE, CONTENT_TYPE)],
        render_prometheus(&snapshot),
    )
}
