//! Main entry point for the lookout binary

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::signal;
use tracing::info;

use lookout::{
    Config, IntervalTicker, Lookout, LookoutError, LookoutResult, Metrics, MetricsServer,
};
use shared::logging;

/// Checks that popular content is discoverable through IPNI and exports metrics
#[derive(Parser)]
#[command(name = "lookout")]
#[command(about = "Samples popular CIDs, looks them up on IPNI indexers and serves the outcome as metrics")]
pub struct Args {
    /// TOML configuration file (runs the built-in checkers and samplers if not set)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error); RUST_LOG takes precedence
    #[arg(long, default_value = "info")]
    pub log_level: String,

    /// Interval between sampling cycles, e.g. "10m"
    #[arg(long, value_parser = humantime::parse_duration)]
    pub check_interval: Option<Duration>,

    /// Metrics listen address, e.g. "0.0.0.0:40080"
    #[arg(long)]
    pub metrics_listen_addr: Option<String>,
}

#[tokio::main]
async fn main() -> LookoutResult<()> {
    let args = Args::parse();
    logging::init_tracing_with_level(Some(&args.log_level));
    logging::log_startup("lookout");

    let mut config = match &args.config {
        Some(path) => {
            info!(path = %path.display(), "Loading configuration");
            Config::load(path)?
        }
        None => {
            info!("No configuration file given; using the default checkers and samplers");
            Config::default_set()
        }
    };
    if let Some(interval) = args.check_interval {
        config.check_interval = interval;
    }
    if let Some(addr) = args.metrics_listen_addr {
        config.metrics_listen_addr = addr;
    }
    config.validate()?;

    let client = reqwest::Client::builder()
        .user_agent(concat!("ipni-lookout/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| LookoutError::config("http_client", e.to_string()))?;

    let samplers = config.build_samplers(&client)?;
    let checkers = config.build_checkers(&client)?;
    let metrics = Arc::new(Metrics::new());
    let lookout = Arc::new(Lookout::new(
        config.lookout_config(),
        samplers,
        checkers,
        Arc::clone(&metrics),
    )?);

    let server = MetricsServer::bind(config.metrics_listen_addr()?, metrics).await?;
    info!(addr = %server.local_addr()?, "📈 Serving metrics at /metrics");

    // Set up graceful shutdown
    let shutdown = lookout.shutdown_token();
    tokio::spawn(async move {
        match signal::ctrl_c().await {
            Ok(()) => {
                logging::log_shutdown("Received Ctrl+C signal");
                shutdown.cancel();
            }
            Err(err) => {
                logging::log_error("Signal handling", &err);
            }
        }
    });

    let server_shutdown = lookout.shutdown_token();
    let serving = tokio::spawn(async move {
        let served = server.serve(server_shutdown.clone()).await;
        // Without its endpoint the pipeline is pointless
        server_shutdown.cancel();
        served
    });

    let ticker = IntervalTicker::new(config.check_interval);
    let pipeline = Arc::clone(&lookout).run(ticker).await;
    lookout.shutdown();

    let served = serving.await.map_err(|e| LookoutError::TaskError {
        message: format!("metrics server: {e}"),
    })?;

    match pipeline.and(served) {
        Ok(()) => {
            logging::log_success("Lookout stopped gracefully");
            Ok(())
        }
        Err(e) => {
            logging::log_error("Lookout", &e);
            Err(e)
        }
    }
}
