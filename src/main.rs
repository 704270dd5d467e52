mod adapters;
mod application;
mod config;
mod domain;
mod interface;
mod ports;

use std::sync::Arc;

use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use adapters::{Iperf3Source, PrometheusStore};
use application::{Sampler, RETRY_BACKOFF};
use config::Config;
use interface::http::create_router;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    // Load configuration
    let config = Config::parse();

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("iperfmon={},tower_http=info", config.log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("🚀 Starting iperfmon v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration: {:?}", config);

    let interval = config.sampling_interval().inspect_err(|e| error!("[FATAL] {}", e))?;
    let iperf3_config = config.iperf3().inspect_err(|e| error!("[FATAL] {}", e))?;
    if interval <= RETRY_BACKOFF {
        warn!(
            "⚠ Interval {} is not longer than the {} retry backoff",
            humantime::format_duration(interval),
            humantime::format_duration(RETRY_BACKOFF)
        );
    }

    let store = Arc::new(PrometheusStore::new()?);
    let target = config.target();

    let sampler = Sampler::new(
        target.clone(),
        interval,
        Arc::new(Iperf3Source::new(iperf3_config)),
        store.clone(),
    );
    let status = sampler.status();

    info!("✓ Sampler initialized for {}", sampler.target());

    // Create HTTP server
    let app = create_router(target, store, status);
    let listener = tokio::net::TcpListener::bind(&config.addr)
        .await
        .inspect_err(|e| error!("[FATAL] start http server fatal: {}", e))?;

    info!("✓ iperfmon listening on {}", config.addr);
    info!("  → Metrics: http://{}/metrics", config.addr);

    tokio::spawn(sampler.run());

    axum::serve(listener, app)
        .await
        .inspect_err(|e| error!("[FATAL] http server stopped: {}", e))?;

    Ok(())
}
