//! Inference bridge server.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client (HTTP / bridge-cli)
//!         │
//!         ▼
//!   ┌──────────┐   ┌────────────────────────────── BridgeContext ─────────────┐
//!   │   http   │──▶│  JobRunner: TaskSubmitter ─▶ ResultPoller ─▶ Progress    │
//!   │ surface  │   │  PendingQueue ◀── enqueue      QueueDrainWorker ──▶ runner│
//!   └──────────┘   └──────────────────────────────┬───────────────────────────┘
//!                                                 │ JobBackend (reqwest)
//!                                                 ▼
//!                                        Remote generation backend
//!
//!   Cross-cutting: config · resilience (timeouts) · observability · lifecycle
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;

use inference_bridge::config::loader::load_startup_config;
use inference_bridge::lifecycle::signals::listen_for_signals;
use inference_bridge::observability::{logging, metrics};
use inference_bridge::{BridgeContext, HttpServer, Shutdown};

#[derive(Parser)]
#[command(name = "inference-bridge")]
#[command(about = "Bridge between chat clients and an asynchronous generation backend", long_about = None)]
struct Args {
    /// TOML configuration file; defaults plus BRIDGE_* environment otherwise.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = match load_startup_config(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            logging::init_logging("info");
            tracing::error!(error = %e, "Failed to load configuration");
            return Err(e.into());
        }
    };

    logging::init_logging(&config.observability.log_level);
    tracing::info!("inference-bridge v{} starting", env!("CARGO_PKG_VERSION"));

    tracing::info!(
        bind_address = %config.listener.bind_address,
        backend_url = %config.backend.base_url,
        total_timeout_ms = config.timeouts.total_ms,
        poll_interval_ms = config.timeouts.poll_interval_ms,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    let context = Arc::new(BridgeContext::from_config(config)?);

    let shutdown = Shutdown::new();
    let server_shutdown = Shutdown::wait(shutdown.subscribe());
    tokio::spawn(listen_for_signals(shutdown));

    HttpServer::new(context.clone()).run(listener, server_shutdown).await?;

    match Arc::try_unwrap(context) {
        Ok(context) => context.teardown(),
        Err(_) => tracing::warn!("Context still shared at shutdown; skipping teardown"),
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
