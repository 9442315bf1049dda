//! SSRF-safe forwarding proxy.
//!
//! # Architecture Overview
//!
//! ```text
//!                      ┌──────────────────────────────────────────────────────────┐
//!                      │                      SSRF PROXY                          │
//!                      │                                                          │
//!   GET /?uri=...      │  ┌────────┐   ┌─────────┐   ┌──────────┐   ┌──────────┐  │
//!   ───────────────────┼─▶│  http  │──▶│  guard  │──▶│  guard   │──▶│  guard   │  │
//!                      │  │ server │   │ target  │   │ resolver │   │classifier│  │
//!                      │  └────────┘   └─────────┘   └──────────┘   └────┬─────┘  │
//!                      │       ▲                                         │        │
//!                      │       │          ┌──────────────────────┐       ▼        │
//!   200 / 400 / 500    │  ┌────┴─────┐    │      upstream        │    VettedTarget│
//!   ◀──────────────────┼──│ response │◀───│ fetcher + transport  │◀──────┘        │──▶ Upstream
//!                      │  └──────────┘    │ (pinned dial, hops   │                │    (by IP)
//!                      │                  │  re-validated)       │                │
//!                      │                  └──────────────────────┘                │
//!                      │                                                          │
//!                      │   config · observability · lifecycle                     │
//!                      └──────────────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use ssrf_proxy::config::{load_config, ProxyConfig};
use ssrf_proxy::lifecycle::signals::spawn_signal_listener;
use ssrf_proxy::observability::{logging, metrics};
use ssrf_proxy::{HttpServer, Shutdown};

#[derive(Parser)]
#[command(name = "ssrf-proxy")]
#[command(about = "SSRF-safe HTTP forwarding proxy", long_about = None)]
struct Args {
    /// Path to a TOML configuration file. Defaults are used when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => ProxyConfig::default(),
    };

    logging::init(&config.observability);

    tracing::info!("ssrf-proxy v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        fetch_timeout_ms = config.timeouts.fetch_ms,
        dns_timeout_ms = config.timeouts.dns_ms,
        max_redirects = config.fetch.max_redirects,
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
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    spawn_signal_listener(shutdown.clone());

    let server = HttpServer::new(config)?;
    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
