//! Edge redirector daemon.
//!
//! Runs the path-to-subdomain rewrite and the edge cache policy in front
//! of the origin, reusing the exact library translation the in-browser
//! worker uses.

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use subdomain_gateway::config::loader::load_edge_config;
use subdomain_gateway::config::watcher::EdgeConfigWatcher;
use subdomain_gateway::observability::{logging, metrics};
use subdomain_gateway::{EdgeConfig, EdgeServer, Shutdown};

#[derive(Parser)]
#[command(name = "subdomain-gateway")]
#[command(about = "Edge redirector for a content-addressed subdomain gateway", long_about = None)]
struct Args {
    /// Path to the TOML configuration file; defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => load_edge_config(path)?,
        None => EdgeConfig::default(),
    };

    logging::init_logging(&config.observability.log_level);
    tracing::info!("subdomain-gateway edge redirector starting");

    tracing::info!(
        bind_address = %config.listener.bind_address,
        upstream = %config.upstream.address,
        "configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(err) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                error = %err,
                "failed to parse metrics address"
            ),
        }
    }

    // hot reload needs a file to watch
    let (config_updates, _watcher) = match &args.config {
        Some(path) => {
            let (watcher, updates) = EdgeConfigWatcher::new(path);
            (updates, Some(watcher.run()?))
        }
        None => {
            let (_tx, updates) = mpsc::unbounded_channel();
            (updates, None)
        }
    };

    let listener = TcpListener::bind(&config.listener.bind_address).await?;

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        shutdown.listen_for_signals().await;
    });

    let server = EdgeServer::new(config);
    server.run(listener, config_updates, server_shutdown).await?;

    tracing::info!("shutdown complete");
    Ok(())
}
