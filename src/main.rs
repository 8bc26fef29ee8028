use anyhow::Result;
use clap::Parser;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::info;
use tracing_subscriber::EnvFilter;

use shortener::analytics::TopDomainsAggregator;
use shortener::api;
use shortener::config::Config;
use shortener::shortener::ShorteningService;
use shortener::storage::{MemoryStorage, Storage};

#[derive(Parser)]
#[command(name = "shortener")]
#[command(about = "In-memory URL shortener with a top domains leaderboard", long_about = None)]
struct Cli {
    /// Domain short URLs are served under (overrides DEFAULT_DOMAIN)
    default_domain: Option<String>,
    /// Listen host (overrides HOST)
    #[arg(long)]
    host: Option<String>,
    /// Listen port (overrides PORT)
    #[arg(long)]
    port: Option<u16>,
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", err);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let mut config = Config::from_env()?;
    if let Some(domain) = cli.default_domain {
        config.links.default_domain = domain;
    }
    if let Some(host) = cli.host {
        config.server.host = host;
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }
    info!("Loaded configuration");

    let storage: Arc<dyn Storage> = Arc::new(MemoryStorage::new());
    let service = Arc::new(ShorteningService::from_config(Arc::clone(&storage), &config));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let aggregator = TopDomainsAggregator::new(Arc::clone(&storage), &config.top_domains)
        .spawn(shutdown_rx);

    let app = api::create_app(service);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("🚀 Server listening on http://{}", addr);
    info!("   - POST /shorten    shorten a URL");
    info!("   - GET  /{{code}}     redirect");
    info!("   - GET  /metrics    top {} domains", config.top_domains.limit);
    info!("   Short URLs are served under {}", config.links.default_domain);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    let _ = shutdown_tx.send(true);
    aggregator.await?;
    info!("Server stopped");

    Ok(())
}
