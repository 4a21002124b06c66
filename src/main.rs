use anyhow::Context;
use clap::{Parser, Subcommand};
use performance::PerformanceEngine;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{EnvFilter, FmtSubscriber};
use web_server::AppState;

/// The main entry point for the marketlens performance service.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables (store URLs) from the .env file if present.
    dotenvy::dotenv().ok();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder().with_env_filter(filter).finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to install the tracing subscriber")?;

    // Parse command-line arguments and execute the appropriate command.
    let cli = Cli::parse();
    match cli.command {
        Commands::Serve => serve().await,
    }
}

/// Relative-performance metrics for instruments and indices, ranked and
/// served over HTTP.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP server exposing the performance endpoints.
    Serve,
}

async fn serve() -> anyhow::Result<()> {
    let config = configuration::load_config().context("Failed to load config.toml")?;

    let stores = database::connect_stores()
        .await
        .context("Failed to connect to the market stores")?;
    let cache = cache::CacheStore::new(Duration::from_secs(config.cache.ttl_secs));
    // Sweep expired payloads once per TTL so filter-keyed entries don't
    // accumulate for the lifetime of the process.
    cache.spawn_maintenance(Duration::from_secs(config.cache.ttl_secs.max(1)));

    let engine = PerformanceEngine::new(
        stores,
        cache,
        Duration::from_secs(config.engine.request_timeout_secs),
        config.engine.result_limit,
    );

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("Invalid server.host/server.port configuration")?;

    web_server::run_server(addr, Arc::new(AppState { engine })).await
}
