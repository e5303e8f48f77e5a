use std::sync::Arc;

use clap::Parser;
use snaproute_core::{MemoryNetwork, RoutingEngine};
use snaproute_server::{AppState, Args, ServerConfig, app};
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // RUST_LOG wins, `log` records from the engine are bridged in
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let config = ServerConfig::load(&args)?;
    let network_path = config
        .network
        .clone()
        .ok_or("no network configured, pass --network or set `network` in the config file")?;

    info!(path = %network_path.display(), table = %config.engine.table, "loading network");
    let table = config.engine.table.clone();
    let network =
        tokio::task::spawn_blocking(move || MemoryNetwork::from_geojson_path(table, network_path))
            .await??;
    info!(edges = network.len(), "network loaded");

    let engine = RoutingEngine::new(config.engine.clone(), Arc::new(network));
    let schema = engine.capabilities();
    if schema.types.is_empty() {
        warn!("network declares no cost types, every route request will be rejected");
    }
    info!(types = ?schema.types, filters = ?schema.filters, properties = ?schema.properties, "schema resolved");

    let app = app(AppState::new(engine), &config);
    let listener = TcpListener::bind(config.listen).await?;
    info!(addr = %config.listen, "listening on");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    info!("shutdown requested");
}
