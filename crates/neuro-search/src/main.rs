mod cache;
mod catalog;
mod config;
mod error;
mod parser;
mod server;
mod update;

use std::sync::Arc;

use rmcp::{ServiceExt, transport::stdio};
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

use cache::SearchCache;
use config::Config;
use server::NeuroSearchServer;
use update::UpdateService;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // stdout carries MCP JSON-RPC, logs go to stderr
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    info!("starting neuro-search MCP server");

    let config = Config::from_env()?;
    info!(
        data_dir = %config.data_dir,
        treatments = %config.treatments_file,
        pathologies = %config.pathologies_file,
        cache_capacity = config.cache_capacity,
        "configuration loaded"
    );

    let cache = Arc::new(SearchCache::new(config.cache_capacity));
    let update_service = UpdateService::new(config.clone(), Arc::clone(&cache));
    let catalog = update_service.full_reload()?;
    info!(
        fingerprint = %catalog.fingerprint(),
        entries = catalog.entry_count(),
        "search index ready"
    );

    let server = NeuroSearchServer::new(catalog, cache, config);

    if let Ok(addr) = std::env::var("MCP_TCP_LISTEN_ADDR") {
        let listener = TcpListener::bind(&addr).await?;
        info!(listen_addr = %addr, "MCP server ready, serving on TCP");
        loop {
            let (stream, peer) = listener.accept().await?;
            let server = server.clone();
            tokio::spawn(async move {
                info!(peer = %peer, "MCP client connected");
                let service = server.serve(stream).await.inspect_err(|e| {
                    tracing::error!(error = %e, "MCP server error");
                })?;
                service.waiting().await?;
                info!(peer = %peer, "MCP client disconnected");
                Ok::<(), anyhow::Error>(())
            });
        }
    } else {
        info!("MCP server ready, serving on stdio");
        let service = server.serve(stdio()).await.inspect_err(|e| {
            tracing::error!(error = %e, "MCP server error");
        })?;
        service.waiting().await?;
        info!("MCP server shut down");
    }
    Ok(())
}
