use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};

use imdblist_service::AddonService;
use imdblist_service::config::Config;
use imdblist_service::fetch::ImdbFetcher;

use crate::endpoints;

/// Resolves the addon service and runs the HTTP server based on the loaded
/// config.
pub fn run(config: Config) -> Result<()> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .thread_name("imdblist")
        .enable_all()
        .build()?;

    runtime.block_on(async move {
        let fetcher = Arc::new(ImdbFetcher::new(&config.fetch));
        let socket = config.bind.parse::<SocketAddr>()?;

        let service = AddonService::create(config, fetcher)
            .await
            .context("failed to create addon service")?;

        tracing::info!("Starting HTTP server on {}", socket);
        axum_server::bind(socket)
            .serve(endpoints::create_app(service).into_make_service())
            .await?;
        tracing::info!("System shutdown complete");

        Ok(())
    })
}
