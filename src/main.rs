use std::{net::SocketAddr, str::FromStr, sync::Arc};

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use synctune::{config, manager::ConnectionManager, server};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = config::Args::parse();
    info!("starting synctune server on {}", args.listen_addr);

    let manager = Arc::new(ConnectionManager::new());
    let app = server::app(manager);

    let addr = SocketAddr::from_str(&args.listen_addr).context("invalid listen address")?;
    axum::Server::bind(&addr)
        .serve(app.into_make_service())
        .await
        .context("server error")?;
    Ok(())
}
