// main.rs
// Axum server wiring: reads configuration, loads the clients file, builds the router and serves.

use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use dotenvy::dotenv;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use cobranca::{config::AppConfig, routes, state};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = AppConfig::from_env();
    let port = config.port;
    let state = Arc::new(
        state::init_state(config)
            .await
            .context("failed to initialize state")?,
    );

    let app = routes::app(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("listening on http://{addr}");
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("cannot bind {addr}"))?;
    axum::serve(listener, app).await?;
    Ok(())
}
