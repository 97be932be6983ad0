use anyhow::Context;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use tandem_server::{build_router, AppState, ServerConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("tandem.toml"));
    let config = ServerConfig::load_or_default(&config_path)
        .map_err(|e| anyhow::anyhow!(e))
        .context("loading configuration")?;

    let db = tandem_storage::create_db(&config.db_path)
        .await
        .with_context(|| format!("opening database at {}", config.db_path.display()))?;

    let state = AppState {
        db,
        tuning: Arc::new(config.matching.clone()),
    };

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("binding {}", config.bind_addr))?;
    tracing::info!("tandem-server listening on {}", config.bind_addr);

    axum::serve(listener, build_router(state)).await?;

    Ok(())
}
