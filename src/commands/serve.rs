use anyhow::{Context, Result};
use std::sync::Arc;
use steam_fetch::config::Config;
use steam_fetch::http::{AppState, HttpServer};
use steam_fetch::store::GameStore;
use tokio::signal;
use tokio::sync::broadcast;
use tracing::{info, warn};

use super::build_client;

pub async fn serve(mut config: Config, listen: Option<String>) -> Result<()> {
    if let Some(addr) = listen {
        config.server.listen_addr = addr;
    }

    let client = Arc::new(build_client(&config, None)?);
    let store = GameStore::open(&config.storage.data_dir).with_context(|| {
        format!(
            "Failed to open games store in {}",
            config.storage.data_dir.display()
        )
    })?;
    info!("Games store holds {} rows", store.len());

    let server = HttpServer::new(config.server.clone(), AppState::new(client, store.clone()));
    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);

    tokio::spawn(async move {
        if signal::ctrl_c().await.is_ok() {
            info!("Received ctrl-c, shutting down");
        }
        let _ = shutdown_tx.send(());
    });

    server.run(shutdown_rx).await?;

    if let Err(e) = store.flush() {
        warn!("Failed to flush games store: {}", e);
    }
    Ok(())
}
