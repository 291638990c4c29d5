//! Copy Steam's full app list into the local games table

use std::time::Instant;

use serde::Serialize;
use tracing::{debug, info};
use uuid::Uuid;

use crate::steam::{SteamClient, SteamError};
use crate::store::{GameRow, GameStore, StoreError};

#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error(transparent)]
    Steam(#[from] SteamError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Outcome of one sync run
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncReport {
    pub sync_id: Uuid,
    /// Apps returned by Steam
    pub fetched: usize,
    /// New rows written
    pub inserted: usize,
    /// Apps without a usable name
    pub skipped: usize,
    pub batches: usize,
    pub duration_ms: u64,
}

/// Insert every named app not already present, `batch_size` rows at a time
pub async fn sync_app_list(
    client: &SteamClient,
    store: &GameStore,
    batch_size: usize,
) -> Result<SyncReport, SyncError> {
    let sync_id = Uuid::new_v4();
    let started = Instant::now();
    info!(%sync_id, "Starting app list sync");

    let apps = client.get_all_games().await?;
    let fetched = apps.len();

    let rows: Vec<GameRow> = apps
        .into_iter()
        .filter_map(|app| {
            let name = app.name.trim();
            (app.appid != 0 && !name.is_empty()).then(|| GameRow::new(app.appid, name))
        })
        .collect();
    let skipped = fetched - rows.len();

    let mut inserted = 0;
    let mut batches = 0;
    for batch in rows.chunks(batch_size.max(1)) {
        inserted += store.insert_missing(batch)?;
        batches += 1;
        debug!(%sync_id, batch = batches, processed = batches * batch_size.max(1), "Sync batch written");
    }
    store.flush()?;

    let report = SyncReport {
        sync_id,
        fetched,
        inserted,
        skipped,
        batches,
        duration_ms: started.elapsed().as_millis() as u64,
    };
    info!(
        %sync_id,
        fetched = report.fetched,
        inserted = report.inserted,
        skipped = report.skipped,
        "App list sync complete"
    );
    Ok(report)
}
