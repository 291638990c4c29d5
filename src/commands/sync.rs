use anyhow::{Context, Result};
use steam_fetch::config::Config;
use steam_fetch::store::GameStore;
use steam_fetch::sync::sync_app_list;

use super::{build_client, print_json};

pub async fn sync_apps(config: Config) -> Result<()> {
    let client = build_client(&config, None)?;
    let store = GameStore::open(&config.storage.data_dir).with_context(|| {
        format!(
            "Failed to open games store in {}",
            config.storage.data_dir.display()
        )
    })?;

    let report = sync_app_list(&client, &store, config.storage.sync_batch_size).await?;
    print_json(&report)
}
