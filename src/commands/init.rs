use anyhow::{Context, Result};
use std::path::PathBuf;
use steam_fetch::config::Config;

pub async fn init_config(path: PathBuf) -> Result<()> {
    let config = Config::default();
    let config_path = path.join("steam-fetch.toml");

    let toml_content = format!(
        r#"# steam-fetch configuration

[steam]
# api_key = ""          # or STEAM_API_KEY
rate_limit = {}          # requests per minute, or STEAM_RATE_LIMIT
cache_ttl_secs = {}      # or STEAM_CACHE_TTL
language = "{}"
store_base_url = "{}"
community_base_url = "{}"
api_base_url = "{}"
request_timeout_secs = {}
connect_timeout_secs = {}

[scraping]
# "dom" (CSS selectors) or "pattern" (regular expressions)
strategy = "dom"

[server]
listen_addr = "{}"
cors_enabled = false
cors_origins = []

[storage]
data_dir = "{}"
sync_batch_size = {}

[logging]
level = "{}"             # or LOG_LEVEL
format = "text"          # "text" or "json"
"#,
        config.steam.rate_limit,
        config.steam.cache_ttl_secs,
        config.steam.language,
        config.steam.store_base_url,
        config.steam.community_base_url,
        config.steam.api_base_url,
        config.steam.request_timeout_secs,
        config.steam.connect_timeout_secs,
        config.server.listen_addr,
        config.storage.data_dir.display(),
        config.storage.sync_batch_size,
        config.logging.level.as_str(),
    );

    std::fs::create_dir_all(&path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    std::fs::write(&config_path, toml_content)
        .with_context(|| format!("Failed to write {}", config_path.display()))?;

    println!("Created configuration file: {}", config_path.display());

    Ok(())
}
