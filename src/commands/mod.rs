//! CLI subcommand implementations

mod games;
mod init;
mod serve;
mod sync;

pub use games::{
    catalog, charts, community, current_players, details, scrape, top_sellers,
};
pub use init::init_config;
pub use serve::serve;
pub use sync::sync_apps;

use anyhow::{Context, Result};
use serde::Serialize;
use steam_fetch::config::Config;
use steam_fetch::steam::{Capability, SteamClient};

/// Client built from configuration, optionally with another extraction strategy
fn build_client(config: &Config, strategy: Option<Capability>) -> Result<SteamClient> {
    let capability = strategy.unwrap_or(config.scraping.strategy);
    SteamClient::new(&config.steam, capability).context("Failed to build Steam HTTP client")
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{}", json);
    Ok(())
}
