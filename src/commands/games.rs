use anyhow::{bail, Context, Result};
use steam_fetch::config::Config;
use steam_fetch::steam::{Capability, CatalogView};
use steam_fetch::types::AppId;
use tracing::info;

use super::{build_client, print_json};

/// Reconciled details for one app
pub async fn details(config: Config, appid: AppId) -> Result<()> {
    let client = build_client(&config, None)?;
    match client.get_game_details(appid).await {
        Some(record) => print_json(&record),
        None => bail!("No game found for appid {}", appid),
    }
}

/// Store page scrape only
pub async fn scrape(config: Config, appid: AppId, strategy: Option<Capability>) -> Result<()> {
    let client = build_client(&config, strategy)?;
    info!("Scraping store page for {} with {:?}", appid, client.capability());
    match client.scrape_game_page(appid).await {
        Some(record) => print_json(&record),
        None => bail!("Store page for {} yielded no game", appid),
    }
}

/// Community hub HTML, written raw to stdout
pub async fn community(config: Config, appid: AppId, section: Option<String>) -> Result<()> {
    let client = build_client(&config, None)?;
    let html = client
        .get_game_community_html(appid, section.as_deref())
        .await
        .with_context(|| format!("Failed to fetch community page for {}", appid))?;
    println!("{}", html);
    Ok(())
}

pub async fn catalog(config: Config, view: CatalogView, limit: usize) -> Result<()> {
    let client = build_client(&config, None)?;
    let games = client.catalog(&view, limit).await;
    info!("{} view returned {} games", view.name(), games.len());
    print_json(&games)
}

pub async fn top_sellers(config: Config, country: String) -> Result<()> {
    let client = build_client(&config, None)?;
    let sellers = client.get_store_top_sellers(&country).await?;
    print_json(&sellers)
}

pub async fn charts(config: Config) -> Result<()> {
    let client = build_client(&config, None)?;
    let chart = client.get_games_by_concurrent_players().await?;
    print_json(&chart)
}

pub async fn current_players(config: Config, appid: AppId) -> Result<()> {
    let client = build_client(&config, None)?;
    let players = client.get_number_of_current_players(appid).await?;
    print_json(&players)
}
