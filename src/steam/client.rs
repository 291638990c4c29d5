//! The Steam client: store pages, Web API, community pages and catalog views
//!
//! A [`SteamClient`] holds no mutable state. Build it once and share it
//! behind an `Arc`.

use std::sync::Arc;

use serde_json::Value;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use super::age_gate::{AgeGate, RandomSessionIds, SessionIdSource};
use super::api::{
    language_currency, ApiAppDetails, AppDetailsEnvelope, AppListEntry, AppListResponse,
    CurrentPlayers, CurrentPlayersResponse,
};
use super::catalog::{collect_sequential, extract_app_ids, sort_discounted, CatalogView};
use super::endpoints::Endpoints;
use super::extractor::{Capability, PageScraper};
use super::fetcher::{FetchClient, FetchConfig, FetchError, HttpTransport, ReqwestTransport};
use super::proto::{
    decode_response, encode_request, ConcurrentPlayersRequest, ConcurrentPlayersResponse,
    StoreBrowseContext, StoreBrowseItemDataRequest, WeeklyTopSellersRequest,
    WeeklyTopSellersResponse,
};
use super::reconcile::reconcile_sources;
use crate::config::SteamConfig;
use crate::types::{AppId, GameRecord, PartialGameRecord};

const TOP_SELLERS_PAGE_SIZE: i32 = 20;
const STEAM_REALM_GLOBAL: i32 = 1;

/// Failures of the Web API calls that have no graceful fallback
#[derive(Debug, Error)]
pub enum SteamError {
    #[error("cannot fetch Steam game list: {0}")]
    AppList(#[source] FetchError),
    #[error("cannot fetch current players for app {appid}: {source}")]
    CurrentPlayers {
        appid: AppId,
        #[source]
        source: FetchError,
    },
    #[error("Steam top sellers request failed: {0}")]
    TopSellers(#[source] FetchError),
    #[error("Steam Charts API request failed: {0}")]
    Charts(#[source] FetchError),
}

impl SteamError {
    pub fn fetch_error(&self) -> &FetchError {
        match self {
            Self::AppList(e) | Self::TopSellers(e) | Self::Charts(e) => e,
            Self::CurrentPlayers { source, .. } => source,
        }
    }

    pub fn status(&self) -> Option<u16> {
        self.fetch_error().status()
    }
}

/// Shared client for every Steam surface
pub struct SteamClient {
    config: SteamConfig,
    endpoints: Endpoints,
    fetcher: FetchClient,
    scraper: PageScraper,
    session_ids: Arc<dyn SessionIdSource>,
}

impl SteamClient {
    /// Client over a pooled reqwest transport
    pub fn new(config: &SteamConfig, capability: Capability) -> Result<Self, FetchError> {
        let transport = ReqwestTransport::new(&FetchConfig::from(config))?;
        Ok(Self::with_transport(config, capability, Arc::new(transport)))
    }

    pub fn with_transport(
        config: &SteamConfig,
        capability: Capability,
        transport: Arc<dyn HttpTransport>,
    ) -> Self {
        info!(
            strategy = ?capability,
            language = %config.language,
            api_key = config.api_key().is_some(),
            "Steam client ready"
        );
        Self {
            config: config.clone(),
            endpoints: Endpoints::new(config),
            fetcher: FetchClient::new(transport),
            scraper: PageScraper::new(capability),
            session_ids: Arc::new(RandomSessionIds),
        }
    }

    /// Replace the age-check session id generator
    pub fn with_session_ids(mut self, session_ids: Arc<dyn SessionIdSource>) -> Self {
        self.session_ids = session_ids;
        self
    }

    pub fn config(&self) -> &SteamConfig {
        &self.config
    }

    pub fn capability(&self) -> Capability {
        self.scraper.capability()
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    /// Raw store page HTML
    pub async fn get_store_page_html(&self, appid: AppId) -> Result<String, FetchError> {
        self.fetcher.get_text(&self.endpoints.store_page(appid)).await
    }

    /// Scrape the store page. Fetch failures and nameless pages give `None`.
    pub async fn scrape_game_page(&self, appid: AppId) -> Option<PartialGameRecord> {
        match self.get_store_page_html(appid).await {
            Ok(html) => self.scraper.scrape(&html, appid),
            Err(e) => {
                warn!(appid, error = %e, "Store page fetch failed");
                None
            }
        }
    }

    async fn fetch_app_details(&self, appid: AppId, language: &str) -> Option<AppDetailsEnvelope> {
        let (language, country) = language_currency(language);
        let url = self.endpoints.app_details(appid, language, country);
        match self.fetcher.get_json::<AppDetailsEnvelope>(&url).await {
            Ok(envelope) => Some(envelope),
            Err(e) => {
                warn!(appid, error = %e, "appdetails request failed");
                None
            }
        }
    }

    /// Unmodified `data` payload from `appdetails`, or `None`
    pub async fn get_api_game_details(&self, appid: AppId, language: &str) -> Option<Value> {
        let envelope = self.fetch_app_details(appid, language).await?;
        let entry = envelope.get(&appid.to_string())?;
        if !entry.success {
            debug!(appid, "appdetails reported no success");
            return None;
        }
        entry.data.clone()
    }

    async fn api_layer(&self, appid: AppId) -> Option<PartialGameRecord> {
        let envelope = self.fetch_app_details(appid, self.endpoints.language()).await?;
        let details = ApiAppDetails::from_envelope(&envelope, appid);
        if details.is_none() {
            debug!(appid, "appdetails entry missing or malformed");
        }
        details.map(|d| d.api_layer(appid))
    }

    /// Reconciled record from the Web API and the store page.
    ///
    /// `None` covers both "no such game" and "every source failed".
    pub async fn get_game_details(&self, appid: AppId) -> Option<GameRecord> {
        let api = self.api_layer(appid).await;
        let scraped = self.scrape_game_page(appid).await;
        let record = reconcile_sources(appid, api, scraped);
        if record.is_none() {
            debug!(appid, "No source produced a named record");
        }
        record
    }

    /// Community hub HTML, through the age gate when needed
    pub async fn get_game_community_html(
        &self,
        appid: AppId,
        section: Option<&str>,
    ) -> Result<String, FetchError> {
        let gate = AgeGate::new(&self.fetcher, &self.endpoints, self.session_ids.as_ref());
        let page = gate.fetch(appid, section).await?;
        debug!(appid, resolution = ?page.resolution, "Community page fetched");
        Ok(page.html)
    }

    pub async fn get_all_games(&self) -> Result<Vec<AppListEntry>, SteamError> {
        let response: AppListResponse = self
            .fetcher
            .get_json(&self.endpoints.app_list())
            .await
            .map_err(|e| {
                error!(error = %e, "GetAppList failed");
                SteamError::AppList(e)
            })?;
        info!(count = response.applist.apps.len(), "Fetched Steam app list");
        Ok(response.applist.apps)
    }

    pub async fn get_number_of_current_players(
        &self,
        appid: AppId,
    ) -> Result<CurrentPlayers, SteamError> {
        let response: CurrentPlayersResponse = self
            .fetcher
            .get_json(&self.endpoints.current_players(appid))
            .await
            .map_err(|source| SteamError::CurrentPlayers { appid, source })?;
        Ok(response.response)
    }

    fn browse_context(&self, country: &str) -> StoreBrowseContext {
        StoreBrowseContext {
            language: Some(self.endpoints.language().to_string()),
            elanguage: None,
            country_code: Some(country.to_string()),
            steam_realm: Some(STEAM_REALM_GLOBAL),
        }
    }

    /// Weekly top sellers for a country code such as `US` or `CN`
    pub async fn get_store_top_sellers(
        &self,
        country: &str,
    ) -> Result<WeeklyTopSellersResponse, SteamError> {
        let country = country.trim().to_uppercase();
        let request = WeeklyTopSellersRequest {
            country_code: Some(country.clone()),
            context: Some(self.browse_context(&country)),
            data_request: Some(StoreBrowseItemDataRequest::listing()),
            start_date: None,
            page_start: Some(0),
            page_count: Some(TOP_SELLERS_PAGE_SIZE),
        };
        let url = self.endpoints.service_method(
            "IStoreTopSellersService",
            "GetWeeklyTopSellers",
            &encode_request(&request),
        );
        let bytes = self
            .fetcher
            .get_bytes(&url)
            .await
            .map_err(SteamError::TopSellers)?;
        let response: WeeklyTopSellersResponse =
            decode_response(&bytes).map_err(SteamError::TopSellers)?;
        debug!(country = %country, ranks = response.ranks.len(), "Decoded top sellers");
        Ok(response)
    }

    /// Games ranked by concurrent players
    pub async fn get_games_by_concurrent_players(
        &self,
    ) -> Result<ConcurrentPlayersResponse, SteamError> {
        let request = ConcurrentPlayersRequest {
            context: Some(self.browse_context("US")),
            data_request: None,
        };
        let url = self.endpoints.service_method(
            "ISteamChartsService",
            "GetGamesByConcurrentPlayers",
            &encode_request(&request),
        );
        let bytes = self.fetcher.get_bytes(&url).await.map_err(|e| {
            error!(error = %e, "Steam Charts request failed");
            SteamError::Charts(e)
        })?;
        decode_response(&bytes).map_err(SteamError::Charts)
    }

    /// Run a catalog view: search crawl, then one detail fetch per id.
    ///
    /// Never fails; a failed search fetch yields an empty list.
    pub async fn catalog(&self, view: &CatalogView, limit: usize) -> Vec<GameRecord> {
        let url = self
            .endpoints
            .search(&view.query(self.endpoints.language()));
        let html = match self.fetcher.get_text(&url).await {
            Ok(html) => html,
            Err(e) => {
                error!(view = view.name(), error = %e, "Catalog search fetch failed");
                return Vec::new();
            }
        };

        let ids = extract_app_ids(&html, limit);
        debug!(view = view.name(), candidates = ids.len(), "Catalog candidates");
        let client = self;
        let records = collect_sequential(&ids, move |appid| client.get_game_details(appid)).await;

        match view {
            CatalogView::Discounted => sort_discounted(records),
            _ => records,
        }
    }

    pub async fn get_popular_games(&self, limit: usize) -> Vec<GameRecord> {
        self.catalog(&CatalogView::Popular, limit).await
    }

    pub async fn get_discounted_games(&self, limit: usize) -> Vec<GameRecord> {
        self.catalog(&CatalogView::Discounted, limit).await
    }

    pub async fn get_upcoming_games(&self, limit: usize) -> Vec<GameRecord> {
        self.catalog(&CatalogView::Upcoming, limit).await
    }

    pub async fn search_games(&self, query: &str, limit: usize) -> Vec<GameRecord> {
        self.catalog(&CatalogView::Search(query.to_string()), limit)
            .await
    }

    pub async fn get_games_by_category(&self, category: &str, limit: usize) -> Vec<GameRecord> {
        self.catalog(&CatalogView::Category(category.to_string()), limit)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::steam::extractor::fixtures;
    use crate::steam::fetcher::HttpResponse;
    use crate::steam::proto::{ConcurrentPlayersRank, PurchaseOption, StoreItem, TopSellerRank};
    use crate::steam::testing::MockTransport;
    use crate::types::DataSource;
    use prost::Message;

    const API_WITCHER: &str = r#"{"292030":{"success":true,"data":{
        "type":"game","name":"The Witcher 3: Wild Hunt","steam_appid":292030,
        "developers":["CD PROJEKT RED"],"publishers":["CD PROJEKT RED"],
        "release_date":{"coming_soon":false,"date":"2015-01-01"},
        "header_image":"https://cdn/header.jpg"}}}"#;
    const API_MISSING: &str = r#"{"999":{"success":false}}"#;

    fn client(transport: Arc<MockTransport>) -> SteamClient {
        SteamClient::with_transport(&SteamConfig::default(), Capability::StreamingDom, transport)
    }

    fn search_page(ids: &[AppId]) -> String {
        ids.iter()
            .map(|id| {
                format!(
                    r#"<a href="https://store.steampowered.com/app/{id}/Game/?snr=1" class="search_result_row">{id}</a>"#
                )
            })
            .collect()
    }

    fn store_page(name: &str, discount: Option<u32>) -> String {
        let discount = discount
            .map(|d| format!(r#"<div class="discount_pct">-{}%</div>"#, d))
            .unwrap_or_default();
        format!(r#"<html><body><div class="apphub_AppName">{}</div>{}</body></html>"#, name, discount)
    }

    #[tokio::test]
    async fn test_game_details_prefers_scraped_fields() {
        let transport = Arc::new(
            MockTransport::new()
                .on_get("appdetails?appids=292030&", HttpResponse::new(200, API_WITCHER))
                .on_get("/app/292030/", HttpResponse::new(200, fixtures::WITCHER3)),
        );
        let record = client(transport.clone()).get_game_details(292030).await.unwrap();

        assert_eq!(record.appid, 292030);
        assert_eq!(record.name, "The Witcher 3: Wild Hunt");
        assert_eq!(record.details.release_date.as_deref(), Some("2015年5月18日"));
        assert_eq!(record.details.data_source, Some(DataSource::SteamStorePage));

        let urls = transport.urls();
        assert!(urls[0].contains("l=schinese&cc=cn"));
        assert!(urls[1].ends_with("/app/292030/?l=schinese"));
    }

    #[tokio::test]
    async fn test_game_details_none_without_any_name() {
        let transport = Arc::new(
            MockTransport::new()
                .on_get("appdetails?appids=999&", HttpResponse::new(200, API_MISSING))
                .on_get("/app/999/", HttpResponse::new(200, fixtures::NOT_FOUND)),
        );
        assert!(client(transport).get_game_details(999).await.is_none());
    }

    #[tokio::test]
    async fn test_game_details_survives_api_failure() {
        let transport = Arc::new(
            MockTransport::new()
                .on_get("appdetails", HttpResponse::new(500, ""))
                .on_get("/app/730/", HttpResponse::new(200, fixtures::CS2)),
        );
        let record = client(transport).get_game_details(730).await.unwrap();
        assert_eq!(record.name, "Counter-Strike 2");
        assert!(record.details.is_free);
    }

    #[tokio::test]
    async fn test_api_game_details_returns_raw_data() {
        let transport = Arc::new(
            MockTransport::new().on_get("appdetails", HttpResponse::new(200, API_WITCHER)),
        );
        let client = client(transport.clone());
        let data = client.get_api_game_details(292030, "english").await.unwrap();
        assert_eq!(data["developers"][0], "CD PROJEKT RED");
        assert!(transport.urls()[0].contains("l=english&cc=us"));

        assert!(client.get_api_game_details(1, "english").await.is_none());
    }

    #[tokio::test]
    async fn test_discounted_catalog_sorts_and_omits_failures() {
        let transport = Arc::new(
            MockTransport::new()
                .on_get("/search/", HttpResponse::new(200, search_page(&[1, 2, 3, 4, 5])))
                .on_get("appdetails", HttpResponse::new(500, ""))
                .on_get("/app/1/", HttpResponse::new(200, store_page("One", Some(10))))
                .on_get("/app/2/", HttpResponse::new(200, store_page("Two", Some(50))))
                .fail_get("/app/3/", "connection reset")
                .on_get("/app/4/", HttpResponse::new(200, store_page("Four", Some(25))))
                .on_get("/app/5/", HttpResponse::new(200, store_page("Five", None))),
        );
        let games = client(transport.clone()).get_discounted_games(50).await;

        let discounts: Vec<_> = games.iter().map(|g| g.details.discount_value()).collect();
        assert_eq!(discounts, vec![50, 25, 10]);

        let urls = transport.urls();
        assert!(urls[0].contains("/search/?specials=1&ndl=1&l=schinese"));
        let store_order: Vec<_> = urls
            .iter()
            .filter(|u| u.contains("/app/"))
            .map(|u| u.split("/app/").nth(1).unwrap_or_default().to_string())
            .collect();
        assert_eq!(store_order, vec!["1/?l=schinese", "2/?l=schinese", "3/?l=schinese", "4/?l=schinese", "5/?l=schinese"]);
    }

    #[tokio::test]
    async fn test_catalog_respects_limit_and_search_failure() {
        let transport = Arc::new(
            MockTransport::new()
                .on_get("/search/", HttpResponse::new(200, search_page(&[7, 8, 9])))
                .on_get("appdetails", HttpResponse::new(500, ""))
                .on_get("/app/", HttpResponse::new(200, store_page("Game", None))),
        );
        let games = client(transport).search_games("witcher", 2).await;
        assert_eq!(games.iter().map(|g| g.appid).collect::<Vec<_>>(), vec![7, 8]);

        let failing = Arc::new(MockTransport::new().on_get("/search/", HttpResponse::new(503, "")));
        assert!(client(failing).get_popular_games(20).await.is_empty());
    }

    #[tokio::test]
    async fn test_app_list_failure_message() {
        let transport = Arc::new(
            MockTransport::new().on_get("GetAppList", HttpResponse::new(502, "")),
        );
        let err = client(transport).get_all_games().await.unwrap_err();
        assert!(err.to_string().starts_with("cannot fetch Steam game list"));
        assert_eq!(err.status(), Some(502));
    }

    #[tokio::test]
    async fn test_current_players() {
        let transport = Arc::new(MockTransport::new().on_get(
            "GetNumberOfCurrentPlayers",
            HttpResponse::new(200, r#"{"response":{"player_count":812345,"result":1}}"#),
        ));
        let players = client(transport.clone())
            .get_number_of_current_players(730)
            .await
            .unwrap();
        assert_eq!(players.player_count, Some(812_345));
        assert!(transport.urls()[0].ends_with("?appid=730"));
    }

    #[tokio::test]
    async fn test_top_sellers_decodes_protobuf() {
        let body = WeeklyTopSellersResponse {
            start_date: Some(1_700_000_000),
            ranks: vec![TopSellerRank {
                rank: Some(1),
                appid: Some(730),
                item: Some(StoreItem {
                    name: Some("Counter-Strike 2".to_string()),
                    best_purchase_option: Some(PurchaseOption {
                        final_price_in_cents: Some(0),
                        ..Default::default()
                    }),
                    ..Default::default()
                }),
                ..Default::default()
            }],
            next_page_start: Some(20),
        }
        .encode_to_vec();
        let transport = Arc::new(
            MockTransport::new().on_get("GetWeeklyTopSellers", HttpResponse::new(200, body)),
        );
        let response = client(transport.clone()).get_store_top_sellers("us").await.unwrap();
        assert_eq!(response.ranks[0].appid, Some(730));
        assert!(transport.urls()[0].contains("input_protobuf_encoded="));

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["ranks"][0]["item"]["bestPurchaseOption"]["finalPriceInCents"], "0");
    }

    #[tokio::test]
    async fn test_charts() {
        let body = ConcurrentPlayersResponse {
            last_update: Some(1_700_000_000),
            ranks: vec![ConcurrentPlayersRank {
                rank: Some(1),
                appid: Some(730),
                concurrent_in_game: Some(1_200_000),
                peak_in_game: Some(1_500_000),
            }],
        }
        .encode_to_vec();
        let transport = Arc::new(
            MockTransport::new()
                .on_get("GetGamesByConcurrentPlayers", HttpResponse::new(200, body)),
        );
        let charts = client(transport).get_games_by_concurrent_players().await.unwrap();
        assert_eq!(charts.ranks[0].concurrent_in_game, Some(1_200_000));

        let failing = Arc::new(
            MockTransport::new().on_get("GetGamesByConcurrentPlayers", HttpResponse::new(500, "")),
        );
        let err = client(failing).get_games_by_concurrent_players().await.unwrap_err();
        assert!(err.to_string().contains("Steam Charts API request failed"));
    }
}
