//! URL construction for store, community and Web API endpoints

use url::form_urlencoded::byte_serialize;

use crate::config::SteamConfig;
use crate::types::AppId;

/// Query marker that makes the community page believe we came from the age check
pub const AGE_GATE_BYPASS_MARKER: &str = "snr=1_agecheck_agecheck__age-gate";

/// Base URLs resolved from configuration
#[derive(Debug, Clone)]
pub struct Endpoints {
    store: String,
    community: String,
    api: String,
    language: String,
}

impl Endpoints {
    pub fn new(config: &SteamConfig) -> Self {
        Self {
            store: config.store_base_url.trim_end_matches('/').to_string(),
            community: config.community_base_url.trim_end_matches('/').to_string(),
            api: config.api_base_url.trim_end_matches('/').to_string(),
            language: config.language.clone(),
        }
    }

    pub fn store_base(&self) -> &str {
        &self.store
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn store_page(&self, appid: AppId) -> String {
        format!("{}/app/{}/?l={}", self.store, appid, self.language)
    }

    /// Store search page with a prebuilt query string
    pub fn search(&self, query: &str) -> String {
        format!("{}/search/?{}", self.store, query)
    }

    pub fn app_details(&self, appid: AppId, language: &str, country: &str) -> String {
        format!(
            "{}/api/appdetails?appids={}&l={}&cc={}",
            self.store, appid, language, country
        )
    }

    pub fn age_check_submit(&self, appid: AppId) -> String {
        format!("{}/agecheckset/app/{}/", self.store, appid)
    }

    pub fn community(&self, appid: AppId, section: Option<&str>) -> String {
        match section.map(|s| s.trim_matches('/')).filter(|s| !s.is_empty()) {
            Some(section) => format!("{}/app/{}/{}", self.community, appid, section),
            None => format!("{}/app/{}", self.community, appid),
        }
    }

    pub fn app_list(&self) -> String {
        format!("{}/ISteamApps/GetAppList/v2/", self.api)
    }

    pub fn current_players(&self, appid: AppId) -> String {
        format!(
            "{}/ISteamUserStats/GetNumberOfCurrentPlayers/v1/?appid={}",
            self.api, appid
        )
    }

    /// Protobuf service method URL with the encoded request attached
    pub fn service_method(&self, service: &str, method: &str, encoded: &str) -> String {
        format!(
            "{}/{}/{}/v1/?input_protobuf_encoded={}",
            self.api,
            service,
            method,
            encode_component(encoded)
        )
    }
}

/// Append the age-gate bypass marker to a URL
pub fn with_bypass_marker(url: &str) -> String {
    let sep = if url.contains('?') { '&' } else { '?' };
    format!("{}{}{}", url, sep, AGE_GATE_BYPASS_MARKER)
}

/// Percent-encode a query component
pub fn encode_component(value: &str) -> String {
    byte_serialize(value.as_bytes()).collect()
}
