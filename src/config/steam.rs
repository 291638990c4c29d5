//! Steam endpoint and client configuration

use serde::{Deserialize, Serialize};

use super::DEFAULT_USER_AGENT;

/// Steam client configuration
///
/// `api_key`, `rate_limit` and `cache_ttl_secs` are carried through to the
/// client but not enforced by it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SteamConfig {
    /// Steam Web API key (optional for every endpoint currently used)
    pub api_key: Option<String>,
    /// Requests per minute budget
    pub rate_limit: u32,
    /// Cache lifetime for fetched records (seconds)
    pub cache_ttl_secs: u64,
    /// Store language used for scraping and search pages
    pub language: String,
    /// Store front base URL
    pub store_base_url: String,
    /// Community base URL
    pub community_base_url: String,
    /// Web API base URL
    pub api_base_url: String,
    /// User agent for API requests
    pub user_agent: String,
    /// Request timeout (seconds)
    pub request_timeout_secs: u64,
    /// Connect timeout (seconds)
    pub connect_timeout_secs: u64,
}

impl Default for SteamConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            rate_limit: 100,
            cache_ttl_secs: 3600,
            language: "schinese".to_string(),
            store_base_url: "https://store.steampowered.com".to_string(),
            community_base_url: "https://steamcommunity.com".to_string(),
            api_base_url: "https://api.steampowered.com".to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            request_timeout_secs: 30,
            connect_timeout_secs: 10,
        }
    }
}

impl SteamConfig {
    /// Configured API key, ignoring blank values
    pub fn api_key(&self) -> Option<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
    }
}
