//! Configuration for steam-fetch

mod http;
mod logging;
mod scraping;
mod steam;
mod storage;

pub use http::HttpConfig;
pub use logging::{LogFormat, LogLevel, LoggingConfig};
pub use scraping::ScrapingConfig;
pub use steam::SteamConfig;
pub use storage::StorageConfig;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default user agent for Web API requests
pub const DEFAULT_USER_AGENT: &str = concat!("steam-fetch/", env!("CARGO_PKG_VERSION"));

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Steam endpoints and client settings
    #[serde(default)]
    pub steam: SteamConfig,
    /// Store page scraping
    #[serde(default)]
    pub scraping: ScrapingConfig,
    /// HTTP API server
    #[serde(default)]
    pub server: HttpConfig,
    /// Local games table
    #[serde(default)]
    pub storage: StorageConfig,
    /// Logging
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file and validate it.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Failed to read config file '{}': {}", path.display(), e))?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Failed to parse config file '{}': {}", path.display(), e))?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `STEAM_API_KEY`, `STEAM_RATE_LIMIT`, `STEAM_CACHE_TTL` and `LOG_LEVEL`.
    ///
    /// Returns one message per ignored variable so the caller can log them
    /// once a subscriber is installed.
    pub fn apply_env_overrides(&mut self) -> Vec<String> {
        self.apply_overrides_from(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary variable lookup.
    ///
    /// Unparseable numbers keep the configured value.
    pub fn apply_overrides_from<F>(&mut self, lookup: F) -> Vec<String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut ignored = Vec::new();
        if let Some(key) = lookup("STEAM_API_KEY") {
            self.steam.api_key = Some(key);
        }
        if let Some(raw) = lookup("STEAM_RATE_LIMIT") {
            match raw.trim().parse::<u32>() {
                Ok(v) if v > 0 => self.steam.rate_limit = v,
                _ => ignored.push(format!("Ignoring invalid STEAM_RATE_LIMIT '{}'", raw)),
            }
        }
        if let Some(raw) = lookup("STEAM_CACHE_TTL") {
            match raw.trim().parse::<u64>() {
                Ok(v) if v > 0 => self.steam.cache_ttl_secs = v,
                _ => ignored.push(format!("Ignoring invalid STEAM_CACHE_TTL '{}'", raw)),
            }
        }
        if let Some(raw) = lookup("LOG_LEVEL") {
            match raw.parse::<LogLevel>() {
                Ok(level) => self.logging.level = level,
                Err(e) => ignored.push(format!("Ignoring LOG_LEVEL: {}", e)),
            }
        }
        ignored
    }

    /// Validate all configuration fields.
    ///
    /// Collects all validation errors and reports them together.
    pub fn validate(&self) -> Result<()> {
        let mut errors: Vec<String> = Vec::new();

        for (name, value) in [
            ("store_base_url", &self.steam.store_base_url),
            ("community_base_url", &self.steam.community_base_url),
            ("api_base_url", &self.steam.api_base_url),
        ] {
            if let Err(e) = url::Url::parse(value) {
                errors.push(format!("steam.{} is not a valid URL ({}): {}", name, e, value));
            }
        }
        if self.steam.language.trim().is_empty() {
            errors.push("steam.language must not be empty".to_string());
        }
        if self.steam.rate_limit == 0 {
            errors.push("steam.rate_limit must be positive".to_string());
        }
        if self.steam.request_timeout_secs == 0 {
            errors.push("steam.request_timeout_secs must be positive".to_string());
        }

        if let Some(port_str) = self.server.listen_addr.rsplit(':').next() {
            match port_str.parse::<u32>() {
                Ok(port) if port == 0 || port > 65535 => errors.push(format!(
                    "HTTP listen port must be between 1 and 65535, got {}",
                    port
                )),
                Ok(_) => {}
                Err(_) => errors.push(format!(
                    "server.listen_addr must be host:port, got '{}'",
                    self.server.listen_addr
                )),
            }
        }

        if self.storage.data_dir.as_os_str().is_empty() {
            errors.push("storage.data_dir must not be empty".to_string());
        }
        if self.storage.sync_batch_size == 0 {
            errors.push("storage.sync_batch_size must be positive".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            anyhow::bail!(
                "Configuration validation failed:\n  - {}",
                errors.join("\n  - ")
            );
        }
    }
}
