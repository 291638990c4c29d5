//! HTTP API server configuration

use serde::{Deserialize, Serialize};

/// HTTP API server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Listen address for HTTP server (e.g., "0.0.0.0:3000")
    pub listen_addr: String,
    /// Enable CORS (useful for browser-based clients)
    pub cors_enabled: bool,
    /// Allowed origins when CORS is enabled (empty = any)
    pub cors_origins: Vec<String>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            listen_addr: "127.0.0.1:3000".to_string(),
            cors_enabled: false,
            cors_origins: Vec::new(),
        }
    }
}
