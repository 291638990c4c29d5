//! Store page scraping configuration

use serde::{Deserialize, Serialize};

use crate::steam::extractor::Capability;

/// Store page scraping configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrapingConfig {
    /// Extraction strategy used for store pages
    pub strategy: Capability,
}
