//! steam-fetch: Steam game metadata proxy
//!
//! Collects game metadata from several Steam surfaces and serves it as one
//! normalized record:
//! - Store Web API (`appdetails`, app list, player counts)
//! - Store page scraping with DOM or regex extraction
//! - Community pages behind the age/content interstitial
//! - Protobuf service endpoints (top sellers, concurrent-player charts)
//! - A local sled-backed games table with app-list sync
//! - A REST API over all of the above

pub mod config;
pub mod http;
pub mod steam;
pub mod store;
pub mod sync;
pub mod types;

pub use config::Config;
pub use types::*;
