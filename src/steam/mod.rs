//! Steam data access
//!
//! Store pages are scraped, the Web API is queried, and both are reconciled
//! into a single [`GameRecord`](crate::types::GameRecord). Community pages
//! are fetched through the age gate, and the protobuf service endpoints are
//! decoded into serializable structures.

pub mod age_gate;
pub mod api;
pub mod catalog;
pub mod client;
pub mod endpoints;
pub mod extractor;
pub mod fetcher;
pub mod proto;
pub mod reconcile;
pub mod rules;

#[cfg(test)]
pub(crate) mod testing;

pub use age_gate::{is_interstitial, RandomSessionIds, SeededSessionIds, SessionIdSource};
pub use api::{AppListEntry, CurrentPlayers};
pub use catalog::{CatalogView, Category};
pub use client::{SteamClient, SteamError};
pub use extractor::{Capability, PageScraper};
pub use fetcher::{FetchError, HttpRequest, HttpResponse, HttpTransport, Method};
pub use proto::{ConcurrentPlayersResponse, WeeklyTopSellersResponse};
