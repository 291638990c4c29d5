//! Protobuf wire messages for the Steam service endpoints
//!
//! Only the fields this crate reads are declared; unknown fields on the wire
//! are skipped by prost. JSON output follows the camelCase convention used by
//! Steam's web clients, with 64-bit integers written as strings.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use prost::Message;
use serde::{Serialize, Serializer};

use super::fetcher::FetchError;

fn int64_as_string<S: Serializer>(value: &Option<i64>, serializer: S) -> Result<S::Ok, S::Error> {
    match value {
        Some(v) => serializer.serialize_str(&v.to_string()),
        None => serializer.serialize_none(),
    }
}

#[derive(Clone, PartialEq, Message, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreBrowseContext {
    #[prost(string, optional, tag = "1")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[prost(int32, optional, tag = "2")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub elanguage: Option<i32>,
    #[prost(string, optional, tag = "3")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country_code: Option<String>,
    #[prost(int32, optional, tag = "4")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub steam_realm: Option<i32>,
}

#[derive(Clone, PartialEq, Message, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreBrowseItemDataRequest {
    #[prost(bool, optional, tag = "1")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub include_assets: Option<bool>,
    #[prost(bool, optional, tag = "2")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub include_release: Option<bool>,
    #[prost(bool, optional, tag = "3")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub include_platforms: Option<bool>,
    #[prost(bool, optional, tag = "4")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub include_all_purchase_options: Option<bool>,
    #[prost(bool, optional, tag = "10")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub include_basic_info: Option<bool>,
}

impl StoreBrowseItemDataRequest {
    /// Enough data to show name, artwork and price
    pub fn listing() -> Self {
        Self {
            include_assets: Some(true),
            include_release: Some(true),
            include_platforms: Some(true),
            include_all_purchase_options: Some(true),
            include_basic_info: Some(true),
        }
    }
}

#[derive(Clone, PartialEq, Message, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseOption {
    #[prost(int32, optional, tag = "1")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub packageid: Option<i32>,
    #[prost(int32, optional, tag = "2")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bundleid: Option<i32>,
    #[prost(string, optional, tag = "3")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub purchase_option_name: Option<String>,
    #[prost(int64, optional, tag = "5")]
    #[serde(serialize_with = "int64_as_string", skip_serializing_if = "Option::is_none")]
    pub final_price_in_cents: Option<i64>,
    #[prost(int64, optional, tag = "6")]
    #[serde(serialize_with = "int64_as_string", skip_serializing_if = "Option::is_none")]
    pub original_price_in_cents: Option<i64>,
    #[prost(string, optional, tag = "8")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub formatted_final_price: Option<String>,
    #[prost(string, optional, tag = "9")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub formatted_original_price: Option<String>,
    #[prost(int32, optional, tag = "10")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discount_pct: Option<i32>,
}

#[derive(Clone, PartialEq, Message, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreItem {
    #[prost(int32, optional, tag = "1")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item_type: Option<i32>,
    #[prost(uint32, optional, tag = "2")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<u32>,
    #[prost(uint32, optional, tag = "3")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub success: Option<u32>,
    #[prost(bool, optional, tag = "4")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visible: Option<bool>,
    #[prost(string, optional, tag = "6")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[prost(uint32, optional, tag = "9")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub appid: Option<u32>,
    #[prost(message, optional, tag = "40")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub best_purchase_option: Option<PurchaseOption>,
}

#[derive(Clone, PartialEq, Message, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeeklyTopSellersRequest {
    #[prost(string, optional, tag = "1")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country_code: Option<String>,
    #[prost(message, optional, tag = "2")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<StoreBrowseContext>,
    #[prost(message, optional, tag = "3")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_request: Option<StoreBrowseItemDataRequest>,
    #[prost(uint32, optional, tag = "4")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<u32>,
    #[prost(int32, optional, tag = "5")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_start: Option<i32>,
    #[prost(int32, optional, tag = "6")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_count: Option<i32>,
}

#[derive(Clone, PartialEq, Message, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopSellerRank {
    #[prost(int32, optional, tag = "1")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rank: Option<i32>,
    #[prost(uint32, optional, tag = "2")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub appid: Option<u32>,
    #[prost(message, optional, tag = "3")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item: Option<StoreItem>,
    #[prost(int32, optional, tag = "4")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_week_rank: Option<i32>,
    #[prost(int32, optional, tag = "5")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub consecutive_weeks: Option<i32>,
    #[prost(bool, optional, tag = "6")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_top: Option<bool>,
}

#[derive(Clone, PartialEq, Message, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeeklyTopSellersResponse {
    #[prost(uint32, optional, tag = "1")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<u32>,
    #[prost(message, repeated, tag = "2")]
    pub ranks: Vec<TopSellerRank>,
    #[prost(int32, optional, tag = "3")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_page_start: Option<i32>,
}

#[derive(Clone, PartialEq, Message, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConcurrentPlayersRequest {
    #[prost(message, optional, tag = "1")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<StoreBrowseContext>,
    #[prost(message, optional, tag = "2")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_request: Option<StoreBrowseItemDataRequest>,
}

#[derive(Clone, PartialEq, Message, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConcurrentPlayersRank {
    #[prost(int32, optional, tag = "1")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rank: Option<i32>,
    #[prost(uint32, optional, tag = "2")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub appid: Option<u32>,
    #[prost(uint32, optional, tag = "3")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub concurrent_in_game: Option<u32>,
    #[prost(uint32, optional, tag = "4")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub peak_in_game: Option<u32>,
}

#[derive(Clone, PartialEq, Message, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConcurrentPlayersResponse {
    #[prost(uint32, optional, tag = "1")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_update: Option<u32>,
    #[prost(message, repeated, tag = "2")]
    pub ranks: Vec<ConcurrentPlayersRank>,
}

/// Base64 of the binary request, ready for `input_protobuf_encoded`
pub fn encode_request<M: Message>(request: &M) -> String {
    STANDARD.encode(request.encode_to_vec())
}

pub fn decode_response<M: Message + Default>(bytes: &[u8]) -> Result<M, FetchError> {
    M::decode(bytes).map_err(|e| FetchError::Decode(e.to_string()))
}
