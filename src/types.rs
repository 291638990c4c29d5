//! Core types for steam-fetch

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Steam application identifier
pub type AppId = u32;

/// Where the bulk of a record's fields came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataSource {
    SteamApi,
    SteamStorePage,
}

/// Minimum/recommended requirement text for one platform
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RequirementBlock {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimum: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recommended: Option<String>,
}

impl RequirementBlock {
    pub fn is_empty(&self) -> bool {
        self.minimum.is_none() && self.recommended.is_none()
    }
}

/// Requirement blocks per platform
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SystemRequirements {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pc: Option<RequirementBlock>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mac: Option<RequirementBlock>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linux: Option<RequirementBlock>,
}

impl SystemRequirements {
    pub fn is_empty(&self) -> bool {
        [&self.pc, &self.mac, &self.linux]
            .iter()
            .all(|block| block.as_ref().map_or(true, RequirementBlock::is_empty))
    }
}

/// One entry of the detailed language list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LanguageSupport {
    pub language: String,
    #[serde(default)]
    pub full_audio: bool,
}

/// Every optional field of a game record.
///
/// Shared by partial (scraped, API-derived) and validated records. Loosely
/// typed upstream structures are kept as opaque JSON values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GameDetails {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub game_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub short_description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detailed_description: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_price: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_price: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discounted_price: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discount_percentage: Option<String>,
    pub is_on_sale: bool,
    pub is_free: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub release_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub developer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub publisher: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub review_summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub review_description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub review_score: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub review_count: Option<u64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub header_image: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub screenshots: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub movies: Vec<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background: Option<String>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub genres: Vec<Value>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub categories: Vec<Value>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub supported_platforms: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_requirements: Option<SystemRequirements>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub supported_languages: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub supported_languages_detailed: Vec<LanguageSupport>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub achievement_count: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub achievements: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub controller_support: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub dlc_list: Vec<AppId>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub full_dlc_list: Vec<Value>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub demos: Vec<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required_age: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_descriptors: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recommendations: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub support_info: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_overview: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metacritic: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub legal_notice: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ext_user_account_notice: Option<String>,
    pub is_upcoming: bool,
    pub is_early_access: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub scraped_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_source: Option<DataSource>,
}

/// Whether a field carries a value for merge purposes
trait FieldValue {
    fn is_unset(&self) -> bool;
}

impl<T> FieldValue for Option<T> {
    fn is_unset(&self) -> bool {
        self.is_none()
    }
}

impl<T> FieldValue for Vec<T> {
    fn is_unset(&self) -> bool {
        self.is_empty()
    }
}

/// Invokes `$apply!` with every non-boolean field of `GameDetails`.
macro_rules! detail_fields {
    ($apply:ident) => {
        $apply!(
            game_type,
            short_description,
            detailed_description,
            price,
            current_price,
            original_price,
            discounted_price,
            discount_percentage,
            release_date,
            developer,
            publisher,
            review_summary,
            review_description,
            review_score,
            review_count,
            header_image,
            screenshots,
            movies,
            background,
            tags,
            genres,
            categories,
            supported_platforms,
            system_requirements,
            supported_languages,
            supported_languages_detailed,
            achievement_count,
            achievements,
            controller_support,
            dlc_list,
            full_dlc_list,
            demos,
            required_age,
            content_descriptors,
            recommendations,
            support_info,
            price_overview,
            metacritic,
            legal_notice,
            ext_user_account_notice,
            scraped_at,
            data_source
        )
    };
}

impl GameDetails {
    /// Lay `layer` on top of `self`: every field `layer` sets replaces ours.
    ///
    /// Booleans are always taken from `layer`.
    pub fn overlay(&mut self, layer: GameDetails) {
        macro_rules! take_set {
            ($($field:ident),*) => {
                $(
                    if !layer.$field.is_unset() {
                        self.$field = layer.$field;
                    }
                )*
            };
        }
        detail_fields!(take_set);

        self.is_on_sale = layer.is_on_sale;
        self.is_free = layer.is_free;
        self.is_upcoming = layer.is_upcoming;
        self.is_early_access = layer.is_early_access;
    }

    /// Fill only the fields `self` has not set yet. Booleans are or-ed.
    pub fn fill_missing(&mut self, other: GameDetails) {
        macro_rules! take_unset {
            ($($field:ident),*) => {
                $(
                    if self.$field.is_unset() {
                        self.$field = other.$field;
                    }
                )*
            };
        }
        detail_fields!(take_unset);

        self.is_on_sale |= other.is_on_sale;
        self.is_free |= other.is_free;
        self.is_upcoming |= other.is_upcoming;
        self.is_early_access |= other.is_early_access;
    }

    /// Discount percentage as a number, zero when absent or unparseable
    pub fn discount_value(&self) -> u32 {
        self.discount_percentage
            .as_deref()
            .and_then(|pct| pct.trim().trim_start_matches('-').trim_end_matches('%').parse().ok())
            .unwrap_or(0)
    }
}

/// A record that may still lack its name
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PartialGameRecord {
    pub appid: AppId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(flatten)]
    pub details: GameDetails,
}

impl PartialGameRecord {
    pub fn new(appid: AppId) -> Self {
        Self {
            appid,
            ..Default::default()
        }
    }

    /// Name trimmed, or `None` when blank
    pub fn valid_name(&self) -> Option<&str> {
        self.name.as_deref().map(str::trim).filter(|n| !n.is_empty())
    }

    /// Validate into a full record. Missing name or zero appid yields `None`.
    pub fn into_record(self) -> Option<GameRecord> {
        if self.appid == 0 {
            return None;
        }
        let name = self.valid_name()?.to_string();
        Some(GameRecord {
            appid: self.appid,
            name,
            details: self.details,
        })
    }
}

/// The normalized, validated game record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameRecord {
    pub appid: AppId,
    pub name: String,
    #[serde(flatten)]
    pub details: GameDetails,
}
