//! Store API payloads (`/api/appdetails`, `GetAppList`, `GetNumberOfCurrentPlayers`)
//!
//! The same app-details shape appears inside the store page JSON island, so
//! the mapping to [`GameDetails`] lives here too. Upstream is loose about
//! types (`required_age` is sometimes a string, requirement blocks are `[]`
//! when empty) so those fields stay as raw JSON until mapped.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::types::{
    AppId, DataSource, GameDetails, LanguageSupport, PartialGameRecord, RequirementBlock,
    SystemRequirements,
};

use super::rules::clean_text;

/// `appdetails` response: `{ "<appid>": { "success": bool, "data": {...} } }`
pub type AppDetailsEnvelope = HashMap<String, AppDetailsEntry>;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppDetailsEntry {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub data: Option<Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlatformFlags {
    #[serde(default)]
    pub windows: bool,
    #[serde(default)]
    pub mac: bool,
    #[serde(default)]
    pub linux: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiScreenshot {
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default)]
    pub path_thumbnail: Option<String>,
    #[serde(default)]
    pub path_full: Option<String>,
}

/// `release_date` is either a plain string or `{coming_soon, date}`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ReleaseDateField {
    Text(String),
    Nested {
        #[serde(default)]
        coming_soon: bool,
        #[serde(default)]
        date: Option<String>,
    },
}

impl ReleaseDateField {
    pub fn date(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text.as_str()),
            Self::Nested { date, .. } => date.as_deref(),
        }
    }

    pub fn coming_soon(&self) -> bool {
        matches!(self, Self::Nested { coming_soon: true, .. })
    }
}

/// The `data` object of an app-details entry
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiAppDetails {
    #[serde(rename = "type")]
    pub app_type: Option<String>,
    pub name: Option<String>,
    pub steam_appid: Option<AppId>,
    pub required_age: Option<Value>,
    pub is_free: Option<bool>,
    pub controller_support: Option<String>,
    pub dlc: Vec<Value>,
    #[serde(alias = "fullDlcList")]
    pub full_dlc_list: Vec<Value>,
    pub detailed_description: Option<String>,
    pub about_the_game: Option<String>,
    pub short_description: Option<String>,
    pub supported_languages: Option<String>,
    pub header_image: Option<String>,
    pub website: Option<String>,
    pub pc_requirements: Option<Value>,
    pub mac_requirements: Option<Value>,
    pub linux_requirements: Option<Value>,
    pub legal_notice: Option<String>,
    pub ext_user_account_notice: Option<String>,
    pub developers: Vec<String>,
    pub publishers: Vec<String>,
    pub demos: Vec<Value>,
    pub price_overview: Option<Value>,
    pub platforms: Option<PlatformFlags>,
    pub metacritic: Option<Value>,
    pub categories: Vec<Value>,
    pub genres: Vec<Value>,
    pub screenshots: Vec<ApiScreenshot>,
    pub movies: Vec<Value>,
    pub recommendations: Option<Value>,
    pub achievements: Option<Value>,
    pub release_date: Option<ReleaseDateField>,
    pub support_info: Option<Value>,
    pub background: Option<String>,
    pub content_descriptors: Option<Value>,
}

impl ApiAppDetails {
    /// Pull the app's entry out of an `appdetails` envelope.
    ///
    /// `None` when the entry is missing, unsuccessful, or malformed.
    pub fn from_envelope(envelope: &AppDetailsEnvelope, appid: AppId) -> Option<Self> {
        let entry = envelope.get(&appid.to_string())?;
        if !entry.success {
            return None;
        }
        serde_json::from_value(entry.data.clone()?).ok()
    }

    /// Normalized release date: the text form, else the nested date
    pub fn release_date_text(&self) -> Option<String> {
        self.release_date
            .as_ref()
            .and_then(ReleaseDateField::date)
            .and_then(clean_text)
    }

    pub fn screenshot_urls(&self) -> Vec<String> {
        self.screenshots
            .iter()
            .filter_map(|s| s.path_full.clone())
            .collect()
    }

    /// Narrow projection copied into a reconciled record
    pub fn api_layer(&self, appid: AppId) -> PartialGameRecord {
        PartialGameRecord {
            appid,
            name: self.name.clone(),
            details: GameDetails {
                developer: self.developers.first().cloned(),
                publisher: self.publishers.first().cloned(),
                release_date: self.release_date_text(),
                short_description: self.short_description.clone(),
                header_image: self.header_image.clone(),
                screenshots: self.screenshot_urls(),
                is_free: self.is_free.unwrap_or(false),
                data_source: Some(DataSource::SteamApi),
                ..Default::default()
            },
        }
    }

    /// Full projection used when the same payload is embedded in a store page
    pub fn island_layer(&self, appid: AppId) -> PartialGameRecord {
        let price = self.price_overview.as_ref();
        let discount = price
            .and_then(|p| p.get("discount_percent"))
            .and_then(Value::as_u64)
            .filter(|pct| *pct > 0);
        let formatted = |key: &str| {
            price
                .and_then(|p| p.get(key))
                .and_then(Value::as_str)
                .and_then(clean_text)
        };
        let (languages, languages_detailed) = self
            .supported_languages
            .as_deref()
            .map(parse_language_list)
            .unwrap_or_default();

        let achievements = self.achievements.clone();
        let achievement_count = achievements
            .as_ref()
            .and_then(|a| a.get("total"))
            .and_then(Value::as_u64)
            .filter(|total| *total > 0)
            .map(|total| total.to_string());

        let dlc_list = self
            .dlc
            .iter()
            .filter_map(Value::as_u64)
            .filter_map(|id| AppId::try_from(id).ok())
            .collect();

        PartialGameRecord {
            appid,
            name: self.name.clone(),
            details: GameDetails {
                game_type: self.app_type.clone(),
                short_description: self.short_description.clone(),
                detailed_description: self
                    .detailed_description
                    .clone()
                    .or_else(|| self.about_the_game.clone()),
                price: formatted("final_formatted"),
                current_price: formatted("final_formatted"),
                original_price: discount.and(formatted("initial_formatted")),
                discounted_price: discount.and(formatted("final_formatted")),
                discount_percentage: discount.map(|pct| pct.to_string()),
                is_on_sale: discount.is_some(),
                is_free: self.is_free.unwrap_or(false),
                release_date: self.release_date_text(),
                developer: self.developers.first().cloned(),
                publisher: self.publishers.first().cloned(),
                header_image: self.header_image.clone(),
                screenshots: self.screenshot_urls(),
                movies: self.movies.clone(),
                background: self.background.clone(),
                genres: self.genres.clone(),
                categories: self.categories.clone(),
                supported_platforms: self.platform_names(),
                system_requirements: self.system_requirements(),
                supported_languages: languages,
                supported_languages_detailed: languages_detailed,
                achievement_count,
                achievements,
                controller_support: self.controller_support.clone(),
                dlc_list,
                full_dlc_list: self.full_dlc_list.clone(),
                demos: self.demos.clone(),
                required_age: self.required_age.as_ref().and_then(parse_age),
                content_descriptors: self.content_descriptors.clone(),
                recommendations: self.recommendations.clone(),
                support_info: self.support_info.clone(),
                price_overview: self.price_overview.clone(),
                metacritic: self.metacritic.clone(),
                legal_notice: self.legal_notice.clone(),
                ext_user_account_notice: self.ext_user_account_notice.clone(),
                is_upcoming: self
                    .release_date
                    .as_ref()
                    .is_some_and(ReleaseDateField::coming_soon),
                ..Default::default()
            },
        }
    }

    fn platform_names(&self) -> Vec<String> {
        let Some(flags) = &self.platforms else {
            return Vec::new();
        };
        [
            (flags.windows, "windows"),
            (flags.mac, "mac"),
            (flags.linux, "linux"),
        ]
        .into_iter()
        .filter(|(supported, _)| *supported)
        .map(|(_, name)| name.to_string())
        .collect()
    }

    fn system_requirements(&self) -> Option<SystemRequirements> {
        let requirements = SystemRequirements {
            pc: self.pc_requirements.as_ref().and_then(requirement_block),
            mac: self.mac_requirements.as_ref().and_then(requirement_block),
            linux: self.linux_requirements.as_ref().and_then(requirement_block),
        };
        (!requirements.is_empty()).then_some(requirements)
    }
}

/// Requirement blocks arrive as `{minimum, recommended}` or as `[]` when absent
fn requirement_block(value: &Value) -> Option<RequirementBlock> {
    let object = value.as_object()?;
    let text = |key: &str| object.get(key).and_then(Value::as_str).and_then(clean_text);
    let block = RequirementBlock {
        minimum: text("minimum"),
        recommended: text("recommended"),
    };
    (!block.is_empty()).then_some(block)
}

fn parse_age(value: &Value) -> Option<u32> {
    match value {
        Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Split Steam's language HTML into a plain summary and a structured list.
///
/// Input looks like `English<strong>*</strong>, French<br><strong>*</strong>languages with full audio support`.
pub fn parse_language_list(html: &str) -> (Option<String>, Vec<LanguageSupport>) {
    let head = html
        .split("<br>")
        .next()
        .unwrap_or_default();
    let mut detailed = Vec::new();
    let mut names = Vec::new();
    for item in head.split(',') {
        let full_audio = item.contains('*');
        let Some(language) = clean_text(&strip_markup(item).replace('*', "")) else {
            continue;
        };
        names.push(language.clone());
        detailed.push(LanguageSupport {
            language,
            full_audio,
        });
    }
    let summary = (!names.is_empty()).then(|| names.join(", "));
    (summary, detailed)
}

fn strip_markup(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_tag = false;
    for c in text.chars() {
        match c {
            '<' => in_tag = true,
            '>' => in_tag = false,
            c if !in_tag => out.push(c),
            _ => {}
        }
    }
    out
}

/// `GetAppList` response
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppListResponse {
    #[serde(default)]
    pub applist: AppList,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppList {
    #[serde(default)]
    pub apps: Vec<AppListEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppListEntry {
    pub appid: AppId,
    #[serde(default)]
    pub name: String,
}

/// `GetNumberOfCurrentPlayers` response
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CurrentPlayersResponse {
    #[serde(default)]
    pub response: CurrentPlayers,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CurrentPlayers {
    #[serde(default)]
    pub player_count: Option<u64>,
    #[serde(default)]
    pub result: Option<i32>,
}

/// Store currency for a store language; unknown languages fall back to English
pub fn language_currency(language: &str) -> (&'static str, &'static str) {
    match language {
        "schinese" => ("schinese", "cn"),
        _ => ("english", "us"),
    }
}
