//! Conversion of raw rule output into record fields, and the cleanup pass

use std::sync::OnceLock;

use chrono::Utc;
use regex::Regex;
use serde_json::Value;

use crate::steam::rules::{clean_text, push_unique, Field, RawFields};
use crate::types::{AppId, DataSource, GameDetails, PartialGameRecord};

static RE_NUMBER: OnceLock<Option<Regex>> = OnceLock::new();

/// Digit groups like `547,203` or `78`, with an optional trailing percent sign
fn number_regex() -> Option<&'static Regex> {
    RE_NUMBER
        .get_or_init(|| Regex::new(r"(\d[\d,]*)(%?)").ok())
        .as_ref()
}

/// First number in `text`, ignoring thousands separators
fn first_number(text: &str, percent: bool) -> Option<u64> {
    number_regex()?
        .captures_iter(text)
        .filter(|caps| caps.get(2).is_some_and(|m| m.as_str().is_empty() != percent))
        .find_map(|caps| caps.get(1)?.as_str().replace(',', "").parse().ok())
}

/// `-57%` -> `57`
fn discount_digits(text: &str) -> Option<String> {
    first_number(text, true)
        .or_else(|| first_number(text, false))
        .filter(|pct| *pct > 0)
        .map(|pct| pct.to_string())
}

fn platform_name(class_attr: &str) -> Option<&'static str> {
    class_attr.split_whitespace().find_map(|token| match token {
        "win" | "windows" => Some("windows"),
        "mac" => Some("mac"),
        "linux" | "steamplay" => Some("linux"),
        _ => None,
    })
}

fn is_free_price(price: &str) -> bool {
    price.contains("免费") || price.to_lowercase().contains("free")
}

/// Turn rule output into a partial record
pub(super) fn record_from_rules(raw: &RawFields, html: &str, appid: AppId) -> PartialGameRecord {
    let owned = |field| raw.single(field).map(str::to_string);

    let price = owned(Field::Price);
    let original_price = owned(Field::OriginalPrice);
    let discount_percentage = raw.single(Field::DiscountPercentage).and_then(discount_digits);
    let review_description = owned(Field::ReviewDescription);

    let mut supported_platforms = Vec::new();
    for class_attr in raw.multiple(Field::Platforms) {
        if let Some(name) = platform_name(class_attr) {
            push_unique(&mut supported_platforms, name.to_string());
        }
    }

    let details = GameDetails {
        short_description: owned(Field::ShortDescription),
        is_free: price.as_deref().is_some_and(is_free_price),
        is_on_sale: original_price.is_some() || discount_percentage.is_some(),
        current_price: price.clone(),
        price,
        discounted_price: owned(Field::DiscountedPrice),
        original_price,
        discount_percentage,
        release_date: owned(Field::ReleaseDate),
        developer: owned(Field::Developer),
        publisher: owned(Field::Publisher),
        review_summary: owned(Field::ReviewSummary),
        review_count: review_description
            .as_deref()
            .and_then(|text| first_number(text, false)),
        review_score: review_description
            .as_deref()
            .and_then(|text| first_number(text, true))
            .and_then(|pct| u32::try_from(pct).ok()),
        review_description,
        tags: raw.multiple(Field::Tags).to_vec(),
        header_image: owned(Field::HeaderImage),
        screenshots: raw.multiple(Field::Screenshots).to_vec(),
        achievement_count: raw
            .single(Field::AchievementCount)
            .and_then(|text| first_number(text, false))
            .map(|n| n.to_string()),
        supported_platforms,
        is_early_access: html.contains("early_access_header"),
        is_upcoming: html.contains("game_area_comingsoon") || html.contains("coming_soon"),
        ..Default::default()
    };

    PartialGameRecord {
        appid,
        name: owned(Field::Name),
        details,
    }
}

fn dedupe<T: PartialEq>(values: &mut Vec<T>) {
    let mut seen: Vec<T> = Vec::with_capacity(values.len());
    for value in values.drain(..) {
        if !seen.contains(&value) {
            seen.push(value);
        }
    }
    *values = seen;
}

fn blank_to_none(value: &mut Option<String>) {
    *value = value.as_deref().and_then(clean_text);
}

fn null_to_none(value: &mut Option<Value>) {
    let empty = match value {
        Some(Value::Null) => true,
        Some(Value::String(s)) => s.trim().is_empty(),
        Some(Value::Array(a)) => a.is_empty(),
        Some(Value::Object(o)) => o.is_empty(),
        _ => false,
    };
    if empty {
        *value = None;
    }
}

/// Final normalization of a scraped record.
///
/// Rejects nameless records, deduplicates list fields in first-seen order,
/// drops empty values and stamps the scrape metadata.
pub fn cleanup(mut record: PartialGameRecord) -> Option<PartialGameRecord> {
    record.name = Some(record.valid_name()?.to_string());
    let d = &mut record.details;

    for text in [
        &mut d.game_type,
        &mut d.short_description,
        &mut d.detailed_description,
        &mut d.price,
        &mut d.current_price,
        &mut d.original_price,
        &mut d.discounted_price,
        &mut d.discount_percentage,
        &mut d.release_date,
        &mut d.developer,
        &mut d.publisher,
        &mut d.review_summary,
        &mut d.review_description,
        &mut d.header_image,
        &mut d.background,
        &mut d.supported_languages,
        &mut d.achievement_count,
        &mut d.controller_support,
        &mut d.legal_notice,
        &mut d.ext_user_account_notice,
    ] {
        blank_to_none(text);
    }
    for opaque in [
        &mut d.achievements,
        &mut d.content_descriptors,
        &mut d.recommendations,
        &mut d.support_info,
        &mut d.price_overview,
        &mut d.metacritic,
    ] {
        null_to_none(opaque);
    }

    d.tags.retain(|t| !t.trim().is_empty());
    dedupe(&mut d.tags);
    dedupe(&mut d.genres);
    dedupe(&mut d.categories);
    dedupe(&mut d.screenshots);
    dedupe(&mut d.supported_platforms);
    dedupe(&mut d.dlc_list);

    if d.required_age == Some(0) {
        d.required_age = None;
    }
    if d.review_count == Some(0) {
        d.review_count = None;
    }
    if d.achievement_count.as_deref() == Some("0") {
        d.achievement_count = None;
    }
    if d.system_requirements.as_ref().is_some_and(|r| r.is_empty()) {
        d.system_requirements = None;
    }

    d.is_on_sale = d.is_on_sale || d.discount_value() > 0;
    d.scraped_at = Some(Utc::now());
    d.data_source = Some(DataSource::SteamStorePage);

    Some(record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_number_parsing() {
        assert_eq!(first_number("(547,203)", false), Some(547_203));
        assert_eq!(first_number("78 项成就", false), Some(78));
        assert_eq!(
            first_number("- 97% of the 547,203 user reviews are positive", false),
            Some(547_203)
        );
        assert_eq!(
            first_number("- 97% of the 547,203 user reviews are positive", true),
            Some(97)
        );
        assert_eq!(first_number("none", false), None);
    }

    #[test]
    fn test_discount_digits() {
        assert_eq!(discount_digits("-57%").as_deref(), Some("57"));
        assert_eq!(discount_digits("0%"), None);
        assert_eq!(discount_digits("sale"), None);
    }

    #[test]
    fn test_platform_names() {
        assert_eq!(platform_name("platform_img win"), Some("windows"));
        assert_eq!(platform_name("platform_img steamplay"), Some("linux"));
        assert_eq!(platform_name("platform_img"), None);
    }

    #[test]
    fn test_cleanup_dedupes_and_drops_empties() {
        let mut record = PartialGameRecord::new(1);
        record.name = Some("  Game  ".to_string());
        record.details.tags = vec!["RPG".into(), "Action".into(), "RPG".into(), " ".into()];
        record.details.genres = vec![json!({"id": "1"}), json!({"id": "1"})];
        record.details.developer = Some("   ".to_string());
        record.details.metacritic = Some(json!({}));
        record.details.required_age = Some(0);

        let cleaned = cleanup(record).unwrap();
        assert_eq!(cleaned.name.as_deref(), Some("Game"));
        assert_eq!(cleaned.details.tags, vec!["RPG", "Action"]);
        assert_eq!(cleaned.details.genres.len(), 1);
        assert!(cleaned.details.developer.is_none());
        assert!(cleaned.details.metacritic.is_none());
        assert!(cleaned.details.required_age.is_none());
        assert_eq!(cleaned.details.data_source, Some(DataSource::SteamStorePage));
        assert!(cleaned.details.scraped_at.is_some());
    }

    #[test]
    fn test_cleanup_rejects_nameless() {
        assert!(cleanup(PartialGameRecord::new(1)).is_none());
    }
}
