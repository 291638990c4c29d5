//! Merge of API-derived and scraped partial records

use crate::types::{AppId, GameRecord, PartialGameRecord};

/// Merge partial records in precedence order into a validated record.
///
/// Layers are applied lowest first, so later layers win on collision:
/// API < scraper < explicit overrides. The appid is always the requested one.
/// `None` when no layer supplies a usable name.
pub fn reconcile<I>(appid: AppId, layers: I) -> Option<GameRecord>
where
    I: IntoIterator<Item = PartialGameRecord>,
{
    let mut merged = PartialGameRecord::new(appid);
    for layer in layers {
        if layer.valid_name().is_some() {
            merged.name = layer.name;
        }
        merged.details.overlay(layer.details);
    }
    merged.appid = appid;
    merged.into_record()
}

/// The usual two-source merge: API result under the scraped result
pub fn reconcile_sources(
    appid: AppId,
    api: Option<PartialGameRecord>,
    scraped: Option<PartialGameRecord>,
) -> Option<GameRecord> {
    reconcile(appid, api.into_iter().chain(scraped))
}
