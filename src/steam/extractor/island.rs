//! JSON island lookup: `window.<Name> = { "<appid>": {...} };` inside a script

use std::sync::OnceLock;

use regex::Regex;
use serde_json::Value;
use tracing::{debug, warn};

use crate::steam::api::ApiAppDetails;
use crate::types::AppId;

static RE_ASSIGNMENT: OnceLock<Option<Regex>> = OnceLock::new();

fn assignment_regex() -> Option<&'static Regex> {
    RE_ASSIGNMENT
        .get_or_init(|| Regex::new(r"window\.([A-Za-z_$][A-Za-z0-9_$]*)\s*=\s*").ok())
        .as_ref()
}

/// Find the first window-scoped JSON object holding an entry for `appid`.
///
/// Entries may be wrapped as `{"success": true, "data": {...}}`. Islands that
/// fail to parse are logged and skipped.
pub fn find_island_entry(html: &str, appid: AppId) -> Option<ApiAppDetails> {
    let re = assignment_regex()?;
    let key = appid.to_string();

    for caps in re.captures_iter(html) {
        let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        let rest = &html[whole.end()..];
        if !rest.starts_with('{') {
            continue;
        }

        let value = match serde_json::Deserializer::from_str(rest)
            .into_iter::<Value>()
            .next()
        {
            Some(Ok(value)) => value,
            Some(Err(e)) => {
                warn!(island = name.as_str(), appid, "Malformed JSON island: {}", e);
                continue;
            }
            None => continue,
        };

        let Some(entry) = value.get(&key) else {
            continue;
        };
        let data = match entry.get("data") {
            Some(data) if entry.get("success").and_then(Value::as_bool) != Some(false) => data,
            Some(_) => continue,
            None => entry,
        };

        match serde_json::from_value::<ApiAppDetails>(data.clone()) {
            Ok(details) => {
                debug!(island = name.as_str(), appid, "Using JSON island");
                return Some(details);
            }
            Err(e) => warn!(island = name.as_str(), appid, "JSON island has unexpected shape: {}", e),
        }
    }

    None
}
