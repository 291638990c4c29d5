//! Catalog views over the store search page

use std::future::Future;
use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;
use tracing::debug;

use super::endpoints::encode_component;
use crate::types::{AppId, GameRecord};

static RE_SEARCH_ROW: OnceLock<Option<Regex>> = OnceLock::new();

fn search_row_regex() -> Option<&'static Regex> {
    RE_SEARCH_ROW
        .get_or_init(|| {
            Regex::new(
                r#"(?i)<a[^>]*href="[^"]*/app/(\d+)/[^"]*"[^>]*class="[^"]*search_result_row[^"]*""#,
            )
            .ok()
        })
        .as_ref()
}

/// Store genres with a dedicated search filter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Action,
    Adventure,
    Strategy,
    Rpg,
    Simulation,
    Sports,
    Racing,
    Indie,
    Free,
}

impl Category {
    pub const ALL: [Category; 9] = [
        Category::Action,
        Category::Adventure,
        Category::Strategy,
        Category::Rpg,
        Category::Simulation,
        Category::Sports,
        Category::Racing,
        Category::Indie,
        Category::Free,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Action => "action",
            Category::Adventure => "adventure",
            Category::Strategy => "strategy",
            Category::Rpg => "rpg",
            Category::Simulation => "simulation",
            Category::Sports => "sports",
            Category::Racing => "racing",
            Category::Indie => "indie",
            Category::Free => "free",
        }
    }

    fn filter(&self) -> &'static str {
        match self {
            Category::Action => "category1=19",
            Category::Adventure => "category1=25",
            Category::Strategy => "category1=2",
            Category::Rpg => "category1=122",
            Category::Simulation => "category1=28",
            Category::Sports => "category1=701",
            Category::Racing => "category1=699",
            Category::Indie => "category1=492",
            Category::Free => "genre=Free%20to%20Play",
        }
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Category::ALL
            .into_iter()
            .find(|c| c.as_str() == wanted)
            .ok_or_else(|| format!("unknown category '{}'", s))
    }
}

/// One façade view and the search query that backs it
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogView {
    Popular,
    Discounted,
    Upcoming,
    Search(String),
    /// A category name; unmapped names fall back to a term search
    Category(String),
}

impl CatalogView {
    /// Query string for the store search page
    pub fn query(&self, language: &str) -> String {
        match self {
            CatalogView::Popular => format!("sort_by=_ASC&supportedlang={}&ndl=1", language),
            CatalogView::Discounted => format!("specials=1&ndl=1&l={}", language),
            CatalogView::Upcoming => format!("category1=998&ndl=1&l={}", language),
            CatalogView::Search(term) => {
                format!("term={}&l={}", encode_component(term), language)
            }
            CatalogView::Category(name) => {
                let filter = match name.parse::<Category>() {
                    Ok(category) => category.filter().to_string(),
                    Err(_) => format!("term={}", encode_component(name)),
                };
                format!("{}&l={}", filter, language)
            }
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            CatalogView::Popular => "popular",
            CatalogView::Discounted => "discounted",
            CatalogView::Upcoming => "upcoming",
            CatalogView::Search(_) => "search",
            CatalogView::Category(_) => "category",
        }
    }
}

/// Appids from search-result anchors, first `limit`, in page order
pub fn extract_app_ids(html: &str, limit: usize) -> Vec<AppId> {
    let Some(re) = search_row_regex() else {
        return Vec::new();
    };
    let mut ids = Vec::new();
    for caps in re.captures_iter(html) {
        if ids.len() >= limit {
            break;
        }
        let Some(id) = caps.get(1).and_then(|m| m.as_str().parse::<AppId>().ok()) else {
            continue;
        };
        if !ids.contains(&id) {
            ids.push(id);
        }
    }
    ids
}

/// Fetch details one id at a time, keeping the ones that resolve
pub async fn collect_sequential<F, Fut>(ids: &[AppId], mut fetch: F) -> Vec<GameRecord>
where
    F: FnMut(AppId) -> Fut,
    Fut: Future<Output = Option<GameRecord>>,
{
    let mut records = Vec::with_capacity(ids.len());
    for &appid in ids {
        match fetch(appid).await {
            Some(record) => records.push(record),
            None => debug!(appid, "No details for catalog entry"),
        }
    }
    records
}

/// Keep on-sale records, highest discount first; ties keep input order
pub fn sort_discounted(mut records: Vec<GameRecord>) -> Vec<GameRecord> {
    records.retain(|r| r.details.is_on_sale);
    records.sort_by(|a, b| b.details.discount_value().cmp(&a.details.discount_value()));
    records
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    const SEARCH_PAGE: &str = r#"
        <div id="search_resultsRows">
          <a href="https://store.steampowered.com/app/292030/The_Witcher_3/?snr=1_7_7_230_150_1" data-ds-appid="292030" class="search_result_row ds_collapse_flag">W3</a>
          <a href="https://store.steampowered.com/app/730/CounterStrike_2/?snr=1_7_7_230_150_1" class="search_result_row ds_collapse_flag app_impression_tracked">CS2</a>
          <a href="https://store.steampowered.com/about/" class="menuitem">About</a>
          <A HREF="https://store.steampowered.com/app/1091500/Cyberpunk_2077/" CLASS="search_result_row">CP</A>
        </div>"#;

    fn record(appid: AppId, discount: Option<&str>, on_sale: bool) -> GameRecord {
        let mut record = GameRecord {
            appid,
            name: format!("Game {}", appid),
            details: Default::default(),
        };
        record.details.discount_percentage = discount.map(str::to_string);
        record.details.is_on_sale = on_sale;
        record
    }

    #[test]
    fn test_extracts_ids_in_page_order() {
        assert_eq!(extract_app_ids(SEARCH_PAGE, 10), vec![292030, 730, 1091500]);
        assert_eq!(extract_app_ids(SEARCH_PAGE, 2), vec![292030, 730]);
        assert!(extract_app_ids("<html></html>", 10).is_empty());
    }

    #[test]
    fn test_view_queries() {
        assert_eq!(
            CatalogView::Popular.query("schinese"),
            "sort_by=_ASC&supportedlang=schinese&ndl=1"
        );
        assert_eq!(CatalogView::Discounted.query("schinese"), "specials=1&ndl=1&l=schinese");
        assert_eq!(
            CatalogView::Search("witcher 3".into()).query("schinese"),
            "term=witcher+3&l=schinese"
        );
        assert_eq!(
            CatalogView::Category("RPG".into()).query("schinese"),
            "category1=122&l=schinese"
        );
        assert_eq!(
            CatalogView::Category("free".into()).query("english"),
            "genre=Free%20to%20Play&l=english"
        );
        assert_eq!(
            CatalogView::Category("roguelike".into()).query("schinese"),
            "term=roguelike&l=schinese"
        );
    }

    #[test]
    fn test_category_parsing() {
        assert_eq!("Action".parse::<Category>().unwrap(), Category::Action);
        assert!("puzzle".parse::<Category>().is_err());
    }

    #[test]
    fn test_discounted_sorted_descending() {
        let sorted = sort_discounted(vec![
            record(1, Some("10"), true),
            record(2, Some("50"), true),
            record(3, None, false),
            record(4, Some("25"), true),
        ]);
        let discounts: Vec<_> = sorted.iter().map(|r| r.details.discount_value()).collect();
        assert_eq!(discounts, vec![50, 25, 10]);
    }

    #[test]
    fn test_discount_ties_keep_input_order() {
        let sorted = sort_discounted(vec![
            record(1, Some("20"), true),
            record(2, Some("20"), true),
            record(3, Some("30"), true),
        ]);
        let ids: Vec<_> = sorted.iter().map(|r| r.appid).collect();
        assert_eq!(ids, vec![3, 1, 2]);
    }

    #[tokio::test]
    async fn test_collect_is_sequential_and_skips_failures() {
        let in_flight = Arc::new(AtomicUsize::new(0));
        let max_seen = Arc::new(AtomicUsize::new(0));

        let records = collect_sequential(&[1, 2, 3], |appid| {
            let in_flight = in_flight.clone();
            let max_seen = max_seen.clone();
            async move {
                let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                max_seen.fetch_max(now, Ordering::SeqCst);
                tokio::task::yield_now().await;
                in_flight.fetch_sub(1, Ordering::SeqCst);
                (appid != 2).then(|| record(appid, None, false))
            }
        })
        .await;

        let ids: Vec<_> = records.iter().map(|r| r.appid).collect();
        assert_eq!(ids, vec![1, 3]);
        assert_eq!(max_seen.load(Ordering::SeqCst), 1);
    }
}
