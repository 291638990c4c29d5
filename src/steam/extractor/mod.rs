//! Store page scraping
//!
//! A page goes through three stages:
//! 1. The embedded JSON island (if any) seeds the record
//! 2. Extraction rules fill whatever the island left unset
//! 3. A cleanup pass validates and normalizes the result
//!
//! Stage 2 runs under one of two interchangeable strategies picked by an
//! explicit [`Capability`]: a parsed DOM with CSS selectors, or plain regular
//! expressions over the markup. Both must yield the same fields.

mod dom;
mod fields;
mod island;
mod pattern;

pub use dom::DomStrategy;
pub use fields::cleanup;
pub use island::find_island_entry;
pub use pattern::{decode_entities, PatternStrategy};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::types::{AppId, PartialGameRecord};

use super::api::ApiAppDetails;
use super::rules::{store_page_rules, RawFields, RuleSet};

/// HTML processing capability available to the scraper
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Capability {
    /// Full DOM parsing with CSS selectors
    #[default]
    #[serde(rename = "dom")]
    StreamingDom,
    /// Regular expressions only
    #[serde(rename = "pattern")]
    PatternOnly,
}

impl std::str::FromStr for Capability {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "dom" => Ok(Self::StreamingDom),
            "pattern" | "regex" => Ok(Self::PatternOnly),
            other => Err(format!("unknown extraction strategy '{}'", other)),
        }
    }
}

/// Applies a rule set to raw HTML
pub trait ExtractionStrategy {
    fn extract(&self, html: &str, rules: &RuleSet) -> RawFields;
}

/// Builds partial game records from store page HTML
#[derive(Debug, Clone, Copy, Default)]
pub struct PageScraper {
    capability: Capability,
}

impl PageScraper {
    pub fn new(capability: Capability) -> Self {
        Self { capability }
    }

    pub fn capability(&self) -> Capability {
        self.capability
    }

    fn strategy(&self) -> &'static dyn ExtractionStrategy {
        match self.capability {
            Capability::StreamingDom => &DomStrategy,
            Capability::PatternOnly => &PatternStrategy,
        }
    }

    /// Scrape a store page. `None` when no name can be found.
    pub fn scrape(&self, html: &str, appid: AppId) -> Option<PartialGameRecord> {
        let mut record = find_island_entry(html, appid)
            .map(|details| island_record(details, appid))
            .unwrap_or_else(|| PartialGameRecord::new(appid));

        let raw = self.strategy().extract(html, store_page_rules());
        let from_rules = fields::record_from_rules(&raw, html, appid);
        if record.valid_name().is_none() {
            record.name = from_rules.name;
        }
        record.details.fill_missing(from_rules.details);

        let cleaned = cleanup(record);
        if cleaned.is_none() {
            debug!(appid, strategy = ?self.capability, "Store page has no game name");
        }
        cleaned
    }
}

fn island_record(details: ApiAppDetails, appid: AppId) -> PartialGameRecord {
    let mut record = details.island_layer(appid);
    record.details.data_source = None;
    record
}

#[cfg(test)]
pub(crate) mod fixtures {
    pub const WITCHER3: &str = r##"<!DOCTYPE html>
<html>
<head><title>Save 85% on The Witcher 3: Wild Hunt on Steam</title></head>
<body>
    <div class="apphub_AppName">The Witcher 3: Wild Hunt</div>
    <div class="game_description_snippet">作为怪物猎人杰洛特，踏上前往找寻命中注定之子的旅程。</div>
    <img class="game_header_image_full" src="https://cdn.example/292030/header.jpg?t=1&amp;v=2">
    <a class="highlight_screenshot_link" href="https://cdn.example/ss_1.jpg">shot</a>
    <a class="highlight_screenshot_link" href="https://cdn.example/ss_2.jpg">shot</a>
    <a class="highlight_screenshot_link" href="https://cdn.example/ss_1.jpg">shot</a>
    <div class="game_purchase_price price" data-price-final="12700">¥ 127.00</div>
    <div class="discount_original_price">¥ 298.00</div>
    <div class="discount_pct">-57%</div>
    <div class="release_date">
        <div class="date">2015年5月18日</div>
    </div>
    <div class="summary column">
        <div class="dev_row">
            <b>开发商:</b>
            <a href="#">CD PROJEKT RED</a>
        </div>
        <div class="dev_row">
            <b>发行商:</b>
            <a href="#">CD PROJEKT RED</a>
        </div>
    </div>
    <div class="user_reviews_summary_row">
        <div class="summary column">
            <span class="game_review_summary positive">好评如潮</span>
            <span class="responsive_reviewdesc">(547,203)</span>
        </div>
    </div>
    <div class="glance_tags popular_tags">
        <a class="app_tag">RPG</a>
        <a class="app_tag">开放世界</a>
        <a class="app_tag">RPG</a>
        <a class="app_tag">故事丰富 &amp; 选择</a>
    </div>
    <div class="game_area_purchase_platform">
        <span class="platform_img win"></span>
        <span class="platform_img linux"></span>
    </div>
    <div class="block_content_inner">
        <div class="achievement_block">
            <div class="achievement_count">78 项成就</div>
        </div>
    </div>
</body>
</html>"##;

    pub const CS2: &str = r##"<html><body>
    <div class="apphub_AppName">Counter-Strike 2</div>
    <div class="game_description_snippet">有史以来最受欢迎的团队射击游戏的新时代已经开始。</div>
    <div class="game_purchase_price price">免费游戏</div>
    <div class="release_date"><div class="date">2023年9月27日</div></div>
    <div class="dev_row"><b>开发商:</b><a href="#">Valve</a></div>
    <div class="dev_row"><b>发行商:</b><a href="#">Valve</a></div>
    <span class="game_review_summary mixed">多半好评</span>
    <span class="responsive_reviewdesc">(1,250,000)</span>
    <a class="app_tag">射击</a><a class="app_tag">多人</a>
</body></html>"##;

    pub const CYBERPUNK: &str = r##"<html><body>
    <div class="apphub_AppName">Cyberpunk 2077</div>
    <div class="discount_block game_purchase_discount">
        <div class="discount_pct">-50%</div>
        <div class="discount_prices">
            <div class="discount_original_price">¥ 178.00</div>
            <div class="discount_final_price">¥ 89.00</div>
        </div>
    </div>
    <div class="dev_row">
        <div class="subtitle column">Developer:</div>
        <div class="summary column" id="developers_list"><a href="#">CD PROJEKT RED</a></div>
    </div>
    <div class="game_area_comingsoon">coming soon</div>
</body></html>"##;

    pub const NOT_FOUND: &str = r#"<html><head><title>页面未找到</title></head>
<body><div class="error_ctn"><h3>抱歉!</h3><p>无法找到您要访问的页面。</p></div></body></html>"#;

    /// Store page whose JSON island supplies structured data and a release date
    pub const WITH_ISLAND: &str = r##"<html><head>
<script type="text/javascript">
    window.g_rgAppContextData = {"broken": };
    window.SSR_AppData = {"440": {"success": true, "data": {
        "type": "game",
        "name": "Team Fortress 2",
        "required_age": 0,
        "controller_support": "full",
        "genres": [{"id": "1", "description": "Action"}, {"id": "1", "description": "Action"}, {"id": "37", "description": "Free to Play"}],
        "categories": [{"id": 1, "description": "Multi-player"}],
        "release_date": {"coming_soon": false, "date": "10 Oct, 2007"},
        "metacritic": {"score": 92, "url": "https://www.metacritic.com/game/pc/team-fortress-2"}
    }}};
</script>
</head><body>
    <div class="apphub_AppName">Team Fortress 2 (page title)</div>
    <div class="release_date"><div class="date">2007年10月10日</div></div>
    <div class="dev_row"><b>Developer:</b><a href="#">Valve</a></div>
    <a class="app_tag">Free to Play</a>
</body></html>"##;
}
