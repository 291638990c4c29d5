//! Declarative field extraction rules for store pages
//!
//! Every rule carries two equivalent descriptions of the same target: a CSS
//! selector (with optional label filter, inner selector and attribute) for
//! DOM extraction, and a regular expression for pattern extraction. The
//! regular expression ends at the target element's opening tag and names the
//! element with a `tag` group; a pattern without that group yields its first
//! capture group instead. Rules never fail: an unmatched pattern is simply
//! "no value".

use std::collections::BTreeMap;
use std::sync::OnceLock;

use regex::Regex;
use tracing::warn;

/// Store page fields filled from rules
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Field {
    Name,
    ShortDescription,
    Price,
    DiscountedPrice,
    OriginalPrice,
    DiscountPercentage,
    ReleaseDate,
    Developer,
    Publisher,
    ReviewSummary,
    ReviewDescription,
    Tags,
    HeaderImage,
    Screenshots,
    AchievementCount,
    Platforms,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Multiplicity {
    /// First non-empty match
    Single,
    /// Every match, deduplicated in document order
    Multiple,
}

/// A single extraction rule
#[derive(Debug, Clone, Copy)]
pub struct ExtractionRule {
    pub field: Field,
    pub multiplicity: Multiplicity,
    /// CSS selector for the DOM strategy
    pub selector: &'static str,
    /// Element text must contain one of these labels
    pub labels: Option<&'static [&'static str]>,
    /// Descend into the first match of this selector before reading
    pub inner: Option<&'static str>,
    /// Read this attribute instead of the element text
    pub attr: Option<&'static str>,
    /// Regex ending at the target's opening tag, or whose first group is the value
    pub pattern: &'static str,
}

impl ExtractionRule {
    pub fn single(field: Field, selector: &'static str, pattern: &'static str) -> Self {
        Self {
            field,
            multiplicity: Multiplicity::Single,
            selector,
            labels: None,
            inner: None,
            attr: None,
            pattern,
        }
    }

    pub fn multiple(field: Field, selector: &'static str, pattern: &'static str) -> Self {
        Self {
            multiplicity: Multiplicity::Multiple,
            ..Self::single(field, selector, pattern)
        }
    }

    pub fn labelled(mut self, labels: &'static [&'static str], inner: &'static str) -> Self {
        self.labels = Some(labels);
        self.inner = Some(inner);
        self
    }

    pub fn attr(mut self, attr: &'static str) -> Self {
        self.attr = Some(attr);
        self
    }
}

/// Rules with their compiled patterns
#[derive(Debug)]
pub struct RuleSet {
    rules: Vec<ExtractionRule>,
    patterns: Vec<Option<Regex>>,
}

impl RuleSet {
    pub fn new(rules: Vec<ExtractionRule>) -> Self {
        let patterns = rules
            .iter()
            .map(|rule| match Regex::new(rule.pattern) {
                Ok(re) => Some(re),
                Err(e) => {
                    warn!(field = ?rule.field, "Extraction pattern does not compile: {}", e);
                    None
                }
            })
            .collect();
        Self { rules, patterns }
    }

    /// Rules paired with their compiled pattern (if it compiled)
    pub fn iter(&self) -> impl Iterator<Item = (&ExtractionRule, Option<&Regex>)> {
        self.rules
            .iter()
            .zip(self.patterns.iter().map(Option::as_ref))
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

const DEVELOPER_LABELS: &[&str] = &["开发商", "Developer"];
const PUBLISHER_LABELS: &[&str] = &["发行商", "Publisher"];

/// `class` attribute containing the given class name, in any quoting
macro_rules! class_attr {
    ($class:literal) => {
        concat!(
            r#"\sclass\s*=\s*["']?[^"'>]*\b"#,
            $class,
            r#"\b[^"'>]*["']?"#
        )
    };
}

/// Opening tag of an element with the given class. `tag` captures its name.
macro_rules! open_tag {
    ($tag:literal, $class:literal) => {
        concat!(
            "<(?P<tag>(?i:",
            $tag,
            "))",
            r"\b[^>]*?",
            class_attr!($class),
            "[^>]*>"
        )
    };
}

/// The rule set applied to store app pages
pub fn store_page_rules() -> &'static RuleSet {
    static RULES: OnceLock<RuleSet> = OnceLock::new();
    RULES.get_or_init(|| {
        use Field::*;
        RuleSet::new(vec![
            ExtractionRule::single(
                Name,
                ".apphub_AppName",
                concat!("(?s)", open_tag!("[a-z][a-z0-9]*", "apphub_AppName")),
            ),
            ExtractionRule::single(
                ShortDescription,
                ".game_description_snippet",
                concat!("(?s)", open_tag!("[a-z][a-z0-9]*", "game_description_snippet")),
            ),
            ExtractionRule::single(
                Price,
                ".game_purchase_price",
                concat!("(?s)", open_tag!("[a-z][a-z0-9]*", "game_purchase_price")),
            ),
            ExtractionRule::single(
                Price,
                ".discount_final_price",
                concat!("(?s)", open_tag!("[a-z][a-z0-9]*", "discount_final_price")),
            ),
            ExtractionRule::single(
                DiscountedPrice,
                ".discount_final_price",
                concat!("(?s)", open_tag!("[a-z][a-z0-9]*", "discount_final_price")),
            ),
            ExtractionRule::single(
                OriginalPrice,
                ".discount_original_price",
                concat!("(?s)", open_tag!("[a-z][a-z0-9]*", "discount_original_price")),
            ),
            ExtractionRule::single(
                DiscountPercentage,
                ".discount_pct",
                concat!("(?s)", open_tag!("[a-z][a-z0-9]*", "discount_pct")),
            ),
            ExtractionRule::single(
                ReleaseDate,
                ".release_date .date",
                concat!(
                    "(?s)",
                    class_attr!("release_date"),
                    "[^>]*>.*?",
                    open_tag!("[a-z][a-z0-9]*", "date")
                ),
            ),
            ExtractionRule::single(
                Developer,
                ".dev_row",
                concat!(
                    "(?s)",
                    class_attr!("dev_row"),
                    r"[^>]*>\s*(?:<[^a/][^>]*>\s*)*(?:开发商|Developer)[^<]*(?:</[^>]+>\s*)*(?:<div[^>]*>\s*)?",
                    r"<(?P<tag>(?i:a))\b[^>]*>"
                ),
            )
            .labelled(DEVELOPER_LABELS, "a"),
            ExtractionRule::single(
                Publisher,
                ".dev_row",
                concat!(
                    "(?s)",
                    class_attr!("dev_row"),
                    r"[^>]*>\s*(?:<[^a/][^>]*>\s*)*(?:发行商|Publisher)[^<]*(?:</[^>]+>\s*)*(?:<div[^>]*>\s*)?",
                    r"<(?P<tag>(?i:a))\b[^>]*>"
                ),
            )
            .labelled(PUBLISHER_LABELS, "a"),
            ExtractionRule::single(
                ReviewSummary,
                "span.game_review_summary",
                concat!("(?s)", open_tag!("span", "game_review_summary")),
            ),
            ExtractionRule::single(
                ReviewDescription,
                "span.responsive_reviewdesc",
                concat!("(?s)", open_tag!("span", "responsive_reviewdesc")),
            ),
            ExtractionRule::multiple(Tags, "a.app_tag", concat!("(?s)", open_tag!("a", "app_tag"))),
            ExtractionRule::single(
                HeaderImage,
                "img.game_header_image_full",
                concat!("(?s)", open_tag!("img", "game_header_image_full")),
            )
            .attr("src"),
            ExtractionRule::multiple(
                Screenshots,
                "a.highlight_screenshot_link",
                concat!("(?s)", open_tag!("a", "highlight_screenshot_link")),
            )
            .attr("href"),
            ExtractionRule::single(
                AchievementCount,
                ".achievement_count",
                concat!("(?s)", open_tag!("[a-z][a-z0-9]*", "achievement_count")),
            ),
            ExtractionRule::multiple(
                Platforms,
                "span.platform_img",
                concat!("(?s)", open_tag!("span", "platform_img")),
            )
            .attr("class"),
        ])
    })
}

/// Values pulled out of a page, per field.
///
/// Several rules may target the same field; the first rule to produce a
/// value owns it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawFields {
    values: BTreeMap<Field, Vec<String>>,
}

impl RawFields {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has(&self, field: Field) -> bool {
        self.values.contains_key(&field)
    }

    /// Record the values a rule produced
    pub fn insert(&mut self, field: Field, values: Vec<String>) {
        if values.is_empty() || self.has(field) {
            return;
        }
        self.values.insert(field, values);
    }

    pub fn single(&self, field: Field) -> Option<&str> {
        self.values
            .get(&field)
            .and_then(|v| v.first())
            .map(String::as_str)
    }

    pub fn multiple(&self, field: Field) -> &[String] {
        self.values.get(&field).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// Collapse whitespace runs and trim; blank strings become `None`
pub fn clean_text(raw: &str) -> Option<String> {
    let joined = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    (!joined.is_empty()).then_some(joined)
}

/// Append unless already present
pub fn push_unique(values: &mut Vec<String>, value: String) {
    if !values.contains(&value) {
        values.push(value);
    }
}
