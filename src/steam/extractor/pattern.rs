//! Regex extraction for environments without a DOM
//!
//! A rule's pattern locates the target element's opening tag. Text rules then
//! read everything up to the matching closing tag (nested elements of the same
//! name included) and drop the markup; attribute rules parse the opening tag.

use std::sync::OnceLock;

use regex::{Captures, Regex};

use crate::steam::rules::{clean_text, push_unique, Multiplicity, RawFields, RuleSet};

use super::ExtractionStrategy;

static RE_TAG: OnceLock<Option<Regex>> = OnceLock::new();
static RE_ATTR: OnceLock<Option<Regex>> = OnceLock::new();

/// Elements that never have content
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source",
    "track", "wbr",
];

/// Runs each rule's regex over the raw markup
#[derive(Debug, Clone, Copy, Default)]
pub struct PatternStrategy;

impl ExtractionStrategy for PatternStrategy {
    fn extract(&self, html: &str, rules: &RuleSet) -> RawFields {
        let mut raw = RawFields::new();

        for (rule, pattern) in rules.iter() {
            let Some(pattern) = pattern else { continue };
            if raw.has(rule.field) {
                continue;
            }

            let mut values = Vec::new();
            for caps in pattern.captures_iter(html) {
                if let Some(value) = read(html, &caps, rule.attr) {
                    push_unique(&mut values, value);
                    if rule.multiplicity == Multiplicity::Single {
                        break;
                    }
                }
            }
            raw.insert(rule.field, values);
        }

        raw
    }
}

fn read(html: &str, caps: &Captures<'_>, attr: Option<&str>) -> Option<String> {
    let whole = caps.get(0)?;
    let text = match caps.name("tag") {
        Some(tag) => {
            let open = &html[tag.start().saturating_sub(1)..whole.end()];
            match attr {
                Some(name) => decode_entities(attribute(open, name)?),
                None => {
                    let name = tag.as_str().to_ascii_lowercase();
                    decode_entities(&strip_tags(element_content(html, whole.end(), &name)))
                }
            }
        }
        None => {
            let value = caps.get(1)?.as_str();
            match attr {
                Some(_) => decode_entities(value),
                None => decode_entities(&strip_tags(value)),
            }
        }
    };
    clean_text(&text)
}

/// Markup between `start` and the closing tag that balances the element
/// opened just before it. Unclosed elements run to the end of the document.
fn element_content<'a>(html: &'a str, start: usize, tag: &str) -> &'a str {
    if VOID_ELEMENTS.contains(&tag) {
        return "";
    }

    let mut depth = 1usize;
    let mut pos = start;
    while let Some(offset) = html[pos..].find('<') {
        let at = pos + offset;
        let rest = &html.as_bytes()[at + 1..];
        match rest.split_first() {
            Some((&b'/', name)) if names_tag(name, tag) => {
                depth -= 1;
                if depth == 0 {
                    return &html[start..at];
                }
            }
            _ if names_tag(rest, tag) => depth += 1,
            _ => {}
        }
        pos = at + 1;
    }
    &html[start..]
}

fn names_tag(bytes: &[u8], tag: &str) -> bool {
    let len = tag.len();
    bytes.len() > len
        && bytes[..len].eq_ignore_ascii_case(tag.as_bytes())
        && matches!(bytes[len], b'>' | b'/' | b' ' | b'\t' | b'\n' | b'\r' | b'\x0c')
}

/// Value of the first `name` attribute in an opening tag
fn attribute<'a>(open_tag: &'a str, name: &str) -> Option<&'a str> {
    let re = RE_ATTR
        .get_or_init(|| {
            Regex::new(r#"(?s)\s([^\s"'>/=]+)\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'>]+))"#).ok()
        })
        .as_ref()?;

    re.captures_iter(open_tag)
        .find(|caps| caps[1].eq_ignore_ascii_case(name))
        .and_then(|caps| caps.get(2).or_else(|| caps.get(3)).or_else(|| caps.get(4)))
        .map(|m| m.as_str())
}

fn strip_tags(fragment: &str) -> String {
    match RE_TAG
        .get_or_init(|| Regex::new(r"(?s)<!--.*?-->|<[^>]*>").ok())
        .as_ref()
    {
        Some(re) => re.replace_all(fragment, "").into_owned(),
        None => fragment.to_string(),
    }
}

/// Decode named and numeric HTML entities.
///
/// Unknown names are left as-is.
pub fn decode_entities(text: &str) -> String {
    html_escape::decode_html_entities(text).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::steam::rules::{ExtractionRule, Field};

    #[test]
    fn test_decode_entities() {
        assert_eq!(decode_entities("Tom &amp; Jerry"), "Tom & Jerry");
        assert_eq!(decode_entities("&lt;b&gt; &#39;quoted&#x27;"), "<b> 'quoted'");
        assert_eq!(decode_entities("a&nbsp;b"), "a\u{a0}b");
        assert_eq!(decode_entities("Pok&eacute;mon &euro; Caf&eacute;"), "Pokémon € Café");
        assert_eq!(decode_entities("&bogus; &"), "&bogus; &");
    }

    #[test]
    fn test_strip_tags() {
        assert_eq!(strip_tags("First <b>Name</b>"), "First Name");
        assert_eq!(strip_tags("a<!-- <b>x</b> -->b"), "ab");
    }

    #[test]
    fn test_element_content_balances_nested_tags() {
        let html = r#"<div class="x"><div>Intro</div> more <DIV>text</DIV></div><div>after</div>"#;
        let start = html.find('>').unwrap() + 1;
        assert_eq!(
            element_content(html, start, "div"),
            "<div>Intro</div> more <DIV>text</DIV>"
        );
        assert_eq!(element_content("<img src=x>tail", 10, "img"), "");
        assert_eq!(element_content("<p>open", 3, "p"), "open");
    }

    #[test]
    fn test_element_content_ignores_prefixed_names() {
        let html = "<a><abbr>x</abbr>y</a>";
        assert_eq!(element_content(html, 3, "a"), "<abbr>x</abbr>y");
    }

    #[test]
    fn test_attribute_quoting() {
        let tag = r#"<img alt="a src=b" data-src='no' SRC='https://cdn/h.jpg' src="dup">"#;
        assert_eq!(attribute(tag, "src"), Some("https://cdn/h.jpg"));
        assert_eq!(attribute("<a href=/app/10 class=x>", "href"), Some("/app/10"));
        assert_eq!(attribute("<a class=x>", "href"), None);
    }

    #[test]
    fn test_multiple_dedupes_in_order() {
        let rules = RuleSet::new(vec![ExtractionRule::multiple(
            Field::Tags,
            "a.app_tag",
            r#"(?s)<(?P<tag>a)\s[^>]*class="app_tag"[^>]*>"#,
        )]);
        let raw = PatternStrategy.extract(
            r#"<a class="app_tag">RPG</a><a class="app_tag">Action</a><a class="app_tag"> RPG </a>"#,
            &rules,
        );
        assert_eq!(raw.multiple(Field::Tags), ["RPG", "Action"]);
    }

    #[test]
    fn test_first_group_pattern_is_still_supported() {
        let rules = RuleSet::new(vec![ExtractionRule::single(
            Field::Name,
            ".apphub_AppName",
            r#"<div class="apphub_AppName">(.*?)</div>"#,
        )]);
        let raw = PatternStrategy.extract(r#"<div class="apphub_AppName"> Portal &amp; 2 </div>"#, &rules);
        assert_eq!(raw.single(Field::Name), Some("Portal & 2"));
    }

    #[test]
    fn test_unmatched_rule_is_absent() {
        let rules = RuleSet::new(vec![ExtractionRule::single(
            Field::Name,
            ".apphub_AppName",
            r#"<div class="apphub_AppName">(.*?)</div>"#,
        )]);
        let raw = PatternStrategy.extract("<p>nothing</p>", &rules);
        assert_eq!(raw.single(Field::Name), None);
    }
}
