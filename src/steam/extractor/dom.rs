//! DOM extraction with the `scraper` crate

use scraper::{ElementRef, Html, Selector};
use tracing::debug;

use crate::steam::rules::{
    clean_text, push_unique, ExtractionRule, Multiplicity, RawFields, RuleSet,
};

use super::ExtractionStrategy;

/// Parses the page once and evaluates every rule's CSS selector
#[derive(Debug, Clone, Copy, Default)]
pub struct DomStrategy;

impl ExtractionStrategy for DomStrategy {
    fn extract(&self, html: &str, rules: &RuleSet) -> RawFields {
        let document = Html::parse_document(html);
        let mut raw = RawFields::new();

        for (rule, _) in rules.iter() {
            if raw.has(rule.field) {
                continue;
            }
            let Ok(selector) = Selector::parse(rule.selector) else {
                debug!(selector = rule.selector, "Skipping unparseable selector");
                continue;
            };
            raw.insert(rule.field, collect(&document, &selector, rule));
        }

        raw
    }
}

fn collect(document: &Html, selector: &Selector, rule: &ExtractionRule) -> Vec<String> {
    let inner = rule.inner.and_then(|s| Selector::parse(s).ok());
    let mut values = Vec::new();

    for element in document.select(selector) {
        if let Some(labels) = rule.labels {
            let text: String = element.text().collect();
            if !labels.iter().any(|label| text.contains(label)) {
                continue;
            }
        }

        let target = match &inner {
            Some(inner) => match element.select(inner).next() {
                Some(found) => found,
                None => continue,
            },
            None => element,
        };

        if let Some(value) = read(target, rule.attr) {
            push_unique(&mut values, value);
            if rule.multiplicity == Multiplicity::Single {
                break;
            }
        }
    }

    values
}

fn read(element: ElementRef<'_>, attr: Option<&str>) -> Option<String> {
    match attr {
        Some(name) => element.value().attr(name).and_then(clean_text),
        None => clean_text(&element.text().collect::<String>()),
    }
}
