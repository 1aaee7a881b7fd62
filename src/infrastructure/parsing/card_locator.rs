//! Product card discovery

use scraper::{ElementRef, Html, Selector};
use tracing::{debug, warn};

use super::strategy::compile_selector;
use crate::infrastructure::parsing_error::{ParsingError, ParsingResult};

/// Priority chain of card selector groups.
///
/// Groups are tried in order and the first one that matches anything supplies
/// every card; results of different groups are never merged.
#[derive(Debug, Clone)]
pub struct CardLocator {
    groups: Vec<(String, Selector)>,
    cap: usize,
}

impl CardLocator {
    /// Groups that fail to compile are dropped with a warning, as long as at
    /// least one group remains usable.
    pub fn new(groups: &[String], cap: usize) -> ParsingResult<Self> {
        let mut compiled = Vec::with_capacity(groups.len());
        let mut errors = Vec::new();

        for raw in groups {
            match compile_selector(raw) {
                Ok(selector) => compiled.push((raw.clone(), selector)),
                Err(e) => {
                    warn!("Failed to compile card selector '{}': {}", raw, e);
                    errors.push(raw.clone());
                }
            }
        }

        if compiled.is_empty() {
            return Err(ParsingError::invalid_selector(
                &errors.join(" | "),
                "no card selector group compiled",
            ));
        }

        Ok(Self {
            groups: compiled,
            cap,
        })
    }

    pub fn cap(&self) -> usize {
        self.cap
    }

    /// Cards of the first matching group in document order, at most `cap`.
    pub fn locate<'a>(&self, document: &'a Html) -> Vec<ElementRef<'a>> {
        for (raw, selector) in &self.groups {
            let cards: Vec<ElementRef<'a>> = document.select(selector).take(self.cap).collect();
            if !cards.is_empty() {
                debug!(group = %raw, count = cards.len(), "card group matched");
                return cards;
            }
        }

        debug!(groups = self.groups.len(), "no card group matched");
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page_with(count: usize, class: &str) -> String {
        let cards: String = (0..count)
            .map(|i| format!(r#"<div class="{class}" id="c{i}">item {i}</div>"#))
            .collect();
        format!("<html><body>{cards}</body></html>")
    }

    #[test]
    fn cap_limits_listing_and_homepage() {
        let doc = Html::parse_document(&page_with(25, "card"));

        let listing = CardLocator::new(&[".card".to_string()], 20).unwrap();
        assert_eq!(listing.locate(&doc).len(), 20);

        let homepage = CardLocator::new(&[".card".to_string()], 10).unwrap();
        let cards = homepage.locate(&doc);
        assert_eq!(cards.len(), 10);
        assert_eq!(cards[0].value().id(), Some("c0"));
        assert_eq!(cards[9].value().id(), Some("c9"));
    }

    #[test]
    fn first_matching_group_wins_without_union() {
        let html = format!(
            "<html><body>{}{}</body></html>",
            r#"<div class="primary">a</div>"#,
            r#"<div class="secondary">b</div><div class="secondary">c</div>"#
        );
        let doc = Html::parse_document(&html);

        let locator = CardLocator::new(
            &[".absent".to_string(), ".primary".to_string(), ".secondary".to_string()],
            20,
        )
        .unwrap();
        let cards = locator.locate(&doc);
        assert_eq!(cards.len(), 1);
        assert_eq!(cards[0].value().attr("class"), Some("primary"));
    }

    #[test]
    fn no_match_yields_empty() {
        let doc = Html::parse_document(&page_with(3, "tile"));
        let locator = CardLocator::new(&[".card".to_string()], 20).unwrap();
        assert!(locator.locate(&doc).is_empty());
    }

    #[test]
    fn broken_group_is_skipped_but_all_broken_is_an_error() {
        let locator = CardLocator::new(&["div[".to_string(), ".card".to_string()], 20).unwrap();
        let doc = Html::parse_document(&page_with(2, "card"));
        assert_eq!(locator.locate(&doc).len(), 2);

        assert!(CardLocator::new(&["div[".to_string()], 20).is_err());
    }
}
