//! Ordered field-extraction strategies
//!
//! A [`FieldSpec`] is the compiled strategy list for one logical field. It is
//! evaluated against a single card element: strategies run in table order and
//! the first one whose raw value survives normalization wins. Later
//! strategies are not evaluated at all once a value has been produced.

use std::fmt;
use std::sync::Arc;

use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use tracing::debug;

use super::config::{BreadcrumbSpec, StrategySpec};
use crate::infrastructure::parsing_error::{ParsingError, ParsingResult};
use crate::utils::clean_text;

pub(crate) fn compile_selector(raw: &str) -> ParsingResult<Selector> {
    Selector::parse(raw).map_err(|e| ParsingError::invalid_selector(raw, e))
}

/// Concatenated, whitespace-collapsed text of an element.
pub fn element_text(element: ElementRef<'_>) -> String {
    clean_text(&element.text().collect::<String>())
}

/// Whitespace-collapsed text of the element's direct text children only.
pub fn own_text(element: ElementRef<'_>) -> String {
    let direct: String = element
        .children()
        .filter_map(|node| node.value().as_text().map(|text| &**text))
        .collect();
    clean_text(&direct)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueSource {
    Text,
    Attr(String),
}

/// Signature of a hand-written strategy.
pub type CustomExtractor =
    Arc<dyn for<'a> Fn(ElementRef<'a>) -> ParsingResult<Option<String>> + Send + Sync>;

#[derive(Clone)]
pub enum Strategy {
    Lookup {
        label: String,
        selector: Selector,
        source: ValueSource,
        text_filter: Option<Regex>,
    },
    Custom {
        label: String,
        extract: CustomExtractor,
    },
}

impl fmt::Debug for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Strategy").field(&self.label()).finish()
    }
}

impl Strategy {
    pub fn compile(spec: &StrategySpec) -> ParsingResult<Self> {
        let selector = compile_selector(&spec.selector)?;
        let text_filter = spec
            .text_pattern
            .as_deref()
            .map(|p| Regex::new(p).map_err(|e| ParsingError::invalid_pattern(p, e)))
            .transpose()?;

        let source = match &spec.attr {
            Some(name) => ValueSource::Attr(name.clone()),
            None => ValueSource::Text,
        };

        let mut label = format!("css:{}", spec.selector);
        if let Some(name) = &spec.attr {
            label.push_str(&format!("@{name}"));
        }
        if let Some(pattern) = &spec.text_pattern {
            label.push_str(&format!("~/{pattern}/"));
        }

        Ok(Self::Lookup {
            label,
            selector,
            source,
            text_filter,
        })
    }

    pub fn custom<F>(label: &str, extract: F) -> Self
    where
        F: for<'a> Fn(ElementRef<'a>) -> ParsingResult<Option<String>> + Send + Sync + 'static,
    {
        Self::Custom {
            label: label.to_string(),
            extract: Arc::new(extract),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Self::Lookup { label, .. } | Self::Custom { label, .. } => label,
        }
    }

    /// Raw, un-normalized value of this strategy against `card`.
    pub fn apply(&self, card: ElementRef<'_>) -> ParsingResult<Option<String>> {
        match self {
            Self::Lookup {
                selector,
                source,
                text_filter,
                ..
            } => {
                // A filtered lookup only accepts an element whose own text
                // matches, so wrappers never win over the node holding the value.
                let hit = match text_filter {
                    Some(filter) => card
                        .select(selector)
                        .map(|el| (el, own_text(el)))
                        .find(|(_, text)| filter.is_match(text)),
                    None => card.select(selector).next().map(|el| (el, element_text(el))),
                };

                Ok(hit.and_then(|(el, text)| match source {
                    ValueSource::Text => Some(text),
                    ValueSource::Attr(name) => el.value().attr(name).map(str::to_string),
                }))
            }
            Self::Custom { extract, .. } => extract(card),
        }
    }
}

/// Compiled, ordered strategy list for one field.
#[derive(Debug, Clone)]
pub struct FieldSpec {
    field: String,
    strategies: Vec<Strategy>,
}

impl FieldSpec {
    pub fn new(field: &str) -> Self {
        Self {
            field: field.to_string(),
            strategies: Vec::new(),
        }
    }

    /// Compile a table of specs. An invalid selector in a table is a setup
    /// error, not something to skip silently.
    pub fn compile(field: &str, specs: &[StrategySpec]) -> ParsingResult<Self> {
        let strategies = specs
            .iter()
            .map(Strategy::compile)
            .collect::<ParsingResult<Vec<_>>>()?;
        Ok(Self {
            field: field.to_string(),
            strategies,
        })
    }

    #[must_use]
    pub fn with_strategy(mut self, strategy: Strategy) -> Self {
        self.strategies.push(strategy);
        self
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }

    /// Evaluate strategies in order and return the first value that
    /// `normalize` accepts.
    ///
    /// `Ok(None)` means every strategy missed. A strategy that itself faults
    /// stops the evaluation with [`ParsingError::FieldExtractionFault`].
    pub fn first_match<T, N>(&self, card: ElementRef<'_>, normalize: N) -> ParsingResult<Option<T>>
    where
        N: Fn(&str) -> Option<T>,
    {
        for strategy in &self.strategies {
            let raw = strategy.apply(card).map_err(|e| match e {
                ParsingError::FieldExtractionFault { .. } => e,
                other => ParsingError::field_fault(&self.field, strategy.label(), other),
            })?;

            if let Some(value) = raw.as_deref().and_then(&normalize) {
                debug!(field = %self.field, strategy = strategy.label(), "field resolved");
                return Ok(Some(value));
            }
        }

        debug!(field = %self.field, tried = self.strategies.len(), "field absent");
        Ok(None)
    }
}

/// Page-level breadcrumb trail.
#[derive(Debug, Clone)]
pub struct Breadcrumb {
    container: Selector,
    items: Selector,
}

impl Breadcrumb {
    pub fn compile(spec: &BreadcrumbSpec) -> ParsingResult<Self> {
        Ok(Self {
            container: compile_selector(&spec.container)?,
            items: compile_selector(&spec.items)?,
        })
    }

    /// Text of the last item of the first matching trail.
    pub fn last_item(&self, document: &Html) -> Option<String> {
        let trail = document.select(&self.container).next()?;
        trail
            .select(&self.items)
            .last()
            .map(element_text)
            .filter(|text| !text.is_empty())
    }
}

/// Normalizer for plain text fields.
pub fn non_empty_text(raw: &str) -> Option<String> {
    let cleaned = clean_text(raw);
    (!cleaned.is_empty()).then_some(cleaned)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::extract_rating;

    const CARD: &str = r#"
        <div class="card" data-asin="B0TEST0001">
            <span class="a-size-medium">  Wireless   Mouse </span>
            <span class="empty"></span>
            <span class="note">Only 2 left</span>
            <span class="price">₹599.00</span>
            <i class="a-icon-star"><span>4.3 out of 5 stars</span></i>
            <img src="/m.jpg" alt="Mouse image">
        </div>"#;

    fn with_card<R>(f: impl FnOnce(ElementRef<'_>) -> R) -> R {
        let doc = Html::parse_fragment(CARD);
        let sel = Selector::parse("div.card").unwrap();
        let card = doc.select(&sel).next().unwrap();
        f(card)
    }

    #[test]
    fn first_matching_strategy_wins() {
        let spec = FieldSpec::compile(
            "title",
            &[
                StrategySpec::text(".missing"),
                StrategySpec::text(".a-size-medium"),
                StrategySpec::attr("img[alt]", "alt"),
            ],
        )
        .unwrap();

        let title = with_card(|card| spec.first_match(card, non_empty_text)).unwrap();
        assert_eq!(title.as_deref(), Some("Wireless Mouse"));
    }

    #[test]
    fn empty_after_normalization_falls_through() {
        let spec = FieldSpec::compile(
            "title",
            &[StrategySpec::text(".empty"), StrategySpec::attr("img[alt]", "alt")],
        )
        .unwrap();

        let title = with_card(|card| spec.first_match(card, non_empty_text)).unwrap();
        assert_eq!(title.as_deref(), Some("Mouse image"));
    }

    #[test]
    fn later_strategies_are_never_reached_after_a_hit() {
        let spec = FieldSpec::compile("rating", &[StrategySpec::text("i.a-icon-star")])
            .unwrap()
            .with_strategy(Strategy::custom("explode", |_| {
                panic!("strategy after a hit must not run")
            }));

        let rating = with_card(|card| spec.first_match(card, extract_rating)).unwrap();
        assert_eq!(rating, Some(4.3));
    }

    #[test]
    fn text_pattern_restricts_candidates() {
        let spec = FieldSpec::compile("price", &[StrategySpec::text_matching("span", "₹")]).unwrap();
        let price = with_card(|card| spec.first_match(card, non_empty_text)).unwrap();
        assert_eq!(price.as_deref(), Some("₹599.00"));
    }

    #[test]
    fn text_pattern_skips_wrapper_elements() {
        let doc = Html::parse_fragment(
            r#"<div class="card">
                <span class="pricing"><span>₹599</span> <span>M.R.P: ₹999</span> <span>(40% off)</span></span>
            </div>"#,
        );
        let sel = Selector::parse("div.card").unwrap();
        let card = doc.select(&sel).next().unwrap();

        let spec = FieldSpec::compile("price", &[StrategySpec::text_matching("span", "₹")]).unwrap();
        let price = spec.first_match(card, non_empty_text).unwrap();
        assert_eq!(price.as_deref(), Some("₹599"));
    }

    #[test]
    fn own_text_ignores_descendants() {
        let doc = Html::parse_fragment(r#"<p class="row"> Sold by <b>Acme</b> Ltd </p>"#);
        let sel = Selector::parse("p.row").unwrap();
        let row = doc.select(&sel).next().unwrap();
        assert_eq!(own_text(row), "Sold by Ltd");
        assert_eq!(element_text(row), "Sold by Acme Ltd");
    }

    #[test]
    fn faulting_strategy_is_reported_with_field_and_label() {
        let spec = FieldSpec::new("price").with_strategy(Strategy::custom("broken", |_| {
            Err(ParsingError::HtmlParsingFailed {
                message: "bad node".into(),
                url: None,
            })
        }));

        let err = with_card(|card| spec.first_match(card, non_empty_text)).unwrap_err();
        match err {
            ParsingError::FieldExtractionFault { field, strategy, .. } => {
                assert_eq!(field, "price");
                assert_eq!(strategy, "broken");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn all_miss_is_absent_not_error() {
        let spec = FieldSpec::compile("reviews", &[StrategySpec::text(".nope")]).unwrap();
        let reviews = with_card(|card| spec.first_match(card, non_empty_text)).unwrap();
        assert_eq!(reviews, None);
    }

    #[test]
    fn invalid_selector_is_rejected_at_compile_time() {
        let err = FieldSpec::compile("title", &[StrategySpec::text("div[")]).unwrap_err();
        assert!(matches!(err, ParsingError::InvalidSelector { .. }));
    }

    #[test]
    fn extraction_is_deterministic() {
        let spec = FieldSpec::compile(
            "image",
            &[StrategySpec::attr("img[src]", "src"), StrategySpec::attr("img", "data-src")],
        )
        .unwrap();

        let first = with_card(|card| spec.first_match(card, non_empty_text)).unwrap();
        for _ in 0..5 {
            let again = with_card(|card| spec.first_match(card, non_empty_text)).unwrap();
            assert_eq!(again, first);
        }
    }

    #[test]
    fn breadcrumb_takes_last_item() {
        let doc = Html::parse_document(
            r#"<div id="crumbs"><a>Home</a><a>Electronics</a><a> Mice </a></div><div class="card"></div>"#,
        );
        let crumb = Breadcrumb::compile(&BreadcrumbSpec {
            container: "#crumbs".into(),
            items: "a".into(),
        })
        .unwrap();
        assert_eq!(crumb.last_item(&doc).as_deref(), Some("Mice"));
    }
}
