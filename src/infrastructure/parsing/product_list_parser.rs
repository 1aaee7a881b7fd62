//! Product record builder for listing pages and the homepage carousel
//!
//! One [`TrendingProduct`] is built per located card. Missing optional fields
//! leave the record partially filled; a fault inside an optional field is
//! absorbed at that field. Only a failure to produce a title or URL rejects
//! the card, and even then the remaining cards are still processed.

use scraper::{ElementRef, Html};
use tracing::{debug, info, warn};

use super::card_locator::CardLocator;
use super::config::{IdentifierSpec, PageSelectors, TitleFallback, UrlFallback, TITLE_TEXT_LIMIT};
use super::context::ParseContext;
use super::strategy::{element_text, non_empty_text, Breadcrumb, FieldSpec};
use super::ContextualParser;
use crate::domain::product::TrendingProduct;
use crate::infrastructure::parsing_error::{ParsingError, ParsingResult};
use crate::utils::{extract_rating, extract_review_count, normalize_url, truncate_chars};

/// Parser for one page kind of one site
#[derive(Debug, Clone)]
pub struct ProductListParser {
    locator: CardLocator,
    identifier: IdentifierSpec,
    title: FieldSpec,
    title_fallback: TitleFallback,
    url: FieldSpec,
    url_fallback: UrlFallback,
    price: FieldSpec,
    image: FieldSpec,
    rating: FieldSpec,
    review_count: FieldSpec,
    breadcrumb: Option<Breadcrumb>,
}

impl ProductListParser {
    pub fn with_config(selectors: &PageSelectors) -> ParsingResult<Self> {
        Ok(Self {
            locator: CardLocator::new(&selectors.card_groups, selectors.card_cap)?,
            identifier: selectors.identifier.clone(),
            title: FieldSpec::compile("title", &selectors.title)?,
            title_fallback: selectors.title_fallback.clone(),
            url: FieldSpec::compile("url", &selectors.url)?,
            url_fallback: selectors.url_fallback.clone(),
            price: FieldSpec::compile("price", &selectors.price)?,
            image: FieldSpec::compile("image_url", &selectors.image)?,
            rating: FieldSpec::compile("rating", &selectors.rating)?,
            review_count: FieldSpec::compile("review_count", &selectors.review_count)?,
            breadcrumb: selectors
                .breadcrumb
                .as_ref()
                .map(Breadcrumb::compile)
                .transpose()?,
        })
    }

    /// Replace the strategy list of one field; used to plug in hand-written
    /// strategies.
    #[must_use]
    pub fn with_field(mut self, spec: FieldSpec) -> Self {
        match spec.field() {
            "title" => self.title = spec,
            "url" => self.url = spec,
            "price" => self.price = spec,
            "image_url" => self.image = spec,
            "rating" => self.rating = spec,
            "review_count" => self.review_count = spec,
            other => warn!("Ignoring strategies for unknown listing field '{}'", other),
        }
        self
    }

    pub fn card_cap(&self) -> usize {
        self.locator.cap()
    }

    /// Parse a raw response body. The parsed tree never outlives this call.
    pub fn parse_document(
        &self,
        body: &str,
        context: &ParseContext,
    ) -> ParsingResult<Vec<TrendingProduct>> {
        if body.trim().is_empty() {
            return Err(ParsingError::EmptyDocument {
                url: context.page.clone(),
            });
        }
        if !body.contains('<') {
            return Err(ParsingError::HtmlParsingFailed {
                message: "response body contains no markup".to_string(),
                url: Some(context.page.clone()),
            });
        }

        let document = Html::parse_document(body);
        self.parse_with_context(&document, context)
    }

    /// Build the record for card `index` (0-based).
    pub fn build_record(
        &self,
        card: ElementRef<'_>,
        index: usize,
        context: &ParseContext,
        category: Option<&str>,
    ) -> ParsingResult<TrendingProduct> {
        let rank = u32::try_from(index + 1).unwrap_or(u32::MAX);
        let identifier = self.card_identifier(card);

        let title = match self.title.first_match(card, non_empty_text)? {
            Some(title) => title,
            None => self.fallback_title(card, identifier.as_deref(), rank),
        };

        let base_url = context.base_url.as_str();
        let url = match self.url.first_match(card, |raw| {
            let raw = raw.trim();
            (!raw.is_empty()).then(|| normalize_url(base_url, raw))
        })? {
            Some(url) => url,
            None => self.fallback_url(base_url, identifier.as_deref()),
        };
        if url.is_empty() {
            return Err(ParsingError::required_field_missing("url", Some(&context.page)));
        }

        let mut product = TrendingProduct::new(title, url, context.record_source(), rank);
        product.price = optional(rank, self.price.first_match(card, non_empty_text));
        product.image_url = optional(
            rank,
            self.image.first_match(card, |raw| {
                let raw = raw.trim();
                (!raw.is_empty()).then(|| normalize_url(base_url, raw))
            }),
        );
        product.rating = optional(rank, self.rating.first_match(card, extract_rating));
        product.review_count = optional(rank, self.review_count.first_match(card, extract_review_count));
        product.category = category.map(str::to_string);

        Ok(product)
    }

    fn card_identifier(&self, card: ElementRef<'_>) -> Option<String> {
        let element = card.value();

        let exact = self
            .identifier
            .attrs
            .iter()
            .filter_map(|name| element.attr(name))
            .map(str::trim)
            .find(|value| !value.is_empty());
        if let Some(value) = exact {
            return Some(value.to_string());
        }

        let fragment = self.identifier.name_contains.as_deref()?.to_ascii_lowercase();
        element
            .attrs()
            .find(|(name, value)| {
                name.to_ascii_lowercase().contains(&fragment) && !value.trim().is_empty()
            })
            .map(|(_, value)| value.trim().to_string())
    }

    fn fallback_title(&self, card: ElementRef<'_>, identifier: Option<&str>, rank: u32) -> String {
        if self.title_fallback.use_card_text {
            let text = element_text(card);
            if !text.is_empty() {
                return truncate_chars(&text, TITLE_TEXT_LIMIT);
            }
        }

        let rank = rank.to_string();
        self.title_fallback
            .placeholder
            .replace("{id}", identifier.unwrap_or(&rank))
            .replace("{rank}", &rank)
    }

    fn fallback_url(&self, base_url: &str, identifier: Option<&str>) -> String {
        if let (Some(template), Some(id)) = (self.url_fallback.with_id.as_deref(), identifier) {
            return normalize_url(base_url, &template.replace("{id}", id));
        }
        match self.url_fallback.generic.as_deref() {
            Some(path) => normalize_url(base_url, path),
            None => base_url.to_string(),
        }
    }
}

impl ContextualParser for ProductListParser {
    type Output = Vec<TrendingProduct>;
    type Context = ParseContext;

    fn parse_with_context(&self, html: &Html, context: &Self::Context) -> ParsingResult<Self::Output> {
        let cards = self.locator.locate(html);
        info!(
            "Found {} potential product cards on {} ({})",
            cards.len(),
            context.page,
            context.kind.as_str()
        );

        let category = self.breadcrumb.as_ref().and_then(|b| b.last_item(html));

        let mut products = Vec::with_capacity(cards.len());
        for (index, card) in cards.into_iter().enumerate() {
            match self.build_record(card, index, context, category.as_deref()) {
                Ok(product) => {
                    debug!("Extracted product: {} (Rank: {})", product.title, product.rank);
                    products.push(product);
                }
                Err(e) if e.is_card_local() => {
                    warn!(rank = index + 1, page = %context.page, "Skipping product card: {}", e);
                }
                Err(e) => return Err(e),
            }
        }

        info!("Extracted {} products from {}", products.len(), context.page);
        Ok(products)
    }
}

fn optional<T>(rank: u32, result: ParsingResult<Option<T>>) -> Option<T> {
    match result {
        Ok(value) => value,
        Err(e) => {
            warn!(rank, "Leaving field empty after extraction fault: {}", e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::parsing::context::PageKind;
    use crate::infrastructure::parsing::strategy::Strategy;
    use crate::infrastructure::sites;
    use crate::domain::site::SiteId;

    const BASE: &str = "https://www.amazon.in";

    fn listing_context() -> ParseContext {
        ParseContext::new(BASE, "amazon.in", "/gp/bestsellers/", PageKind::Listing)
    }

    fn amazon_listing() -> ProductListParser {
        ProductListParser::with_config(&sites::selectors_for(SiteId::AmazonIn).listing).unwrap()
    }

    #[test]
    fn partial_card_still_yields_record() {
        let html = r#"
            <div data-asin="B0PARTIAL1">
                <a class="a-link-normal" href="/Widget/dp/B0PARTIAL1"><span>Bare Widget</span></a>
            </div>"#;

        let records = amazon_listing().parse_document(html, &listing_context()).unwrap();
        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record.title, "Bare Widget");
        assert_eq!(record.url, "https://www.amazon.in/Widget/dp/B0PARTIAL1");
        assert_eq!(record.rank, 1);
        assert_eq!(record.price, None);
        assert_eq!(record.rating, None);
        assert_eq!(record.review_count, None);
    }

    #[test]
    fn nested_wrapper_spans_do_not_leak_into_fields() {
        let html = r#"
            <div data-asin="B0WRAPPED1">
                <a class="a-link-normal" href="/dp/B0WRAPPED1"><span>Wrapped Bottle</span></a>
                <span class="row"><span>4.4 out of 5 stars</span> <span>2,345 ratings</span></span>
                <span class="pricing"><span>₹599</span> <span>M.R.P: ₹999</span> <span>(40% off)</span></span>
            </div>"#;

        let records = amazon_listing().parse_document(html, &listing_context()).unwrap();
        let record = &records[0];
        assert_eq!(record.review_count, Some(2345));
        assert_eq!(record.price.as_deref(), Some("₹599"));
        assert_eq!(record.numeric_price(), Some(599.0));
    }

    #[test]
    fn fallbacks_for_title_and_url() {
        let html = r#"
            <div data-asin="B0NOLINK01"><div class="x">   </div></div>
            <div data-asin="B0NOLINK02"><b>Mystery gadget with no title markup</b></div>"#;

        let records = amazon_listing().parse_document(html, &listing_context()).unwrap();
        assert_eq!(records.len(), 2);

        assert_eq!(records[0].title, "Unknown Product B0NOLINK01");
        assert_eq!(records[0].url, "https://www.amazon.in/dp/B0NOLINK01");
        assert_eq!(records[1].title, "Mystery gadget with no title markup");
        assert_eq!(records[1].rank, 2);
    }

    #[test]
    fn long_card_text_title_is_truncated() {
        let long = "word ".repeat(60);
        let html = format!(r#"<div data-asin="B0LONGTEXT"><p>{long}</p></div>"#);
        let records = amazon_listing().parse_document(&html, &listing_context()).unwrap();
        assert_eq!(records[0].title.chars().count(), TITLE_TEXT_LIMIT);
    }

    #[test]
    fn breadcrumb_category_is_shared_by_all_cards() {
        let html = r#"
            <div id="wayfinding-breadcrumbs_feature_div"><a>Electronics</a><a>Headphones</a></div>
            <div data-asin="B0AAAAAAA1"><span class="a-size-base">One</span></div>
            <div data-asin="B0AAAAAAA2"><span class="a-size-base">Two</span></div>"#;

        let records = amazon_listing().parse_document(html, &listing_context()).unwrap();
        assert_eq!(records.len(), 2);
        assert!(records.iter().all(|r| r.category.as_deref() == Some("Headphones")));
    }

    #[test]
    fn optional_field_fault_is_absorbed() {
        let parser = amazon_listing().with_field(FieldSpec::new("price").with_strategy(
            Strategy::custom("broken-price", |_| {
                Err(ParsingError::field_fault("price", "broken-price", "corrupt node"))
            }),
        ));
        let html = r#"<div data-asin="B0FAULTY01"><span class="a-size-medium">Kettle</span></div>"#;

        let records = parser.parse_document(html, &listing_context()).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].title, "Kettle");
        assert_eq!(records[0].price, None);
    }

    #[test]
    fn title_fault_skips_only_that_card() {
        let parser = amazon_listing().with_field(FieldSpec::new("title").with_strategy(
            Strategy::custom("picky-title", |card| {
                if card.value().attr("data-asin") == Some("B0BADCARD1") {
                    Err(ParsingError::field_fault("title", "picky-title", "unreadable"))
                } else {
                    Ok(Some("Good card".to_string()))
                }
            }),
        ));
        let html = r#"
            <div data-asin="B0BADCARD1"></div>
            <div data-asin="B0GOODCRD2"></div>"#;

        let records = parser.parse_document(html, &listing_context()).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].title, "Good card");
        assert_eq!(records[0].rank, 2);
    }

    #[test]
    fn empty_and_non_markup_bodies_are_page_faults() {
        let parser = amazon_listing();
        let err = parser.parse_document("  \n", &listing_context()).unwrap_err();
        assert!(err.is_page_level());
        let err = parser.parse_document("{\"captcha\":true}", &listing_context()).unwrap_err();
        assert!(err.is_page_level());
    }
}
