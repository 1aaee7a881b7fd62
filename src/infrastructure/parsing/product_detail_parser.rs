//! Product detail page parser
//!
//! Produces a [`ProductDetails`] value; merging it into an existing record is
//! the record's job, so nothing here can overwrite listing data.

use lazy_static::lazy_static;
use regex::Regex;
use scraper::{Html, Selector};
use tracing::{debug, warn};

use super::config::{DetailSelectors, DESCRIPTION_LIMIT, MAX_FEATURES, MIN_FEATURE_LENGTH};
use super::strategy::{compile_selector, element_text, non_empty_text, Breadcrumb, FieldSpec};
use crate::domain::product::ProductDetails;
use crate::infrastructure::parsing_error::{ParsingError, ParsingResult};
use crate::utils::truncate_chars;

lazy_static! {
    static ref DISCOUNT_PATTERN: Regex = Regex::new(r"(\d+)%").unwrap();
}

#[derive(Debug, Clone)]
pub struct ProductDetailParser {
    description: FieldSpec,
    features: Option<Selector>,
    availability: FieldSpec,
    breadcrumb: Option<Breadcrumb>,
    seller: FieldSpec,
    discount: FieldSpec,
}

impl ProductDetailParser {
    pub fn with_config(selectors: &DetailSelectors) -> ParsingResult<Self> {
        Ok(Self {
            description: FieldSpec::compile("description", &selectors.description)?,
            features: selectors
                .features
                .as_deref()
                .map(compile_selector)
                .transpose()?,
            availability: FieldSpec::compile("availability", &selectors.availability)?,
            breadcrumb: selectors
                .breadcrumb
                .as_ref()
                .map(Breadcrumb::compile)
                .transpose()?,
            seller: FieldSpec::compile("seller", &selectors.seller)?,
            discount: FieldSpec::compile("discount_percentage", &selectors.discount)?,
        })
    }

    pub fn parse_details(&self, body: &str, url: &str) -> ParsingResult<ProductDetails> {
        if body.trim().is_empty() {
            return Err(ParsingError::EmptyDocument {
                url: url.to_string(),
            });
        }

        let document = Html::parse_document(body);
        let root = document.root_element();

        let details = ProductDetails {
            description: soft(self.description.first_match(root, |raw| {
                non_empty_text(raw).map(|text| truncate_chars(&text, DESCRIPTION_LIMIT))
            })),
            features: self.features(&document),
            availability: soft(self.availability.first_match(root, non_empty_text)),
            category: self.breadcrumb.as_ref().and_then(|b| b.last_item(&document)),
            seller: soft(self.seller.first_match(root, non_empty_text)),
            discount_percentage: soft(self.discount.first_match(root, |raw| {
                DISCOUNT_PATTERN
                    .captures(raw)
                    .and_then(|c| c[1].parse::<u32>().ok())
            })),
        };

        debug!(
            url,
            features = details.features.len(),
            has_description = details.description.is_some(),
            "Parsed detail page"
        );
        Ok(details)
    }

    /// First ten candidates, keeping those longer than five characters.
    fn features(&self, document: &Html) -> Vec<String> {
        let Some(selector) = &self.features else {
            return Vec::new();
        };

        document
            .select(selector)
            .take(MAX_FEATURES)
            .map(element_text)
            .filter(|text| text.chars().count() > MIN_FEATURE_LENGTH)
            .collect()
    }
}

fn soft<T>(result: ParsingResult<Option<T>>) -> Option<T> {
    result.unwrap_or_else(|e| {
        warn!("Detail field left empty: {}", e);
        None
    })
}
