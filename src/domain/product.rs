use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::utils::extract_numeric_price;

pub const NOT_FOUND_TITLE: &str = "No trending products found";
pub const HOMEPAGE_SUFFIX: &str = "_homepage";
pub const NOT_FOUND_SUFFIX: &str = "_not_found";

/// One trending product as it appears on a listing page, optionally enriched
/// from its detail page.
///
/// `title` and `url` are always populated. `price` keeps the raw display
/// string (currency symbol included); numeric parsing happens downstream via
/// [`TrendingProduct::numeric_price`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendingProduct {
    pub title: String,
    pub url: String,
    #[serde(default)]
    pub price: Option<String>,
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub review_count: Option<u64>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub rank: u32,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub availability: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub features: Vec<String>,
    pub source: String,
    #[serde(default = "Utc::now")]
    extracted_at: DateTime<Utc>,
    #[serde(default)]
    pub seller: Option<String>,
    #[serde(default)]
    pub discount_percentage: Option<u32>,
}

impl TrendingProduct {
    pub fn new(
        title: impl Into<String>,
        url: impl Into<String>,
        source: impl Into<String>,
        rank: u32,
    ) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
            price: None,
            rating: None,
            review_count: None,
            image_url: None,
            rank,
            category: None,
            availability: None,
            description: None,
            features: Vec::new(),
            source: source.into(),
            extracted_at: Utc::now(),
            seller: None,
            discount_percentage: None,
        }
    }

    /// Placeholder emitted when no tier of the pipeline produced a product.
    pub fn not_found(source: &str, base_url: &str) -> Self {
        Self::new(
            NOT_FOUND_TITLE,
            base_url,
            format!("{source}{NOT_FOUND_SUFFIX}"),
            1,
        )
    }

    pub fn is_not_found(&self) -> bool {
        self.source.ends_with(NOT_FOUND_SUFFIX)
    }

    /// Set once at construction; there is no setter.
    pub fn extracted_at(&self) -> DateTime<Utc> {
        self.extracted_at
    }

    pub fn numeric_price(&self) -> Option<f64> {
        self.price.as_deref().and_then(extract_numeric_price)
    }

    /// Fold detail-page data into this record.
    ///
    /// Only fields that are currently absent (or empty) are filled; a value
    /// already on the record is never replaced, and an empty or absent detail
    /// value never clears anything.
    #[must_use]
    pub fn merge_details(mut self, details: ProductDetails) -> Self {
        fill_if_missing(&mut self.description, details.description);
        fill_if_missing(&mut self.availability, details.availability);
        fill_if_missing(&mut self.category, details.category);
        fill_if_missing(&mut self.seller, details.seller);

        if self.discount_percentage.is_none() {
            self.discount_percentage = details.discount_percentage;
        }
        if self.features.is_empty() {
            self.features = details.features;
        }
        self
    }
}

fn fill_if_missing(slot: &mut Option<String>, candidate: Option<String>) {
    let occupied = slot.as_deref().is_some_and(|s| !s.trim().is_empty());
    if occupied {
        return;
    }
    if let Some(value) = candidate.filter(|v| !v.trim().is_empty()) {
        *slot = Some(value);
    }
}

/// Fields recovered from a product detail page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductDetails {
    pub description: Option<String>,
    pub features: Vec<String>,
    pub availability: Option<String>,
    pub category: Option<String>,
    pub seller: Option<String>,
    pub discount_percentage: Option<u32>,
}

impl ProductDetails {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}
