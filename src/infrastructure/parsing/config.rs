//! Declarative selector tables
//!
//! Everything a site contributes to extraction is data: card selector groups,
//! per-field strategy lists and fallback templates. The tables are plain serde
//! structs so a site can be re-tuned from a config file without touching the
//! extraction algorithm.

use serde::{Deserialize, Serialize};

pub const LISTING_CARD_CAP: usize = 20;
pub const HOMEPAGE_CARD_CAP: usize = 10;
pub const TITLE_TEXT_LIMIT: usize = 100;
pub const DESCRIPTION_LIMIT: usize = 500;
pub const MAX_FEATURES: usize = 10;
pub const MIN_FEATURE_LENGTH: usize = 5;

/// One lookup rule: the first descendant matching `selector` (and, when set,
/// whose text matches `text_pattern`) yields either its text or `attr`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrategySpec {
    pub selector: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attr: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_pattern: Option<String>,
}

impl StrategySpec {
    pub fn text(selector: &str) -> Self {
        Self {
            selector: selector.to_string(),
            attr: None,
            text_pattern: None,
        }
    }

    pub fn attr(selector: &str, attr: &str) -> Self {
        Self {
            selector: selector.to_string(),
            attr: Some(attr.to_string()),
            text_pattern: None,
        }
    }

    pub fn text_matching(selector: &str, pattern: &str) -> Self {
        Self {
            selector: selector.to_string(),
            attr: None,
            text_pattern: Some(pattern.to_string()),
        }
    }
}

/// How a card's item identifier is read from the card element's own attributes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentifierSpec {
    /// Attribute names checked first, in order.
    #[serde(default)]
    pub attrs: Vec<String>,
    /// Otherwise, the first attribute whose name contains this fragment.
    #[serde(default)]
    pub name_contains: Option<String>,
}

/// Page-scoped trail; the category is the text of its last item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BreadcrumbSpec {
    pub container: String,
    pub items: String,
}

/// Title used when no strategy recovers one.
///
/// `placeholder` may contain `{id}` (identifier, or rank when there is none)
/// and `{rank}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TitleFallback {
    pub use_card_text: bool,
    pub placeholder: String,
}

/// URL used when the card has no link. Paths are resolved against the base
/// URL; with neither template the base URL itself is used.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UrlFallback {
    /// Path template containing `{id}`.
    #[serde(default)]
    pub with_id: Option<String>,
    #[serde(default)]
    pub generic: Option<String>,
}

/// Selector table for one kind of page (a listing page or the homepage).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageSelectors {
    /// Candidate card groups in priority order; each entry is one
    /// comma-separated selector list.
    pub card_groups: Vec<String>,
    pub card_cap: usize,
    #[serde(default)]
    pub identifier: IdentifierSpec,
    pub title: Vec<StrategySpec>,
    pub title_fallback: TitleFallback,
    pub url: Vec<StrategySpec>,
    #[serde(default)]
    pub url_fallback: UrlFallback,
    #[serde(default)]
    pub price: Vec<StrategySpec>,
    #[serde(default)]
    pub image: Vec<StrategySpec>,
    #[serde(default)]
    pub rating: Vec<StrategySpec>,
    #[serde(default)]
    pub review_count: Vec<StrategySpec>,
    #[serde(default)]
    pub breadcrumb: Option<BreadcrumbSpec>,
}

/// Selector table for a product detail page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetailSelectors {
    #[serde(default)]
    pub description: Vec<StrategySpec>,
    /// Every match is a feature candidate.
    #[serde(default)]
    pub features: Option<String>,
    #[serde(default)]
    pub availability: Vec<StrategySpec>,
    #[serde(default)]
    pub breadcrumb: Option<BreadcrumbSpec>,
    #[serde(default)]
    pub seller: Vec<StrategySpec>,
    #[serde(default)]
    pub discount: Vec<StrategySpec>,
}

/// Complete selector set of one site.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteSelectors {
    pub listing: PageSelectors,
    pub homepage: PageSelectors,
    pub detail: DetailSelectors,
}
