//! Daraz Nepal selector tables
//!
//! Daraz ships obfuscated class names that rotate between deployments, so
//! most groups list several generations of the same class.

use crate::infrastructure::parsing::config::{
    BreadcrumbSpec, DetailSelectors, IdentifierSpec, PageSelectors, SiteSelectors, StrategySpec,
    TitleFallback, UrlFallback, HOMEPAGE_CARD_CAP, LISTING_CARD_CAP,
};

pub fn selectors() -> SiteSelectors {
    SiteSelectors {
        listing: listing(),
        homepage: homepage(),
        detail: detail(),
    }
}

fn listing() -> PageSelectors {
    PageSelectors {
        card_groups: vec![
            ".Bm3ON, .c2iYAv".to_string(),
            ".c1ZEkM".to_string(),
            ".c5TXIP".to_string(),
        ],
        card_cap: LISTING_CARD_CAP,
        identifier: IdentifierSpec {
            attrs: Vec::new(),
            name_contains: Some("data-item-id".to_string()),
        },
        title: vec![
            StrategySpec::text(".c16H9d, .c3KeDq, .c16TX_"),
            StrategySpec::attr("img[alt]", "alt"),
        ],
        title_fallback: TitleFallback {
            use_card_text: true,
            placeholder: "Unknown Product {id}".to_string(),
        },
        url: vec![StrategySpec::attr("a[href]", "href")],
        url_fallback: UrlFallback {
            with_id: Some("/products/{id}".to_string()),
            generic: Some("/trending-products/".to_string()),
        },
        price: vec![
            StrategySpec::text(".c13VH6, .c1-B2V"),
            StrategySpec::text(".c3gUW0"),
            StrategySpec::text(".c1hkC1"),
            StrategySpec::text_matching("span", r"Rs\.|रू|NPR"),
        ],
        // lazy-loaded tiles only carry data-src
        image: vec![
            StrategySpec::attr("img[src]", "src"),
            StrategySpec::attr("img[data-src]", "data-src"),
        ],
        rating: vec![
            StrategySpec::text(".c3XbGJ"),
            StrategySpec::text(".c3dn4k"),
            StrategySpec::attr("[data-rating]", "data-rating"),
            StrategySpec::text("[data-rating]"),
        ],
        review_count: vec![
            StrategySpec::text(".c3XbGJ + span"),
            StrategySpec::text(".c2JB4x"),
            StrategySpec::attr("span[data-reviews]", "data-reviews"),
            StrategySpec::text("span[data-reviews]"),
        ],
        breadcrumb: Some(BreadcrumbSpec {
            container: ".c1nVRb, .ant-breadcrumb".to_string(),
            items: "a, span".to_string(),
        }),
    }
}

fn homepage() -> PageSelectors {
    PageSelectors {
        card_groups: vec![
            ".card-jfy-item-wrapper, .slick-slide > div".to_string(),
            ".c1_t2i, .c2iYAv".to_string(),
        ],
        card_cap: HOMEPAGE_CARD_CAP,
        identifier: IdentifierSpec::default(),
        title: vec![
            StrategySpec::attr("img[alt]", "alt"),
            StrategySpec::text(".c16H9d, .c3KeDq"),
        ],
        title_fallback: TitleFallback {
            use_card_text: false,
            placeholder: "Featured Product {rank}".to_string(),
        },
        url: vec![StrategySpec::attr("a[href]", "href")],
        url_fallback: UrlFallback::default(),
        price: vec![StrategySpec::text(".c13VH6, .c1-B2V, .c3gUW0")],
        image: vec![
            StrategySpec::attr("img[src]", "src"),
            StrategySpec::attr("img[data-src]", "data-src"),
        ],
        rating: Vec::new(),
        review_count: Vec::new(),
        breadcrumb: None,
    }
}

fn detail() -> DetailSelectors {
    DetailSelectors {
        description: vec![StrategySpec::text(
            ".html-content, .pdp-product-desc, .pdp-mod-description",
        )],
        features: Some(
            ".specification-keys, .pdp-product-highlights li, .key-features li".to_string(),
        ),
        availability: vec![StrategySpec::text(".quantity-content, .pdp-stock")],
        breadcrumb: Some(BreadcrumbSpec {
            container: ".c1nVRb, .ant-breadcrumb, .pdp-breadcrumb".to_string(),
            items: "a, span".to_string(),
        }),
        seller: vec![StrategySpec::text(".seller-name, .pdp-seller-info-name")],
        discount: vec![StrategySpec::text(
            ".pdp-product-price__discount, .discount-percentage",
        )],
    }
}
