//! Amazon India selector tables

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

fn breadcrumb() -> BreadcrumbSpec {
    BreadcrumbSpec {
        container: "#wayfinding-breadcrumbs_feature_div".to_string(),
        items: "a".to_string(),
    }
}

/// Best-seller style grids and carousels.
fn listing() -> PageSelectors {
    PageSelectors {
        card_groups: vec![
            r#"li.a-carousel-card, div[data-asin]:not([data-asin=""])"#.to_string(),
            ".a-carousel-card".to_string(),
            r#"[data-asin]:not([data-asin=""])"#.to_string(),
        ],
        card_cap: LISTING_CARD_CAP,
        identifier: IdentifierSpec {
            attrs: vec!["data-asin".to_string()],
            name_contains: Some("asin".to_string()),
        },
        title: vec![
            StrategySpec::text(".a-size-medium, .a-size-base, .a-link-normal > span"),
            StrategySpec::attr("img[alt]", "alt"),
        ],
        title_fallback: TitleFallback {
            use_card_text: true,
            placeholder: "Unknown Product {id}".to_string(),
        },
        url: vec![StrategySpec::attr("a[href]", "href")],
        url_fallback: UrlFallback {
            with_id: Some("/dp/{id}".to_string()),
            generic: Some("/s?k=trending".to_string()),
        },
        price: vec![
            StrategySpec::text(".a-price .a-offscreen"),
            StrategySpec::text(".a-price-whole"),
            StrategySpec::text(".p13n-sc-price"),
            StrategySpec::text("[data-a-price-whole]"),
            StrategySpec::text_matching("span", "₹"),
        ],
        image: vec![StrategySpec::attr("img[src]", "src")],
        rating: vec![
            StrategySpec::text("i.a-icon-star"),
            StrategySpec::text(".a-star-medium-4"),
            StrategySpec::text(r#"span[data-a-icon-alt*="out of 5 stars"]"#),
            StrategySpec::text(".a-icon-alt"),
            StrategySpec::attr(r#"[class*="star"][title]"#, "title"),
        ],
        review_count: vec![
            StrategySpec::text(r#"a.a-link-normal[title*="review"]"#),
            StrategySpec::text(r#".a-size-small[aria-label*="review"]"#),
            StrategySpec::text(r#"span[id*="customerReviews"]"#),
            StrategySpec::text_matching("span", r"\d+[\d,]*\s*(ratings|reviews)"),
        ],
        breadcrumb: Some(breadcrumb()),
    }
}

/// Homepage carousels, used when no listing page yields cards.
fn homepage() -> PageSelectors {
    PageSelectors {
        card_groups: vec![".a-carousel-card".to_string(), ".feed-carousel-card".to_string()],
        card_cap: HOMEPAGE_CARD_CAP,
        identifier: IdentifierSpec::default(),
        title: vec![
            StrategySpec::attr("img[alt]", "alt"),
            StrategySpec::attr("a[title]", "title"),
        ],
        title_fallback: TitleFallback {
            use_card_text: false,
            placeholder: "Featured Product {rank}".to_string(),
        },
        url: vec![StrategySpec::attr("a[href]", "href")],
        url_fallback: UrlFallback::default(),
        price: Vec::new(),
        image: vec![StrategySpec::attr("img[src]", "src")],
        rating: Vec::new(),
        review_count: Vec::new(),
        breadcrumb: None,
    }
}

fn detail() -> DetailSelectors {
    DetailSelectors {
        description: vec![StrategySpec::text("#productDescription, #feature-bullets, #aplus")],
        features: Some("#feature-bullets li, #detailBullets li, .a-unordered-list li".to_string()),
        availability: vec![StrategySpec::text("#availability, #outOfStock")],
        breadcrumb: Some(breadcrumb()),
        seller: Vec::new(),
        discount: Vec::new(),
    }
}
