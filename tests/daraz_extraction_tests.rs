//! Daraz listing extraction: rotating class names, lazy images and
//! identifier-based fallbacks
use trending_scraper_lib::domain::SiteId;
use trending_scraper_lib::infrastructure::parsing::{
    PageKind, ParseContext, ParsingError, ProductListParser,
};
use trending_scraper_lib::infrastructure::sites;

const BASE: &str = "https://www.daraz.np";

// Only the second card group generation is present on this page.
const LISTING: &str = r#"<html><body>
    <div class="ant-breadcrumb"><a>Home</a><span>Home Appliances</span></div>
    <div class="grid">
        <div class="c1ZEkM" data-item-id="101">
            <a href="//www.daraz.np/products/rice-cooker-i101.html">
                <img data-src="https://img.drz.lazcdn.com/rice.jpg" alt="Rice Cooker 1.8L">
            </a>
            <div class="c16H9d">Rice Cooker 1.8L</div>
            <span class="c13VH6">Rs. 3,250</span>
            <span class="c3XbGJ">4.5</span><span>(1,204)</span>
        </div>
        <div class="c1ZEkM" data-item-id="202">
            <p>Bamboo Toothbrush Pack</p>
            <span class="c3gUW0">Rs. 499</span>
        </div>
        <div class="c1ZEkM">
            <a href="/products/solar-lamp-i303.html"><img src="/lamp.png" alt="Solar Lamp"></a>
            <span>रू 1,050</span>
        </div>
    </div>
</body></html>"#;

fn parser() -> ProductListParser {
    ProductListParser::with_config(&sites::selectors_for(SiteId::DarazNp).listing).unwrap()
}

fn context() -> ParseContext {
    ParseContext::new(BASE, "daraz.np", "/trending-products/", PageKind::Listing)
}

#[test]
fn fully_populated_card() {
    let products = parser().parse_document(LISTING, &context()).unwrap();
    assert_eq!(products.len(), 3);

    let rice = &products[0];
    assert_eq!(rice.rank, 1);
    assert_eq!(rice.title, "Rice Cooker 1.8L");
    assert_eq!(rice.url, "https://www.daraz.np/products/rice-cooker-i101.html");
    assert_eq!(rice.price.as_deref(), Some("Rs. 3,250"));
    assert_eq!(rice.numeric_price(), Some(3250.0));
    assert_eq!(rice.image_url.as_deref(), Some("https://img.drz.lazcdn.com/rice.jpg"));
    assert_eq!(rice.rating, Some(4.5));
    assert_eq!(rice.review_count, Some(1204));
    assert_eq!(rice.category.as_deref(), Some("Home Appliances"));
    assert_eq!(rice.source, "daraz.np");
}

#[test]
fn card_without_title_or_link_uses_fallbacks() {
    let products = parser().parse_document(LISTING, &context()).unwrap();

    let brush = &products[1];
    assert!(brush.title.starts_with("Bamboo Toothbrush Pack"));
    assert_eq!(brush.url, "https://www.daraz.np/products/202");
    assert_eq!(brush.price.as_deref(), Some("Rs. 499"));
    assert!(brush.rating.is_none());
    assert!(brush.image_url.is_none());
}

#[test]
fn later_strategies_cover_missing_classes() {
    let products = parser().parse_document(LISTING, &context()).unwrap();

    let lamp = &products[2];
    assert_eq!(lamp.title, "Solar Lamp");
    assert_eq!(lamp.url, "https://www.daraz.np/products/solar-lamp-i303.html");
    assert_eq!(lamp.image_url.as_deref(), Some("https://www.daraz.np/lamp.png"));
    assert_eq!(lamp.price.as_deref(), Some("रू 1,050"));
    assert_eq!(lamp.numeric_price(), Some(1050.0));
}

#[test]
fn listing_cap_limits_records() {
    let cards: String = (0..30)
        .map(|i| {
            format!(
                r#"<div class="c2iYAv" data-item-id="{i}"><div class="c16H9d">Item {i}</div></div>"#
            )
        })
        .collect();
    let page = format!("<html><body>{cards}</body></html>");

    let products = parser().parse_document(&page, &context()).unwrap();
    assert_eq!(products.len(), 20);
    assert_eq!(products[19].title, "Item 19");
    assert_eq!(products[19].rank, 20);
}

#[test]
fn homepage_records_are_marked() {
    let page = r#"<html><body>
        <div class="card-jfy-item-wrapper">
            <a href="/products/fan-i9.html"><img src="https://img.drz.lazcdn.com/fan.jpg" alt="Table Fan"></a>
            <span class="c13VH6">Rs. 2,999</span>
        </div>
    </body></html>"#;
    let homepage =
        ProductListParser::with_config(&sites::selectors_for(SiteId::DarazNp).homepage).unwrap();
    let context = ParseContext::new(BASE, "daraz.np", "/", PageKind::Homepage);

    let products = homepage.parse_document(page, &context).unwrap();
    assert_eq!(products.len(), 1);
    assert_eq!(products[0].title, "Table Fan");
    assert_eq!(products[0].source, "daraz.np_homepage");
    assert_eq!(products[0].price.as_deref(), Some("Rs. 2,999"));
}

#[test]
fn page_level_failures_are_errors() {
    let parser = parser();
    assert!(matches!(
        parser.parse_document("   ", &context()),
        Err(ParsingError::EmptyDocument { .. })
    ));
    assert!(matches!(
        parser.parse_document("Service Unavailable", &context()),
        Err(ParsingError::HtmlParsingFailed { .. })
    ));
}
