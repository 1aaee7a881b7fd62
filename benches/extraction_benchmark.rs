//! Listing extraction throughput
//!
//! Measures card location plus record building over synthetic Amazon
//! listing pages, and the cost of walking the whole strategy chain when the
//! preferred selectors are missing.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use trending_scraper_lib::domain::SiteId;
use trending_scraper_lib::infrastructure::parsing::{PageKind, ParseContext, ProductListParser};
use trending_scraper_lib::infrastructure::sites;
use trending_scraper_lib::utils::extract_numeric_price;

fn listing_page(cards: usize, degraded: bool) -> String {
    let body: String = (0..cards)
        .map(|i| {
            if degraded {
                // only the last-resort strategies match
                format!(
                    r#"<div data-asin="B0BENCH{i:03}"><a href="/dp/B0BENCH{i:03}"><img alt="Item {i}" src="/i/{i}.jpg"></a><span>₹{i},299</span><span>{i} ratings</span></div>"#
                )
            } else {
                format!(
                    r#"<div data-asin="B0BENCH{i:03}"><a class="a-link-normal" href="/dp/B0BENCH{i:03}"><span>Item {i}</span></a><span class="a-price"><span class="a-offscreen">₹{i},299.00</span></span><i class="a-icon-star">4.{} out of 5 stars</i></div>"#,
                    i % 10
                )
            }
        })
        .collect();
    format!("<html><body>{body}</body></html>")
}

fn bench_listing_extraction(c: &mut Criterion) {
    let parser =
        ProductListParser::with_config(&sites::selectors_for(SiteId::AmazonIn).listing).unwrap();
    let context = ParseContext::new(
        "https://www.amazon.in",
        "amazon.in",
        "/gp/bestsellers/",
        PageKind::Listing,
    );

    let mut group = c.benchmark_group("listing_extraction");
    for (label, degraded) in [("preferred", false), ("degraded", true)] {
        let page = listing_page(50, degraded);
        group.bench_with_input(BenchmarkId::new(label, 50), &page, |b, page| {
            b.iter(|| parser.parse_document(black_box(page), &context).unwrap());
        });
    }
    group.finish();
}

fn bench_price_normalizer(c: &mut Criterion) {
    let inputs = ["₹1,499.00", "Rs. 3,250", "रू 1,050", "NPR 12,000.50", "Currently unavailable"];
    c.bench_function("extract_numeric_price", |b| {
        b.iter(|| {
            for input in inputs {
                black_box(extract_numeric_price(black_box(input)));
            }
        });
    });
}

criterion_group!(benches, bench_listing_extraction, bench_price_normalizer);
criterion_main!(benches);
