//! One configured scraper per supported site
//!
//! A `SiteAdapter` bundles the site's profile, its compiled selector tables
//! and the page source. All site differences are data: there is one adapter
//! type, tagged by [`SiteId`].

use std::sync::Arc;

use tracing::{debug, info, info_span, warn, Instrument};

use super::trending_pipeline::TrendingPipeline;
use crate::domain::product::TrendingProduct;
use crate::domain::site::{SiteId, SiteProfile};
use crate::infrastructure::page_fetcher::PageFetcher;
use crate::infrastructure::parsing::{
    ParsingResult, ProductDetailParser, ProductListParser, SiteSelectors,
};

pub struct SiteAdapter {
    profile: SiteProfile,
    fetcher: Arc<dyn PageFetcher>,
    listing: ProductListParser,
    homepage: ProductListParser,
    detail: ProductDetailParser,
}

impl SiteAdapter {
    /// Compile `selectors` for `profile`. Fails only on a malformed table.
    pub fn new(
        profile: SiteProfile,
        selectors: &SiteSelectors,
        fetcher: Arc<dyn PageFetcher>,
    ) -> ParsingResult<Self> {
        Ok(Self {
            profile,
            fetcher,
            listing: ProductListParser::with_config(&selectors.listing)?,
            homepage: ProductListParser::with_config(&selectors.homepage)?,
            detail: ProductDetailParser::with_config(&selectors.detail)?,
        })
    }

    pub fn site(&self) -> SiteId {
        self.profile.site
    }

    pub fn profile(&self) -> &SiteProfile {
        &self.profile
    }

    /// Ranked trending products; never empty.
    pub async fn get_trending_products(&self) -> Vec<TrendingProduct> {
        info!("Scraping trending products from {}", self.profile.site.display_name());
        TrendingPipeline::new(
            &self.profile,
            self.fetcher.as_ref(),
            &self.listing,
            &self.homepage,
        )
        .run()
        .await
    }

    /// Fetch the product's own page and fill in whatever it is missing.
    ///
    /// On any failure the product comes back unchanged.
    pub async fn get_product_details(&self, product: TrendingProduct) -> TrendingProduct {
        let span = info_span!("details", rank = product.rank);
        async move {
            let Some(body) = self.fetcher.get_page(&product.url).await else {
                warn!("Detail page unavailable for {}", product.url);
                return product;
            };

            match self.detail.parse_details(&body, &product.url) {
                Ok(details) if details.is_empty() => {
                    debug!("Detail page of {} had nothing to add", product.url);
                    product
                }
                Ok(details) => product.merge_details(details),
                Err(e) => {
                    warn!("Could not parse detail page {}: {}", product.url, e);
                    product
                }
            }
        }
        .instrument(span)
        .await
    }

    /// Enrich the first `limit` products in place order; the rest pass
    /// through untouched. The placeholder record is never enriched.
    pub async fn enrich_top(
        &self,
        products: Vec<TrendingProduct>,
        limit: usize,
    ) -> Vec<TrendingProduct> {
        let mut enriched = Vec::with_capacity(products.len());
        for (index, product) in products.into_iter().enumerate() {
            if index < limit && !product.is_not_found() {
                enriched.push(self.get_product_details(product).await);
            } else {
                enriched.push(product);
            }
        }
        enriched
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::page_fetcher::StaticPageFetcher;
    use crate::infrastructure::sites;

    const PRODUCT_URL: &str = "https://www.daraz.np/products/kettle-i1.html";

    fn adapter(fetcher: StaticPageFetcher) -> SiteAdapter {
        SiteAdapter::new(
            SiteProfile::builtin(SiteId::DarazNp),
            &sites::selectors_for(SiteId::DarazNp),
            Arc::new(fetcher),
        )
        .unwrap()
    }

    fn kettle() -> TrendingProduct {
        let mut product = TrendingProduct::new("Kettle", PRODUCT_URL, "daraz.np", 1);
        product.category = Some("Kitchen".to_string());
        product
    }

    #[tokio::test]
    async fn details_fill_missing_fields_only() {
        let page = r#"<html><body>
            <div class="pdp-breadcrumb"><a>Home</a><a>Appliances</a></div>
            <div class="pdp-product-desc">Boils a litre in three minutes.</div>
            <span class="seller-name">Kathmandu Traders</span>
        </body></html>"#;
        let adapter = adapter(StaticPageFetcher::new().with_page(PRODUCT_URL, page));

        let product = adapter.get_product_details(kettle()).await;
        assert_eq!(product.description.as_deref(), Some("Boils a litre in three minutes."));
        assert_eq!(product.seller.as_deref(), Some("Kathmandu Traders"));
        assert_eq!(product.category.as_deref(), Some("Kitchen"));
    }

    #[tokio::test]
    async fn unavailable_detail_page_returns_product_unchanged() {
        let adapter = adapter(StaticPageFetcher::new());
        let before = kettle();

        let after = adapter.get_product_details(before.clone()).await;
        assert_eq!(after, before);
    }

    #[tokio::test]
    async fn enrich_top_skips_placeholder_and_tail() {
        let fetcher = Arc::new(StaticPageFetcher::new());
        let adapter = SiteAdapter::new(
            SiteProfile::builtin(SiteId::DarazNp),
            &sites::selectors_for(SiteId::DarazNp),
            fetcher.clone(),
        )
        .unwrap();

        let products = vec![
            TrendingProduct::not_found("daraz.np", "https://www.daraz.np"),
            TrendingProduct::new("Second", "https://www.daraz.np/products/2", "daraz.np", 2),
            TrendingProduct::new("Third", "https://www.daraz.np/products/3", "daraz.np", 3),
        ];

        let enriched = adapter.enrich_top(products, 2).await;
        assert_eq!(enriched.len(), 3);
        assert_eq!(fetcher.requested(), vec!["https://www.daraz.np/products/2"]);
    }
}
