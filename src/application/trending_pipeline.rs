//! Tiered discovery of trending products for one site
//!
//! Listing pages are tried in priority order and the first page that yields
//! at least one record ends the run. When every listing page comes back
//! empty the homepage carousel is tried, and when that is empty too a single
//! placeholder record is returned. The caller always gets a non-empty list.

use tracing::{error, info, info_span, warn, Instrument};

use crate::domain::product::TrendingProduct;
use crate::domain::site::SiteProfile;
use crate::infrastructure::page_fetcher::PageFetcher;
use crate::infrastructure::parsing::{PageKind, ParseContext, ProductListParser};

const HOMEPAGE_PATH: &str = "/";

/// Where the pipeline currently stands.
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineState {
    /// Next listing page to try, as an index into the profile's page list
    TryListingPage(usize),
    TryHomepage,
    Done(Vec<TrendingProduct>),
}

pub struct TrendingPipeline<'a> {
    profile: &'a SiteProfile,
    fetcher: &'a dyn PageFetcher,
    listing: &'a ProductListParser,
    homepage: &'a ProductListParser,
}

impl<'a> TrendingPipeline<'a> {
    pub fn new(
        profile: &'a SiteProfile,
        fetcher: &'a dyn PageFetcher,
        listing: &'a ProductListParser,
        homepage: &'a ProductListParser,
    ) -> Self {
        Self {
            profile,
            fetcher,
            listing,
            homepage,
        }
    }

    /// Drive the state machine to completion.
    pub async fn run(&self) -> Vec<TrendingProduct> {
        let span = info_span!("trending", site = self.profile.site.key());
        async move {
            let mut state = PipelineState::TryListingPage(0);
            loop {
                state = match state {
                    PipelineState::Done(products) => {
                        info!("Returning {} products", products.len());
                        return products;
                    }
                    pending => self.step(pending).await,
                };
            }
        }
        .instrument(span)
        .await
    }

    /// Advance by one tier attempt.
    pub async fn step(&self, state: PipelineState) -> PipelineState {
        match state {
            PipelineState::TryListingPage(index) => {
                let Some(path) = self.profile.trending_pages.get(index) else {
                    warn!("No listing page produced products, trying homepage");
                    return PipelineState::TryHomepage;
                };

                let products = self.extract_page(path, PageKind::Listing).await;
                if products.is_empty() {
                    PipelineState::TryListingPage(index + 1)
                } else {
                    info!("Found {} products on {}", products.len(), path);
                    PipelineState::Done(products)
                }
            }
            PipelineState::TryHomepage => {
                let products = self.extract_page(HOMEPAGE_PATH, PageKind::Homepage).await;
                if products.is_empty() {
                    warn!("No trending products found on any page");
                    PipelineState::Done(vec![TrendingProduct::not_found(
                        self.profile.source(),
                        &self.profile.base_url,
                    )])
                } else {
                    PipelineState::Done(products)
                }
            }
            done @ PipelineState::Done(_) => done,
        }
    }

    /// Fetch and parse one page. Anything that goes wrong at page level is
    /// logged and reported as an empty page.
    async fn extract_page(&self, path: &str, kind: PageKind) -> Vec<TrendingProduct> {
        let span = info_span!("page", path, tier = kind.as_str());
        async move {
            let Some(body) = self.fetcher.get_page(path).await else {
                warn!("Page unavailable, moving on");
                return Vec::new();
            };

            let parser = match kind {
                PageKind::Listing => self.listing,
                PageKind::Homepage => self.homepage,
            };
            let context = ParseContext::new(
                &self.profile.base_url,
                self.profile.source(),
                path,
                kind,
            );

            match parser.parse_document(&body, &context) {
                Ok(products) => products,
                Err(e) if e.is_page_level() => {
                    warn!("Page could not be parsed: {}", e);
                    Vec::new()
                }
                Err(e) => {
                    error!("Extraction aborted: {}", e);
                    Vec::new()
                }
            }
        }
        .instrument(span)
        .await
    }
}
