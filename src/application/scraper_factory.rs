//! Site registry
//!
//! Maps a site key to a ready-to-use [`SiteAdapter`]. Unknown keys are an
//! ordinary outcome here: they are logged and reported as `None`.

use std::sync::Arc;

use tracing::{error, info};

use super::site_adapter::SiteAdapter;
use crate::domain::site::SiteId;
use crate::infrastructure::config::AppConfig;
use crate::infrastructure::page_fetcher::PageFetcher;
use crate::infrastructure::parsing::ParsingResult;
use crate::infrastructure::simple_http_client::{HttpClient, HttpClientConfig};
use crate::infrastructure::sites;

pub struct ScraperFactory;

impl ScraperFactory {
    /// Keys accepted by [`ScraperFactory::create`].
    pub fn available_sites() -> Vec<&'static str> {
        SiteId::ALL.iter().map(|site| site.key()).collect()
    }

    /// Adapter for `key` backed by a live HTTP client.
    pub fn create(key: &str, config: &AppConfig) -> Option<SiteAdapter> {
        let site = match key.parse::<SiteId>() {
            Ok(site) => site,
            Err(e) => {
                error!("{}", e);
                return None;
            }
        };

        let profile = config.site_profile(site);
        let http_config =
            HttpClientConfig::from_scraper_config(&config.scraper, config.user_agent_for(site));
        let client = match HttpClient::with_config(&profile.base_url, http_config) {
            Ok(client) => client,
            Err(e) => {
                error!("Failed to create HTTP client for {}: {}", site, e);
                return None;
            }
        };

        match Self::create_with_fetcher(site, config, Arc::new(client)) {
            Ok(adapter) => {
                info!("Created scraper for {} ({})", site.display_name(), profile.base_url);
                Some(adapter)
            }
            Err(e) => {
                error!("Failed to compile selectors for {}: {}", site, e);
                None
            }
        }
    }

    /// Adapter for `site` reading pages from `fetcher`.
    pub fn create_with_fetcher(
        site: SiteId,
        config: &AppConfig,
        fetcher: Arc<dyn PageFetcher>,
    ) -> ParsingResult<SiteAdapter> {
        SiteAdapter::new(config.site_profile(site), &sites::selectors_for(site), fetcher)
    }
}
