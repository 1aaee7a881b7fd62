//! Page source abstraction
//!
//! The pipeline only ever asks for a page body by path or absolute URL and
//! treats `None` as "this page is unavailable". Retries, rate limits and
//! transport errors stay behind the trait.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Body of the page at `path_or_url`, or `None` once every attempt failed.
    async fn get_page(&self, path_or_url: &str) -> Option<String>;
}

/// In-memory fetcher serving fixed bodies keyed by the exact requested path.
///
/// Every request is recorded so callers can assert which pages were visited
/// and in what order.
#[derive(Debug, Default)]
pub struct StaticPageFetcher {
    pages: HashMap<String, String>,
    requests: Mutex<Vec<String>>,
}

impl StaticPageFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_page(mut self, path: &str, body: impl Into<String>) -> Self {
        self.pages.insert(path.to_string(), body.into());
        self
    }

    pub fn requested(&self) -> Vec<String> {
        self.requests
            .lock()
            .map(|log| log.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl PageFetcher for StaticPageFetcher {
    async fn get_page(&self, path_or_url: &str) -> Option<String> {
        if let Ok(mut log) = self.requests.lock() {
            log.push(path_or_url.to_string());
        }
        self.pages.get(path_or_url).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn serves_known_paths_and_records_requests() {
        let fetcher = StaticPageFetcher::new().with_page("/a", "<p>a</p>");

        assert_eq!(fetcher.get_page("/a").await.as_deref(), Some("<p>a</p>"));
        assert_eq!(fetcher.get_page("/b").await, None);
        assert_eq!(fetcher.requested(), vec!["/a", "/b"]);
    }
}
