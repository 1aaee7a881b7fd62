//! Registered e-commerce sites

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SiteId {
    AmazonIn,
    DarazNp,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown site '{0}' (expected one of: amazon_in, daraz_np)")]
pub struct UnknownSite(pub String);

impl SiteId {
    pub const ALL: [SiteId; 2] = [SiteId::AmazonIn, SiteId::DarazNp];

    /// Registry key, also the prefix of stored result files.
    pub fn key(self) -> &'static str {
        match self {
            SiteId::AmazonIn => "amazon_in",
            SiteId::DarazNp => "daraz_np",
        }
    }

    /// Value written to `TrendingProduct::source` for listing-page records.
    pub fn source(self) -> &'static str {
        match self {
            SiteId::AmazonIn => "amazon.in",
            SiteId::DarazNp => "daraz.np",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            SiteId::AmazonIn => "Amazon India",
            SiteId::DarazNp => "Daraz Nepal",
        }
    }

    pub fn default_base_url(self) -> &'static str {
        match self {
            SiteId::AmazonIn => "https://www.amazon.in",
            SiteId::DarazNp => "https://www.daraz.np",
        }
    }

    pub fn default_trending_pages(self) -> &'static [&'static str] {
        match self {
            SiteId::AmazonIn => &[
                "/gp/bestsellers/",
                "/gp/new-releases/",
                "/gp/movers-and-shakers/",
                "/deals/",
            ],
            SiteId::DarazNp => &["/trending-products/", "/top-selling-products/"],
        }
    }
}

/// Where and what to fetch for one site, after configuration overrides.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteProfile {
    pub site: SiteId,
    pub base_url: String,
    /// Listing pages in priority order.
    pub trending_pages: Vec<String>,
}

impl SiteProfile {
    pub fn builtin(site: SiteId) -> Self {
        Self {
            site,
            base_url: site.default_base_url().to_string(),
            trending_pages: site
                .default_trending_pages()
                .iter()
                .map(ToString::to_string)
                .collect(),
        }
    }

    pub fn source(&self) -> &'static str {
        self.site.source()
    }
}

impl fmt::Display for SiteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for SiteId {
    type Err = UnknownSite;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        SiteId::ALL
            .into_iter()
            .find(|site| site.key() == wanted || site.source() == wanted)
            .ok_or_else(|| UnknownSite(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_keys_and_sources() {
        assert_eq!("amazon_in".parse::<SiteId>(), Ok(SiteId::AmazonIn));
        assert_eq!("daraz.np".parse::<SiteId>(), Ok(SiteId::DarazNp));
        assert_eq!(" Daraz_NP ".parse::<SiteId>(), Ok(SiteId::DarazNp));
        assert!("ebay_us".parse::<SiteId>().is_err());
    }

    #[test]
    fn listing_paths_are_ordered() {
        assert_eq!(SiteId::AmazonIn.default_trending_pages()[0], "/gp/bestsellers/");
        assert_eq!(SiteId::DarazNp.default_trending_pages().len(), 2);
    }
}
