//! Trending Scraper - trending product discovery for e-commerce sites
//!
//! Pulls the currently trending products of a supported site, tolerating
//! markup drift through ordered fallback strategies, and stores, analyzes
//! and charts the results.
//!
//! The library never installs a tracing subscriber; the binary does that
//! through [`infrastructure::logging`].

pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod utils;

pub use application::{ProductAnalyzer, ScraperFactory, SiteAdapter};
pub use domain::{ProductDetails, SiteId, TrendingProduct};
