//! Application layer
//!
//! Use cases built on the infrastructure: the tiered trending pipeline, the
//! per-site adapters that run it, and post-processing of stored results.

pub mod analysis;
pub mod charts;
pub mod scraper_factory;
pub mod site_adapter;
pub mod trending_pipeline;

pub use analysis::{AnalysisError, AnalysisReport, ProductAnalyzer};
pub use charts::ChartRenderer;
pub use scraper_factory::ScraperFactory;
pub use site_adapter::SiteAdapter;
pub use trending_pipeline::{PipelineState, TrendingPipeline};
