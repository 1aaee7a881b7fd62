//! Infrastructure layer for page fetching, markup parsing, storage and logging

pub mod config;
pub mod logging;
pub mod page_fetcher;
pub mod parsing;
pub mod parsing_error;
pub mod product_repository;
pub mod simple_http_client;
pub mod sites;

pub use config::AppConfig;
pub use logging::{init_logging, init_logging_with_config};
pub use page_fetcher::{PageFetcher, StaticPageFetcher};
pub use parsing::{ParsingError, ParsingResult, ProductDetailParser, ProductListParser};
pub use product_repository::ProductRepository;
pub use simple_http_client::{HttpClient, HttpClientConfig};
