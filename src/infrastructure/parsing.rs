//! Markup extraction
//!
//! Layering, bottom up:
//! - [`strategy`]: one field, an ordered list of lookup strategies with
//!   short-circuit evaluation
//! - [`card_locator`]: a priority chain of card selector groups
//! - [`product_list_parser`]: one record per card, faults absorbed per card
//! - [`product_detail_parser`]: enrichment data from a product page
//!
//! Site differences live entirely in the [`config`] tables.

pub mod card_locator;
pub mod config;
pub mod context;
pub mod product_detail_parser;
pub mod product_list_parser;
pub mod strategy;

pub use crate::infrastructure::parsing_error::{ParsingError, ParsingResult};
pub use card_locator::CardLocator;
pub use config::{DetailSelectors, PageSelectors, SiteSelectors, StrategySpec};
pub use context::{PageKind, ParseContext};
pub use product_detail_parser::ProductDetailParser;
pub use product_list_parser::ProductListParser;
pub use strategy::{FieldSpec, Strategy};

use scraper::Html;

/// Parser over an already-built document tree
pub trait ContextualParser {
    type Output;
    type Context;

    fn parse_with_context(&self, html: &Html, context: &Self::Context) -> ParsingResult<Self::Output>;
}
