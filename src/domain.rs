//! Domain module - records and site identities
//!
//! Nothing in here performs I/O.

pub mod product;
pub mod site;

pub use product::{ProductDetails, TrendingProduct};
pub use site::{SiteId, SiteProfile, UnknownSite};
