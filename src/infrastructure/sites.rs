//! Built-in selector tables, one module per supported site

pub mod amazon_in;
pub mod daraz_np;

use crate::domain::site::SiteId;
use crate::infrastructure::parsing::SiteSelectors;

pub fn selectors_for(site: SiteId) -> SiteSelectors {
    match site {
        SiteId::AmazonIn => amazon_in::selectors(),
        SiteId::DarazNp => daraz_np::selectors(),
    }
}
