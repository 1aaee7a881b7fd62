//! Per-page parsing context

use crate::domain::product::HOMEPAGE_SUFFIX;

/// Which tier of the pipeline a page belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageKind {
    Listing,
    Homepage,
}

impl PageKind {
    pub fn as_str(self) -> &'static str {
        match self {
            PageKind::Listing => "listing",
            PageKind::Homepage => "homepage",
        }
    }
}

/// Context information for parsing one fetched page
#[derive(Debug, Clone)]
pub struct ParseContext {
    /// Base URL for resolving relative links
    pub base_url: String,

    /// Site source label, e.g. `amazon.in`
    pub source: String,

    /// Path or URL the document was fetched from
    pub page: String,

    pub kind: PageKind,
}

impl ParseContext {
    pub fn new(base_url: &str, source: &str, page: &str, kind: PageKind) -> Self {
        Self {
            base_url: base_url.to_string(),
            source: source.to_string(),
            page: page.to_string(),
            kind,
        }
    }

    /// `source` as stamped on records from this page.
    pub fn record_source(&self) -> String {
        match self.kind {
            PageKind::Listing => self.source.clone(),
            PageKind::Homepage => format!("{}{HOMEPAGE_SUFFIX}", self.source),
        }
    }
}
