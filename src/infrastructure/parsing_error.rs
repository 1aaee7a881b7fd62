//! Error types for markup extraction
//!
//! A field that simply is not present on a card is not an error at all: it is
//! an `Ok(None)` from the field extractor. The variants below describe faults,
//! and each one tells the caller at which granularity it should be absorbed.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParsingError {
    #[error("Invalid CSS selector: {selector} - {reason}")]
    InvalidSelector { selector: String, reason: String },

    #[error("Invalid text pattern: {pattern} - {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("Extraction of '{field}' failed in strategy '{strategy}': {reason}")]
    FieldExtractionFault {
        field: String,
        strategy: String,
        reason: String,
    },

    #[error("Required field '{field}' could not be recovered")]
    RequiredFieldMissing {
        field: String,
        context: Option<String>,
    },

    #[error("Empty document received for {url}")]
    EmptyDocument { url: String },

    #[error("HTML parsing failed: {message}")]
    HtmlParsingFailed {
        message: String,
        url: Option<String>,
    },
}

impl ParsingError {
    pub fn invalid_selector(selector: &str, reason: impl ToString) -> Self {
        Self::InvalidSelector {
            selector: selector.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn invalid_pattern(pattern: &str, reason: impl ToString) -> Self {
        Self::InvalidPattern {
            pattern: pattern.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn field_fault(field: &str, strategy: &str, reason: impl ToString) -> Self {
        Self::FieldExtractionFault {
            field: field.to_string(),
            strategy: strategy.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn required_field_missing(field: &str, context: Option<&str>) -> Self {
        Self::RequiredFieldMissing {
            field: field.to_string(),
            context: context.map(ToString::to_string),
        }
    }

    /// Faults confined to a single card. The builder logs them and moves on
    /// to the next card; everything else aborts the page or the setup.
    pub fn is_card_local(&self) -> bool {
        matches!(
            self,
            Self::FieldExtractionFault { .. } | Self::RequiredFieldMissing { .. }
        )
    }

    /// Faults that cover a whole page; the pipeline advances to the next tier.
    pub fn is_page_level(&self) -> bool {
        matches!(self, Self::EmptyDocument { .. } | Self::HtmlParsingFailed { .. })
    }
}

pub type ParsingResult<T> = Result<T, ParsingError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification() {
        assert!(ParsingError::field_fault("price", "css:.a-price", "boom").is_card_local());
        assert!(!ParsingError::invalid_selector("!!", "bad").is_card_local());
        assert!(ParsingError::EmptyDocument { url: "/".into() }.is_page_level());
    }

    #[test]
    fn messages_name_the_field_and_strategy() {
        let err = ParsingError::field_fault("rating", "css:i.a-icon-star", "bad utf-8");
        assert_eq!(
            err.to_string(),
            "Extraction of 'rating' failed in strategy 'css:i.a-icon-star': bad utf-8"
        );
    }
}
