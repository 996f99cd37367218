//! Document extraction
//!
//! Turns fetched documents into structured values:
//! - `Record`: one review article
//! - `ReviewExtractor`: the default selector-driven review extractor
//! - `ListingExtractor`: product links on a listing page, for target discovery
//!
//! Extraction is idempotent: the same document always yields the same records.

mod listing;
mod record;
mod reviews;

pub use listing::{ListingEntry, ListingExtractor};
pub use record::Record;
pub use reviews::{ReviewExtractor, ReviewSelectors};

use thiserror::Error;

/// Errors raised while extracting records
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("Invalid selector '{selector}': {message}")]
    Selector { selector: String, message: String },

    #[error("Malformed document: {0}")]
    Malformed(String),
}

/// Context for one extraction call
#[derive(Debug, Clone, Copy)]
pub struct ExtractContext<'a> {
    /// Display name of the item, used when the document carries no title
    pub item_name: &'a str,

    /// Title fixed by an earlier page of the same item
    pub title: Option<&'a str>,

    /// Page number the document came from
    pub page: u32,
}

/// Converts a document into zero or more records
pub trait DocumentExtractor: Send + Sync {
    fn extract(&self, document: &str, context: &ExtractContext<'_>)
        -> Result<Vec<Record>, ExtractError>;
}

/// Parses a CSS selector, mapping the parser error into an [`ExtractError`]
pub(crate) fn parse_selector(selector: &str) -> Result<scraper::Selector, ExtractError> {
    scraper::Selector::parse(selector).map_err(|e| ExtractError::Selector {
        selector: selector.to_string(),
        message: e.to_string(),
    })
}
