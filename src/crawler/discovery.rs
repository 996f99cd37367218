//! Listing discovery
//!
//! Walks the pages of a brand or category listing and collects the products
//! on them as harvest targets.

use super::Pacer;
use crate::config::Config;
use crate::extract::{ListingEntry, ListingExtractor};
use crate::session::BrowserBootstrap;
use crate::state::TargetItem;
use std::collections::HashSet;

/// Collects product entries from `listing.max-pages` listing pages
///
/// A page that fails to load is skipped. Entries are de-duplicated by item
/// id, keeping the first occurrence; links that are not item pages of the
/// configured storefront are dropped.
///
/// # Arguments
///
/// * `config` - Listing URL template, page count and delays
/// * `bootstrap` - Loads each listing page with lazy content expanded
/// * `pacer` - Waits between pages and observes shutdown
///
/// # Returns
///
/// * `Ok(Vec<ListingEntry>)` - Unique entries in listing order
/// * `Err(HarvestError)` - The storefront base URL is invalid
pub async fn discover_targets(
    config: &Config,
    bootstrap: &mut dyn BrowserBootstrap,
    pacer: &mut Pacer,
) -> crate::Result<Vec<ListingEntry>> {
    let extractor = ListingExtractor::new(&config.target.base_url)?;
    let listing = &config.listing;
    let mut seen = HashSet::new();
    let mut entries = Vec::new();

    for page in 1..=listing.max_pages {
        if pacer.is_cancelled() {
            tracing::warn!("Shutdown requested, stopping discovery at page {}", page);
            break;
        }

        let url = listing.page_url(page);
        tracing::info!("Listing page {}/{}: {}", page, listing.max_pages, url);

        match bootstrap.load_fully_scrolled(&url).await {
            Ok(document) => {
                let found = extractor.extract(&document);
                let before = entries.len();
                for entry in found {
                    let id = match TargetItem::from_url(&entry.url, &entry.name, &config.target) {
                        Ok(item) => item.id,
                        Err(e) => {
                            tracing::debug!("Ignoring listing link: {}", e);
                            continue;
                        }
                    };
                    if seen.insert(id) {
                        entries.push(entry);
                    }
                }
                tracing::info!(
                    "Listing page {}: {} new products ({} total)",
                    page,
                    entries.len() - before,
                    entries.len()
                );
            }
            Err(e) => {
                tracing::warn!("Listing page {} failed, skipping: {}", page, e);
            }
        }

        if page < listing.max_pages && !pacer.pause(&listing.page_delay).await {
            break;
        }
    }

    Ok(entries)
}
