use super::{parse_selector, ExtractError};
use scraper::{Html, Selector};
use serde::Serialize;
use url::Url;

/// A product found on a listing page
///
/// Serializes with the same keys the target-list loader reads.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListingEntry {
    #[serde(rename = "product_url")]
    pub url: String,

    #[serde(rename = "product_name")]
    pub name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<f32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub review_count: Option<u32>,
}

/// Extracts product links from a brand or category listing page
pub struct ListingExtractor {
    base: Url,
    product: Selector,
    link: Selector,
    name: Selector,
    price: Selector,
    rating: Selector,
    review_count: Selector,
}

impl ListingExtractor {
    /// Creates an extractor that resolves relative links against `base_url`
    pub fn new(base_url: &str) -> Result<Self, ExtractError> {
        let base = Url::parse(base_url)
            .map_err(|e| ExtractError::Malformed(format!("invalid base URL: {}", e)))?;

        Ok(Self {
            base,
            product: parse_selector("ul#productList li.baby-product")?,
            link: parse_selector("a.baby-product-link")?,
            name: parse_selector("div.name")?,
            price: parse_selector("strong.price-value")?,
            rating: parse_selector("em.rating")?,
            review_count: parse_selector("span.rating-total-count")?,
        })
    }

    /// Returns the products on the page in document order
    pub fn extract(&self, document: &str) -> Vec<ListingEntry> {
        let html = Html::parse_document(document);
        let mut entries = Vec::new();

        for product in html.select(&self.product) {
            let Some(href) = product
                .select(&self.link)
                .next()
                .and_then(|a| a.value().attr("href"))
            else {
                continue;
            };

            let Ok(url) = self.base.join(href) else {
                tracing::debug!("Skipping unresolvable product link: {}", href);
                continue;
            };

            let text_of = |selector: &Selector| {
                product
                    .select(selector)
                    .next()
                    .map(|e| e.text().collect::<String>().trim().to_string())
                    .filter(|t| !t.is_empty())
            };

            entries.push(ListingEntry {
                url: url.to_string(),
                name: text_of(&self.name).unwrap_or_default(),
                price: text_of(&self.price),
                rating: text_of(&self.rating).and_then(|r| r.parse().ok()),
                review_count: text_of(&self.review_count).and_then(|c| {
                    let digits: String = c.chars().filter(|ch| ch.is_ascii_digit()).collect();
                    digits.parse().ok()
                }),
            });
        }

        entries
    }
}
