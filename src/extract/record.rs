use serde::Serialize;

/// One extracted review
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Record {
    /// Page title: the first article's product name, else the item name
    pub title: String,

    /// Purchased-product name shown on the article
    pub product_name: String,

    /// Review date as displayed
    pub review_date: String,

    /// Author as displayed
    pub author: String,

    /// Star rating, 0 when absent
    pub rating: u8,

    pub headline: String,

    /// Review body with newlines and tabs removed
    pub body: String,

    /// "Helpful" votes, 0 when absent
    pub helpful_count: u32,

    /// Attached images
    pub attachment_count: u32,
}
