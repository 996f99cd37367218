use super::{parse_selector, DocumentExtractor, ExtractContext, ExtractError, Record};
use scraper::{ElementRef, Html, Selector};

/// CSS selectors locating the fields of a review article
#[derive(Debug, Clone)]
pub struct ReviewSelectors {
    pub article: String,
    pub review_date: String,
    pub author: String,
    pub rating: String,
    pub product_name: String,
    pub headline: String,
    pub body: String,
    /// Tried when `body` matches nothing
    pub body_fallback: String,
    pub helpful_count: String,
    pub attachment: String,
}

impl Default for ReviewSelectors {
    fn default() -> Self {
        Self {
            article: "article.sdp-review__article__list".to_string(),
            review_date: "div.sdp-review__article__list__info__product-info__reg-date".to_string(),
            author: "span.sdp-review__article__list__info__user__name".to_string(),
            rating: "div.sdp-review__article__list__info__product-info__star-orange".to_string(),
            product_name: "div.sdp-review__article__list__info__product-info__name".to_string(),
            headline: "div.sdp-review__article__list__headline".to_string(),
            body: "div.sdp-review__article__list__review__content.js_reviewArticleContent"
                .to_string(),
            body_fallback: "div.sdp-review__article__list__review > div".to_string(),
            helpful_count: "span.js_reviewArticleHelpfulCount".to_string(),
            attachment: "div.sdp-review__article__list__attachment__list img".to_string(),
        }
    }
}

/// Compiled selectors, built once per extractor
struct Compiled {
    article: Selector,
    review_date: Selector,
    author: Selector,
    rating: Selector,
    product_name: Selector,
    headline: Selector,
    body: Selector,
    body_fallback: Selector,
    helpful_count: Selector,
    attachment: Selector,
}

/// Extracts review articles from a review-list document
pub struct ReviewExtractor {
    selectors: Compiled,
}

impl ReviewExtractor {
    pub fn new(selectors: &ReviewSelectors) -> Result<Self, ExtractError> {
        Ok(Self {
            selectors: Compiled {
                article: parse_selector(&selectors.article)?,
                review_date: parse_selector(&selectors.review_date)?,
                author: parse_selector(&selectors.author)?,
                rating: parse_selector(&selectors.rating)?,
                product_name: parse_selector(&selectors.product_name)?,
                headline: parse_selector(&selectors.headline)?,
                body: parse_selector(&selectors.body)?,
                body_fallback: parse_selector(&selectors.body_fallback)?,
                helpful_count: parse_selector(&selectors.helpful_count)?,
                attachment: parse_selector(&selectors.attachment)?,
            },
        })
    }

    /// The storefront's review markup
    pub fn storefront() -> Result<Self, ExtractError> {
        Self::new(&ReviewSelectors::default())
    }

    fn extract_article(&self, article: ElementRef<'_>, title: &str) -> Record {
        let s = &self.selectors;

        let rating = article
            .select(&s.rating)
            .next()
            .and_then(|e| e.value().attr("data-rating"))
            .and_then(|r| r.trim().parse::<u8>().ok())
            .unwrap_or(0);

        let body = first_text(article, &s.body)
            .or_else(|| first_text(article, &s.body_fallback))
            .map(|b| b.replace(['\n', '\t'], ""))
            .unwrap_or_default();

        let helpful_count = first_text(article, &s.helpful_count)
            .and_then(|t| {
                let digits: String = t.chars().filter(|c| c.is_ascii_digit()).collect();
                digits.parse::<u32>().ok()
            })
            .unwrap_or(0);

        Record {
            title: title.to_string(),
            product_name: first_text(article, &s.product_name).unwrap_or_else(|| "-".to_string()),
            review_date: first_text(article, &s.review_date).unwrap_or_else(|| "-".to_string()),
            author: first_text(article, &s.author).unwrap_or_else(|| "-".to_string()),
            rating,
            headline: first_text(article, &s.headline).unwrap_or_default(),
            body,
            helpful_count,
            attachment_count: article.select(&s.attachment).count() as u32,
        }
    }
}

impl DocumentExtractor for ReviewExtractor {
    fn extract(
        &self,
        document: &str,
        context: &ExtractContext<'_>,
    ) -> Result<Vec<Record>, ExtractError> {
        let html = Html::parse_document(document);
        let articles: Vec<ElementRef<'_>> = html.select(&self.selectors.article).collect();

        let title = match context.title {
            Some(title) => title.to_string(),
            None => articles
                .first()
                .and_then(|a| first_text(*a, &self.selectors.product_name))
                .unwrap_or_else(|| context.item_name.to_string()),
        };

        let records: Vec<Record> = articles
            .into_iter()
            .map(|article| self.extract_article(article, &title))
            .collect();

        tracing::trace!("Extracted {} records from page {}", records.len(), context.page);
        Ok(records)
    }
}

/// Trimmed text of the first match, if it has any
fn first_text(element: ElementRef<'_>, selector: &Selector) -> Option<String> {
    element
        .select(selector)
        .next()
        .map(|e| e.text().collect::<String>().trim().to_string())
        .filter(|t| !t.is_empty())
}
