//! Page attempt classification
//!
//! `classify` is a pure function from what one attempt observed to a
//! [`FetchOutcome`]; the fetcher decides what to do with the outcome.

use crate::config::CrawlerConfig;

/// Result of one page attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The page yielded records
    Success {
        /// Number of records extracted
        record_count: usize,
    },

    /// A valid page with no records and no sign of blocking: end of data
    EmptyNotBlocked,

    /// No records, block markers present, and no attempts left to retry
    EmptyBlocked {
        /// The block marker found in the body
        indicator: String,
    },

    /// Worth retrying with another identity and proxy
    TransientError(TransientReason),

    /// The page cannot be processed; retrying will not help
    FatalError(String),
}

/// Why an attempt is retried
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransientReason {
    /// HTTP 403
    AccessDenied,

    /// Any other non-200 status
    Status(u16),

    /// A first page with no records whose body looks like a block page
    BlockedContent { indicator: String },

    /// No response at all
    Network { message: String, timeout: bool },
}

impl TransientReason {
    /// Whether the failure counts against the proxy in use
    ///
    /// Network failures are attributed by the transport error itself.
    pub fn is_proxy_attributable(&self) -> bool {
        matches!(
            self,
            TransientReason::AccessDenied | TransientReason::BlockedContent { .. }
        )
    }

    /// Whether the retry should wait the longer block delay
    pub fn wants_long_delay(&self) -> bool {
        matches!(self, TransientReason::BlockedContent { .. })
    }
}

/// Inputs to classification that come from configuration
#[derive(Debug, Clone)]
pub struct ClassifyPolicy {
    /// Lower-cased block markers
    pub block_indicators: Vec<String>,

    /// Attempt budget per page
    pub max_attempts: u32,
}

impl ClassifyPolicy {
    pub fn from_config(config: &CrawlerConfig) -> Self {
        Self {
            block_indicators: config
                .block_indicators
                .iter()
                .map(|s| s.to_lowercase())
                .collect(),
            max_attempts: config.retry_attempts,
        }
    }

    /// The first block marker contained in `body`, case-insensitively
    pub fn find_block_indicator(&self, body: &str) -> Option<&str> {
        let lowered = body.to_lowercase();
        self.block_indicators
            .iter()
            .find(|marker| lowered.contains(marker.as_str()))
            .map(String::as_str)
    }
}

/// Classifies one attempt that received an HTTP response
///
/// | Observation | Outcome |
/// |-------------|---------|
/// | 403 | `TransientError(AccessDenied)` |
/// | other non-200 | `TransientError(Status)` |
/// | 200, records | `Success` |
/// | 200, none, page 1, block marker, attempts left | `TransientError(BlockedContent)` |
/// | 200, none, page 1, block marker, last attempt | `EmptyBlocked` |
/// | 200, none, otherwise | `EmptyNotBlocked` |
///
/// # Arguments
///
/// * `status` - HTTP status code
/// * `body` - Response body
/// * `record_count` - Records extracted from the body (0 for non-200)
/// * `attempt` - 1-based attempt number for this page
/// * `page` - 1-based page number
/// * `policy` - Block markers and attempt budget
pub fn classify(
    status: u16,
    body: &str,
    record_count: usize,
    attempt: u32,
    page: u32,
    policy: &ClassifyPolicy,
) -> FetchOutcome {
    if status == 403 {
        return FetchOutcome::TransientError(TransientReason::AccessDenied);
    }

    if status != 200 {
        return FetchOutcome::TransientError(TransientReason::Status(status));
    }

    if record_count > 0 {
        return FetchOutcome::Success { record_count };
    }

    // Only the first page can tell a block apart from an item without reviews
    if page == 1 {
        if let Some(indicator) = policy.find_block_indicator(body) {
            let indicator = indicator.to_string();
            if attempt < policy.max_attempts {
                return FetchOutcome::TransientError(TransientReason::BlockedContent {
                    indicator,
                });
            }
            return FetchOutcome::EmptyBlocked { indicator };
        }
    }

    FetchOutcome::EmptyNotBlocked
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> ClassifyPolicy {
        ClassifyPolicy::from_config(&CrawlerConfig::default())
    }

    #[test]
    fn test_forbidden_is_access_denied() {
        assert_eq!(
            classify(403, "", 0, 1, 1, &policy()),
            FetchOutcome::TransientError(TransientReason::AccessDenied)
        );
    }

    #[test]
    fn test_other_status_is_transient() {
        assert_eq!(
            classify(503, "<html>records</html>", 3, 1, 4, &policy()),
            FetchOutcome::TransientError(TransientReason::Status(503))
        );
        assert_eq!(
            classify(302, "", 0, 1, 1, &policy()),
            FetchOutcome::TransientError(TransientReason::Status(302))
        );
    }

    #[test]
    fn test_records_are_success() {
        assert_eq!(
            classify(200, "captcha", 5, 1, 1, &policy()),
            FetchOutcome::Success { record_count: 5 }
        );
    }

    #[test]
    fn test_captcha_on_first_page_is_retried() {
        let outcome = classify(200, "<p>Please solve the CAPTCHA</p>", 0, 1, 1, &policy());
        assert_eq!(
            outcome,
            FetchOutcome::TransientError(TransientReason::BlockedContent {
                indicator: "captcha".to_string()
            })
        );
    }

    #[test]
    fn test_captcha_on_last_attempt_is_empty_blocked() {
        let outcome = classify(200, "captcha", 0, 10, 1, &policy());
        assert_eq!(
            outcome,
            FetchOutcome::EmptyBlocked {
                indicator: "captcha".to_string()
            }
        );
    }

    #[test]
    fn test_block_heuristic_only_on_first_page() {
        assert_eq!(
            classify(200, "Access Denied", 0, 1, 2, &policy()),
            FetchOutcome::EmptyNotBlocked
        );
    }

    #[test]
    fn test_empty_first_page_without_marker() {
        assert_eq!(
            classify(200, "<html><body>No reviews yet</body></html>", 0, 1, 1, &policy()),
            FetchOutcome::EmptyNotBlocked
        );
    }

    #[test]
    fn test_custom_indicators() {
        let policy = ClassifyPolicy {
            block_indicators: vec!["잠시 후".to_string()],
            max_attempts: 3,
        };
        assert!(matches!(
            classify(200, "잠시 후 다시 시도해주세요", 0, 2, 1, &policy),
            FetchOutcome::TransientError(TransientReason::BlockedContent { .. })
        ));
        assert_eq!(
            classify(200, "captcha", 0, 1, 1, &policy),
            FetchOutcome::EmptyNotBlocked
        );
    }

    #[test]
    fn test_reason_attribution() {
        assert!(TransientReason::AccessDenied.is_proxy_attributable());
        assert!(TransientReason::BlockedContent {
            indicator: "bot".to_string()
        }
        .is_proxy_attributable());
        assert!(!TransientReason::Status(500).is_proxy_attributable());
        assert!(TransientReason::BlockedContent {
            indicator: "bot".to_string()
        }
        .wants_long_delay());
        assert!(!TransientReason::AccessDenied.wants_long_delay());
    }
}
