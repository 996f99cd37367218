use crate::config::types::{
    BrowserConfig, Config, CooldownConfig, CrawlerConfig, DelayRange, HttpConfig,
    IdentityConfig, ListingConfig, OutputConfig, ProxyConfig, TargetConfig,
};
use crate::identity::{is_excluded, FALLBACK_DESKTOP, FALLBACK_MOBILE};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_target_config(&config.target)?;
    validate_crawler_config(&config.crawler)?;
    validate_cooldown_config(&config.cooldown)?;
    validate_proxy_config(&config.proxy)?;
    validate_http_config(&config.http)?;
    validate_identity_config(&config.identity)?;
    validate_browser_config(&config.browser)?;
    validate_listing_config(&config.listing)?;
    validate_output_config(&config.output)?;
    Ok(())
}

fn validate_target_config(config: &TargetConfig) -> Result<(), ConfigError> {
    let base = Url::parse(&config.base_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid base-url: {}", e)))?;
    if base.host_str().is_none() {
        return Err(ConfigError::InvalidUrl(format!(
            "base-url '{}' has no host",
            config.base_url
        )));
    }

    Url::parse(&config.review_endpoint)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid review-endpoint: {}", e)))?;

    if config.item_path.trim_matches('/').is_empty() {
        return Err(ConfigError::Validation(
            "item-path cannot be empty".to_string(),
        ));
    }

    if config.page_size < 1 {
        return Err(ConfigError::Validation(format!(
            "page-size must be >= 1, got {}",
            config.page_size
        )));
    }

    Ok(())
}

fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.max_pages < 1 {
        return Err(ConfigError::Validation(format!(
            "max-pages must be >= 1, got {}",
            config.max_pages
        )));
    }

    if config.max_empty_pages < 1 {
        return Err(ConfigError::Validation(format!(
            "max-empty-pages must be >= 1, got {}",
            config.max_empty_pages
        )));
    }

    if config.retry_attempts < 1 {
        return Err(ConfigError::Validation(format!(
            "retry-attempts must be >= 1, got {}",
            config.retry_attempts
        )));
    }

    validate_delay("retry-delay", &config.retry_delay)?;
    validate_delay("blocked-retry-delay", &config.blocked_retry_delay)?;
    validate_delay("page-delay", &config.page_delay)?;
    validate_delay("item-delay", &config.item_delay)?;

    if config.block_indicators.iter().any(|s| s.trim().is_empty()) {
        return Err(ConfigError::Validation(
            "block-indicators cannot contain empty entries".to_string(),
        ));
    }

    Ok(())
}

fn validate_cooldown_config(config: &CooldownConfig) -> Result<(), ConfigError> {
    if config.trigger < 1 {
        return Err(ConfigError::Validation(format!(
            "cooldown trigger must be >= 1, got {}",
            config.trigger
        )));
    }

    if config.report_interval < 1 {
        return Err(ConfigError::Validation(format!(
            "cooldown report-interval must be >= 1s, got {}s",
            config.report_interval
        )));
    }

    validate_delay("cooldown window", &config.window)
}

fn validate_proxy_config(config: &ProxyConfig) -> Result<(), ConfigError> {
    if config.failure_threshold < 1 {
        return Err(ConfigError::Validation(format!(
            "failure-threshold must be >= 1, got {}",
            config.failure_threshold
        )));
    }

    if config.preferred_max_failures >= config.failure_threshold {
        return Err(ConfigError::Validation(format!(
            "preferred-max-failures ({}) must be below failure-threshold ({})",
            config.preferred_max_failures, config.failure_threshold
        )));
    }

    Url::parse(&config.preflight_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid preflight-url: {}", e)))?;

    Ok(())
}

fn validate_http_config(config: &HttpConfig) -> Result<(), ConfigError> {
    if config.connect_timeout < 1 {
        return Err(ConfigError::Validation(format!(
            "connect-timeout must be >= 1s, got {}s",
            config.connect_timeout
        )));
    }

    if config.connect_timeout >= config.read_timeout {
        return Err(ConfigError::Validation(format!(
            "connect-timeout ({}s) must be shorter than read-timeout ({}s)",
            config.connect_timeout, config.read_timeout
        )));
    }

    for (name, value) in &config.extra_headers {
        if reqwest::header::HeaderName::from_bytes(name.as_bytes()).is_err()
            || reqwest::header::HeaderValue::from_str(value).is_err()
        {
            return Err(ConfigError::Validation(format!(
                "invalid extra header '{}: {}'",
                name, value
            )));
        }
    }

    Ok(())
}

fn validate_identity_config(config: &IdentityConfig) -> Result<(), ConfigError> {
    if config.max_attempts < 1 {
        return Err(ConfigError::Validation(format!(
            "identity max-attempts must be >= 1, got {}",
            config.max_attempts
        )));
    }

    // The generator falls back to these when every draw is rejected
    for fallback in [FALLBACK_DESKTOP, FALLBACK_MOBILE] {
        if is_excluded(fallback, &config.excluded_keywords) {
            return Err(ConfigError::Validation(format!(
                "excluded-keywords reject the fallback identity '{}'",
                fallback
            )));
        }
    }

    Ok(())
}

fn validate_browser_config(config: &BrowserConfig) -> Result<(), ConfigError> {
    if config.stable_checks < 1 {
        return Err(ConfigError::Validation(format!(
            "stable-checks must be >= 1, got {}",
            config.stable_checks
        )));
    }

    if config.max_scrolls < config.stable_checks {
        return Err(ConfigError::Validation(format!(
            "max-scrolls ({}) must be >= stable-checks ({})",
            config.max_scrolls, config.stable_checks
        )));
    }

    validate_delay("scroll-delay", &config.scroll_delay)?;
    validate_delay("warm-up-delay", &config.warm_up_delay)
}

fn validate_listing_config(config: &ListingConfig) -> Result<(), ConfigError> {
    if !config.url_template.contains("{page}") {
        return Err(ConfigError::Validation(format!(
            "listing url-template must contain {{page}}, got '{}'",
            config.url_template
        )));
    }

    Url::parse(&config.page_url(1))
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid listing url-template: {}", e)))?;

    validate_delay("listing page-delay", &config.page_delay)
}

fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.database_path.is_empty() {
        return Err(ConfigError::Validation(
            "database-path cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates a delay range: finite, non-negative, ordered
fn validate_delay(name: &str, range: &DelayRange) -> Result<(), ConfigError> {
    if !range.min.is_finite() || !range.max.is_finite() || range.min < 0.0 {
        return Err(ConfigError::Validation(format!(
            "{} must be finite and non-negative, got {}..{}",
            name, range.min, range.max
        )));
    }

    if range.min > range.max {
        return Err(ConfigError::Validation(format!(
            "{} min ({}) must not exceed max ({})",
            name, range.min, range.max
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate(&Config::default()).is_ok());
    }

    #[test]
    fn test_inverted_delay_rejected() {
        let mut config = Config::default();
        config.crawler.page_delay = DelayRange::new(3.0, 1.0);
        assert!(matches!(
            validate(&config),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn test_negative_delay_rejected() {
        let mut config = Config::default();
        config.crawler.retry_delay = DelayRange::new(-1.0, 1.0);
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_connect_timeout_must_be_shorter() {
        let mut config = Config::default();
        config.http.connect_timeout = 30;
        config.http.read_timeout = 30;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_keywords_rejecting_fallback() {
        let mut config = Config::default();
        config.identity.excluded_keywords.push("macintosh".to_string());
        let err = validate(&config).unwrap_err();
        assert!(err.to_string().contains("fallback"));
    }

    #[test]
    fn test_preferred_failures_below_threshold() {
        let mut config = Config::default();
        config.proxy.failure_threshold = 2;
        config.proxy.preferred_max_failures = 2;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_listing_template_needs_placeholder() {
        let mut config = Config::default();
        config.listing.url_template = "https://shop.test/list".to_string();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_invalid_base_url() {
        let mut config = Config::default();
        config.target.base_url = "not a url".to_string();
        assert!(matches!(
            validate(&config),
            Err(ConfigError::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_invalid_preflight_url() {
        let mut config = Config::default();
        config.proxy.preflight_url = "httpbin/ip".to_string();
        assert!(matches!(
            validate(&config),
            Err(ConfigError::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_invalid_extra_header() {
        let mut config = Config::default();
        config
            .http
            .extra_headers
            .insert("bad header".to_string(), "x".to_string());
        assert!(validate(&config).is_err());
    }
}
