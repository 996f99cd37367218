use crate::config::types::Config;
use crate::config::validation::validate;
use crate::ConfigError;
use sha2::{Digest, Sha256};
use std::path::Path;

/// Reads, parses and validates a TOML configuration file
///
/// Keys missing from the file take their defaults; see [`Config`].
///
/// ```no_run
/// use std::path::Path;
/// use review_harvester::config::load_config;
///
/// let config = load_config(Path::new("harvest.toml")).unwrap();
/// println!("Retry budget: {}", config.crawler.retry_attempts);
/// ```
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    parse_config(&std::fs::read_to_string(path)?)
}

/// Parses and validates configuration from TOML text
pub fn parse_config(content: &str) -> Result<Config, ConfigError> {
    let config: Config = toml::from_str(content)?;
    validate(&config)?;
    Ok(config)
}

/// Hex SHA-256 of the configuration file, stored with each run
pub fn compute_config_hash(path: &Path) -> Result<String, ConfigError> {
    Ok(hash_content(&std::fs::read_to_string(path)?))
}

fn hash_content(content: &str) -> String {
    hex::encode(Sha256::digest(content.as_bytes()))
}

/// Loads a configuration together with the hash of the exact text parsed
pub fn load_config_with_hash(path: &Path) -> Result<(Config, String), ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let config = parse_config(&content)?;
    Ok((config, hash_content(&content)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DelayRange;
    use crate::identity::IdentityKind;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn config_file(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", content).unwrap();
        file
    }

    #[test]
    fn test_load_valid_config() {
        let config_content = r#"
[crawler]
max-pages = 40
max-empty-pages = 3
retry-attempts = 4
retry-delay = { min = 0.5, max = 1.5 }

[cooldown]
trigger = 2
window = { min = 60.0, max = 90.0 }

[proxy]
required = true

[http]
connect-timeout = 5
read-timeout = 20

[output]
database-path = "./test.db"
"#;

        let file = config_file(config_content);
        let config = load_config(file.path()).unwrap();

        assert_eq!(config.crawler.max_pages, 40);
        assert_eq!(config.crawler.max_empty_pages, 3);
        assert_eq!(config.crawler.retry_attempts, 4);
        assert_eq!(config.crawler.retry_delay, DelayRange::new(0.5, 1.5));
        assert_eq!(config.cooldown.trigger, 2);
        assert!(config.proxy.required);
        assert_eq!(config.http.read_timeout, 20);
        assert_eq!(config.output.database_path, "./test.db");
        // Untouched keys keep their defaults
        assert_eq!(config.crawler.proxy_change_budget, 3);
        assert_eq!(config.proxy.failure_threshold, 3);
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = parse_config("").unwrap();
        assert_eq!(config.crawler.max_pages, 150);
        assert_eq!(config.crawler.max_empty_pages, 5);
        assert_eq!(config.crawler.retry_attempts, 10);
        assert_eq!(config.cooldown.trigger, 5);
        assert_eq!(config.cooldown.window, DelayRange::new(600.0, 900.0));
        assert_eq!(config.identity.max_attempts, 20);
        assert_eq!(config.http.connect_timeout, 15);
        assert_eq!(config.http.read_timeout, 30);
        assert!(config.crawler.block_indicators.contains(&"captcha".to_string()));
        assert_eq!(
            config.http.extra_headers.get("x-coupang-target-market"),
            Some(&"KR".to_string())
        );
    }

    #[test]
    fn test_identity_kind_and_preflight_keys() {
        let config = parse_config(
            r#"
[identity]
kind = "mobile"

[proxy]
preflight = true
preflight-url = "http://127.0.0.1:9/ip"
"#,
        )
        .unwrap();

        assert_eq!(config.identity.kind, IdentityKind::Mobile);
        assert!(config.proxy.preflight);
        assert_eq!(config.proxy.preflight_url, "http://127.0.0.1:9/ip");

        let defaults = parse_config("").unwrap();
        assert_eq!(defaults.identity.kind, IdentityKind::Random);
        assert!(!defaults.proxy.preflight);
    }

    #[test]
    fn test_unknown_identity_kind_rejected() {
        let result = parse_config("[identity]\nkind = \"tablet\"\n");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_load_config_with_invalid_path() {
        let result = load_config(Path::new("/nonexistent/harvest.toml"));
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }

    #[test]
    fn test_load_config_with_invalid_toml() {
        let file = config_file("this is not valid TOML {{{");
        let result = load_config(file.path());
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_load_config_with_validation_error() {
        let config_content = r#"
[crawler]
retry-attempts = 0
"#;
        let file = config_file(config_content);
        let result = load_config(file.path());
        assert!(matches!(result.unwrap_err(), ConfigError::Validation(_)));
    }

    #[test]
    fn test_hash_matches_loaded_text() {
        let file = config_file("[crawler]\nmax-pages = 7\n");

        let (config, hash) = load_config_with_hash(file.path()).unwrap();
        assert_eq!(config.crawler.max_pages, 7);
        assert_eq!(hash, compute_config_hash(file.path()).unwrap());
        assert_eq!(hash.len(), 64);
    }

    #[test]
    fn test_different_content_different_hash() {
        let file1 = config_file("[crawler]\nmax-pages = 1\n");
        let file2 = config_file("[crawler]\nmax-pages = 2\n");

        let (_, hash1) = load_config_with_hash(file1.path()).unwrap();
        let (_, hash2) = load_config_with_hash(file2.path()).unwrap();

        assert_ne!(hash1, hash2);
    }
}
