use crate::config::types::{BatchConfig, Config, FetchConfig, OutputConfig, SiteConfig};
use crate::entry::MAX_ENTRY_ID;
use crate::ConfigError;
use url::Url;

/// Upper bound on simultaneous entry extractions
const MAX_CONCURRENCY: usize = 64;

/// Upper bound on retry attempts per request
const MAX_RETRIES: u32 = 10;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_site_config(&config.site)?;
    validate_fetch_config(&config.fetch)?;
    validate_batch_config(&config.batch)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates site URLs
fn validate_site_config(config: &SiteConfig) -> Result<(), ConfigError> {
    validate_http_url("entry-base-url", &config.entry_base_url)?;
    validate_http_url("series-base-url", &config.series_base_url)?;
    Ok(())
}

/// Validates transport configuration
fn validate_fetch_config(config: &FetchConfig) -> Result<(), ConfigError> {
    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user-agent cannot be empty".to_string(),
        ));
    }

    if config.timeout_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "timeout-secs must be >= 1, got {}",
            config.timeout_secs
        )));
    }

    if config.connect_timeout_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "connect-timeout-secs must be >= 1, got {}",
            config.connect_timeout_secs
        )));
    }

    if config.max_retries > MAX_RETRIES {
        return Err(ConfigError::Validation(format!(
            "max-retries must be <= {}, got {}",
            MAX_RETRIES, config.max_retries
        )));
    }

    Ok(())
}

/// Validates the identifier range and concurrency
fn validate_batch_config(config: &BatchConfig) -> Result<(), ConfigError> {
    if config.max_concurrent < 1 || config.max_concurrent > MAX_CONCURRENCY {
        return Err(ConfigError::Validation(format!(
            "max-concurrent must be between 1 and {}, got {}",
            MAX_CONCURRENCY, config.max_concurrent
        )));
    }

    validate_range(config.start_id, config.end_id)
}

/// Checks that `[start, end]` is a non-empty range of valid identifiers
pub fn validate_range(start: i64, end: i64) -> Result<(), ConfigError> {
    if start < 1 {
        return Err(ConfigError::Validation(format!(
            "start-id must be >= 1, got {}",
            start
        )));
    }

    if end > i64::from(MAX_ENTRY_ID) {
        return Err(ConfigError::Validation(format!(
            "end-id must be <= {}, got {}",
            MAX_ENTRY_ID, end
        )));
    }

    if start > end {
        return Err(ConfigError::Validation(format!(
            "start-id ({}) must not exceed end-id ({})",
            start, end
        )));
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.json_path.trim().is_empty() {
        return Err(ConfigError::Validation(
            "json-path cannot be empty".to_string(),
        ));
    }

    Ok(())
}

fn validate_http_url(key: &str, value: &str) -> Result<(), ConfigError> {
    let url = Url::parse(value)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid {} '{}': {}", key, value, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "{} '{}' must use http or https",
            key, value
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
    fn test_validate_range() {
        assert!(validate_range(1, 1).is_ok());
        assert!(validate_range(1, 9000).is_ok());

        assert!(validate_range(0, 10).is_err());
        assert!(validate_range(-3, 10).is_err());
        assert!(validate_range(10, 9).is_err());
        assert!(validate_range(1, 9001).is_err());
    }

    #[test]
    fn test_validate_site_urls() {
        let mut config = Config::default();
        config.site.series_base_url = "not a url".to_string();
        assert!(matches!(validate(&config), Err(ConfigError::InvalidUrl(_))));

        let mut config = Config::default();
        config.site.entry_base_url = "ftp://example.com/scp-".to_string();
        assert!(matches!(validate(&config), Err(ConfigError::InvalidUrl(_))));
    }

    #[test]
    fn test_validate_fetch_config() {
        let mut config = Config::default();
        config.fetch.timeout_secs = 0;
        assert!(validate(&config).is_err());

        let mut config = Config::default();
        config.fetch.max_retries = 11;
        assert!(validate(&config).is_err());

        let mut config = Config::default();
        config.fetch.user_agent = "  ".to_string();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_validate_concurrency() {
        let mut config = Config::default();
        config.batch.max_concurrent = 0;
        assert!(validate(&config).is_err());

        config.batch.max_concurrent = 65;
        assert!(validate(&config).is_err());

        config.batch.max_concurrent = 64;
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_validate_output_path() {
        let mut config = Config::default();
        config.output.json_path = String::new();
        assert!(validate(&config).is_err());
    }
}
