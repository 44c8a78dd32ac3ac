use crate::config::types::{
    Backend, BatchConfig, Config, CrawlerConfig, OutputConfig, UserAgentConfig, ValidationConfig,
};
use crate::ConfigError;
use std::net::IpAddr;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_batch_config(&config.batch)?;
    validate_validation_config(&config.validation)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.max_links_per_page < 1 {
        return Err(ConfigError::Validation(format!(
            "max-links-per-page must be >= 1, got {}",
            config.max_links_per_page
        )));
    }

    if config.min_emails_required == Some(0) {
        return Err(ConfigError::Validation(
            "min-emails-required must be >= 1 when set".to_string(),
        ));
    }

    if config.navigation_timeout_ms < 1_000 {
        return Err(ConfigError::Validation(format!(
            "navigation-timeout-ms must be >= 1000ms, got {}ms",
            config.navigation_timeout_ms
        )));
    }

    if config.interaction_timeout_ms < 100 {
        return Err(ConfigError::Validation(format!(
            "interaction-timeout-ms must be >= 100ms, got {}ms",
            config.interaction_timeout_ms
        )));
    }

    if config.keywords.is_empty() {
        return Err(ConfigError::Validation(
            "keywords cannot be empty".to_string(),
        ));
    }

    if config.keywords.iter().any(|k| k.trim().is_empty()) {
        return Err(ConfigError::Validation(
            "keywords cannot contain empty entries".to_string(),
        ));
    }

    if config.backend == Backend::Browser && !cfg!(feature = "browser") {
        return Err(ConfigError::Validation(
            "backend \"browser\" requires building with the `browser` feature".to_string(),
        ));
    }

    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    if config.value.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user-agent value cannot be empty".to_string(),
        ));
    }

    if config.value.chars().any(|c| c.is_control()) {
        return Err(ConfigError::Validation(
            "user-agent value cannot contain control characters".to_string(),
        ));
    }

    Ok(())
}

/// Validates worker pool and batching configuration
fn validate_batch_config(config: &BatchConfig) -> Result<(), ConfigError> {
    if config.workers < 1 || config.workers > 64 {
        return Err(ConfigError::Validation(format!(
            "batch workers must be between 1 and 64, got {}",
            config.workers
        )));
    }

    if config.batch_size < 1 {
        return Err(ConfigError::Validation(format!(
            "batch-size must be >= 1, got {}",
            config.batch_size
        )));
    }

    if config.backfill_batch_size < 1 {
        return Err(ConfigError::Validation(format!(
            "backfill-batch-size must be >= 1, got {}",
            config.backfill_batch_size
        )));
    }

    if config.backfill_min_emails == Some(0) {
        return Err(ConfigError::Validation(
            "backfill-min-emails must be >= 1 when set".to_string(),
        ));
    }

    Ok(())
}

/// Validates DNS and validation worker settings
fn validate_validation_config(config: &ValidationConfig) -> Result<(), ConfigError> {
    if config.nameservers.is_empty() {
        return Err(ConfigError::Validation(
            "at least one nameserver is required".to_string(),
        ));
    }

    for nameserver in &config.nameservers {
        nameserver
            .parse::<IpAddr>()
            .map_err(|_| ConfigError::InvalidNameserver(nameserver.clone()))?;
    }

    if config.query_timeout_ms < 100 {
        return Err(ConfigError::Validation(format!(
            "query-timeout-ms must be >= 100ms, got {}ms",
            config.query_timeout_ms
        )));
    }

    if config.attempts < 1 {
        return Err(ConfigError::Validation(
            "attempts must be >= 1".to_string(),
        ));
    }

    if config.workers < 1 || config.workers > 32 {
        return Err(ConfigError::Validation(format!(
            "validation workers must be between 1 and 32, got {}",
            config.workers
        )));
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.results_dir.is_empty() {
        return Err(ConfigError::Validation(
            "results-dir cannot be empty".to_string(),
        ));
    }

    if config.search_terms_path.is_empty() {
        return Err(ConfigError::Validation(
            "search-terms-path cannot be empty".to_string(),
        ));
    }

    if config.completed_terms_path.is_empty() {
        return Err(ConfigError::Validation(
            "completed-terms-path cannot be empty".to_string(),
        ));
    }

    Ok(())
}
