use crate::config::types::{
    Config, DiscoveryConfig, ExtractionConfig, OutputConfig, PortalConfig,
};
use crate::ConfigError;
use chrono::format::{Item, StrftimeItems};
use url::Url;

/// One hour
const MAX_WAIT_TIMEOUT_SECS: u64 = 3600;

/// One year
const MAX_CACHE_TTL_HOURS: u64 = 8760;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_portal_config(&config.portal)?;
    validate_discovery_config(&config.discovery)?;
    validate_extraction_config(&config.extraction)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates portal configuration
fn validate_portal_config(config: &PortalConfig) -> Result<(), ConfigError> {
    let url = Url::parse(&config.search_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid search-url: {}", e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::Validation(format!(
            "search-url must use http or https, got '{}'",
            url.scheme()
        )));
    }

    if config.date_format.is_empty() {
        return Err(ConfigError::Validation(
            "date-format cannot be empty".to_string(),
        ));
    }

    if StrftimeItems::new(&config.date_format).any(|item| matches!(item, Item::Error)) {
        return Err(ConfigError::Validation(format!(
            "date-format '{}' is not a valid strftime pattern",
            config.date_format
        )));
    }

    Ok(())
}

/// Validates discovery configuration
fn validate_discovery_config(config: &DiscoveryConfig) -> Result<(), ConfigError> {
    if config.days_back < 1 || config.days_back > 366 {
        return Err(ConfigError::Validation(format!(
            "days-back must be between 1 and 366, got {}",
            config.days_back
        )));
    }

    if config.wait_timeout_secs < 1 || config.wait_timeout_secs > MAX_WAIT_TIMEOUT_SECS {
        return Err(ConfigError::Validation(format!(
            "wait-timeout-secs must be between 1 and {}, got {}",
            MAX_WAIT_TIMEOUT_SECS, config.wait_timeout_secs
        )));
    }

    if let Some(remote) = &config.remote_url {
        let url = Url::parse(remote)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid remote-url: {}", e)))?;

        if !matches!(url.scheme(), "ws" | "wss" | "http" | "https") {
            return Err(ConfigError::Validation(format!(
                "remote-url must use ws, wss, http or https, got '{}'",
                url.scheme()
            )));
        }
    }

    if config.diagnostics_dir.is_empty() {
        return Err(ConfigError::Validation(
            "diagnostics-dir cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates extraction configuration
fn validate_extraction_config(config: &ExtractionConfig) -> Result<(), ConfigError> {
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

    if config.cache_ttl_hours > MAX_CACHE_TTL_HOURS {
        return Err(ConfigError::Validation(format!(
            "cache-ttl-hours must be at most {}, got {}",
            MAX_CACHE_TTL_HOURS, config.cache_ttl_hours
        )));
    }

    if config.cache_path.is_empty() {
        return Err(ConfigError::Validation(
            "cache-path cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.database_path.is_empty() {
        return Err(ConfigError::Validation(
            "database-path cannot be empty".to_string(),
        ));
    }

    if config.export_dir.is_empty() {
        return Err(ConfigError::Validation(
            "export-dir cannot be empty".to_string(),
        ));
    }

    Ok(())
}
