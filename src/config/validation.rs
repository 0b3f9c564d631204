use crate::config::types::{CanvasConfig, Config, ExportConfig, PacingConfig, RetryConfig};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_canvas_config(&config.canvas)?;
    validate_pacing_config(&config.pacing)?;
    validate_retry_config(&config.retry)?;
    validate_export_config(&config.export)?;
    Ok(())
}

/// Validates the remote service settings
fn validate_canvas_config(config: &CanvasConfig) -> Result<(), ConfigError> {
    let url = Url::parse(&config.api_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid api_url '{}': {}", config.api_url, e)))?;

    if url.scheme() != "https" && url.scheme() != "http" {
        return Err(ConfigError::InvalidUrl(format!(
            "api_url '{}' must use http or https",
            config.api_url
        )));
    }

    Ok(())
}

/// Validates pacing bounds and adaptation factors
fn validate_pacing_config(config: &PacingConfig) -> Result<(), ConfigError> {
    if config.min_interval_ms == 0 {
        return Err(ConfigError::Validation(
            "min_interval_ms must be > 0".to_string(),
        ));
    }

    if config.min_interval_ms > config.max_interval_ms {
        return Err(ConfigError::Validation(format!(
            "min_interval_ms ({}) must not exceed max_interval_ms ({})",
            config.min_interval_ms, config.max_interval_ms
        )));
    }

    if config.initial_interval_ms < config.min_interval_ms
        || config.initial_interval_ms > config.max_interval_ms
    {
        return Err(ConfigError::Validation(format!(
            "initial_interval_ms must be between {} and {}, got {}",
            config.min_interval_ms, config.max_interval_ms, config.initial_interval_ms
        )));
    }

    if config.success_threshold < 1 {
        return Err(ConfigError::Validation(format!(
            "success_threshold must be >= 1, got {}",
            config.success_threshold
        )));
    }

    if !(config.speedup_factor > 0.0 && config.speedup_factor < 1.0) {
        return Err(ConfigError::Validation(format!(
            "speedup_factor must be between 0 and 1 (exclusive), got {}",
            config.speedup_factor
        )));
    }

    if config.slowdown_factor <= 1.0 || !config.slowdown_factor.is_finite() {
        return Err(ConfigError::Validation(format!(
            "slowdown_factor must be > 1, got {}",
            config.slowdown_factor
        )));
    }

    Ok(())
}

/// Validates backoff settings
fn validate_retry_config(config: &RetryConfig) -> Result<(), ConfigError> {
    if config.backoff_factor < 1.0 || !config.backoff_factor.is_finite() {
        return Err(ConfigError::Validation(format!(
            "backoff_factor must be >= 1, got {}",
            config.backoff_factor
        )));
    }

    Ok(())
}

/// Validates output settings
fn validate_export_config(config: &ExportConfig) -> Result<(), ConfigError> {
    if config.worker_count < 1 || config.worker_count > 100 {
        return Err(ConfigError::Validation(format!(
            "worker_count must be between 1 and 100, got {}",
            config.worker_count
        )));
    }

    if config.output_dir.trim().is_empty() {
        return Err(ConfigError::Validation(
            "output_dir cannot be empty".to_string(),
        ));
    }

    Ok(())
}
