use crate::config::types::Config;
use crate::config::validation::validate;
use crate::ConfigError;
use std::path::Path;

/// Environment variable consulted when no token is configured explicitly
pub const TOKEN_ENV_VAR: &str = "CANVAS_API_TOKEN";

/// Loads and parses a configuration file from the given path
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(Config)` - Successfully loaded and validated configuration
/// * `Err(ConfigError)` - Failed to load, parse, or validate the configuration
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    parse_config(&content)
}

/// Parses and validates configuration from TOML text
pub fn parse_config(content: &str) -> Result<Config, ConfigError> {
    let config: Config = toml::from_str(content)?;

    validate(&config)?;

    Ok(config)
}

/// Picks the API token to use
///
/// Precedence: explicit override (CLI), then `canvas.api-token`, then the
/// `CANVAS_API_TOKEN` environment variable. Blank values are ignored.
pub fn resolve_api_token(config: &Config, cli_token: Option<&str>) -> Result<String, ConfigError> {
    let env_token = std::env::var(TOKEN_ENV_VAR).ok();

    [
        cli_token.map(str::to_string),
        config.canvas.api_token.clone(),
        env_token,
    ]
    .into_iter()
    .flatten()
    .map(|token| token.trim().to_string())
    .find(|token| !token.is_empty())
    .ok_or(ConfigError::MissingToken)
}
