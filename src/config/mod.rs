//! Configuration module for Canvas-Export
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! Every section is optional; missing values fall back to the built-in pacing,
//! retry and export defaults.
//!
//! # Example
//!
//! ```no_run
//! use canvas_export::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("canvas-export.toml")).unwrap();
//! println!("Workers: {}", config.export.worker_count);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{CanvasConfig, Config, ExportConfig, PacingConfig, RetryConfig};

// Re-export parser functions
pub use parser::{load_config, parse_config, resolve_api_token, TOKEN_ENV_VAR};
pub use validation::validate;
