//! Canvas-Export: a polite course content exporter
//!
//! This crate exports a Canvas course's module tree (pages, files, assignments)
//! into a Markdown document. Every remote call goes through an adaptive pacing
//! gate that learns the safe request rate at runtime, and content is fetched in
//! two concurrent phases whose output order never depends on completion order.

pub mod client;
pub mod config;
pub mod exporter;
pub mod index;
pub mod output;
pub mod pacing;
pub mod remote;
pub mod render;

use thiserror::Error;

/// Main error type for Canvas-Export operations
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Remote error: {0}")]
    Remote(#[from] remote::RemoteError),

    #[error("Failed to list modules for course '{course}': {source}")]
    ModuleListing {
        course: String,
        source: remote::RemoteError,
    },

    #[error("Course '{course}' has no modules")]
    EmptyCourse { course: String },

    #[error("Output error: {0}")]
    Output(#[from] output::OutputError),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("No API token configured (set canvas.api-token, CANVAS_API_TOKEN or --token)")]
    MissingToken,
}

/// Result type alias for Canvas-Export operations
pub type Result<T> = std::result::Result<T, ExportError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use client::{FailureKind, RetryingCaller};
pub use config::Config;
pub use exporter::{CourseSelection, Exporter, FetchOrchestrator};
pub use index::{CourseIndex, SharedCourseIndex};
pub use pacing::PacingController;
pub use remote::{Item, ItemKind, Module, RemoteApi, RemoteError};
