//! Content rendering
//!
//! This module contains:
//! - `ContentRenderer`: HTML to Markdown conversion (`MarkdownRenderer`)
//! - `AssetSink`: materialization of embedded images (`ImageDownloader`)

mod assets;
mod html;

pub use assets::{local_file_name, AssetSink, ImageDownloader};
pub use html::{html_to_markdown, image_sources, ContentRenderer, MarkdownRenderer};

use thiserror::Error;

/// Failure while converting content
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Invalid selector: {0}")]
    Selector(String),
}

/// Result type for rendering operations
pub type RenderResult<T> = Result<T, RenderError>;
