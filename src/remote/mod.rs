//! Remote course service binding
//!
//! This module contains:
//! - The course content data model (courses, modules, items, content)
//! - The `RemoteApi` capability trait every remote operation goes through
//! - A reqwest-backed Canvas REST implementation

mod canvas;
mod types;

pub use canvas::{build_http_client, CanvasClient};
pub use types::{
    compare_items, Assignment, Course, FileInfo, Item, ItemKind, ItemTarget, Module, Page, User,
    UNORDERED_POSITION,
};

use async_trait::async_trait;
use thiserror::Error;

/// Failure of a single remote operation
///
/// Errors carry structured information (status code, message) so the retry
/// layer can classify them without guessing.
#[derive(Debug, Clone, Error)]
pub enum RemoteError {
    /// The service answered with an error status
    #[error("HTTP {status}: {message}")]
    Api { status: u16, message: String },

    /// The request never produced a response (connection, timeout, ...)
    #[error("Network error: {0}")]
    Network(String),

    /// The response could not be decoded
    #[error("Failed to decode response: {0}")]
    Decode(String),
}

impl RemoteError {
    /// Creates a service-level error
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }
}

impl From<reqwest::Error> for RemoteError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_decode() {
            Self::Decode(error.to_string())
        } else if let Some(status) = error.status() {
            Self::api(status.as_u16(), error.to_string())
        } else {
            Self::Network(error.to_string())
        }
    }
}

/// Result type for remote operations
pub type RemoteResult<T> = Result<T, RemoteError>;

/// Operations the exporter needs from the course service
#[async_trait]
pub trait RemoteApi: Send + Sync {
    /// Identifies the authenticated user
    async fn current_user(&self) -> RemoteResult<User>;

    /// Lists courses with an active enrollment
    async fn active_courses(&self) -> RemoteResult<Vec<Course>>;

    /// Lists the modules of a course
    async fn list_modules(&self, course_id: u64) -> RemoteResult<Vec<Module>>;

    /// Lists the items of one module
    async fn list_module_items(&self, course_id: u64, module_id: u64) -> RemoteResult<Vec<Item>>;

    /// Fetches a wiki page by its URL slug
    async fn get_page(&self, course_id: u64, page_url: &str) -> RemoteResult<Page>;

    /// Fetches file metadata
    async fn get_file(&self, course_id: u64, file_id: u64) -> RemoteResult<FileInfo>;

    /// Fetches assignment metadata
    async fn get_assignment(&self, course_id: u64, assignment_id: u64) -> RemoteResult<Assignment>;
}
