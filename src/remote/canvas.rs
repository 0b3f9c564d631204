//! Canvas REST API client
//!
//! This module handles all HTTP requests to the course service, including:
//! - Building the HTTP client with timeouts and a user agent
//! - Bearer-token authentication
//! - Link-header pagination for list endpoints
//! - Mapping HTTP failures into structured `RemoteError`s

use crate::remote::types::{RawModule, RawModuleItem};
use crate::remote::{
    Assignment, Course, FileInfo, Item, Module, Page, RemoteApi, RemoteError, RemoteResult, User,
};
use crate::ConfigError;
use async_trait::async_trait;
use reqwest::header::{CONTENT_TYPE, LINK};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use std::time::Duration;
use url::Url;

/// Page size requested from list endpoints
const PER_PAGE: &str = "100";

/// Longest error body kept in an error message
const MAX_ERROR_BODY: usize = 300;

/// Builds an HTTP client with proper configuration
///
/// Per-request timeouts live here; the pacing and retry layers have no
/// deadlines of their own.
pub fn build_http_client() -> Result<Client, reqwest::Error> {
    let user_agent = format!("canvas-export/{}", env!("CARGO_PKG_VERSION"));

    Client::builder()
        .user_agent(user_agent)
        .timeout(Duration::from_secs(30))
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Canvas implementation of [`RemoteApi`]
#[derive(Debug, Clone)]
pub struct CanvasClient {
    client: Client,
    api_root: Url,
    token: String,
}

impl CanvasClient {
    /// Creates a client for the Canvas instance at `api_url`
    ///
    /// # Arguments
    ///
    /// * `client` - Shared HTTP client
    /// * `api_url` - Base URL of the instance (e.g., "https://canvas.example.edu")
    /// * `token` - Personal access token
    pub fn new(client: Client, api_url: &str, token: impl Into<String>) -> Result<Self, ConfigError> {
        let mut api_root = Url::parse(api_url)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid api_url '{}': {}", api_url, e)))?;

        api_root
            .path_segments_mut()
            .map_err(|_| ConfigError::InvalidUrl(format!("api_url '{}' cannot be a base", api_url)))?
            .pop_if_empty()
            .extend(["api", "v1"]);

        Ok(Self {
            client,
            api_root,
            token: token.into(),
        })
    }

    /// Builds an endpoint URL from path segments below `/api/v1`
    ///
    /// Segments are percent-encoded, so page slugs can be passed verbatim.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.api_root.clone();
        // The root was verified to be a base URL in `new`
        if let Ok(mut path) = url.path_segments_mut() {
            path.extend(segments);
        }
        url
    }

    async fn send(&self, url: Url) -> RemoteResult<Response> {
        tracing::trace!("GET {}", url);

        let response = self
            .client
            .get(url)
            .bearer_auth(&self.token)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RemoteError::api(
                status.as_u16(),
                error_message(&status.to_string(), &body),
            ));
        }

        Ok(response)
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> RemoteResult<T> {
        let status = response.status().as_u16();
        let is_html = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.contains("text/html"))
            .unwrap_or(false);

        if is_html {
            // A challenge page instead of JSON
            let body = response.text().await?;
            if body.to_lowercase().contains("captcha") {
                return Err(RemoteError::api(status, "captcha challenge returned"));
            }
            return Err(RemoteError::Decode(
                "expected JSON, received an HTML document".to_string(),
            ));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| RemoteError::Decode(e.to_string()))
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> RemoteResult<T> {
        let response = self.send(url).await?;
        Self::decode(response).await
    }

    /// Fetches every page of a list endpoint, following `rel="next"` links
    async fn get_paginated<T: DeserializeOwned>(&self, mut url: Url) -> RemoteResult<Vec<T>> {
        url.query_pairs_mut().append_pair("per_page", PER_PAGE);

        let mut results = Vec::new();
        let mut next = Some(url);

        while let Some(url) = next.take() {
            let response = self.send(url).await?;

            next = response
                .headers()
                .get(LINK)
                .and_then(|v| v.to_str().ok())
                .and_then(parse_next_link)
                .and_then(|link| Url::parse(&link).ok());

            let mut page: Vec<T> = Self::decode(response).await?;
            results.append(&mut page);
        }

        Ok(results)
    }
}

#[async_trait]
impl RemoteApi for CanvasClient {
    async fn current_user(&self) -> RemoteResult<User> {
        self.get_json(self.endpoint(&["users", "self"])).await
    }

    async fn active_courses(&self) -> RemoteResult<Vec<Course>> {
        let mut url = self.endpoint(&["courses"]);
        url.query_pairs_mut()
            .append_pair("enrollment_state", "active");
        self.get_paginated(url).await
    }

    async fn list_modules(&self, course_id: u64) -> RemoteResult<Vec<Module>> {
        let course = course_id.to_string();
        let raw: Vec<RawModule> = self
            .get_paginated(self.endpoint(&["courses", &course, "modules"]))
            .await?;
        Ok(raw.into_iter().map(Module::from).collect())
    }

    async fn list_module_items(&self, course_id: u64, module_id: u64) -> RemoteResult<Vec<Item>> {
        let course = course_id.to_string();
        let module = module_id.to_string();
        let raw: Vec<RawModuleItem> = self
            .get_paginated(self.endpoint(&["courses", &course, "modules", &module, "items"]))
            .await?;
        Ok(raw.into_iter().map(Item::from).collect())
    }

    async fn get_page(&self, course_id: u64, page_url: &str) -> RemoteResult<Page> {
        let course = course_id.to_string();
        self.get_json(self.endpoint(&["courses", &course, "pages", page_url]))
            .await
    }

    async fn get_file(&self, course_id: u64, file_id: u64) -> RemoteResult<FileInfo> {
        let course = course_id.to_string();
        let file = file_id.to_string();
        self.get_json(self.endpoint(&["courses", &course, "files", &file]))
            .await
    }

    async fn get_assignment(&self, course_id: u64, assignment_id: u64) -> RemoteResult<Assignment> {
        let course = course_id.to_string();
        let assignment = assignment_id.to_string();
        self.get_json(self.endpoint(&["courses", &course, "assignments", &assignment]))
            .await
    }
}

/// Extracts the `rel="next"` target from a `Link` header
///
/// # Example
///
/// ```text
/// <https://x/api/v1/courses?page=2>; rel="next", <https://x/api/v1/courses?page=5>; rel="last"
/// ```
fn parse_next_link(header: &str) -> Option<String> {
    header.split(',').find_map(|part| {
        let mut pieces = part.split(';');
        let target = pieces.next()?.trim();
        let is_next = pieces.any(|p| {
            let p = p.trim();
            p == "rel=\"next\"" || p == "rel=next"
        });

        if is_next {
            target
                .strip_prefix('<')
                .and_then(|t| t.strip_suffix('>'))
                .map(str::to_string)
        } else {
            None
        }
    })
}

/// Combines the status line with a trimmed response body
fn error_message(status: &str, body: &str) -> String {
    let body = body.trim();
    if body.is_empty() {
        return status.to_string();
    }

    let truncated: String = body.chars().take(MAX_ERROR_BODY).collect();
    format!("{} {}", status, truncated)
}
