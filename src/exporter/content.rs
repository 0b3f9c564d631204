//! Per-kind content retrieval and formatting
//!
//! Each fetchable item becomes one Markdown fragment:
//! - Page: rendered body followed by a link to the original page
//! - File: name, download link and size
//! - Assignment: due date, rendered description and a link

use crate::client::RetryingCaller;
use crate::remote::{Item, ItemKind, ItemTarget, RemoteApi, RemoteError};
use crate::render::{AssetSink, ContentRenderer, RenderError};
use thiserror::Error;

/// Why an item's content could not be produced
#[derive(Debug, Error)]
pub enum ItemError {
    #[error("{0}")]
    Remote(#[from] RemoteError),

    #[error("{0}")]
    Render(#[from] RenderError),

    #[error("item has no {0} reference")]
    MissingTarget(&'static str),
}

/// Inline text stored in place of content that could not be fetched
pub fn error_text(error: &dyn std::fmt::Display) -> String {
    format!("> Error fetching content: {}\n", error)
}

/// Everything a fetch task needs, borrowed from the orchestrator's handles
pub struct ContentSource<'a> {
    pub api: &'a dyn RemoteApi,
    pub caller: &'a RetryingCaller,
    pub renderer: &'a dyn ContentRenderer,
    pub assets: Option<&'a dyn AssetSink>,
    pub course_id: u64,
}

impl ContentSource<'_> {
    /// Fetches and formats the content of one fetchable item
    pub async fn fetch(&self, item: &Item) -> Result<String, ItemError> {
        match (&item.kind, &item.target) {
            (ItemKind::Page, ItemTarget::Page { url }) => self.page(item, url).await,
            (ItemKind::Page, _) => Err(ItemError::MissingTarget("page")),
            (ItemKind::File, ItemTarget::File { id }) => self.file(*id).await,
            (ItemKind::File, _) => Err(ItemError::MissingTarget("file")),
            (ItemKind::Assignment, ItemTarget::Assignment { id }) => {
                self.assignment(item, *id).await
            }
            (ItemKind::Assignment, _) => Err(ItemError::MissingTarget("assignment")),
            _ => Ok(String::new()),
        }
    }

    async fn page(&self, item: &Item, page_url: &str) -> Result<String, ItemError> {
        let label = format!("page '{}'", item.title);
        let page = self
            .caller
            .call(&label, || self.api.get_page(self.course_id, page_url))
            .await?;

        let Some(body) = page.body.as_deref() else {
            return Ok(String::new());
        };

        let mut content = self.renderer.render(body, self.assets).await?;
        if let Some(link) = &item.html_url {
            content.push_str(&format!("\n\n> [Original page]({})\n", link));
        }

        Ok(content)
    }

    async fn file(&self, file_id: u64) -> Result<String, ItemError> {
        let label = format!("file {}", file_id);
        let file = self
            .caller
            .call(&label, || self.api.get_file(self.course_id, file_id))
            .await?;

        let name = if file.filename.is_empty() {
            file.display_name.as_deref().unwrap_or("unnamed")
        } else {
            file.filename.as_str()
        };

        Ok(format!(
            "- **File name**: `{}`\n- **Download**: [Download]({})\n- *Size: {:.2} KB*\n",
            name,
            file.url,
            file.size as f64 / 1024.0
        ))
    }

    async fn assignment(&self, item: &Item, assignment_id: u64) -> Result<String, ItemError> {
        let label = format!("assignment '{}'", item.title);
        let assignment = self
            .caller
            .call(&label, || {
                self.api.get_assignment(self.course_id, assignment_id)
            })
            .await?;

        let mut content = format!(
            "- **Due**: {}\n",
            assignment.due_at.as_deref().unwrap_or("No due date")
        );

        if let Some(description) = assignment.description.as_deref() {
            if !description.trim().is_empty() {
                content.push_str("\n--- Assignment description ---\n\n");
                content.push_str(&self.renderer.render(description, self.assets).await?);
                content.push_str("\n\n---\n");
            }
        }

        if let Some(link) = &item.html_url {
            content.push_str(&format!("- [Assignment link]({})\n", link));
        }

        Ok(content)
    }
}
