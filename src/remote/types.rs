//! Course content data model
//!
//! The wire shapes returned by the service are decoded into `Raw*` structs and
//! converted into the typed model here, so the rest of the crate never sees
//! optional-everything JSON.

use serde::Deserialize;
use std::cmp::Ordering;

/// Position assigned to modules/items the service returns without one,
/// so they sort after every explicitly ordered entry.
pub const UNORDERED_POSITION: i64 = i64::MAX;

/// The authenticated user
#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub id: u64,
    #[serde(default)]
    pub name: String,
}

/// A course the user is enrolled in
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Course {
    pub id: u64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub course_code: Option<String>,
}

impl Course {
    /// Display name, falling back to the identifier
    pub fn display_name(&self) -> String {
        self.name
            .clone()
            .unwrap_or_else(|| format!("Course {}", self.id))
    }
}

/// A structural unit of a course
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Module {
    pub id: u64,
    pub name: String,
    pub position: Option<i64>,
}

impl Module {
    /// Sort key: position (absent sorts last), then identifier
    pub fn sort_key(&self) -> (i64, u64) {
        (self.position.unwrap_or(UNORDERED_POSITION), self.id)
    }
}

/// Kind tag of a module item
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ItemKind {
    Page,
    File,
    Assignment,
    SubHeader,
    ExternalUrl,
    /// Any other kind (Discussion, Quiz, ExternalTool, ...), raw name kept
    Other(String),
}

impl ItemKind {
    /// Parses the service's `type` field
    pub fn from_type_name(name: &str) -> Self {
        match name {
            "Page" => Self::Page,
            "File" => Self::File,
            "Assignment" => Self::Assignment,
            "SubHeader" => Self::SubHeader,
            "ExternalUrl" => Self::ExternalUrl,
            other => Self::Other(other.to_string()),
        }
    }

    /// Whether content must be retrieved with a separate call
    pub fn is_fetchable(&self) -> bool {
        matches!(self, Self::Page | Self::File | Self::Assignment)
    }

    /// Name as the service spells it
    pub fn as_str(&self) -> &str {
        match self {
            Self::Page => "Page",
            Self::File => "File",
            Self::Assignment => "Assignment",
            Self::SubHeader => "SubHeader",
            Self::ExternalUrl => "ExternalUrl",
            Self::Other(name) => name,
        }
    }
}

/// What an item points at, depending on its kind
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemTarget {
    Page { url: String },
    File { id: u64 },
    Assignment { id: u64 },
    External { url: String },
    None,
}

/// An entry inside a module
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    pub id: u64,
    pub kind: ItemKind,
    pub title: String,
    pub position: Option<i64>,
    pub target: ItemTarget,

    /// Browser URL of the item on the service, when provided
    pub html_url: Option<String>,
}

impl Item {
    /// Sort key: position (absent sorts last), then identifier
    pub fn sort_key(&self) -> (i64, u64) {
        (self.position.unwrap_or(UNORDERED_POSITION), self.id)
    }
}

/// Orders items by position, independent of arrival order
pub fn compare_items(a: &Item, b: &Item) -> Ordering {
    a.sort_key().cmp(&b.sort_key())
}

/// Wiki page content
#[derive(Debug, Clone, Deserialize)]
pub struct Page {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
}

/// File metadata
#[derive(Debug, Clone, Deserialize)]
pub struct FileInfo {
    #[serde(default)]
    pub filename: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub size: u64,
}

/// Assignment metadata
#[derive(Debug, Clone, Deserialize)]
pub struct Assignment {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub due_at: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// Module as returned by the modules endpoint
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RawModule {
    pub id: u64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub position: Option<i64>,
}

impl From<RawModule> for Module {
    fn from(raw: RawModule) -> Self {
        Self {
            id: raw.id,
            name: raw.name.unwrap_or_else(|| "Unnamed Module".to_string()),
            position: raw.position,
        }
    }
}

/// Module item as returned by the module items endpoint
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RawModuleItem {
    pub id: u64,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub position: Option<i64>,
    #[serde(default)]
    pub page_url: Option<String>,
    #[serde(default)]
    pub content_id: Option<u64>,
    #[serde(default)]
    pub external_url: Option<String>,
    #[serde(default)]
    pub html_url: Option<String>,
}

impl From<RawModuleItem> for Item {
    fn from(raw: RawModuleItem) -> Self {
        let kind = ItemKind::from_type_name(&raw.kind);
        let target = match (&kind, raw.page_url, raw.content_id, raw.external_url) {
            (ItemKind::Page, Some(url), _, _) => ItemTarget::Page { url },
            (ItemKind::File, _, Some(id), _) => ItemTarget::File { id },
            (ItemKind::Assignment, _, Some(id), _) => ItemTarget::Assignment { id },
            (_, _, _, Some(url)) => ItemTarget::External { url },
            _ => ItemTarget::None,
        };

        Self {
            id: raw.id,
            kind,
            title: raw.title.unwrap_or_else(|| "Untitled".to_string()),
            position: raw.position,
            target,
            html_url: raw.html_url,
        }
    }
}
