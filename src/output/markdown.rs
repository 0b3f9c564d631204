//! Course document generation
//!
//! This module writes one Markdown document per course: a header, a table of
//! contents linking to `mod-{id}` / `item-{id}` anchors, then every module
//! section with its items in position order.

use crate::index::CourseIndex;
use crate::output::report::{OutputError, OutputResult};
use crate::remote::{Course, Item, ItemKind, ItemTarget};
use chrono::NaiveDateTime;
use std::path::Path;

/// Anchor target offset so headings are not hidden under sticky viewer bars
const ANCHOR_STYLE: &str = "display:block; margin-top:-60px; padding-top:60px;";

/// Content shown for a fetchable item that never received any
const MISSING_CONTENT: &str = "> Error fetching content: content was not retrieved\n";

/// Writes the course document to `path`
///
/// # Arguments
///
/// * `path` - Destination file; its parent directory must exist
/// * `course` - The exported course
/// * `index` - Finished course index
/// * `exported_at` - Timestamp printed in the header
pub fn write_course_markdown(
    path: &Path,
    course: &Course,
    index: &CourseIndex,
    exported_at: NaiveDateTime,
) -> OutputResult<()> {
    let markdown = format_course_markdown(course, index, exported_at);

    std::fs::write(path, markdown).map_err(|source| OutputError::Write {
        path: path.to_path_buf(),
        source,
    })
}

/// Formats a finished course index as Markdown
pub fn format_course_markdown(
    course: &Course,
    index: &CourseIndex,
    exported_at: NaiveDateTime,
) -> String {
    let mut md = String::new();

    md.push_str(&format!("# {}\n\n", course.display_name()));
    md.push_str(&format!(
        "- **Course Code**: {}\n",
        course.course_code.as_deref().unwrap_or("N/A")
    ));
    md.push_str(&format!(
        "- **Exported at**: {}\n\n",
        exported_at.format("%Y-%m-%d %H:%M:%S")
    ));
    md.push_str("---\n\n");

    // Table of contents
    md.push_str("## Table of Contents\n\n");
    for (module, items) in index.modules() {
        md.push_str(&format!("- [{}](#mod-{})\n", module.name, module.id));

        for item in items.iter().filter(|i| listed_in_contents(&i.kind)) {
            md.push_str(&format!("  - [{}](#item-{})\n", item.title, item.id));
        }
    }
    md.push_str("\n---\n\n");

    for (module, items) in index.modules() {
        md.push_str(&anchor(&format!("mod-{}", module.id)));
        md.push_str(&format!("## Module: {}\n\n", module.name));

        for item in items {
            md.push_str(&anchor(&format!("item-{}", item.id)));
            format_item(&mut md, item, index);
        }

        md.push_str("---\n\n");
    }

    md
}

fn format_item(md: &mut String, item: &Item, index: &CourseIndex) {
    match &item.kind {
        ItemKind::SubHeader => {
            md.push_str(&format!("### {}\n\n", item.title));
        }
        ItemKind::ExternalUrl => {
            md.push_str(&format!("### Link: {}\n\n", item.title));
            if let ItemTarget::External { url } = &item.target {
                md.push_str(&format!("- [{}]({})\n\n", url, url));
            }
        }
        kind if kind.is_fetchable() => {
            md.push_str(&format!("### {}: {}\n\n", kind.as_str(), item.title));
            md.push_str(index.detail(item.id).unwrap_or(MISSING_CONTENT));
            md.push_str("\n\n");
        }
        kind => {
            md.push_str(&format!("### {} ({})\n", item.title, kind.as_str()));
            if let Some(link) = &item.html_url {
                md.push_str(&format!("- [Link]({})\n", link));
            }
            md.push('\n');
        }
    }
}

fn listed_in_contents(kind: &ItemKind) -> bool {
    kind.is_fetchable() || *kind == ItemKind::ExternalUrl
}

fn anchor(id: &str) -> String {
    format!("<span id=\"{}\" style=\"{}\"></span>\n", id, ANCHOR_STYLE)
}

/// Removes characters that are invalid in file names on common platforms
///
/// Strips `\ / * ? : " < > |` and newlines, then trims surrounding whitespace.
pub fn sanitize_filename(name: &str) -> String {
    name.chars()
        .filter(|c| !matches!(c, '\\' | '/' | '*' | '?' | ':' | '"' | '<' | '>' | '|' | '\n' | '\r'))
        .collect::<String>()
        .trim()
        .to_string()
}
