//! Output module for exported course documents
//!
//! This module handles:
//! - Laying out the per-course output directory
//! - Writing the Markdown document for a finished course index
//! - Reporting which courses were exported or skipped

mod markdown;
mod report;

pub use markdown::{format_course_markdown, sanitize_filename, write_course_markdown};
pub use report::{
    print_report, ExportReport, ExportedCourse, OutputError, OutputResult, SkippedCourse,
};

use crate::remote::Course;
use std::path::{Path, PathBuf};

/// Directory and file locations for one exported course
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CourseLayout {
    /// `<output-dir>/<course name>`
    pub course_dir: PathBuf,

    /// `<course-dir>/<course name>.md`
    pub document: PathBuf,

    /// `<course-dir>/images`
    pub images_dir: PathBuf,
}

impl CourseLayout {
    /// Computes the layout for `course` below `output_dir`
    ///
    /// Courses whose name sanitizes to nothing fall back to `course_<id>`.
    pub fn new(output_dir: &Path, course: &Course) -> Self {
        let mut name = sanitize_filename(&course.display_name());
        if name.is_empty() {
            name = format!("course_{}", course.id);
        }

        let course_dir = output_dir.join(&name);
        Self {
            document: course_dir.join(format!("{}.md", name)),
            images_dir: course_dir.join("images"),
            course_dir,
        }
    }

    /// Creates the course directory
    ///
    /// The image directory is created on the first downloaded image.
    pub fn create(&self) -> OutputResult<()> {
        std::fs::create_dir_all(&self.course_dir).map_err(|source| OutputError::CreateDir {
            path: self.course_dir.clone(),
            source,
        })
    }
}
