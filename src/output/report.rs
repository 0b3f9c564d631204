//! Output errors and the run report

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while writing exported documents
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to create directory {}: {source}", path.display())]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// A course written to disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedCourse {
    pub name: String,
    pub path: PathBuf,
    pub modules: usize,
    pub items: usize,
}

/// A course that produced no document, with the reason
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedCourse {
    pub name: String,
    pub reason: String,
}

/// Outcome of a whole export run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportReport {
    pub exported: Vec<ExportedCourse>,
    pub skipped: Vec<SkippedCourse>,
}

impl ExportReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether every selected course was exported
    pub fn is_complete(&self) -> bool {
        self.skipped.is_empty()
    }

    pub fn total_courses(&self) -> usize {
        self.exported.len() + self.skipped.len()
    }

    pub fn record_skip(&mut self, name: impl Into<String>, reason: impl Into<String>) {
        self.skipped.push(SkippedCourse {
            name: name.into(),
            reason: reason.into(),
        });
    }
}

/// Prints a human-readable run summary to stdout
pub fn print_report(report: &ExportReport) {
    println!("\n=== Export Summary ===\n");
    println!(
        "Courses: {} exported, {} skipped",
        report.exported.len(),
        report.skipped.len()
    );

    if !report.exported.is_empty() {
        println!("\nExported:");
        for course in &report.exported {
            println!(
                "  {} ({} modules, {} items) -> {}",
                course.name,
                course.modules,
                course.items,
                course.path.display()
            );
        }
    }

    if !report.skipped.is_empty() {
        println!("\nSkipped:");
        for course in &report.skipped {
            println!("  {}: {}", course.name, course.reason);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_report_is_complete() {
        let report = ExportReport::new();
        assert!(report.is_complete());
        assert_eq!(report.total_courses(), 0);
    }

    #[test]
    fn test_skip_makes_report_incomplete() {
        let mut report = ExportReport::new();
        report.exported.push(ExportedCourse {
            name: "Biology".to_string(),
            path: PathBuf::from("out/Biology/Biology.md"),
            modules: 3,
            items: 12,
        });
        report.record_skip("Chemistry", "Course 'Chemistry' has no modules");

        assert!(!report.is_complete());
        assert_eq!(report.total_courses(), 2);
        assert_eq!(report.skipped[0].name, "Chemistry");
    }

    #[test]
    fn test_write_error_names_path() {
        let error = OutputError::Write {
            path: PathBuf::from("out/a.md"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        assert_eq!(error.to_string(), "Failed to write out/a.md: denied");
    }
}
