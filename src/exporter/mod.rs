//! Exporter module for whole-run orchestration
//!
//! This module contains the export pipeline, including:
//! - Identifying the user and selecting courses
//! - The bounded worker pool shared by the whole run
//! - The two-phase per-course fetch
//! - Writing each finished course and collecting the run report

mod content;
mod orchestrator;
mod pool;

pub use content::{error_text, ContentSource, ItemError};
pub use orchestrator::{CoursePhase, FetchOrchestrator};
pub use pool::{wait_all, WorkerPool};

use crate::client::RetryingCaller;
use crate::config::Config;
use crate::output::{write_course_markdown, CourseLayout, ExportReport, ExportedCourse};
use crate::pacing::PacingController;
use crate::remote::{Course, RemoteApi, User};
use crate::render::{AssetSink, ImageDownloader, MarkdownRenderer};
use crate::Result;
use reqwest::Client;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info, warn};

/// Which courses a run exports
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CourseSelection {
    /// Every active course
    All,

    /// Only these course identifiers
    Ids(Vec<u64>),
}

/// Credentials for downloading embedded images
#[derive(Debug, Clone)]
struct ImageSettings {
    client: Client,
    token: String,
}

/// Runs an export over the selected courses
///
/// One pacing controller and one worker pool are shared by every course;
/// courses are processed one after another, each with its own index.
pub struct Exporter {
    api: Arc<dyn RemoteApi>,
    caller: Arc<RetryingCaller>,
    orchestrator: FetchOrchestrator,
    output_dir: PathBuf,
    images: Option<ImageSettings>,
}

impl Exporter {
    /// Creates an exporter from validated configuration
    pub fn new(config: &Config, api: Arc<dyn RemoteApi>) -> Self {
        let pacer = Arc::new(PacingController::new(config.pacing.clone()));
        let caller = Arc::new(RetryingCaller::new(pacer, config.retry.clone()));
        let pool = WorkerPool::new(config.export.worker_count as usize);

        let orchestrator = FetchOrchestrator::new(
            Arc::clone(&api),
            Arc::clone(&caller),
            Arc::new(MarkdownRenderer),
            pool,
        );

        Self {
            api,
            caller,
            orchestrator,
            output_dir: PathBuf::from(&config.export.output_dir),
            images: None,
        }
    }

    /// Enables downloading embedded images next to each course document
    pub fn with_image_downloads(mut self, client: Client, token: impl Into<String>) -> Self {
        self.images = Some(ImageSettings {
            client,
            token: token.into(),
        });
        self
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// The shared pacing/retry wrapper
    pub fn caller(&self) -> &Arc<RetryingCaller> {
        &self.caller
    }

    /// Identifies the authenticated user
    pub async fn login(&self) -> Result<User> {
        let user = self
            .caller
            .call("current user", || self.api.current_user())
            .await?;
        info!("Logged in as {} ({})", user.name, user.id);
        Ok(user)
    }

    /// Lists active courses, ignoring unnamed enrollment stubs
    pub async fn list_courses(&self) -> Result<Vec<Course>> {
        let courses = self
            .caller
            .call("course list", || self.api.active_courses())
            .await?;

        Ok(courses.into_iter().filter(|c| c.name.is_some()).collect())
    }

    /// Exports the selected courses
    ///
    /// # Returns
    ///
    /// * `Ok(ExportReport)` - Exported and skipped courses
    /// * `Err(ExportError)` - The user or course list could not be fetched
    pub async fn run(&self, selection: &CourseSelection) -> Result<ExportReport> {
        self.login().await?;
        let courses = self.list_courses().await?;
        info!("Found {} active courses", courses.len());

        let mut report = ExportReport::new();
        let selected = match selection {
            CourseSelection::All => courses,
            CourseSelection::Ids(ids) => {
                for id in ids {
                    if !courses.iter().any(|c| c.id == *id) {
                        warn!("Course {} is not among the active courses", id);
                        report.record_skip(
                            format!("Course {}", id),
                            "not found among active courses",
                        );
                    }
                }
                courses
                    .into_iter()
                    .filter(|c| ids.contains(&c.id))
                    .collect()
            }
        };

        for (n, course) in selected.iter().enumerate() {
            let name = course.display_name();
            info!("Exporting course {}/{}: {}", n + 1, selected.len(), name);

            match self.export_course(course).await {
                Ok(exported) => {
                    info!("Wrote {}", exported.path.display());
                    report.exported.push(exported);
                }
                Err(e) => {
                    error!("Skipping course '{}': {}", name, e);
                    report.record_skip(name, e.to_string());
                }
            }
        }

        Ok(report)
    }

    /// Fetches one course and writes its document
    pub async fn export_course(&self, course: &Course) -> Result<ExportedCourse> {
        let layout = CourseLayout::new(&self.output_dir, course);

        let assets: Option<Arc<dyn AssetSink>> = self.images.as_ref().map(|settings| {
            info!("Saving images to {}", layout.images_dir.display());
            Arc::new(ImageDownloader::new(
                settings.client.clone(),
                layout.images_dir.clone(),
                settings.token.clone(),
            )) as Arc<dyn AssetSink>
        });

        let index = self.orchestrator.export_course(course, assets).await?;

        layout.create()?;
        let exported_at = chrono::Local::now().naive_local();
        write_course_markdown(&layout.document, course, &index, exported_at)?;

        Ok(ExportedCourse {
            name: course.display_name(),
            path: layout.document,
            modules: index.modules().len(),
            items: index.item_count(),
        })
    }
}
