//! Two-phase course fetch
//!
//! A course is exported in two scatter-gather phases over the shared
//! [`WorkerPool`]:
//! 1. Structure scan: one task per module lists its items
//! 2. Content fetch: one task per fetchable item retrieves and renders it
//!
//! Each phase ends in a barrier that waits for every task, and the fetch set
//! is derived from the index only after the scan barrier, so it is complete.

use crate::client::RetryingCaller;
use crate::exporter::content::{error_text, ContentSource};
use crate::exporter::pool::{wait_all, wait_all_with, WorkerPool};
use crate::index::{CourseIndex, SharedCourseIndex};
use crate::remote::{Course, RemoteApi};
use crate::render::{AssetSink, ContentRenderer};
use crate::ExportError;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

/// Fetch progress is logged every this many items
const PROGRESS_EVERY: usize = 10;

/// Where a course export currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoursePhase {
    ScanningStructure,
    ScanBarrier,
    FetchingContent,
    FetchBarrier,
    Done,
}

impl fmt::Display for CoursePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::ScanningStructure => "scanning structure",
            Self::ScanBarrier => "waiting for structure scan",
            Self::FetchingContent => "fetching content",
            Self::FetchBarrier => "waiting for content fetch",
            Self::Done => "done",
        };
        f.write_str(name)
    }
}

/// Runs the scan and fetch phases for one course at a time
pub struct FetchOrchestrator {
    api: Arc<dyn RemoteApi>,
    caller: Arc<RetryingCaller>,
    renderer: Arc<dyn ContentRenderer>,
    pool: WorkerPool,
}

impl FetchOrchestrator {
    /// Creates an orchestrator
    ///
    /// # Arguments
    ///
    /// * `api` - Remote course service
    /// * `caller` - Paced, retrying wrapper every remote call goes through
    /// * `renderer` - HTML to Markdown converter for page and assignment bodies
    /// * `pool` - Worker pool shared across courses
    pub fn new(
        api: Arc<dyn RemoteApi>,
        caller: Arc<RetryingCaller>,
        renderer: Arc<dyn ContentRenderer>,
        pool: WorkerPool,
    ) -> Self {
        Self {
            api,
            caller,
            renderer,
            pool,
        }
    }

    /// Exports the module tree and item content of one course
    ///
    /// Module and item failures are contained: a module whose items cannot be
    /// listed is left out, and an item whose content cannot be fetched gets
    /// inline error text. Only a failure to list the modules themselves, or a
    /// course without modules, fails the course.
    ///
    /// # Returns
    ///
    /// * `Ok(CourseIndex)` - Position-ordered structure with content
    /// * `Err(ExportError)` - The course was skipped
    pub async fn export_course(
        &self,
        course: &Course,
        assets: Option<Arc<dyn AssetSink>>,
    ) -> Result<CourseIndex, ExportError> {
        let name = course.display_name();
        let course_id = course.id;

        let modules = self
            .caller
            .call("module list", || self.api.list_modules(course_id))
            .await
            .map_err(|source| ExportError::ModuleListing {
                course: name.clone(),
                source,
            })?;

        if modules.is_empty() {
            return Err(ExportError::EmptyCourse { course: name });
        }

        let index = Arc::new(SharedCourseIndex::new());
        let module_count = modules.len();

        enter_phase(&name, CoursePhase::ScanningStructure);
        let mut scans = JoinSet::new();
        for module in modules {
            let api = Arc::clone(&self.api);
            let caller = Arc::clone(&self.caller);
            let index = Arc::clone(&index);

            self.pool.spawn(&mut scans, async move {
                let label = format!("items of module '{}'", module.name);
                let module_id = module.id;
                let listed = caller
                    .call(&label, || api.list_module_items(course_id, module_id))
                    .await;

                match listed {
                    Ok(items) => {
                        debug!("Module '{}': {} items", module.name, items.len());
                        index.add_module(module, items);
                        true
                    }
                    Err(e) => {
                        warn!("Skipping module '{}': {}", module.name, e);
                        false
                    }
                }
            });
        }

        enter_phase(&name, CoursePhase::ScanBarrier);
        let scanned = wait_all(scans, "Structure scan")
            .await
            .into_iter()
            .filter(|ok| *ok)
            .count();
        info!("Scanned {}/{} modules of '{}'", scanned, module_count, name);

        enter_phase(&name, CoursePhase::FetchingContent);
        let fetchable = index.fetchable_items();
        let total = fetchable.len();
        let completed = Arc::new(AtomicUsize::new(0));
        info!("Fetching content for {} items", total);

        let mut fetches = JoinSet::new();
        let mut slots = HashMap::with_capacity(total);
        for (item_id, item) in fetchable {
            let api = Arc::clone(&self.api);
            let caller = Arc::clone(&self.caller);
            let renderer = Arc::clone(&self.renderer);
            let assets = assets.clone();
            let index = Arc::clone(&index);
            let completed = Arc::clone(&completed);

            let handle = self.pool.spawn(&mut fetches, async move {
                let source = ContentSource {
                    api: api.as_ref(),
                    caller: caller.as_ref(),
                    renderer: renderer.as_ref(),
                    assets: assets.as_deref(),
                    course_id,
                };

                let content = match source.fetch(&item).await {
                    Ok(content) => content,
                    Err(e) => {
                        warn!("Failed to fetch '{}': {}", item.title, e);
                        error_text(&e)
                    }
                };
                index.save_detail(item_id, content);

                let done = completed.fetch_add(1, Ordering::SeqCst) + 1;
                if done % PROGRESS_EVERY == 0 || done == total {
                    info!("Progress: {}/{} items fetched", done, total);
                }
            });
            slots.insert(handle.id(), item_id);
        }

        enter_phase(&name, CoursePhase::FetchBarrier);
        // A task that died never wrote its slot
        wait_all_with(fetches, "Content fetch", |task, e| {
            if let Some(item_id) = slots.get(&task) {
                index.save_detail(*item_id, error_text(&e));
            }
        })
        .await;

        enter_phase(&name, CoursePhase::Done);
        Ok(index.snapshot())
    }
}

fn enter_phase(course: &str, phase: CoursePhase) {
    debug!("Course '{}': {}", course, phase);
}
