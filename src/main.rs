//! Canvas-Export main entry point
//!
//! This is the command-line interface for the Canvas-Export course exporter.

use anyhow::Context;
use canvas_export::config::{load_config, resolve_api_token, validate, Config};
use canvas_export::exporter::{CourseSelection, Exporter};
use canvas_export::output::print_report;
use canvas_export::remote::{build_http_client, CanvasClient, RemoteApi};
use clap::{ArgGroup, Parser};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Canvas-Export: a polite course content exporter
///
/// Canvas-Export saves the modules, pages, files and assignments of your
/// Canvas courses as Markdown documents. Requests are paced adaptively so the
/// export stays below the service's rate limits.
#[derive(Parser, Debug)]
#[command(name = "canvas-export")]
#[command(version)]
#[command(about = "A polite Canvas course exporter", long_about = None)]
#[command(group(
    ArgGroup::new("selection")
        .required(true)
        .args(["list", "course", "all"])
))]
struct Cli {
    /// Path to TOML configuration file (built-in defaults when omitted)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// API access token (overrides config and CANVAS_API_TOKEN)
    #[arg(long, value_name = "TOKEN")]
    token: Option<String>,

    /// Base URL of the Canvas instance
    #[arg(long, value_name = "URL")]
    api_url: Option<String>,

    /// List active courses and exit
    #[arg(long)]
    list: bool,

    /// Export the course with this ID (repeatable)
    #[arg(long = "course", value_name = "ID")]
    course: Vec<u64>,

    /// Export every active course
    #[arg(long)]
    all: bool,

    /// Download embedded images next to each document
    #[arg(long)]
    download_images: bool,

    /// Directory the course folders are written to
    #[arg(short, long, value_name = "DIR")]
    output_dir: Option<PathBuf>,

    /// Number of worker tasks fetching concurrently
    #[arg(short, long, value_name = "N")]
    workers: Option<u32>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let config = build_config(&cli)?;
    let token = resolve_api_token(&config, cli.token.as_deref())?;

    let http = build_http_client().context("Failed to build HTTP client")?;
    let canvas = CanvasClient::new(http.clone(), &config.canvas.api_url, token.clone())?;
    let api: Arc<dyn RemoteApi> = Arc::new(canvas);

    let mut exporter = Exporter::new(&config, api);
    if config.export.download_images {
        exporter = exporter.with_image_downloads(http, token);
    }

    if cli.list {
        return handle_list(&exporter).await;
    }

    let selection = if cli.all {
        CourseSelection::All
    } else {
        CourseSelection::Ids(cli.course.clone())
    };

    handle_export(&exporter, &selection).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("canvas_export=info,warn"),
            1 => EnvFilter::new("canvas_export=debug,info"),
            2 => EnvFilter::new("canvas_export=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Loads the configuration file (if any) and applies command-line overrides
fn build_config(cli: &Cli) -> anyhow::Result<Config> {
    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            load_config(path)
                .with_context(|| format!("Failed to load configuration from {}", path.display()))?
        }
        None => Config::default(),
    };

    if let Some(api_url) = &cli.api_url {
        config.canvas.api_url = api_url.clone();
    }
    if let Some(output_dir) = &cli.output_dir {
        config.export.output_dir = output_dir.to_string_lossy().into_owned();
    }
    if let Some(workers) = cli.workers {
        config.export.worker_count = workers;
    }
    if cli.download_images {
        config.export.download_images = true;
    }

    validate(&config).context("Invalid configuration")?;
    Ok(config)
}

/// Handles the --list mode: prints active courses
async fn handle_list(exporter: &Exporter) -> anyhow::Result<()> {
    exporter.login().await?;
    let courses = exporter.list_courses().await?;

    println!("=== Active Courses ({}) ===\n", courses.len());
    for course in &courses {
        println!(
            "  {:>8}  {}  [{}]",
            course.id,
            course.display_name(),
            course.course_code.as_deref().unwrap_or("N/A")
        );
    }

    Ok(())
}

/// Handles the main export operation
async fn handle_export(exporter: &Exporter, selection: &CourseSelection) -> anyhow::Result<()> {
    tracing::info!("Writing exports to {}", exporter.output_dir().display());

    let report = exporter.run(selection).await.context("Export failed")?;
    print_report(&report);

    if report.exported.is_empty() && !report.skipped.is_empty() {
        anyhow::bail!("No course was exported");
    }

    Ok(())
}
