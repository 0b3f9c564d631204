//! End-to-end exports against a mock Canvas instance

use canvas_export::config::Config;
use canvas_export::exporter::{CourseSelection, Exporter};
use canvas_export::remote::{build_http_client, CanvasClient, RemoteApi};
use canvas_export::render::local_file_name;
use serde_json::{json, Value};
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TOKEN: &str = "test-token";

/// Creates a configuration with short pacing and retry delays for testing
fn create_test_config(base_url: &str, output_dir: &Path) -> Config {
    let mut config = Config::default();
    config.canvas.api_url = base_url.to_string();
    config.pacing.initial_interval_ms = 10;
    config.pacing.min_interval_ms = 5;
    config.pacing.max_interval_ms = 200;
    config.pacing.cooldown_secs = 1;
    config.retry.base_backoff_ms = 10;
    config.retry.jitter_ms = 0;
    config.retry.soft_throttle_pause_ms = 10;
    config.export.worker_count = 4;
    config.export.output_dir = output_dir.to_string_lossy().into_owned();
    config
}

fn create_exporter(config: &Config) -> Exporter {
    let client = CanvasClient::new(build_http_client().unwrap(), &config.canvas.api_url, TOKEN).unwrap();
    let api: Arc<dyn RemoteApi> = Arc::new(client);
    Exporter::new(config, api)
}

async fn mount_json(server: &MockServer, route: &str, body: Value) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

/// Mounts a user, two courses (one unnamed stub) and the Biology course tree
async fn mount_biology_course(server: &MockServer) {
    let base_url = server.uri();

    mount_json(server, "/api/v1/users/self", json!({"id": 1, "name": "Student"})).await;
    mount_json(
        server,
        "/api/v1/courses",
        json!([
            {"id": 42, "name": "Biology 101", "course_code": "BIO-101"},
            {"id": 43}
        ]),
    )
    .await;

    // Returned out of order on purpose
    mount_json(
        server,
        "/api/v1/courses/42/modules",
        json!([
            {"id": 2, "name": "Week 2", "position": 2},
            {"id": 1, "name": "Week 1", "position": 1}
        ]),
    )
    .await;

    mount_json(
        server,
        "/api/v1/courses/42/modules/1/items",
        json!([
            {"id": 13, "type": "Page", "title": "Retired page", "position": 4, "page_url": "gone"},
            {"id": 10, "type": "Page", "title": "Intro", "position": 1, "page_url": "intro",
             "html_url": format!("{}/courses/42/pages/intro", base_url)},
            {"id": 11, "type": "SubHeader", "title": "Materials", "position": 2},
            {"id": 12, "type": "File", "title": "Slides", "position": 3, "content_id": 5}
        ]),
    )
    .await;

    mount_json(
        server,
        "/api/v1/courses/42/modules/2/items",
        json!([
            {"id": 20, "type": "Assignment", "title": "Essay", "position": 1, "content_id": 7,
             "html_url": format!("{}/courses/42/assignments/7", base_url)},
            {"id": 21, "type": "ExternalUrl", "title": "Lab site", "position": 2,
             "external_url": "https://lab.example"}
        ]),
    )
    .await;

    mount_json(
        server,
        "/api/v1/courses/42/pages/intro",
        json!({
            "title": "Intro",
            "body": format!(
                "<h2>Welcome</h2><p>Hello <strong>class</strong></p><img src=\"{}/img/cell.png\" alt=\"cell\">",
                base_url
            )
        }),
    )
    .await;

    Mock::given(method("GET"))
        .and(path("/api/v1/courses/42/pages/gone"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "errors": [{"message": "The specified resource does not exist."}]
        })))
        .mount(server)
        .await;

    mount_json(
        server,
        "/api/v1/courses/42/files/5",
        json!({"filename": "slides.pdf", "url": "https://files.example/slides.pdf", "size": 2048}),
    )
    .await;

    mount_json(
        server,
        "/api/v1/courses/42/assignments/7",
        json!({"name": "Essay", "due_at": "2024-05-01T23:59:00Z", "description": "<p>Two pages</p>"}),
    )
    .await;
}

fn read_document(output_dir: &Path, course_name: &str) -> String {
    let path = output_dir
        .join(course_name)
        .join(format!("{}.md", course_name));
    std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("missing document {}: {}", path.display(), e))
}

#[tokio::test]
async fn test_full_export_single_course() {
    let mock_server = MockServer::start().await;
    mount_biology_course(&mock_server).await;

    let output = TempDir::new().unwrap();
    let config = create_test_config(&mock_server.uri(), output.path());
    let exporter = create_exporter(&config);

    let report = exporter.run(&CourseSelection::All).await.unwrap();

    assert_eq!(report.exported.len(), 1);
    assert!(report.is_complete());
    assert_eq!(report.exported[0].modules, 2);
    assert_eq!(report.exported[0].items, 6);

    let doc = read_document(output.path(), "Biology 101");

    assert!(doc.starts_with("# Biology 101\n"));
    assert!(doc.contains("- **Course Code**: BIO-101"));

    // Modules and items in position order
    let week1 = doc.find("## Module: Week 1").unwrap();
    let week2 = doc.find("## Module: Week 2").unwrap();
    assert!(week1 < week2);
    let intro = doc.find("### Page: Intro").unwrap();
    let materials = doc.find("### Materials").unwrap();
    let slides = doc.find("### File: Slides").unwrap();
    let retired = doc.find("### Page: Retired page").unwrap();
    assert!(intro < materials && materials < slides && slides < retired);

    // Rendered content
    assert!(doc.contains("## Welcome\n\nHello **class**"));
    assert!(doc.contains("loading=\"lazy\""));
    assert!(doc.contains("`slides.pdf`"));
    assert!(doc.contains("*Size: 2.00 KB*"));
    assert!(doc.contains("- **Due**: 2024-05-01T23:59:00Z"));
    assert!(doc.contains("Two pages"));
    assert!(doc.contains("- [https://lab.example](https://lab.example)"));

    // The missing page is reported inline without failing the course
    let error_line = doc
        .lines()
        .find(|l| l.starts_with("> Error fetching content:"))
        .unwrap();
    assert!(error_line.contains("404"));

    // Anchors used by the table of contents
    assert!(doc.contains("- [Week 1](#mod-1)"));
    assert!(doc.contains("  - [Intro](#item-10)"));
    assert!(doc.contains("<span id=\"item-10\""));
}

#[tokio::test]
async fn test_export_downloads_images() {
    let mock_server = MockServer::start().await;
    mount_biology_course(&mock_server).await;

    Mock::given(method("GET"))
        .and(path("/img/cell.png"))
        .and(header("authorization", "Bearer test-token"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(b"\x89PNG".to_vec(), "image/png"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let output = TempDir::new().unwrap();
    let mut config = create_test_config(&mock_server.uri(), output.path());
    config.export.download_images = true;
    let exporter = create_exporter(&config).with_image_downloads(build_http_client().unwrap(), TOKEN);

    let report = exporter.run(&CourseSelection::Ids(vec![42])).await.unwrap();
    assert_eq!(report.exported.len(), 1);

    let image_url = url::Url::parse(&format!("{}/img/cell.png", mock_server.uri())).unwrap();
    let file_name = local_file_name(&image_url);
    let image_path = output.path().join("Biology 101").join("images").join(&file_name);
    assert_eq!(std::fs::read(&image_path).unwrap(), b"\x89PNG");

    let doc = read_document(output.path(), "Biology 101");
    assert!(doc.contains(&format!("src=\"images/{}\"", file_name)));
}

#[tokio::test]
async fn test_failed_image_keeps_original_url() {
    let mock_server = MockServer::start().await;
    mount_biology_course(&mock_server).await;

    Mock::given(method("GET"))
        .and(path("/img/cell.png"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let output = TempDir::new().unwrap();
    let config = create_test_config(&mock_server.uri(), output.path());
    let exporter = create_exporter(&config).with_image_downloads(build_http_client().unwrap(), TOKEN);

    exporter.run(&CourseSelection::All).await.unwrap();

    let doc = read_document(output.path(), "Biology 101");
    assert!(doc.contains(&format!("src=\"{}/img/cell.png\"", mock_server.uri())));
}

#[tokio::test]
async fn test_failing_course_does_not_abort_run() {
    let mock_server = MockServer::start().await;

    mount_json(&mock_server, "/api/v1/users/self", json!({"id": 1, "name": "Student"})).await;
    mount_json(
        &mock_server,
        "/api/v1/courses",
        json!([
            {"id": 50, "name": "Locked Course"},
            {"id": 51, "name": "Empty Course"},
            {"id": 52, "name": "History"}
        ]),
    )
    .await;

    Mock::given(method("GET"))
        .and(path("/api/v1/courses/50/modules"))
        .respond_with(ResponseTemplate::new(401).set_body_string("unauthorized"))
        .mount(&mock_server)
        .await;
    mount_json(&mock_server, "/api/v1/courses/51/modules", json!([])).await;
    mount_json(
        &mock_server,
        "/api/v1/courses/52/modules",
        json!([{"id": 1, "name": "Unit 1", "position": 1}]),
    )
    .await;
    mount_json(
        &mock_server,
        "/api/v1/courses/52/modules/1/items",
        json!([{"id": 5, "type": "SubHeader", "title": "Reading list", "position": 1}]),
    )
    .await;

    let output = TempDir::new().unwrap();
    let config = create_test_config(&mock_server.uri(), output.path());
    let exporter = create_exporter(&config);

    let report = exporter
        .run(&CourseSelection::Ids(vec![50, 51, 52, 99]))
        .await
        .unwrap();

    assert_eq!(report.exported.len(), 1);
    assert_eq!(report.exported[0].name, "History");

    let skipped: Vec<&str> = report.skipped.iter().map(|s| s.name.as_str()).collect();
    assert!(skipped.contains(&"Course 99"));
    assert!(skipped.contains(&"Locked Course"));
    assert!(skipped.contains(&"Empty Course"));

    // Skipped courses leave nothing behind
    assert!(!output.path().join("Locked Course").exists());
    assert!(!output.path().join("Empty Course").exists());

    let doc = read_document(output.path(), "History");
    assert!(doc.contains("### Reading list"));
}

#[tokio::test]
async fn test_throttled_and_flaky_calls_are_retried() {
    let mock_server = MockServer::start().await;

    mount_json(&mock_server, "/api/v1/users/self", json!({"id": 1, "name": "Student"})).await;
    mount_json(
        &mock_server,
        "/api/v1/courses",
        json!([{"id": 60, "name": "Physics"}]),
    )
    .await;

    // First answer is a rate limit, then the real listing
    Mock::given(method("GET"))
        .and(path("/api/v1/courses/60/modules"))
        .respond_with(ResponseTemplate::new(403).set_body_string("403 Forbidden (Rate Limit Exceeded)"))
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;
    mount_json(
        &mock_server,
        "/api/v1/courses/60/modules",
        json!([{"id": 1, "name": "Mechanics", "position": 1}]),
    )
    .await;

    // Two server errors before the items come through
    Mock::given(method("GET"))
        .and(path("/api/v1/courses/60/modules/1/items"))
        .respond_with(ResponseTemplate::new(502))
        .up_to_n_times(2)
        .mount(&mock_server)
        .await;
    mount_json(
        &mock_server,
        "/api/v1/courses/60/modules/1/items",
        json!([{"id": 3, "type": "Page", "title": "Forces", "position": 1, "page_url": "forces"}]),
    )
    .await;

    mount_json(
        &mock_server,
        "/api/v1/courses/60/pages/forces",
        json!({"title": "Forces", "body": "<p>F = ma</p>"}),
    )
    .await;

    let output = TempDir::new().unwrap();
    let config = create_test_config(&mock_server.uri(), output.path());
    let exporter = create_exporter(&config);

    let report = exporter.run(&CourseSelection::All).await.unwrap();

    assert!(report.is_complete());
    let doc = read_document(output.path(), "Physics");
    assert!(doc.contains("F = ma"));

    // The rate limit slowed the shared pace down
    assert!(exporter.caller().pacer().interval() > std::time::Duration::from_millis(10));
}

#[tokio::test]
async fn test_login_failure_is_run_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/users/self"))
        .respond_with(ResponseTemplate::new(401).set_body_string("Invalid access token."))
        .mount(&mock_server)
        .await;

    let output = TempDir::new().unwrap();
    let config = create_test_config(&mock_server.uri(), output.path());
    let exporter = create_exporter(&config);

    assert!(exporter.run(&CourseSelection::All).await.is_err());
}
