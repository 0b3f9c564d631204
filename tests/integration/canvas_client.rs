//! Canvas REST client against a mock server

use canvas_export::client::{classify, FailureKind};
use canvas_export::remote::{
    build_http_client, CanvasClient, ItemKind, ItemTarget, RemoteApi, RemoteError,
};
use serde_json::json;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn create_client(base_url: &str) -> CanvasClient {
    CanvasClient::new(build_http_client().unwrap(), base_url, "test-token").unwrap()
}

#[tokio::test]
async fn test_pagination_follows_link_header() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    // Mounted first so the page-2 request matches it before the generic mock
    Mock::given(method("GET"))
        .and(path("/api/v1/courses"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": 3, "name": "Chemistry"}
        ])))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/v1/courses"))
        .and(query_param("per_page", "100"))
        .and(query_param("enrollment_state", "active"))
        .and(header("authorization", "Bearer test-token"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([
                    {"id": 1, "name": "Biology", "course_code": "BIO-101"},
                    {"id": 2}
                ]))
                .insert_header(
                    "link",
                    format!(
                        r#"<{0}/api/v1/courses?page=1&per_page=100>; rel="current", <{0}/api/v1/courses?page=2&per_page=100>; rel="next""#,
                        base_url
                    )
                    .as_str(),
                ),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = create_client(&base_url);
    let courses = client.active_courses().await.unwrap();

    let ids: Vec<u64> = courses.iter().map(|c| c.id).collect();
    assert_eq!(ids, vec![1, 2, 3]);
    assert_eq!(courses[0].course_code.as_deref(), Some("BIO-101"));
    assert_eq!(courses[1].name, None);
}

#[tokio::test]
async fn test_module_items_are_typed() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/courses/42/modules/7/items"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": 1, "type": "Page", "title": "Intro", "position": 1, "page_url": "intro",
             "html_url": "https://canvas.example/courses/42/modules/items/1"},
            {"id": 2, "type": "File", "title": "Slides", "position": 2, "content_id": 55},
            {"id": 3, "type": "ExternalUrl", "title": "Lab", "external_url": "https://lab.example"},
            {"id": 4, "type": "Quiz", "title": "Quiz 1", "position": 4, "content_id": 9}
        ])))
        .mount(&mock_server)
        .await;

    let client = create_client(&mock_server.uri());
    let items = client.list_module_items(42, 7).await.unwrap();

    assert_eq!(items.len(), 4);
    assert_eq!(
        items[0].target,
        ItemTarget::Page {
            url: "intro".to_string()
        }
    );
    assert_eq!(items[1].target, ItemTarget::File { id: 55 });
    assert_eq!(items[2].position, None);
    assert_eq!(items[3].kind, ItemKind::Other("Quiz".to_string()));
    assert_eq!(items[3].target, ItemTarget::None);
}

#[tokio::test]
async fn test_page_slug_and_body() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/courses/42/pages/week-1-overview"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "title": "Week 1", "body": "<p>Hello</p>"
        })))
        .mount(&mock_server)
        .await;

    let client = create_client(&mock_server.uri());
    let page = client.get_page(42, "week-1-overview").await.unwrap();

    assert_eq!(page.title.as_deref(), Some("Week 1"));
    assert_eq!(page.body.as_deref(), Some("<p>Hello</p>"));
}

#[tokio::test]
async fn test_not_found_is_fatal_api_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/courses/42/files/5"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "errors": [{"message": "The specified resource does not exist."}]
        })))
        .mount(&mock_server)
        .await;

    let client = create_client(&mock_server.uri());
    let error = client.get_file(42, 5).await.unwrap_err();

    match &error {
        RemoteError::Api { status, message } => {
            assert_eq!(*status, 404);
            assert!(message.starts_with("404 Not Found"));
            assert!(message.contains("does not exist"));
        }
        other => panic!("unexpected error: {:?}", other),
    }
    assert_eq!(classify(&error), FailureKind::Fatal);
}

#[tokio::test]
async fn test_rate_limit_forbidden_is_soft_throttle() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/users/self"))
        .respond_with(ResponseTemplate::new(403).set_body_string("403 Forbidden (Rate Limit Exceeded)"))
        .mount(&mock_server)
        .await;

    let client = create_client(&mock_server.uri());
    let error = client.current_user().await.unwrap_err();

    assert_eq!(classify(&error), FailureKind::SoftThrottle);
}

#[tokio::test]
async fn test_captcha_page_is_hard_throttle() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/courses/42/modules"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(
                "<html><body>Please solve the CAPTCHA to continue</body></html>",
                "text/html",
            ),
        )
        .mount(&mock_server)
        .await;

    let client = create_client(&mock_server.uri());
    let error = client.list_modules(42).await.unwrap_err();

    assert_eq!(classify(&error), FailureKind::HardThrottle);
}

#[tokio::test]
async fn test_server_error_is_transient() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/courses/42/assignments/7"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&mock_server)
        .await;

    let client = create_client(&mock_server.uri());
    let error = client.get_assignment(42, 7).await.unwrap_err();

    assert!(matches!(error, RemoteError::Api { status: 503, .. }));
    assert_eq!(classify(&error), FailureKind::Transient);
}

#[tokio::test]
async fn test_malformed_json_is_decode_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/users/self"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw("{\"id\": ", "application/json"),
        )
        .mount(&mock_server)
        .await;

    let client = create_client(&mock_server.uri());
    let error = client.current_user().await.unwrap_err();

    assert!(matches!(error, RemoteError::Decode(_)));
}

#[tokio::test]
async fn test_connection_failure_is_network_error() {
    // Nothing listens on the discard port
    let client = create_client("http://127.0.0.1:9");
    let error = client.current_user().await.unwrap_err();

    assert!(matches!(error, RemoteError::Network(_)));
    assert_eq!(classify(&error), FailureKind::Transient);
}
