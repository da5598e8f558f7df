//! Landing page, health checks and static assets.

use axum::http::StatusCode;

use wozify_integration_tests::TestApp;

#[tokio::test]
async fn test_landing_page_renders_for_visitors() {
    let mut app = TestApp::new();

    let response = app.get("/").await;

    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body.contains("unprecedented scale"));
    assert!(response.body.contains("Built for performance"));
    assert!(response.body.contains("Ready when you are"));
    assert!(!response.body.contains("Your Stores"));
}

#[tokio::test]
async fn test_responses_carry_request_id_and_security_headers() {
    let mut app = TestApp::new();

    let response = app.get("/").await;

    assert!(response.headers.contains_key("x-request-id"));
    assert_eq!(response.headers["x-frame-options"], "DENY");
    assert!(response.headers.contains_key("content-security-policy"));
}

#[tokio::test]
async fn test_health_checks() {
    let mut app = TestApp::new();

    let live = app.get("/health").await;
    assert_eq!(live.status, StatusCode::OK);
    assert_eq!(live.body, "ok");

    let ready = app.get("/health/ready").await;
    assert_eq!(ready.status, StatusCode::OK);
}

#[tokio::test]
async fn test_static_assets_are_served() {
    let mut app = TestApp::new();

    let css = app.get("/static/css/main.css").await;
    assert_eq!(css.status, StatusCode::OK);

    let js = app.get("/static/js/app.js").await;
    assert_eq!(js.status, StatusCode::OK);
    assert!(js.body.contains("data-gated"));
}

#[tokio::test]
async fn test_unknown_path_is_not_found() {
    let mut app = TestApp::new();

    let response = app.get("/no-such-page").await;

    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(response.body, "Not found: /no-such-page");
}
