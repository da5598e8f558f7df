//! Integration test harness for Wozify.
//!
//! Drives the real router in-process with `tower::ServiceExt::oneshot`
//! against the in-memory backend, carrying the session cookie between
//! requests like a browser would.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p wozify-integration-tests
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! let mut app = TestApp::new();
//! let response = app.sign_up("Jane Doe", "jane@example.com", "hunter22").await;
//! assert_eq!(response.location(), Some("/dashboard"));
//! ```

#![allow(clippy::unwrap_used, clippy::missing_panics_doc)]

use std::sync::Arc;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{HeaderValue, Request, StatusCode, header},
};
use tower::ServiceExt;
use url::form_urlencoded;

use wozify_web::backend::MemoryBackend;
use wozify_web::config::WebConfig;
use wozify_web::middleware::session::SESSION_COOKIE_NAME;
use wozify_web::state::AppState;

/// Client address sent with every request so the rate limiter can key on it.
const TEST_CLIENT_IP: &str = "203.0.113.10";

/// A response with its body already read.
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: axum::http::HeaderMap,
    pub body: String,
}

impl TestResponse {
    /// Redirect target, if any.
    #[must_use]
    pub fn location(&self) -> Option<&str> {
        self.headers
            .get(header::LOCATION)
            .and_then(|v| v.to_str().ok())
    }

    /// Whether the response redirects to `path`.
    #[must_use]
    pub fn redirects_to(&self, path: &str) -> bool {
        self.status.is_redirection() && self.location() == Some(path)
    }
}

/// The application plus one browser's cookie jar.
pub struct TestApp {
    router: Router,
    state: AppState,
    cookie: Option<String>,
}

impl Default for TestApp {
    fn default() -> Self {
        Self::new()
    }
}

impl TestApp {
    /// App backed by a fresh in-memory backend.
    #[must_use]
    pub fn new() -> Self {
        Self::with_backend(MemoryBackend::new())
    }

    /// App backed by the given in-memory backend.
    #[must_use]
    pub fn with_backend(backend: MemoryBackend) -> Self {
        let state = AppState::new(WebConfig::local(), Arc::new(backend));
        Self {
            router: wozify_web::app(state.clone()),
            state,
            cookie: None,
        }
    }

    /// Shared application state, for subscribing to session changes.
    #[must_use]
    pub const fn state(&self) -> &AppState {
        &self.state
    }

    /// Same app, new browser with an empty cookie jar.
    #[must_use]
    pub fn new_browser(&self) -> Self {
        Self {
            router: self.router.clone(),
            state: self.state.clone(),
            cookie: None,
        }
    }

    pub async fn get(&mut self, path: &str) -> TestResponse {
        let request = Request::get(path).body(Body::empty()).unwrap();
        self.send(request).await
    }

    pub async fn post_form(&mut self, path: &str, fields: &[(&str, &str)]) -> TestResponse {
        let body = form_urlencoded::Serializer::new(String::new())
            .extend_pairs(fields)
            .finish();
        let request = Request::post(path)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body))
            .unwrap();
        self.send(request).await
    }

    pub async fn sign_up(&mut self, full_name: &str, email: &str, password: &str) -> TestResponse {
        self.post_form(
            "/auth/sign-up",
            &[
                ("full_name", full_name),
                ("email", email),
                ("password", password),
            ],
        )
        .await
    }

    pub async fn sign_in(&mut self, email: &str, password: &str) -> TestResponse {
        self.post_form("/auth/sign-in", &[("email", email), ("password", password)])
            .await
    }

    pub async fn sign_out(&mut self) -> TestResponse {
        self.post_form("/auth/sign-out", &[]).await
    }

    pub async fn create_store(&mut self, name: &str, description: &str) -> TestResponse {
        self.post_form(
            "/dashboard/stores",
            &[("name", name), ("description", description)],
        )
        .await
    }

    async fn send(&mut self, mut request: Request<Body>) -> TestResponse {
        let headers = request.headers_mut();
        headers.insert("x-forwarded-for", HeaderValue::from_static(TEST_CLIENT_IP));
        if let Some(cookie) = &self.cookie {
            headers.insert(header::COOKIE, HeaderValue::from_str(cookie).unwrap());
        }

        let Ok(response) = self.router.clone().oneshot(request).await;

        if let Some(set_cookie) = response
            .headers()
            .get(header::SET_COOKIE)
            .and_then(|v| v.to_str().ok())
        {
            self.store_cookie(set_cookie);
        }

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();

        TestResponse {
            status,
            headers,
            body: String::from_utf8(bytes.to_vec()).unwrap(),
        }
    }

    fn store_cookie(&mut self, set_cookie: &str) {
        let Some(pair) = set_cookie.split(';').next() else {
            return;
        };
        let Some((name, value)) = pair.split_once('=') else {
            return;
        };
        if name.trim() != SESSION_COOKIE_NAME {
            return;
        }

        let removed = value.is_empty() || set_cookie.contains("Max-Age=0");
        self.cookie = (!removed).then(|| pair.trim().to_string());
    }
}
