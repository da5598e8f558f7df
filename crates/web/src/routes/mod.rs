//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                       - Landing page (signed-in users go to /dashboard)
//! GET  /health                 - Liveness check
//! GET  /health/ready           - Readiness check (backend reachable)
//!
//! # Auth
//! GET  /auth?mode=sign-in      - Sign-in form
//! GET  /auth?mode=sign-up      - Sign-up form
//! POST /auth/sign-in           - Sign in (rate limited)
//! POST /auth/sign-up           - Sign up (rate limited)
//! POST /auth/sign-out          - Sign out, back to /
//!
//! # Dashboard (requires auth, otherwise redirects to /)
//! GET  /dashboard              - Store list
//! GET  /dashboard?create=1     - Store list with the create-store modal open
//! POST /dashboard/stores       - Create a store
//!
//! *                            - 404 Not Found
//! ```

pub mod auth;
pub mod dashboard;
pub mod health;
pub mod landing;

use axum::{
    Router,
    http::Uri,
    routing::{get, post},
};

use crate::error::AppError;
use crate::middleware::auth_rate_limiter;
use crate::state::AppState;

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    let credentials = Router::new()
        .route("/sign-in", post(auth::sign_in))
        .route("/sign-up", post(auth::sign_up))
        .route_layer(auth_rate_limiter());

    Router::new()
        .route("/", get(auth::auth_page))
        .route("/sign-out", post(auth::sign_out))
        .merge(credentials)
}

/// Create the dashboard routes router.
pub fn dashboard_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(dashboard::index))
        .route("/stores", post(dashboard::create_store))
}

/// Create all page routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(landing::landing))
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .nest("/auth", auth_routes())
        .nest("/dashboard", dashboard_routes())
        .fallback(not_found)
}

async fn not_found(uri: Uri) -> AppError {
    AppError::NotFound(uri.path().to_string())
}
