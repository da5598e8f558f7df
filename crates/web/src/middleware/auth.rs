//! Authentication extractors.
//!
//! Both extractors go through [`AuthService::current`](crate::services::AuthService::current),
//! so an access token close to expiry is refreshed before the handler runs.

use axum::{
    extract::FromRequestParts,
    http::request::Parts,
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

use crate::error::set_sentry_user;
use crate::models::AuthSession;
use crate::state::AppState;

/// Extractor that requires a signed-in user.
///
/// Visitors without a session are sent back to the landing page.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(
///     RequireAuth(auth): RequireAuth,
/// ) -> impl IntoResponse {
///     format!("Hello, {}!", auth.user.email)
/// }
/// ```
pub struct RequireAuth(pub AuthSession);

/// Rejection returned when a signed-in user is required.
pub struct AuthRejection;

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        Redirect::to("/").into_response()
    }
}

impl FromRequestParts<AppState> for RequireAuth {
    type Rejection = AuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth = current_session(parts, state).await.ok_or(AuthRejection)?;

        // Scoped to this request's hub by sentry-tower.
        set_sentry_user(&auth.user.id, Some(auth.user.email.as_str()));

        Ok(Self(auth))
    }
}

/// Extractor that optionally gets the signed-in user.
///
/// Unlike `RequireAuth`, this does not reject the request.
pub struct OptionalAuth(pub Option<AuthSession>);

impl FromRequestParts<AppState> for OptionalAuth {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        Ok(Self(current_session(parts, state).await))
    }
}

async fn current_session(parts: &Parts, state: &AppState) -> Option<AuthSession> {
    // Set by SessionManagerLayer
    let session = parts.extensions.get::<Session>()?;

    match state.auth().current(session).await {
        Ok(auth) => auth,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to load auth session");
            None
        }
    }
}
