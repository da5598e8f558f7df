//! Authentication route handlers.
//!
//! One form serves both sign-in and sign-up; `?mode=` picks which. Switching
//! mode is a plain link, so the re-rendered form never carries the previous
//! error.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;

use crate::error::{AppError, clear_sentry_user};
use crate::filters;
use crate::middleware::OptionalAuth;
use crate::services::{AuthError, Registration};
use crate::state::AppState;

// =============================================================================
// Form Types
// =============================================================================

/// Which variant of the auth form is shown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AuthMode {
    #[default]
    SignIn,
    SignUp,
}

impl AuthMode {
    /// Query-string value for this mode.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SignIn => "sign-in",
            Self::SignUp => "sign-up",
        }
    }

    /// The other mode.
    #[must_use]
    pub const fn toggled(self) -> Self {
        match self {
            Self::SignIn => Self::SignUp,
            Self::SignUp => Self::SignIn,
        }
    }

    #[must_use]
    pub const fn is_sign_up(self) -> bool {
        matches!(self, Self::SignUp)
    }

    #[must_use]
    pub const fn heading(self) -> &'static str {
        match self {
            Self::SignIn => "Welcome back",
            Self::SignUp => "Create your account",
        }
    }

    #[must_use]
    pub const fn subheading(self) -> &'static str {
        match self {
            Self::SignIn => "Sign in to continue to your dashboard",
            Self::SignUp => "Start building at scale",
        }
    }

    #[must_use]
    pub const fn submit_label(self) -> &'static str {
        match self {
            Self::SignIn => "Sign In",
            Self::SignUp => "Create Account",
        }
    }

    /// Text of the link that switches to the other mode.
    #[must_use]
    pub const fn toggle_label(self) -> &'static str {
        match self {
            Self::SignIn => "Don't have an account? Sign up",
            Self::SignUp => "Already have an account? Sign in",
        }
    }
}

/// Query parameters for the auth page.
#[derive(Debug, Deserialize)]
pub struct AuthQuery {
    #[serde(default)]
    pub mode: AuthMode,
}

/// Sign-in form data.
#[derive(Debug, Deserialize)]
pub struct SignInForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Sign-up form data.
#[derive(Debug, Deserialize)]
pub struct SignUpForm {
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

// =============================================================================
// Templates
// =============================================================================

/// Combined sign-in / sign-up page template.
///
/// The password is never echoed back into the form.
#[derive(Template, WebTemplate)]
#[template(path = "auth/form.html")]
pub struct AuthTemplate {
    pub mode: AuthMode,
    pub full_name: String,
    pub email: String,
    pub error: Option<String>,
    pub notice: Option<String>,
}

impl AuthTemplate {
    /// Empty form in the given mode.
    #[must_use]
    pub const fn new(mode: AuthMode) -> Self {
        Self {
            mode,
            full_name: String::new(),
            email: String::new(),
            error: None,
            notice: None,
        }
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// Display the auth form.
pub async fn auth_page(
    OptionalAuth(auth): OptionalAuth,
    Query(query): Query<AuthQuery>,
) -> Response {
    if auth.is_some() {
        return Redirect::to("/dashboard").into_response();
    }

    AuthTemplate::new(query.mode).into_response()
}

/// Handle sign-in form submission.
pub async fn sign_in(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<SignInForm>,
) -> Response {
    match state
        .auth()
        .sign_in(&session, &form.email, &form.password)
        .await
    {
        Ok(_) => Redirect::to("/dashboard").into_response(),
        Err(e) => rejected(
            AuthTemplate {
                email: form.email,
                ..AuthTemplate::new(AuthMode::SignIn)
            },
            &e,
        ),
    }
}

/// Handle sign-up form submission.
pub async fn sign_up(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<SignUpForm>,
) -> Response {
    match state
        .auth()
        .sign_up(&session, &form.email, &form.password, &form.full_name)
        .await
    {
        Ok(Registration::SignedIn(_)) => Redirect::to("/dashboard").into_response(),
        Ok(Registration::ConfirmationRequired(email)) => AuthTemplate {
            email: email.to_string(),
            notice: Some(format!(
                "Check {email} for a confirmation link, then sign in."
            )),
            ..AuthTemplate::new(AuthMode::SignIn)
        }
        .into_response(),
        Err(e) => rejected(
            AuthTemplate {
                full_name: form.full_name,
                email: form.email,
                ..AuthTemplate::new(AuthMode::SignUp)
            },
            &e,
        ),
    }
}

/// Handle sign-out. Always lands on the landing page.
///
/// # Errors
///
/// Returns `AppError::Session` if the session cannot be read or flushed.
pub async fn sign_out(
    State(state): State<AppState>,
    OptionalAuth(auth): OptionalAuth,
    session: Session,
) -> Result<Redirect, AppError> {
    if let Some(auth) = auth {
        state.stores().forget_profile(auth.user.id).await;
    }

    state.auth().sign_out(&session).await?;
    clear_sentry_user();

    Ok(Redirect::to("/"))
}

/// Re-render the form with the failure shown inline.
fn rejected(template: AuthTemplate, err: &AuthError) -> Response {
    if err.is_client_error() {
        tracing::info!(error = %err, mode = template.mode.as_str(), "Auth form rejected");
    } else {
        tracing::error!(error = %err, mode = template.mode.as_str(), "Auth request failed");
    }

    let template = AuthTemplate {
        error: Some(err.user_message()),
        ..template
    };
    (StatusCode::UNPROCESSABLE_ENTITY, template).into_response()
}
