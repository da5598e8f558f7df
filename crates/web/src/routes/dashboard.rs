//! Dashboard route handlers.
//!
//! The store list, the create-store modal (`?create=1`) and the create
//! action. A failed create re-renders the dashboard with the modal open and
//! the error inline; a successful one redirects back so the fresh list is
//! loaded.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;

use wozify_core::Store;

use crate::error::add_breadcrumb;
use crate::filters;
use crate::middleware::RequireAuth;
use crate::models::AuthSession;
use crate::services::CreateStoreForm;
use crate::state::AppState;

// =============================================================================
// View Types
// =============================================================================

/// A placeholder metric tile.
pub struct Metric {
    pub label: &'static str,
    pub value: &'static str,
    pub change: &'static str,
}

const METRICS: &[Metric] = &[
    Metric {
        label: "Total Revenue",
        value: "$0",
        change: "+0%",
    },
    Metric {
        label: "Orders",
        value: "0",
        change: "+0%",
    },
    Metric {
        label: "Conversion Rate",
        value: "0%",
        change: "+0%",
    },
];

/// A store as shown on its dashboard card.
pub struct StoreCard {
    pub name: String,
    pub description: String,
    pub status: String,
    pub is_active: bool,
    pub domain: String,
}

impl StoreCard {
    fn from_store(store: &Store, apex: &str) -> Self {
        Self {
            name: store.name.clone(),
            description: store.description_or_default().to_string(),
            status: store.status.to_string(),
            is_active: store.status.is_active(),
            domain: store.display_domain(apex),
        }
    }
}

/// State of the create-store modal.
pub struct CreateModal {
    pub form: CreateStoreForm,
    pub error: Option<String>,
    /// Initial state of the submit button; the script keeps it live.
    pub can_submit: bool,
}

impl CreateModal {
    fn new(form: CreateStoreForm, error: Option<String>) -> Self {
        let can_submit = form.can_submit(false);
        Self {
            form,
            error,
            can_submit,
        }
    }
}

/// Query parameters for the dashboard.
#[derive(Debug, Deserialize)]
pub struct DashboardQuery {
    pub create: Option<String>,
}

impl DashboardQuery {
    fn opens_modal(&self) -> bool {
        self.create
            .as_deref()
            .is_some_and(|v| matches!(v, "1" | "true"))
    }
}

// =============================================================================
// Templates
// =============================================================================

/// Dashboard page template.
#[derive(Template, WebTemplate)]
#[template(path = "dashboard/index.html")]
pub struct DashboardTemplate {
    pub display_name: String,
    pub stores: Vec<StoreCard>,
    pub load_error: Option<String>,
    pub metrics: &'static [Metric],
    pub modal: Option<CreateModal>,
}

// =============================================================================
// Handlers
// =============================================================================

/// Display the store list.
pub async fn index(
    State(state): State<AppState>,
    RequireAuth(auth): RequireAuth,
    Query(query): Query<DashboardQuery>,
) -> Response {
    let modal = query
        .opens_modal()
        .then(|| CreateModal::new(CreateStoreForm::default(), None));

    render(&state, &auth, modal).await.into_response()
}

/// Handle create-store form submission.
pub async fn create_store(
    State(state): State<AppState>,
    RequireAuth(auth): RequireAuth,
    Form(form): Form<CreateStoreForm>,
) -> Response {
    match state.stores().create(&auth, &form).await {
        Ok(()) => {
            add_breadcrumb("store", "Created store", Some(&[("name", form.name.as_str())]));
            Redirect::to("/dashboard").into_response()
        }
        Err(e) => {
            tracing::warn!(error = %e, "Store creation failed");
            let modal = CreateModal::new(form, Some(e.user_message()));
            (
                StatusCode::UNPROCESSABLE_ENTITY,
                render(&state, &auth, Some(modal)).await,
            )
                .into_response()
        }
    }
}

async fn render(state: &AppState, auth: &AuthSession, modal: Option<CreateModal>) -> DashboardTemplate {
    let profile = state.stores().profile(auth).await;
    let apex = &state.config().store_domain;

    let (stores, load_error) = match state.stores().list(auth).await {
        Ok(stores) => (
            stores
                .iter()
                .map(|store| StoreCard::from_store(store, apex))
                .collect(),
            None,
        ),
        Err(e) => {
            tracing::error!(error = %e, "Failed to load stores");
            (Vec::new(), Some(e.user_message()))
        }
    };

    DashboardTemplate {
        display_name: profile.display_name().to_string(),
        stores,
        load_error,
        metrics: METRICS,
        modal,
    }
}
