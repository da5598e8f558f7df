//! Wozify web server.
//!
//! Serves the landing page and the store dashboard on port 3000.
//!
//! # Architecture
//!
//! - Axum web framework, Askama templates rendered on the server
//! - Supabase (auth + `profiles` / `stores` tables) as the only data store
//! - Browser sessions in tower-sessions, holding the backend session tokens
//!
//! Set `WOZIFY_BACKEND=memory` to run without a Supabase project.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::net::SocketAddr;

use sentry::integrations::tracing as sentry_tracing;
use tokio::sync::broadcast::{self, error::RecvError};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use wozify_web::config::WebConfig;
use wozify_web::services::SessionChange;
use wozify_web::state::AppState;
use wozify_web::{app, backend};

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &WebConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry.dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: config
                .sentry
                .environment
                .clone()
                .map(std::borrow::Cow::Owned),
            sample_rate: config.sentry.sample_rate,
            traces_sample_rate: config.sentry.traces_sample_rate,
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    tracing::info!("Sentry initialized");
    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

#[tokio::main]
async fn main() {
    // Load configuration from environment (needed for Sentry init)
    let config = WebConfig::from_env().expect("Failed to load configuration");

    // Initialize Sentry (must be done before tracing subscriber)
    let _sentry_guard = init_sentry(&config);

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "wozify_web=info,tower_http=debug".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();

    let backend = backend::from_config(&config.backend).expect("Failed to create backend client");
    let state = AppState::new(config.clone(), backend);

    tokio::spawn(log_session_changes(state.auth().subscribe()));

    let app = app(state);

    let addr = config.socket_addr();
    tracing::info!("wozify-web listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .expect("Server error");
}

/// Log every session change. INFO events also reach Sentry as breadcrumbs.
async fn log_session_changes(mut changes: broadcast::Receiver<SessionChange>) {
    loop {
        match changes.recv().await {
            Ok(change) => {
                let (event, user_id) = match &change {
                    SessionChange::SignedIn(user) => ("signed in", Some(user.id)),
                    SessionChange::TokenRefreshed(user) => ("token refreshed", Some(user.id)),
                    SessionChange::SignedOut => ("signed out", None),
                };
                let user_id = user_id.map(|id| id.to_string()).unwrap_or_default();
                tracing::info!(event, user_id = %user_id, "Session changed");
            }
            Err(RecvError::Lagged(missed)) => {
                tracing::warn!(missed, "Session change listener fell behind");
            }
            Err(RecvError::Closed) => break,
        }
    }
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}
