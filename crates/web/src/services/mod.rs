//! Business logic services.
//!
//! Services sit between route handlers and the [`Backend`](crate::backend::Backend):
//! they validate user input before any external call, keep the browser
//! session in sync with the backend session, and reduce failures to the
//! message shown next to the form.

pub mod auth;
pub mod stores;

pub use auth::{AuthError, AuthService, Registration, SessionChange};
pub use stores::{CreateStoreForm, StoreError, StoreService};
