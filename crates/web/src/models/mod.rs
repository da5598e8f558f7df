//! Domain models for the web crate.
//!
//! Records owned by the hosted backend (`Store`, `Profile`) live in
//! `wozify-core`; this module holds what the web layer keeps per browser.

pub mod session;

pub use session::{AuthSession, SessionUser, keys as session_keys, profile_from_session};
