//! Core types for Wozify.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod id;
pub mod profile;
pub mod slug;
pub mod status;
pub mod store;

pub use email::{Email, EmailError};
pub use id::*;
pub use profile::Profile;
pub use slug::{Slug, slugify};
pub use status::StoreStatus;
pub use store::{DEFAULT_STORE_DOMAIN, NewStore, Store};
