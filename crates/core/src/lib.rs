//! Wozify Core - Shared types library.
//!
//! This crate provides the domain types used across Wozify components:
//! - `web` - Landing page, authentication and store dashboard
//! - `integration-tests` - In-process HTTP tests of the web binary
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no HTTP
//! clients. Everything that talks to the hosted backend lives in the web crate.
//!
//! # Modules
//!
//! - [`types`] - Type-safe IDs, emails, slugs, store and profile records

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
