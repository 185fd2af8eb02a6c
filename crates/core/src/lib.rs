//! Saraphan Core - Shared types library.
//!
//! This crate provides common types used across all Saraphan components:
//! - `api` - Catalog and shopping-cart HTTP API
//! - `cli` - Command-line tools for migrations, users and catalog data
//!
//! # Architecture
//!
//! The core crate contains only types and traits - no I/O, no database access,
//! no HTTP clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, slugs, usernames, prices and amounts

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
