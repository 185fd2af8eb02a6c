//! Saraphan API library.
//!
//! This crate provides the catalog and shopping-cart API as a library,
//! allowing it to be tested in-process and reused by the CLI.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
pub mod validation;

pub use routes::app;
pub use state::AppState;
