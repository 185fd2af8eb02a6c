//! Business logic services.
//!
//! # Services
//!
//! - `auth` - Password login, JWT issue/refresh, bearer authentication
//! - `cart` - Cart validation, atomic replacement and totals
//! - `sequence` - The repeated-digit number sequence
//! - `seed` - Loading YAML fixtures into a store

pub mod auth;
pub mod cart;
pub mod seed;
pub mod sequence;
