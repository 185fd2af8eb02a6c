//! Core types for Saraphan.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod id;
pub mod money;
pub mod slug;
pub mod username;

pub use id::*;
pub use money::{Amount, AmountError, Price, PriceError};
pub use slug::{Slug, SlugError};
pub use username::{Username, UsernameError};
