//! Domain models for the catalog, carts and accounts.
//!
//! These types are validated domain objects, separate from both database
//! rows and the JSON shapes the API renders.

pub mod cart;
pub mod catalog;
pub mod user;

pub use cart::{CartItem, CartLine, CartSummary};
pub use catalog::{Category, Good, NewCategory, NewGood, NewSubcategory, Subcategory};
pub use user::User;
