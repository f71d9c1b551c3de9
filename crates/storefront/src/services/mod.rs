//! Business logic services for the storefront.
//!
//! # Services
//!
//! - `auth` - Login, registration and Google sign-in against the auth backend
//! - `cart` - Per-visitor in-memory carts with change notifications

pub mod auth;
pub mod cart;

pub use cart::{CartNotification, CartStore};
