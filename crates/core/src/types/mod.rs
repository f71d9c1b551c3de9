//! Core value types for Doux Shop.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod id;
pub mod price;
pub mod product;

pub use email::{Email, EmailError};
pub use id::{ProductId, VisitorId};
pub use price::{CurrencyCode, Price, UnknownCurrency};
pub use product::Product;
