//! Doux Core - Shared storefront types and shop logic.
//!
//! This crate provides the types and rules used by the storefront binary:
//! - `storefront` - Server-rendered shop front (catalog, cart, auth forms)
//! - `integration-tests` - End-to-end checks against a fake backend
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no HTTP
//! clients, no clocks. Callers pass in "now" where time matters, which keeps
//! every rule here deterministic and trivially testable.
//!
//! # Modules
//!
//! - [`types`] - Product, price, id and email value types
//! - [`cart`] - Cart store operations and the cart summary (shipping, promo)
//! - [`search`] - Substring search, suggestions and the suggestion cursor
//! - [`pagination`] - Page arithmetic and the numbered page window
//! - [`catalog`] - Search + category + sort + paginate in one pass
//! - [`auth`] - Bearer token decoding and the logged-in gate
//! - [`register`] - Multi-step registration wizard

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod auth;
pub mod cart;
pub mod catalog;
pub mod pagination;
pub mod register;
pub mod search;
pub mod types;

pub use auth::{AuthToken, AuthTokenError, is_logged_in};
pub use cart::{Cart, CartEvent, CartItem, CartSummary, PromoCode, PromoError};
pub use catalog::{CatalogPage, CatalogQuery, CatalogSort};
pub use pagination::{PAGE_SIZE, PageSlot, Pagination};
pub use register::{NewUser, RegistrationDraft, RegistrationError, RegistrationStep, StepFields};
pub use search::{CursorAction, NavKey, SuggestionCursor};
pub use types::*;
