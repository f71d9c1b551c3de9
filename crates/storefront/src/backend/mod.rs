//! REST client for the catalog and auth backend.
//!
//! # Endpoints
//!
//! - `GET {BACKEND_URL}{BACKEND_CATALOG_PATH}`: the whole catalog, as a bare
//!   JSON array or wrapped in `{ "data": [...] }`. No query parameters are
//!   sent; filtering and paging happen in `doux_core::catalog`.
//! - `POST {AUTH_API_URL}/login`: `{ email, password }` to `{ token }`.
//! - `POST {AUTH_API_URL}/register`: the new user; the body is ignored.
//! - `POST {AUTH_API_URL}/api/auth/google`: `{ id_token }` or `{ code }` to
//!   `{ token }`.
//!
//! The catalog is cached with `moka` for `CATALOG_CACHE_TTL_SECS`; concurrent
//! misses share one request.

mod client;
mod types;

pub use client::{BackendClient, Catalog};
pub use types::GoogleCredential;

use thiserror::Error;

/// Errors that can occur when talking to the backend.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Connection, timeout or body transfer failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The backend answered with a non-success status.
    #[error("backend returned {status}: {message}")]
    Status { status: u16, message: String },

    /// Rate limited by the backend.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// A login answered without a token.
    #[error("backend response did not contain a token")]
    MissingToken,
}

impl ApiError {
    /// The backend refused the request because of what was sent
    /// (bad credentials, duplicate account, invalid Google credential).
    #[must_use]
    pub const fn is_rejection(&self) -> bool {
        matches!(self, Self::Status { status, .. } if *status >= 400 && *status < 500)
    }

    /// Message the backend gave for a rejection.
    #[must_use]
    pub fn backend_message(&self) -> Option<&str> {
        match self {
            Self::Status { message, .. } if !message.is_empty() => Some(message),
            _ => None,
        }
    }
}
