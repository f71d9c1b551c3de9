//! Session-related types.
//!
//! The session is the only per-visitor state besides the cart store.

use doux_core::AuthToken;

/// What the header needs to know about the signed-in visitor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser {
    /// `email` claim of the token, when present.
    pub email: Option<String>,
}

impl From<&AuthToken> for CurrentUser {
    fn from(token: &AuthToken) -> Self {
        Self {
            email: token.email().map(str::to_owned),
        }
    }
}

/// Session keys.
pub mod keys {
    /// Raw bearer token issued by the auth backend.
    pub const TOKEN: &str = "token";

    /// Anonymous visitor id the cart is keyed by.
    pub const VISITOR_ID: &str = "visitor_id";

    /// Applied promo code.
    pub const PROMO_CODE: &str = "promo_code";

    /// Registration wizard draft between steps.
    pub const REGISTER_DRAFT: &str = "register_draft";
}
