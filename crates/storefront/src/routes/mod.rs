//! HTTP route handlers for the storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                        - Catalog (search, page, sort, category)
//! GET  /articles/{id}           - Product detail
//! GET  /details/{id}            - Product detail (alias)
//!
//! # Cart (HTMX fragments, plain-form redirects)
//! GET  /cart                    - Cart page
//! POST /cart/add                - Add one (returns count badge, triggers cart-updated)
//! POST /cart/update             - Set quantity, <= 0 removes (returns cart contents)
//! POST /cart/remove             - Remove entry (returns cart contents)
//! POST /cart/clear              - Empty the cart and drop the promo code
//! POST /cart/promo              - Apply a promo code
//! GET  /cart/count              - Cart count badge (fragment)
//!
//! # Checkout (requires auth)
//! GET  /checkout                - Order summary
//!
//! # Search
//! GET  /search/suggest          - Suggestion dropdown (debounced, keyboard nav)
//!
//! # Auth
//! GET  /auth/login              - Login page
//! POST /auth/login              - Login action (rate limited)
//! GET  /auth/register           - Registration wizard
//! POST /auth/register           - Wizard step action
//! GET  /auth/forgot-password    - Forgot password page
//! POST /auth/forgot-password    - Forgot password confirmation
//! POST /auth/logout             - Logout action
//! GET  /auth/google/callback    - Google OAuth redirect target
//! POST /auth/google/callback    - Google Identity Services credential (rate limited)
//! ```

pub mod articles;
pub mod auth;
pub mod cart;
pub mod checkout;
pub mod google_auth;
pub mod home;
pub mod search;

use axum::{
    Router,
    http::{HeaderMap, StatusCode},
    response::{AppendHeaders, IntoResponse, Response},
    routing::{get, post},
};
use doux_core::{AuthToken, CurrencyCode, Price};
use rust_decimal::Decimal;

use crate::error::AppError;
use crate::middleware::{auth_rate_limiter, suggest_rate_limiter};
use crate::models::CurrentUser;
use crate::state::AppState;

// =============================================================================
// Page chrome
// =============================================================================

/// Data every full page needs for the header and scripts.
#[derive(Debug, Clone, Default)]
pub struct Layout {
    /// Signed-in visitor, if any.
    pub user: Option<CurrentUser>,
    /// Current catalog search, echoed into the header search box.
    pub search: String,
    /// Google Identity Services client id; the sign-in button is hidden without it.
    pub google_client_id: Option<String>,
}

impl Layout {
    /// Layout for a page rendered for `token`'s owner (or an anonymous visitor).
    #[must_use]
    pub fn new(state: &AppState, token: Option<&AuthToken>) -> Self {
        Self {
            user: token.map(CurrentUser::from),
            search: String::new(),
            google_client_id: state.config().google_client_id.clone(),
        }
    }

    /// Layout with no user and no scripts beyond the defaults.
    ///
    /// Used where no request state is available, such as error pages.
    #[must_use]
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Echo `search` into the header search box.
    #[must_use]
    pub fn with_search(mut self, search: &str) -> Self {
        search.trim().clone_into(&mut self.search);
        self
    }

    #[must_use]
    pub const fn logged_in(&self) -> bool {
        self.user.is_some()
    }
}

// =============================================================================
// Helpers
// =============================================================================

/// Whether the request was issued by HTMX.
#[must_use]
pub fn is_htmx(headers: &HeaderMap) -> bool {
    headers.contains_key("hx-request")
}

/// Local path to send a plain form back to, or `fallback`.
///
/// Only same-site absolute paths are accepted; protocol-relative URLs such
/// as `//evil.example` are rejected.
#[must_use]
pub fn safe_return_path<'a>(return_to: Option<&'a str>, fallback: &'a str) -> &'a str {
    match return_to.map(str::trim) {
        Some(path) if path.starts_with('/') && !path.starts_with("//") && !path.contains('\\') => {
            path
        }
        _ => fallback,
    }
}

/// Client-side navigation for HTMX requests.
#[must_use]
pub fn hx_redirect(location: String) -> Response {
    (StatusCode::OK, AppendHeaders([("HX-Redirect", location)])).into_response()
}

/// Render an amount in the configured shop currency.
#[must_use]
pub fn format_price(amount: Decimal, currency: CurrencyCode) -> String {
    Price::new(amount, currency).to_string()
}

// =============================================================================
// Routers
// =============================================================================

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/add", post(cart::add))
        .route("/update", post(cart::update))
        .route("/remove", post(cart::remove))
        .route("/clear", post(cart::clear))
        .route("/promo", post(cart::apply_promo))
        .route("/count", get(cart::count))
}

/// Create the auth routes router.
///
/// Only the credential-accepting POSTs are rate limited.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/login",
            get(auth::login_page).merge(post(auth::login).layer(auth_rate_limiter())),
        )
        .route("/register", get(auth::register_page).post(auth::register))
        .route(
            "/forgot-password",
            get(auth::forgot_password_page).post(auth::forgot_password),
        )
        .route("/logout", post(auth::logout))
        .route(
            "/google/callback",
            get(google_auth::callback)
                .merge(post(google_auth::credential).layer(auth_rate_limiter())),
        )
}

/// Create the search routes router.
pub fn search_routes() -> Router<AppState> {
    Router::new().route(
        "/suggest",
        get(search::suggest).layer(suggest_rate_limiter()),
    )
}

/// Create all page routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        // Catalog
        .route("/", get(home::home))
        .route("/articles/{id}", get(articles::show))
        .route("/details/{id}", get(articles::show))
        // Cart
        .nest("/cart", cart_routes())
        // Checkout summary
        .route("/checkout", get(checkout::show))
        // Search-as-you-type
        .nest("/search", search_routes())
        // Auth
        .nest("/auth", auth_routes())
}

/// Fallback for unknown routes.
pub async fn not_found() -> AppError {
    AppError::NotFound("route".to_string())
}
