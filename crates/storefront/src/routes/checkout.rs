//! Checkout summary (requires auth).
//!
//! Order placement is not offered; the page shows what would be ordered.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::State;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::Result;
use crate::filters;
use crate::middleware::{CurrentVisitor, RequireAuth};
use crate::routes::Layout;
use crate::routes::cart::{CartView, cart_view};
use crate::state::AppState;

/// Checkout page template.
#[derive(Template, WebTemplate)]
#[template(path = "checkout/show.html")]
pub struct CheckoutTemplate {
    pub layout: Layout,
    pub cart: CartView,
}

/// Display the checkout summary.
///
/// Visitors without a valid token are redirected to the login page by
/// [`RequireAuth`].
#[instrument(skip(state, session, token, visitor))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(token): RequireAuth,
    CurrentVisitor(visitor): CurrentVisitor,
) -> Result<CheckoutTemplate> {
    Ok(CheckoutTemplate {
        layout: Layout::new(&state, Some(&token)),
        cart: cart_view(&state, &session, visitor).await?,
    })
}
