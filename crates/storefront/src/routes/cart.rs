//! Cart route handlers.
//!
//! Cart operations use HTMX for dynamic updates without full page reloads.
//! Without JavaScript the same forms post normally and are redirected back
//! to the page they came from. Carts live in the in-memory [`CartStore`]
//! keyed by the session's visitor id; the applied promo code lives in the
//! session itself.
//!
//! [`CartStore`]: crate::services::CartStore

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    http::HeaderMap,
    response::{AppendHeaders, IntoResponse, Redirect, Response},
};
use doux_core::{
    Cart, CartEvent, CartSummary, CurrencyCode, ProductId, PromoCode, VisitorId,
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{AppError, Result, add_breadcrumb};
use crate::filters;
use crate::middleware::{CurrentVisitor, OptionalAuth};
use crate::models::session_keys;
use crate::routes::{Layout, format_price, is_htmx, safe_return_path};
use crate::state::AppState;

// =============================================================================
// View Types
// =============================================================================

/// Cart entry display data for templates.
#[derive(Debug, Clone)]
pub struct CartItemView {
    pub product_id: String,
    pub href: String,
    pub name: String,
    pub image: String,
    pub quantity: u32,
    pub price: String,
    pub line_price: String,
}

/// Cart display data for templates.
#[derive(Debug, Clone)]
pub struct CartView {
    pub items: Vec<CartItemView>,
    pub item_count: u64,
    pub subtotal: String,
    pub shipping: String,
    pub free_shipping: bool,
    /// Amount still missing for free shipping.
    pub free_shipping_remaining: Option<String>,
    pub discount: Option<String>,
    pub promo: Option<&'static str>,
    pub total: String,
}

impl CartView {
    #[must_use]
    pub fn new(cart: &Cart, promo: Option<PromoCode>, currency: CurrencyCode) -> Self {
        let summary = CartSummary::compute(cart, promo);
        let items = cart
            .items()
            .iter()
            .map(|item| CartItemView {
                product_id: item.product.id.to_string(),
                href: format!("/articles/{}", urlencoding::encode(item.product.id.as_str())),
                name: item.product.name.clone(),
                image: item.product.image_or_default().to_string(),
                quantity: item.quantity,
                price: format_price(item.product.price, currency),
                line_price: format_price(item.line_total(), currency),
            })
            .collect();

        Self {
            items,
            item_count: summary.item_count,
            subtotal: format_price(summary.subtotal, currency),
            shipping: format_price(summary.shipping, currency),
            free_shipping: summary.has_free_shipping(),
            free_shipping_remaining: summary
                .free_shipping_remaining
                .map(|amount| format_price(amount, currency)),
            discount: summary
                .promo
                .map(|_| format_price(summary.discount, currency)),
            promo: summary.promo.map(PromoCode::code),
            total: format_price(summary.total, currency),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Build the cart view for `visitor`, including the session's promo code.
pub(crate) async fn cart_view(
    state: &AppState,
    session: &Session,
    visitor: VisitorId,
) -> Result<CartView> {
    let promo = session.get::<PromoCode>(session_keys::PROMO_CODE).await?;
    let cart = state.carts().get(visitor).await;
    Ok(CartView::new(&cart, promo, state.config().currency))
}

// =============================================================================
// Form Types
// =============================================================================

/// Add to cart form data.
#[derive(Debug, Deserialize)]
pub struct AddToCartForm {
    pub product_id: String,
    pub return_to: Option<String>,
}

/// Update quantity form data.
#[derive(Debug, Deserialize)]
pub struct UpdateCartForm {
    pub product_id: String,
    pub quantity: i64,
    pub return_to: Option<String>,
}

/// Remove from cart form data.
#[derive(Debug, Deserialize)]
pub struct RemoveFromCartForm {
    pub product_id: String,
    pub return_to: Option<String>,
}

/// Clear cart form data.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ClearCartForm {
    pub return_to: Option<String>,
}

/// Promo code form data.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct PromoForm {
    pub code: String,
}

/// Cart page query string.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CartQuery {
    /// The rejected input of a plain-form promo submission.
    pub promo_error: Option<String>,
}

// =============================================================================
// Templates
// =============================================================================

/// Cart page template.
#[derive(Template, WebTemplate)]
#[template(path = "cart/show.html")]
pub struct CartShowTemplate {
    pub layout: Layout,
    pub cart: CartView,
    pub promo_error: Option<String>,
}

/// Cart contents fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_contents.html")]
pub struct CartContentsTemplate {
    pub cart: CartView,
    pub promo_error: Option<String>,
}

/// Cart count badge fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_count.html")]
pub struct CartCountTemplate {
    pub count: u64,
}

// =============================================================================
// Responses
// =============================================================================

/// Fragment an HTMX cart request gets back.
enum Fragment {
    Count,
    Contents,
}

/// Answer a cart mutation.
///
/// HTMX requests get `fragment`, plus `HX-Trigger: cart-updated` when the
/// cart actually changed. Plain form posts are redirected back.
async fn respond(
    state: &AppState,
    session: &Session,
    visitor: VisitorId,
    headers: &HeaderMap,
    return_to: Option<&str>,
    event: &CartEvent,
    fragment: Fragment,
) -> Result<Response> {
    if !is_htmx(headers) {
        return Ok(Redirect::to(safe_return_path(return_to, "/cart")).into_response());
    }

    let body = match fragment {
        Fragment::Count => CartCountTemplate {
            count: state.carts().count(visitor).await,
        }
        .into_response(),
        Fragment::Contents => CartContentsTemplate {
            cart: cart_view(state, session, visitor).await?,
            promo_error: None,
        }
        .into_response(),
    };

    if event.is_change() {
        Ok((AppendHeaders([("HX-Trigger", "cart-updated")]), body).into_response())
    } else {
        Ok(body)
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// Display cart page.
#[instrument(skip(state, session, auth, visitor))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    auth: OptionalAuth,
    CurrentVisitor(visitor): CurrentVisitor,
    Query(query): Query<CartQuery>,
) -> Result<CartShowTemplate> {
    let promo_error = query
        .promo_error
        .and_then(|input| PromoCode::parse(&input).err())
        .map(|e| e.to_string());

    Ok(CartShowTemplate {
        layout: Layout::new(&state, auth.0.as_ref()),
        cart: cart_view(&state, &session, visitor).await?,
        promo_error,
    })
}

/// Add one unit of a product to the cart.
///
/// The product is looked up in the catalog so the cart always holds
/// backend data, never form input.
#[instrument(skip(state, session, visitor, headers))]
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    CurrentVisitor(visitor): CurrentVisitor,
    headers: HeaderMap,
    Form(form): Form<AddToCartForm>,
) -> Result<Response> {
    let id = ProductId::new(form.product_id);
    let product = state
        .backend()
        .product(&id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("product {id}")))?;

    let event = state.carts().add(visitor, product).await;
    add_breadcrumb("cart", "Added product", Some(&[("product_id", id.as_str())]));

    respond(
        &state,
        &session,
        visitor,
        &headers,
        form.return_to.as_deref(),
        &event,
        Fragment::Count,
    )
    .await
}

/// Set the quantity of a cart entry; zero or less removes it.
#[instrument(skip(state, session, visitor, headers))]
pub async fn update(
    State(state): State<AppState>,
    session: Session,
    CurrentVisitor(visitor): CurrentVisitor,
    headers: HeaderMap,
    Form(form): Form<UpdateCartForm>,
) -> Result<Response> {
    let id = ProductId::new(form.product_id);
    let event = state
        .carts()
        .update_quantity(visitor, &id, form.quantity)
        .await;

    respond(
        &state,
        &session,
        visitor,
        &headers,
        form.return_to.as_deref(),
        &event,
        Fragment::Contents,
    )
    .await
}

/// Remove a cart entry.
#[instrument(skip(state, session, visitor, headers))]
pub async fn remove(
    State(state): State<AppState>,
    session: Session,
    CurrentVisitor(visitor): CurrentVisitor,
    headers: HeaderMap,
    Form(form): Form<RemoveFromCartForm>,
) -> Result<Response> {
    let id = ProductId::new(form.product_id);
    let event = state.carts().remove(visitor, &id).await;
    add_breadcrumb("cart", "Removed product", Some(&[("product_id", id.as_str())]));

    respond(
        &state,
        &session,
        visitor,
        &headers,
        form.return_to.as_deref(),
        &event,
        Fragment::Contents,
    )
    .await
}

/// Empty the cart and drop the applied promo code.
#[instrument(skip(state, session, visitor, headers))]
pub async fn clear(
    State(state): State<AppState>,
    session: Session,
    CurrentVisitor(visitor): CurrentVisitor,
    headers: HeaderMap,
    Form(form): Form<ClearCartForm>,
) -> Result<Response> {
    let event = state.carts().clear(visitor).await;
    session.remove::<PromoCode>(session_keys::PROMO_CODE).await?;

    respond(
        &state,
        &session,
        visitor,
        &headers,
        form.return_to.as_deref(),
        &event,
        Fragment::Contents,
    )
    .await
}

/// Apply a promo code to the cart.
#[instrument(skip(state, session, visitor, headers))]
pub async fn apply_promo(
    State(state): State<AppState>,
    session: Session,
    CurrentVisitor(visitor): CurrentVisitor,
    headers: HeaderMap,
    Form(form): Form<PromoForm>,
) -> Result<Response> {
    let htmx = is_htmx(&headers);

    match PromoCode::parse(&form.code) {
        Ok(promo) => {
            session.insert(session_keys::PROMO_CODE, promo).await?;
            tracing::info!(code = promo.code(), "Promo code applied");
            if !htmx {
                return Ok(Redirect::to("/cart").into_response());
            }
            let cart = cart_view(&state, &session, visitor).await?;
            Ok((
                AppendHeaders([("HX-Trigger", "cart-updated")]),
                CartContentsTemplate {
                    cart,
                    promo_error: None,
                },
            )
                .into_response())
        }
        Err(e) if htmx => Ok(CartContentsTemplate {
            cart: cart_view(&state, &session, visitor).await?,
            promo_error: Some(e.to_string()),
        }
        .into_response()),
        Err(_) => Ok(Redirect::to(&format!(
            "/cart?promo_error={}",
            urlencoding::encode(form.code.trim())
        ))
        .into_response()),
    }
}

/// Get cart count badge (HTMX).
#[instrument(skip(state, visitor))]
pub async fn count(
    State(state): State<AppState>,
    CurrentVisitor(visitor): CurrentVisitor,
) -> CartCountTemplate {
    CartCountTemplate {
        count: state.carts().count(visitor).await,
    }
}
