//! Product detail page.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::{Path, State};
use doux_core::ProductId;
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::{CurrentVisitor, OptionalAuth};
use crate::routes::Layout;
use crate::routes::home::ProductView;
use crate::state::AppState;

/// Product detail page template.
#[derive(Template, WebTemplate)]
#[template(path = "articles/show.html")]
pub struct ArticleTemplate {
    pub layout: Layout,
    pub product: ProductView,
    pub return_to: String,
}

/// Display a product. Unknown ids render the not-found page.
#[instrument(skip(state, auth, visitor))]
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<String>,
    auth: OptionalAuth,
    CurrentVisitor(visitor): CurrentVisitor,
) -> Result<ArticleTemplate> {
    let id = ProductId::new(id);
    let product = state
        .backend()
        .product(&id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("product {id}")))?;
    let cart = state.carts().get(visitor).await;

    let product = ProductView::new(&product, state.config().currency, &cart);
    Ok(ArticleTemplate {
        layout: Layout::new(&state, auth.0.as_ref()),
        return_to: product.href.clone(),
        product,
    })
}
