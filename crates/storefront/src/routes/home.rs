//! Catalog page: search, category filter, sort and pagination.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::{Query, State};
use doux_core::{
    Cart, CatalogQuery, CatalogSort, CurrencyCode, PageSlot, Pagination, Product, catalog,
};
use serde::Deserialize;
use tracing::instrument;

use crate::error::Result;
use crate::filters;
use crate::middleware::{CurrentVisitor, OptionalAuth};
use crate::routes::{Layout, format_price};
use crate::state::AppState;

// =============================================================================
// View Types
// =============================================================================

/// Product display data for templates.
#[derive(Debug, Clone)]
pub struct ProductView {
    pub id: String,
    /// Detail page URL.
    pub href: String,
    pub name: String,
    pub price: String,
    pub image: String,
    pub description: String,
    pub category: Option<String>,
    pub rating: Option<String>,
    pub stock: Option<u32>,
    pub sold_out: bool,
    /// Quantity of this product already in the visitor's cart.
    pub in_cart: u32,
}

impl ProductView {
    #[must_use]
    pub fn new(product: &Product, currency: CurrencyCode, cart: &Cart) -> Self {
        let in_cart = cart
            .items()
            .iter()
            .find(|item| item.product.id == product.id)
            .map_or(0, |item| item.quantity);

        Self {
            id: product.id.to_string(),
            href: format!("/articles/{}", urlencoding::encode(product.id.as_str())),
            name: product.name.clone(),
            price: format_price(product.price, currency),
            image: product.image_or_default().to_string(),
            description: product.description.clone(),
            category: product.category.clone(),
            rating: product.rating.map(|r| format!("{:.1}", r.round_dp(1))),
            stock: product.stock,
            sold_out: product.is_sold_out(),
            in_cart,
        }
    }
}

/// An entry of the sort dropdown.
#[derive(Debug, Clone)]
pub struct SortOption {
    pub value: &'static str,
    pub label: &'static str,
    pub selected: bool,
}

/// An entry of the category dropdown.
#[derive(Debug, Clone)]
pub struct CategoryOption {
    pub name: String,
    pub selected: bool,
}

/// A numbered page button, or an ellipsis when `href` is `None`.
#[derive(Debug, Clone)]
pub struct PageLink {
    pub label: String,
    pub href: Option<String>,
    pub current: bool,
}

/// Page controls with every link carrying the current filters.
#[derive(Debug, Clone)]
pub struct PaginationView {
    pub needed: bool,
    pub current: usize,
    pub total_pages: usize,
    pub prev_href: Option<String>,
    pub next_href: Option<String>,
    pub links: Vec<PageLink>,
}

impl PaginationView {
    fn new(pagination: &Pagination, query: &CatalogQuery) -> Self {
        let links = pagination
            .window()
            .into_iter()
            .map(|slot| match slot {
                PageSlot::Page(page) => PageLink {
                    label: page.to_string(),
                    href: Some(catalog_href(query, page)),
                    current: page == pagination.current(),
                },
                PageSlot::Ellipsis => PageLink {
                    label: "…".to_string(),
                    href: None,
                    current: false,
                },
            })
            .collect();

        Self {
            needed: pagination.is_needed(),
            current: pagination.current(),
            total_pages: pagination.total_pages(),
            prev_href: pagination.prev().map(|page| catalog_href(query, page)),
            next_href: pagination.next().map(|page| catalog_href(query, page)),
            links,
        }
    }
}

/// Catalog URL for `page` of `query`. Defaults are left out of the URL.
fn catalog_href(query: &CatalogQuery, page: usize) -> String {
    let mut params = Vec::new();
    let search = query.search.trim();
    if !search.is_empty() {
        params.push(format!("search={}", urlencoding::encode(search)));
    }
    if let Some(category) = query.category.as_deref().filter(|c| !c.is_empty()) {
        params.push(format!("category={}", urlencoding::encode(category)));
    }
    let sort = query.sort.as_param();
    if !sort.is_empty() {
        params.push(format!("sort={sort}"));
    }
    if page > 1 {
        params.push(format!("page={page}"));
    }

    if params.is_empty() {
        "/".to_string()
    } else {
        format!("/?{}", params.join("&"))
    }
}

// =============================================================================
// Query Types
// =============================================================================

/// Catalog query string.
///
/// Everything is read as text so a malformed `page` falls back to page 1
/// instead of rejecting the request.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CatalogParams {
    pub search: String,
    pub page: Option<String>,
    pub sort: Option<String>,
    pub category: Option<String>,
}

impl From<CatalogParams> for CatalogQuery {
    fn from(params: CatalogParams) -> Self {
        Self {
            search: params.search.trim().to_string(),
            page: params
                .page
                .as_deref()
                .and_then(|p| p.trim().parse().ok())
                .unwrap_or(1),
            sort: params
                .sort
                .as_deref()
                .map_or(CatalogSort::Featured, CatalogSort::from_param),
            category: params
                .category
                .map(|c| c.trim().to_string())
                .filter(|c| !c.is_empty()),
        }
    }
}

// =============================================================================
// Templates
// =============================================================================

/// Catalog page template.
#[derive(Template, WebTemplate)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub layout: Layout,
    pub products: Vec<ProductView>,
    pub total_items: usize,
    pub search: String,
    pub category: String,
    pub sort: &'static str,
    pub sort_options: Vec<SortOption>,
    pub categories: Vec<CategoryOption>,
    pub pagination: PaginationView,
    /// Path plain cart forms return to.
    pub return_to: String,
}

// =============================================================================
// Handlers
// =============================================================================

/// Display the catalog.
#[instrument(skip(state, auth, visitor))]
pub async fn home(
    State(state): State<AppState>,
    Query(params): Query<CatalogParams>,
    auth: OptionalAuth,
    CurrentVisitor(visitor): CurrentVisitor,
) -> Result<HomeTemplate> {
    let query = CatalogQuery::from(params);
    let products = state.backend().catalog().await?;
    let cart = state.carts().get(visitor).await;
    let currency = state.config().currency;

    let page = query.apply(&products);
    let pagination = PaginationView::new(&page.pagination, &query);
    let selected_category = query.category.clone().unwrap_or_default();

    let categories = catalog::categories(&products)
        .into_iter()
        .map(|name| CategoryOption {
            selected: name.eq_ignore_ascii_case(&selected_category),
            name: name.to_string(),
        })
        .collect();

    let sort_options = CatalogSort::ALL
        .into_iter()
        .map(|sort| SortOption {
            value: sort.as_param(),
            label: sort.label(),
            selected: sort == query.sort,
        })
        .collect();

    tracing::debug!(
        matches = page.pagination.total_items(),
        page = page.pagination.current(),
        "Catalog rendered"
    );

    Ok(HomeTemplate {
        layout: Layout::new(&state, auth.0.as_ref()).with_search(&query.search),
        products: page
            .products
            .iter()
            .map(|p| ProductView::new(p, currency, &cart))
            .collect(),
        total_items: page.pagination.total_items(),
        return_to: catalog_href(&query, page.pagination.current()),
        search: query.search.clone(),
        category: selected_category,
        sort: query.sort.as_param(),
        sort_options,
        categories,
        pagination,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use doux_core::ProductId;
    use rust_decimal::Decimal;

    use super::*;

    fn params(search: &str, page: Option<&str>, sort: Option<&str>) -> CatalogParams {
        CatalogParams {
            search: search.to_string(),
            page: page.map(String::from),
            sort: sort.map(String::from),
            category: None,
        }
    }

    #[test]
    fn test_params_tolerate_garbage() {
        let query = CatalogQuery::from(params(" phone ", Some("abc"), Some("bogus")));
        assert_eq!(query.search, "phone");
        assert_eq!(query.page, 1);
        assert_eq!(query.sort, CatalogSort::Featured);
        assert_eq!(query.category, None);
    }

    #[test]
    fn test_catalog_href_keeps_filters() {
        let query = CatalogQuery {
            search: "smart phone".to_string(),
            page: 1,
            sort: CatalogSort::PriceAsc,
            category: Some("Audio".to_string()),
        };
        assert_eq!(
            catalog_href(&query, 3),
            "/?search=smart%20phone&category=Audio&sort=price-asc&page=3"
        );
        assert_eq!(catalog_href(&CatalogQuery::default(), 1), "/");
    }

    #[test]
    fn test_pagination_view_links() {
        let query = CatalogQuery::default();
        let view = PaginationView::new(&Pagination::new(5, 90), &query);
        assert!(view.needed);
        assert_eq!(view.prev_href.as_deref(), Some("/?page=4"));
        assert_eq!(view.next_href.as_deref(), Some("/?page=6"));
        let labels: Vec<_> = view.links.iter().map(|l| l.label.as_str()).collect();
        assert_eq!(labels, ["1", "…", "3", "4", "5", "6", "7", "…", "10"]);
        assert!(view.links.iter().any(|l| l.current && l.label == "5"));
        assert_eq!(view.links[0].href.as_deref(), Some("/"));
    }

    #[test]
    fn test_product_view_marks_cart_quantity() {
        let product = Product {
            id: ProductId::from(7),
            name: "Smartphone Galaxy S24".to_string(),
            price: Decimal::new(79900, 2),
            image: String::new(),
            description: String::new(),
            category: None,
            stock: Some(0),
            rating: Some(Decimal::new(45, 1)),
        };
        let mut cart = Cart::new();
        cart.add(product.clone());
        cart.add(product.clone());

        let view = ProductView::new(&product, CurrencyCode::EUR, &cart);
        assert_eq!(view.in_cart, 2);
        assert_eq!(view.href, "/articles/7");
        assert_eq!(view.price, "799.00 €");
        assert_eq!(view.image, Product::DEFAULT_IMAGE);
        assert_eq!(view.rating.as_deref(), Some("4.5"));
        assert!(view.sold_out);
    }
}
