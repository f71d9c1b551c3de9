//! Catalog listing: search, category filter, sort and paginate in one pass.
//!
//! The backend returns the whole catalog without honouring any query
//! parameters, so every listing is computed here in a fixed order:
//! search filter, then category filter, then a stable sort, then the page
//! slice.

use std::cmp::Ordering;

use crate::pagination::Pagination;
use crate::search;
use crate::types::Product;

/// Sort orders offered by the catalog toolbar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CatalogSort {
    /// Keep the backend's order.
    #[default]
    Featured,
    NameAsc,
    NameDesc,
    PriceAsc,
    PriceDesc,
}

impl CatalogSort {
    /// All variants in toolbar order.
    pub const ALL: [Self; 5] = [
        Self::Featured,
        Self::NameAsc,
        Self::NameDesc,
        Self::PriceAsc,
        Self::PriceDesc,
    ];

    /// Parse a `sort` query parameter. Unknown values mean [`Self::Featured`].
    #[must_use]
    pub fn from_param(value: &str) -> Self {
        match value.trim() {
            "name-asc" => Self::NameAsc,
            "name-desc" => Self::NameDesc,
            "price-asc" => Self::PriceAsc,
            "price-desc" => Self::PriceDesc,
            _ => Self::Featured,
        }
    }

    /// Query parameter value; empty for the default order.
    #[must_use]
    pub const fn as_param(self) -> &'static str {
        match self {
            Self::Featured => "",
            Self::NameAsc => "name-asc",
            Self::NameDesc => "name-desc",
            Self::PriceAsc => "price-asc",
            Self::PriceDesc => "price-desc",
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Featured => "Featured",
            Self::NameAsc => "Name (A-Z)",
            Self::NameDesc => "Name (Z-A)",
            Self::PriceAsc => "Price (low to high)",
            Self::PriceDesc => "Price (high to low)",
        }
    }

    fn compare(self, a: &Product, b: &Product) -> Ordering {
        match self {
            Self::Featured => Ordering::Equal,
            Self::NameAsc => a.name.to_lowercase().cmp(&b.name.to_lowercase()),
            Self::NameDesc => b.name.to_lowercase().cmp(&a.name.to_lowercase()),
            Self::PriceAsc => a.price.cmp(&b.price),
            Self::PriceDesc => b.price.cmp(&a.price),
        }
    }
}

/// Parameters of a catalog listing.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CatalogQuery {
    pub search: String,
    /// Requested 1-based page; clamped when applied.
    pub page: usize,
    pub sort: CatalogSort,
    pub category: Option<String>,
}

/// One page of a catalog listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogPage<'a> {
    pub products: Vec<&'a Product>,
    pub pagination: Pagination,
}

impl CatalogQuery {
    /// Run the query against the full catalog.
    #[must_use]
    pub fn apply<'a>(&self, catalog: &'a [Product]) -> CatalogPage<'a> {
        let mut matches = search::filter(catalog, &self.search);

        if let Some(category) = self.category.as_deref().map(str::trim).filter(|c| !c.is_empty()) {
            matches.retain(|p| {
                p.category
                    .as_deref()
                    .is_some_and(|c| c.eq_ignore_ascii_case(category))
            });
        }

        if self.sort != CatalogSort::Featured {
            matches.sort_by(|a, b| self.sort.compare(a, b));
        }

        let pagination = Pagination::new(self.page, matches.len());
        let products = pagination.slice(&matches).to_vec();
        CatalogPage {
            products,
            pagination,
        }
    }
}

/// Distinct categories in first-seen order, for the category filter.
#[must_use]
pub fn categories(catalog: &[Product]) -> Vec<&str> {
    let mut seen: Vec<&str> = Vec::new();
    for category in catalog.iter().filter_map(|p| p.category.as_deref()) {
        if !seen.iter().any(|c| c.eq_ignore_ascii_case(category)) {
            seen.push(category);
        }
    }
    seen
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;
    use crate::ProductId;

    fn product(id: u64, name: &str, price: i64, category: Option<&str>) -> Product {
        Product {
            id: ProductId::from(id),
            name: name.to_owned(),
            price: Decimal::from(price),
            image: String::new(),
            description: String::new(),
            category: category.map(str::to_owned),
            stock: None,
            rating: None,
        }
    }

    fn names(page: &CatalogPage<'_>) -> Vec<String> {
        page.products.iter().map(|p| p.name.clone()).collect()
    }

    fn catalog() -> Vec<Product> {
        vec![
            product(1, "banana phone", 30, Some("Phones")),
            product(2, "Apple phone", 900, Some("phones")),
            product(3, "Cable", 5, Some("Accessories")),
            product(4, "charger", 20, None),
        ]
    }

    #[test]
    fn test_default_query_keeps_backend_order() {
        let catalog = catalog();
        let page = CatalogQuery::default().apply(&catalog);
        assert_eq!(names(&page), ["banana phone", "Apple phone", "Cable", "charger"]);
        assert_eq!(page.pagination.current(), 1);
        assert_eq!(page.pagination.total_items(), 4);
    }

    #[test]
    fn test_sort_by_name_is_case_insensitive() {
        let catalog = catalog();
        let query = CatalogQuery {
            sort: CatalogSort::NameAsc,
            ..CatalogQuery::default()
        };
        assert_eq!(
            names(&query.apply(&catalog)),
            ["Apple phone", "banana phone", "Cable", "charger"]
        );
    }

    #[test]
    fn test_sort_by_price_desc() {
        let catalog = catalog();
        let query = CatalogQuery {
            sort: CatalogSort::PriceDesc,
            ..CatalogQuery::default()
        };
        assert_eq!(
            names(&query.apply(&catalog)),
            ["Apple phone", "banana phone", "charger", "Cable"]
        );
    }

    #[test]
    fn test_search_then_category() {
        let catalog = catalog();
        let query = CatalogQuery {
            search: "PHONE".into(),
            category: Some("PHONES".into()),
            sort: CatalogSort::PriceAsc,
            page: 1,
        };
        assert_eq!(names(&query.apply(&catalog)), ["banana phone", "Apple phone"]);

        let query = CatalogQuery {
            category: Some("accessories".into()),
            ..CatalogQuery::default()
        };
        assert_eq!(names(&query.apply(&catalog)), ["Cable"]);
    }

    #[test]
    fn test_blank_category_is_ignored() {
        let catalog = catalog();
        let query = CatalogQuery {
            category: Some("  ".into()),
            ..CatalogQuery::default()
        };
        assert_eq!(query.apply(&catalog).products.len(), 4);
    }

    #[test]
    fn test_paginates_after_filtering() {
        let catalog: Vec<Product> = (1..=20)
            .map(|i| product(i, &format!("Item {i:02}"), 1, None))
            .collect();
        let query = CatalogQuery {
            page: 3,
            ..CatalogQuery::default()
        };
        let page = query.apply(&catalog);
        assert_eq!(names(&page), ["Item 19", "Item 20"]);
        assert_eq!(page.pagination.total_pages(), 3);

        let query = CatalogQuery {
            search: "xyz123".into(),
            page: 4,
            ..CatalogQuery::default()
        };
        let empty = query.apply(&catalog);
        assert!(empty.products.is_empty());
        assert_eq!(empty.pagination.total_pages(), 0);
        assert_eq!(empty.pagination.current(), 1);
    }

    #[test]
    fn test_sort_param_round_trip() {
        for sort in CatalogSort::ALL {
            assert_eq!(CatalogSort::from_param(sort.as_param()), sort);
        }
        assert_eq!(CatalogSort::from_param("rating"), CatalogSort::Featured);
    }

    #[test]
    fn test_categories_dedup_case_insensitive() {
        assert_eq!(categories(&catalog()), ["Phones", "Accessories"]);
    }
}
