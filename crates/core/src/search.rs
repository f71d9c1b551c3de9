//! Substring search, suggestions, and the suggestion keyboard cursor.
//!
//! The catalog is small and fetched whole, so search is a linear scan:
//! a product matches when the lower-cased, trimmed query is a substring of
//! its lower-cased name or description.

use std::str::FromStr;

use crate::types::{Product, ProductId};

/// Maximum number of entries in the suggestion dropdown.
pub const MAX_SUGGESTIONS: usize = 5;

/// Normalise a raw query for matching.
fn normalise(query: &str) -> String {
    query.trim().to_lowercase()
}

fn matches_normalised(product: &Product, needle: &str) -> bool {
    product.name.to_lowercase().contains(needle)
        || product.description.to_lowercase().contains(needle)
}

/// `true` if `product` matches `query`. An empty query matches everything.
#[must_use]
pub fn matches(product: &Product, query: &str) -> bool {
    matches_normalised(product, &normalise(query))
}

/// All products matching `query`, in catalog order.
#[must_use]
pub fn filter<'a>(products: &'a [Product], query: &str) -> Vec<&'a Product> {
    let needle = normalise(query);
    products
        .iter()
        .filter(|p| matches_normalised(p, &needle))
        .collect()
}

/// Up to [`MAX_SUGGESTIONS`] matches for the dropdown.
///
/// Blank queries yield nothing so the dropdown stays hidden.
#[must_use]
pub fn suggest<'a>(products: &'a [Product], query: &str) -> Vec<&'a Product> {
    let needle = normalise(query);
    if needle.is_empty() {
        return Vec::new();
    }
    products
        .iter()
        .filter(|p| matches_normalised(p, &needle))
        .take(MAX_SUGGESTIONS)
        .collect()
}

// =============================================================================
// Keyboard cursor
// =============================================================================

/// Keys the suggestion dropdown reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavKey {
    ArrowDown,
    ArrowUp,
    Enter,
    Escape,
}

impl FromStr for NavKey {
    type Err = ();

    /// Parses `KeyboardEvent.key` names.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ArrowDown" | "Down" => Ok(Self::ArrowDown),
            "ArrowUp" | "Up" => Ok(Self::ArrowUp),
            "Enter" => Ok(Self::Enter),
            "Escape" | "Esc" => Ok(Self::Escape),
            _ => Err(()),
        }
    }
}

/// Result of feeding a key to the cursor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CursorAction {
    /// Selection moved (or stayed); re-render the dropdown.
    Select(Option<usize>),
    /// Navigate to this product's detail page.
    OpenProduct(ProductId),
    /// Navigate to the catalog filtered by this query.
    ShowAll(String),
    /// Close the dropdown and forget the selection.
    Hide,
    /// Ignore the key.
    Nothing,
}

/// Selection state over `n` suggestions plus a trailing "show all results"
/// entry at index `n`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuggestionCursor {
    query: String,
    ids: Vec<ProductId>,
    selected: Option<usize>,
}

impl SuggestionCursor {
    /// Cursor for `query` over the given suggestion ids, nothing selected.
    #[must_use]
    pub fn new(query: &str, ids: Vec<ProductId>) -> Self {
        Self {
            query: query.trim().to_owned(),
            ids,
            selected: None,
        }
    }

    /// Restore a previous selection. Out-of-range indices are clamped to the
    /// "show all" entry.
    #[must_use]
    pub fn with_selected(mut self, selected: Option<usize>) -> Self {
        self.selected = selected.map(|i| i.min(self.ids.len()));
        self
    }

    #[must_use]
    pub const fn selected(&self) -> Option<usize> {
        self.selected
    }

    /// Index of the synthetic "show all results" entry.
    #[must_use]
    pub fn show_all_index(&self) -> usize {
        self.ids.len()
    }

    /// Apply a key press.
    pub fn handle(&mut self, key: NavKey) -> CursorAction {
        let n = self.ids.len();
        match key {
            NavKey::ArrowDown => {
                if n == 0 {
                    return CursorAction::Nothing;
                }
                self.selected = Some(match self.selected {
                    None => 0,
                    Some(i) if i < n => i + 1,
                    Some(i) => i,
                });
                CursorAction::Select(self.selected)
            }
            NavKey::ArrowUp => {
                if n == 0 {
                    return CursorAction::Nothing;
                }
                self.selected = match self.selected {
                    Some(i) if i > 0 => Some(i - 1),
                    _ => None,
                };
                CursorAction::Select(self.selected)
            }
            NavKey::Enter => {
                if let Some(id) = self.selected.and_then(|i| self.ids.get(i)) {
                    return CursorAction::OpenProduct(id.clone());
                }
                if self.query.is_empty() {
                    CursorAction::Nothing
                } else {
                    CursorAction::ShowAll(self.query.clone())
                }
            }
            NavKey::Escape => {
                self.selected = None;
                CursorAction::Hide
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;

    fn product(id: u64, name: &str, description: &str) -> Product {
        Product {
            id: ProductId::from(id),
            name: name.to_owned(),
            price: Decimal::ONE,
            image: String::new(),
            description: description.to_owned(),
            category: None,
            stock: None,
            rating: None,
        }
    }

    fn catalog() -> Vec<Product> {
        vec![
            product(1, "Smartphone Galaxy S24", "Android flagship"),
            product(2, "USB-C Cable", "Charging cable for your PHONE"),
            product(3, "Router", "Fast WLAN"),
            product(4, "Tablet", "Large screen"),
        ]
    }

    fn ids(products: &[&Product]) -> Vec<String> {
        products.iter().map(|p| p.id.to_string()).collect()
    }

    #[test]
    fn test_phone_finds_smartphone() {
        let products = catalog();
        let hits = filter(&products, "phone");
        assert_eq!(ids(&hits), ["1", "2"]);
        assert!(hits.iter().any(|p| p.name == "Smartphone Galaxy S24"));
    }

    #[test]
    fn test_no_match() {
        let products = catalog();
        assert!(filter(&products, "xyz123").is_empty());
        assert!(suggest(&products, "xyz123").is_empty());
    }

    #[test]
    fn test_case_insensitive_and_trimmed() {
        let products = catalog();
        assert!(matches(&products[2], "  rOuTeR "));
        assert!(matches(&products[2], "wlan"));
        assert!(!matches(&products[2], "tablet"));
    }

    #[test]
    fn test_empty_query() {
        let products = catalog();
        assert_eq!(filter(&products, "").len(), products.len());
        assert!(suggest(&products, "   ").is_empty());
    }

    #[test]
    fn test_suggest_caps_at_five() {
        let products: Vec<Product> = (0..8).map(|i| product(i, "Cable", "")).collect();
        let hits = suggest(&products, "cable");
        assert_eq!(hits.len(), MAX_SUGGESTIONS);
        assert_eq!(ids(&hits), ["0", "1", "2", "3", "4"]);
    }

    fn cursor(n: u64) -> SuggestionCursor {
        SuggestionCursor::new(" phone ", (0..n).map(ProductId::from).collect())
    }

    #[test]
    fn test_arrow_down_walks_to_show_all() {
        let mut c = cursor(2);
        assert_eq!(c.handle(NavKey::ArrowDown), CursorAction::Select(Some(0)));
        assert_eq!(c.handle(NavKey::ArrowDown), CursorAction::Select(Some(1)));
        assert_eq!(c.handle(NavKey::ArrowDown), CursorAction::Select(Some(2)));
        assert_eq!(c.handle(NavKey::ArrowDown), CursorAction::Select(Some(2)));
        assert_eq!(c.selected(), Some(c.show_all_index()));
    }

    #[test]
    fn test_arrow_up_returns_to_input() {
        let mut c = cursor(3).with_selected(Some(1));
        assert_eq!(c.handle(NavKey::ArrowUp), CursorAction::Select(Some(0)));
        assert_eq!(c.handle(NavKey::ArrowUp), CursorAction::Select(None));
        assert_eq!(c.handle(NavKey::ArrowUp), CursorAction::Select(None));
    }

    #[test]
    fn test_enter_opens_selected_product() {
        let mut c = cursor(3).with_selected(Some(2));
        assert_eq!(
            c.handle(NavKey::Enter),
            CursorAction::OpenProduct(ProductId::from(2_u64))
        );
    }

    #[test]
    fn test_enter_without_selection_shows_all() {
        let mut c = cursor(3);
        assert_eq!(c.handle(NavKey::Enter), CursorAction::ShowAll("phone".into()));
        let mut c = cursor(3).with_selected(Some(3));
        assert_eq!(c.handle(NavKey::Enter), CursorAction::ShowAll("phone".into()));
    }

    #[test]
    fn test_enter_on_empty_query() {
        let mut c = SuggestionCursor::new("  ", Vec::new());
        assert_eq!(c.handle(NavKey::Enter), CursorAction::Nothing);
    }

    #[test]
    fn test_arrows_ignored_without_suggestions() {
        let mut c = cursor(0);
        assert_eq!(c.handle(NavKey::ArrowDown), CursorAction::Nothing);
        assert_eq!(c.handle(NavKey::ArrowUp), CursorAction::Nothing);
        assert_eq!(c.selected(), None);
    }

    #[test]
    fn test_escape_resets() {
        let mut c = cursor(3).with_selected(Some(1));
        assert_eq!(c.handle(NavKey::Escape), CursorAction::Hide);
        assert_eq!(c.selected(), None);
    }

    #[test]
    fn test_with_selected_clamps() {
        let c = cursor(2).with_selected(Some(10));
        assert_eq!(c.selected(), Some(2));
    }

    #[test]
    fn test_nav_key_names() {
        assert_eq!("ArrowDown".parse::<NavKey>(), Ok(NavKey::ArrowDown));
        assert_eq!("Esc".parse::<NavKey>(), Ok(NavKey::Escape));
        assert!("Tab".parse::<NavKey>().is_err());
    }
}
