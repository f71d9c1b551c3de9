//! Shopping cart and cart summary.
//!
//! A [`Cart`] is an ordered list of [`CartItem`]s with one entry per product
//! id. Adding a product that is already present bumps its quantity, so the
//! quantity of an entry always equals the number of times it was added minus
//! whatever the visitor changed on the cart page.
//!
//! Every mutation reports a [`CartEvent`] describing what actually happened.
//! No-ops report [`CartEvent::Unchanged`], which lets callers skip
//! notifications for requests that changed nothing.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::{Product, ProductId};

/// Subtotal above which shipping is free.
pub const FREE_SHIPPING_THRESHOLD: Decimal = Decimal::from_parts(500, 0, 0, false, 0);

/// Flat shipping fee charged below the threshold.
pub const SHIPPING_FEE: Decimal = Decimal::from_parts(999, 0, 0, false, 2);

/// One product in the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    pub product: Product,
    /// Always at least 1; entries reaching 0 are removed.
    pub quantity: u32,
}

impl CartItem {
    /// `price × quantity`.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.product.price * Decimal::from(self.quantity)
    }
}

/// What a cart mutation did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CartEvent {
    /// Product added or its quantity bumped by one.
    Added { product_id: ProductId, quantity: u32 },
    /// Entry dropped.
    Removed { product_id: ProductId },
    /// Quantity replaced.
    QuantityChanged { product_id: ProductId, quantity: u32 },
    /// All entries dropped.
    Cleared,
    /// Nothing to do (unknown id, empty cart, same quantity).
    Unchanged,
}

impl CartEvent {
    /// `false` for [`CartEvent::Unchanged`].
    #[must_use]
    pub const fn is_change(&self) -> bool {
        !matches!(self, Self::Unchanged)
    }
}

/// An ordered collection of cart entries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    items: Vec<CartItem>,
}

impl Cart {
    #[must_use]
    pub const fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Add one unit of `product`, merging with an existing entry.
    pub fn add(&mut self, product: Product) -> CartEvent {
        if let Some(item) = self.items.iter_mut().find(|i| i.product.id == product.id) {
            item.quantity = item.quantity.saturating_add(1);
            return CartEvent::Added {
                product_id: product.id,
                quantity: item.quantity,
            };
        }

        let product_id = product.id.clone();
        self.items.push(CartItem {
            product,
            quantity: 1,
        });
        CartEvent::Added {
            product_id,
            quantity: 1,
        }
    }

    /// Drop the entry for `product_id`, if any.
    pub fn remove(&mut self, product_id: &ProductId) -> CartEvent {
        let before = self.items.len();
        self.items.retain(|i| &i.product.id != product_id);
        if self.items.len() == before {
            CartEvent::Unchanged
        } else {
            CartEvent::Removed {
                product_id: product_id.clone(),
            }
        }
    }

    /// Replace the quantity of an entry. Zero or negative removes it.
    ///
    /// Unknown ids are ignored; quantities above `u32::MAX` are capped.
    pub fn update_quantity(&mut self, product_id: &ProductId, quantity: i64) -> CartEvent {
        if quantity <= 0 {
            return self.remove(product_id);
        }
        let quantity = u32::try_from(quantity).unwrap_or(u32::MAX);

        match self.items.iter_mut().find(|i| &i.product.id == product_id) {
            Some(item) if item.quantity == quantity => CartEvent::Unchanged,
            Some(item) => {
                item.quantity = quantity;
                CartEvent::QuantityChanged {
                    product_id: product_id.clone(),
                    quantity,
                }
            }
            None => CartEvent::Unchanged,
        }
    }

    /// Empty the cart.
    pub fn clear(&mut self) -> CartEvent {
        if self.items.is_empty() {
            return CartEvent::Unchanged;
        }
        self.items.clear();
        CartEvent::Cleared
    }

    /// Sum of all quantities.
    #[must_use]
    pub fn count(&self) -> u64 {
        self.items.iter().map(|i| u64::from(i.quantity)).sum()
    }

    #[must_use]
    pub fn is_in_cart(&self, product_id: &ProductId) -> bool {
        self.items.iter().any(|i| &i.product.id == product_id)
    }

    /// Entries in insertion order.
    #[must_use]
    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Σ price × quantity.
    #[must_use]
    pub fn total(&self) -> Decimal {
        self.items.iter().map(CartItem::line_total).sum()
    }
}

// =============================================================================
// Promo codes
// =============================================================================

/// Errors from [`PromoCode::parse`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PromoError {
    #[error("please enter a promo code")]
    Empty,
    #[error("invalid promo code: {0}")]
    Unknown(String),
}

/// A recognised promotional code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PromoCode {
    /// `SAVE10`: 10 % off the subtotal.
    Save10,
}

impl PromoCode {
    /// Parse a code as typed by the visitor (trimmed, case-insensitive).
    ///
    /// # Errors
    ///
    /// [`PromoError::Empty`] for blank input, [`PromoError::Unknown`] otherwise.
    pub fn parse(input: &str) -> Result<Self, PromoError> {
        let code = input.trim();
        if code.is_empty() {
            return Err(PromoError::Empty);
        }
        if code.eq_ignore_ascii_case("SAVE10") {
            Ok(Self::Save10)
        } else {
            Err(PromoError::Unknown(code.to_owned()))
        }
    }

    /// Canonical spelling.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Save10 => "SAVE10",
        }
    }

    /// Fraction of the subtotal taken off.
    #[must_use]
    pub const fn rate(self) -> Decimal {
        match self {
            Self::Save10 => Decimal::from_parts(10, 0, 0, false, 2),
        }
    }
}

// =============================================================================
// Summary
// =============================================================================

/// Totals shown on the cart and checkout pages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartSummary {
    pub item_count: u64,
    pub subtotal: Decimal,
    pub shipping: Decimal,
    pub discount: Decimal,
    pub total: Decimal,
    pub promo: Option<PromoCode>,
    /// Amount still missing for free shipping; `None` once it applies.
    pub free_shipping_remaining: Option<Decimal>,
}

impl CartSummary {
    /// Compute the summary for `cart` with an optional applied promo code.
    #[must_use]
    pub fn compute(cart: &Cart, promo: Option<PromoCode>) -> Self {
        let subtotal = cart.total();

        let (shipping, free_shipping_remaining) =
            if cart.is_empty() || subtotal > FREE_SHIPPING_THRESHOLD {
                (Decimal::ZERO, None)
            } else {
                (SHIPPING_FEE, Some(FREE_SHIPPING_THRESHOLD - subtotal))
            };

        let discount = promo.map_or(Decimal::ZERO, |p| subtotal * p.rate());

        Self {
            item_count: cart.count(),
            subtotal,
            shipping,
            discount,
            total: subtotal + shipping - discount,
            promo,
            free_shipping_remaining,
        }
    }

    #[must_use]
    pub fn has_free_shipping(&self) -> bool {
        self.item_count > 0 && self.shipping.is_zero()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn product(id: u64, price: i64) -> Product {
        Product {
            id: ProductId::from(id),
            name: format!("Product {id}"),
            price: Decimal::from(price),
            image: String::new(),
            description: String::new(),
            category: None,
            stock: None,
            rating: None,
        }
    }

    #[test]
    fn test_add_merges_by_id() {
        let mut cart = Cart::new();
        for _ in 0..3 {
            cart.add(product(1, 10));
        }
        assert_eq!(cart.items().len(), 1);
        assert_eq!(cart.items()[0].quantity, 3);
        assert_eq!(cart.count(), 3);
    }

    #[test]
    fn test_add_reports_quantity() {
        let mut cart = Cart::new();
        assert_eq!(
            cart.add(product(1, 10)),
            CartEvent::Added {
                product_id: ProductId::from(1_u64),
                quantity: 1
            }
        );
        assert_eq!(
            cart.add(product(1, 10)),
            CartEvent::Added {
                product_id: ProductId::from(1_u64),
                quantity: 2
            }
        );
    }

    #[test]
    fn test_total_two_products() {
        let mut cart = Cart::new();
        cart.add(product(1, 10));
        cart.add(product(1, 10));
        cart.add(product(2, 5));
        assert_eq!(cart.total(), Decimal::from(25));
        assert_eq!(cart.count(), 3);
        // insertion order
        assert_eq!(cart.items()[1].product.id.as_str(), "2");
    }

    #[test]
    fn test_update_quantity_zero_is_remove() {
        let mut a = Cart::new();
        a.add(product(1, 10));
        a.add(product(2, 5));
        let mut b = a.clone();

        let ev = a.update_quantity(&ProductId::from(1_u64), 0);
        b.remove(&ProductId::from(1_u64));
        assert_eq!(a, b);
        assert!(matches!(ev, CartEvent::Removed { .. }));

        a.update_quantity(&ProductId::from(2_u64), -4);
        assert!(a.is_empty());
    }

    #[test]
    fn test_update_quantity_replaces() {
        let mut cart = Cart::new();
        cart.add(product(1, 10));
        let ev = cart.update_quantity(&ProductId::from(1_u64), 7);
        assert_eq!(
            ev,
            CartEvent::QuantityChanged {
                product_id: ProductId::from(1_u64),
                quantity: 7
            }
        );
        assert_eq!(cart.count(), 7);
        assert_eq!(cart.items()[0].line_total(), Decimal::from(70));
        assert_eq!(
            cart.update_quantity(&ProductId::from(1_u64), 7),
            CartEvent::Unchanged
        );
    }

    #[test]
    fn test_noops_on_unknown_ids() {
        let mut cart = Cart::new();
        cart.add(product(1, 10));
        let snapshot = cart.clone();
        assert_eq!(cart.remove(&ProductId::from(9_u64)), CartEvent::Unchanged);
        assert_eq!(
            cart.update_quantity(&ProductId::from(9_u64), 3),
            CartEvent::Unchanged
        );
        assert_eq!(cart, snapshot);
    }

    #[test]
    fn test_clear_and_membership() {
        let mut cart = Cart::new();
        assert_eq!(cart.clear(), CartEvent::Unchanged);
        cart.add(product(1, 10));
        assert!(cart.is_in_cart(&ProductId::from(1_u64)));
        assert!(!cart.is_in_cart(&ProductId::from(2_u64)));
        assert_eq!(cart.clear(), CartEvent::Cleared);
        assert_eq!(cart.count(), 0);
        assert!(!cart.is_in_cart(&ProductId::from(1_u64)));
    }

    #[test]
    fn test_promo_parse() {
        assert_eq!(PromoCode::parse(" save10 ").unwrap(), PromoCode::Save10);
        assert_eq!(PromoCode::parse("SAVE10").unwrap().code(), "SAVE10");
        assert_eq!(PromoCode::parse("  "), Err(PromoError::Empty));
        assert_eq!(
            PromoCode::parse("SAVE20"),
            Err(PromoError::Unknown("SAVE20".to_owned()))
        );
    }

    #[test]
    fn test_summary_below_threshold() {
        let mut cart = Cart::new();
        cart.add(product(1, 10));
        cart.add(product(1, 10));
        cart.add(product(2, 5));
        let summary = CartSummary::compute(&cart, None);
        assert_eq!(summary.subtotal, Decimal::from(25));
        assert_eq!(summary.shipping, SHIPPING_FEE);
        assert_eq!(summary.total, Decimal::new(3499, 2));
        assert_eq!(summary.free_shipping_remaining, Some(Decimal::from(475)));
        assert!(!summary.has_free_shipping());
    }

    #[test]
    fn test_summary_threshold_is_exclusive() {
        let mut cart = Cart::new();
        cart.add(product(1, 500));
        let at = CartSummary::compute(&cart, None);
        assert_eq!(at.shipping, SHIPPING_FEE);
        assert_eq!(at.free_shipping_remaining, Some(Decimal::ZERO));

        cart.add(product(2, 1));
        let above = CartSummary::compute(&cart, None);
        assert_eq!(above.shipping, Decimal::ZERO);
        assert!(above.has_free_shipping());
        assert_eq!(above.total, Decimal::from(501));
    }

    #[test]
    fn test_summary_with_promo() {
        let mut cart = Cart::new();
        cart.add(product(1, 600));
        let summary = CartSummary::compute(&cart, Some(PromoCode::Save10));
        assert_eq!(summary.discount, Decimal::from(60));
        assert_eq!(summary.total, Decimal::from(540));
    }

    #[test]
    fn test_summary_empty_cart() {
        let summary = CartSummary::compute(&Cart::new(), Some(PromoCode::Save10));
        assert_eq!(summary.total, Decimal::ZERO);
        assert_eq!(summary.shipping, Decimal::ZERO);
        assert!(!summary.has_free_shipping());
        assert!(summary.free_shipping_remaining.is_none());
    }
}
