//! Server-held carts, one per visitor.
//!
//! Carts live in memory only and are dropped after [`CART_IDLE_EXPIRY`]
//! without activity (or on restart). Each mutation is a single
//! read-modify-write on the visitor's cache entry, so concurrent requests
//! from one visitor never lose updates.

use std::sync::Arc;
use std::time::Duration;

use doux_core::{Cart, CartEvent, Product, ProductId, VisitorId};
use moka::future::Cache;
use moka::ops::compute::Op;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// Idle lifetime of a cart, matching the session cookie.
pub const CART_IDLE_EXPIRY: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Buffered notifications per subscriber before it starts lagging.
const EVENT_CAPACITY: usize = 256;

/// Published after every mutation that changed a cart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartNotification {
    pub visitor: VisitorId,
    pub event: CartEvent,
    /// Item count after the change.
    pub count: u64,
}

/// All visitors' carts.
#[derive(Clone)]
pub struct CartStore {
    inner: Arc<CartStoreInner>,
}

struct CartStoreInner {
    carts: Cache<VisitorId, Cart>,
    events: broadcast::Sender<CartNotification>,
}

impl Default for CartStore {
    fn default() -> Self {
        Self::new(CART_IDLE_EXPIRY)
    }
}

impl CartStore {
    /// Create an empty store whose carts expire after `idle` without access.
    #[must_use]
    pub fn new(idle: Duration) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            inner: Arc::new(CartStoreInner {
                carts: Cache::builder().time_to_idle(idle).build(),
                events,
            }),
        }
    }

    /// Snapshot of the visitor's cart (empty if they have none).
    pub async fn get(&self, visitor: VisitorId) -> Cart {
        self.inner.carts.get(&visitor).await.unwrap_or_default()
    }

    /// Total quantity in the visitor's cart.
    pub async fn count(&self, visitor: VisitorId) -> u64 {
        self.inner
            .carts
            .get(&visitor)
            .await
            .map_or(0, |cart| cart.count())
    }

    pub async fn add(&self, visitor: VisitorId, product: Product) -> CartEvent {
        self.mutate(visitor, move |cart| cart.add(product)).await
    }

    pub async fn remove(&self, visitor: VisitorId, product_id: &ProductId) -> CartEvent {
        self.mutate(visitor, |cart| cart.remove(product_id)).await
    }

    /// Set a quantity; zero or less removes the line.
    pub async fn update_quantity(
        &self,
        visitor: VisitorId,
        product_id: &ProductId,
        quantity: i64,
    ) -> CartEvent {
        self.mutate(visitor, |cart| cart.update_quantity(product_id, quantity))
            .await
    }

    pub async fn clear(&self, visitor: VisitorId) -> CartEvent {
        self.mutate(visitor, Cart::clear).await
    }

    /// Receive a [`CartNotification`] for every effective mutation from now on.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<CartNotification> {
        self.inner.events.subscribe()
    }

    /// Apply `change` atomically to the visitor's cart and publish the event.
    ///
    /// Empty carts are removed from the cache instead of being stored.
    async fn mutate<F>(&self, visitor: VisitorId, change: F) -> CartEvent
    where
        F: FnOnce(&mut Cart) -> CartEvent + Send,
    {
        let mut event = CartEvent::Unchanged;
        let mut count = 0;

        self.inner
            .carts
            .entry(visitor)
            .and_compute_with(|existing| {
                let mut cart = existing.map(moka::Entry::into_value).unwrap_or_default();
                event = change(&mut cart);
                count = cart.count();
                let op = match (event.is_change(), cart.is_empty()) {
                    (false, _) => Op::Nop,
                    (true, true) => Op::Remove,
                    (true, false) => Op::Put(cart),
                };
                std::future::ready(op)
            })
            .await;

        if event.is_change() {
            // No subscribers is fine
            let _ = self.inner.events.send(CartNotification {
                visitor,
                event: event.clone(),
                count,
            });
        }
        event
    }
}

/// Log every cart notification until the store is dropped.
pub fn spawn_event_logger(mut events: broadcast::Receiver<CartNotification>) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(n) => info!(
                    visitor = %n.visitor,
                    event = ?n.event,
                    count = n.count,
                    "Cart updated"
                ),
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Cart event logger fell behind");
                }
                Err(RecvError::Closed) => break,
            }
        }
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;
    use tokio::sync::broadcast::error::TryRecvError;

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

    #[tokio::test]
    async fn test_add_twice_then_total() {
        let store = CartStore::default();
        let visitor = VisitorId::generate();

        store.add(visitor, product(1, 10)).await;
        store.add(visitor, product(1, 10)).await;
        store.add(visitor, product(2, 5)).await;

        let cart = store.get(visitor).await;
        assert_eq!(cart.items().len(), 2);
        assert_eq!(cart.total(), Decimal::from(25));
        assert_eq!(store.count(visitor).await, 3);
    }

    #[tokio::test]
    async fn test_visitors_are_isolated() {
        let store = CartStore::default();
        let alice = VisitorId::generate();
        let bob = VisitorId::generate();

        store.add(alice, product(1, 10)).await;
        assert_eq!(store.count(alice).await, 1);
        assert_eq!(store.count(bob).await, 0);
        assert!(store.get(bob).await.is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_adds_are_not_lost() {
        let store = CartStore::default();
        let visitor = VisitorId::generate();

        let tasks: Vec<_> = (0..50)
            .map(|_| {
                let store = store.clone();
                tokio::spawn(async move { store.add(visitor, product(7, 1)).await })
            })
            .collect();
        for task in tasks {
            task.await.unwrap();
        }

        assert_eq!(store.count(visitor).await, 50);
        assert_eq!(store.get(visitor).await.items().len(), 1);
    }

    #[tokio::test]
    async fn test_zero_quantity_removes_and_empty_cart_is_dropped() {
        let store = CartStore::default();
        let visitor = VisitorId::generate();
        let id = ProductId::from(1_u64);

        store.add(visitor, product(1, 10)).await;
        let event = store.update_quantity(visitor, &id, 0).await;
        assert_eq!(event, CartEvent::Removed { product_id: id });
        assert!(store.get(visitor).await.is_empty());
    }

    #[tokio::test]
    async fn test_notifications_only_for_changes() {
        let store = CartStore::default();
        let mut events = store.subscribe();
        let visitor = VisitorId::generate();

        store.add(visitor, product(3, 10)).await;
        let n = events.try_recv().unwrap();
        assert_eq!(n.visitor, visitor);
        assert_eq!(n.count, 1);
        assert!(matches!(n.event, CartEvent::Added { .. }));

        assert_eq!(store.remove(visitor, &ProductId::from(99_u64)).await, CartEvent::Unchanged);
        assert_eq!(store.clear(VisitorId::generate()).await, CartEvent::Unchanged);
        assert!(matches!(events.try_recv(), Err(TryRecvError::Empty)));

        store.clear(visitor).await;
        let n = events.try_recv().unwrap();
        assert_eq!(n.event, CartEvent::Cleared);
        assert_eq!(n.count, 0);
    }

    #[tokio::test]
    async fn test_event_logger_stops_when_store_is_dropped() {
        let store = CartStore::default();
        let logger = spawn_event_logger(store.subscribe());
        store.add(VisitorId::generate(), product(1, 1)).await;
        drop(store);
        logger.await.unwrap();
    }
}
