//! Process-wide cart and order storage.
//!
//! An explicit store abstraction instead of bare globals: cart and order
//! maps live behind mutexes and the order sequence is atomic, so two
//! simultaneous placements can never observe the same counter value. A
//! database-backed implementation could replace this without touching the
//! storefront logic.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use crate::domain::cart::Cart;
use crate::domain::order::{Order, OrderId};

/// First order id issued is `CMD-1000`.
const ORDER_SEQ_START: u64 = 1000;

#[derive(Debug)]
pub struct MemoryStore {
    carts: Mutex<HashMap<String, Cart>>,
    orders: Mutex<HashMap<String, Order>>,
    order_seq: AtomicU64,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            carts: Mutex::new(HashMap::new()),
            orders: Mutex::new(HashMap::new()),
            order_seq: AtomicU64::new(ORDER_SEQ_START),
        }
    }

    /// Allocates the next sequential order id.
    pub fn next_order_id(&self) -> OrderId {
        let seq = self.order_seq.fetch_add(1, Ordering::SeqCst);
        OrderId(format!("CMD-{seq}"))
    }

    /// Runs `mutate` against the customer's cart, creating it if absent.
    pub fn with_cart_mut<T>(&self, customer_id: &str, mutate: impl FnOnce(&mut Cart) -> T) -> T {
        let mut carts = self.carts.lock().expect("cart store lock poisoned");
        let cart = carts.entry(customer_id.to_string()).or_default();
        mutate(cart)
    }

    /// Snapshot of the customer's cart, if one exists.
    pub fn cart(&self, customer_id: &str) -> Option<Cart> {
        let carts = self.carts.lock().expect("cart store lock poisoned");
        carts.get(customer_id).cloned()
    }

    /// Replaces the customer's cart with an empty one.
    pub fn clear_cart(&self, customer_id: &str) {
        let mut carts = self.carts.lock().expect("cart store lock poisoned");
        carts.insert(customer_id.to_string(), Cart::new());
    }

    pub fn insert_order(&self, order: Order) {
        let mut orders = self.orders.lock().expect("order store lock poisoned");
        orders.insert(order.order_id.0.clone(), order);
    }

    pub fn order(&self, order_id: &str) -> Option<Order> {
        let orders = self.orders.lock().expect("order store lock poisoned");
        orders.get(order_id).cloned()
    }

    pub fn order_count(&self) -> usize {
        let orders = self.orders.lock().expect("order store lock poisoned");
        orders.len()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;

    use super::MemoryStore;

    #[test]
    fn order_ids_are_sequential_from_cmd_1000() {
        let store = MemoryStore::new();
        assert_eq!(store.next_order_id().0, "CMD-1000");
        assert_eq!(store.next_order_id().0, "CMD-1001");
        assert_eq!(store.next_order_id().0, "CMD-1002");
    }

    #[test]
    fn concurrent_allocation_never_duplicates_an_order_id() {
        let store = Arc::new(MemoryStore::new());
        let handles = (0..8)
            .map(|_| {
                let store = Arc::clone(&store);
                thread::spawn(move || {
                    (0..50).map(|_| store.next_order_id().0).collect::<Vec<_>>()
                })
            })
            .collect::<Vec<_>>();

        let mut all_ids = Vec::new();
        for handle in handles {
            all_ids.extend(handle.join().expect("allocator thread panicked"));
        }
        let total = all_ids.len();
        all_ids.sort();
        all_ids.dedup();
        assert_eq!(all_ids.len(), total);
    }

    #[test]
    fn cart_is_created_lazily_and_cleared_in_place() {
        let store = MemoryStore::new();
        assert!(store.cart("c1").is_none());

        store.with_cart_mut("c1", |cart| {
            cart.insert(
                "prod_001".to_string(),
                crate::domain::cart::CartEntry {
                    product: crate::catalog::Catalog::seed()
                        .details("prod_001")
                        .expect("seeded")
                        .clone(),
                    quantity: rust_decimal::Decimal::ONE,
                },
            );
        });
        assert_eq!(store.cart("c1").expect("cart exists").len(), 1);

        store.clear_cart("c1");
        assert!(store.cart("c1").expect("cart still exists").is_empty());
    }
}
