//! The storefront: every operation the agent (and the REST surface) can
//! perform against the catalog and the cart/order store.
//!
//! Expected business conditions come back as `CommerceError` values; see
//! `errors`. Stock is a point-in-time availability check only: it is never
//! decremented on add or on order placement. That mirrors the display-only
//! stock semantics of the assortment feed and is deliberate, not a missing
//! reservation step.

use chrono::Utc;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::catalog::{Catalog, CategoryList, SearchResults, POPULAR_KEYS};
use crate::domain::cart::{Cart, CartEntry, CartLine, CartReceipt, CartView};
use crate::domain::order::{Order, OrderConfirmation, OrderLine, OrderStatus};
use crate::errors::CommerceError;
use crate::store::MemoryStore;

/// Recommendation lists are capped at five entries across all modes.
const MAX_RECOMMENDATIONS: usize = 5;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub id: String,
    pub name: String,
    pub category: String,
    pub price: Decimal,
    pub reason: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Recommendations {
    pub recommendations: Vec<Recommendation>,
}

/// Delivery and contact details collected before an order is placed.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OrderRequest {
    pub customer_id: String,
    pub delivery_address: String,
    pub customer_name: String,
    pub customer_phone: String,
    pub customer_email: String,
}

#[derive(Debug)]
pub struct Storefront {
    catalog: Catalog,
    store: MemoryStore,
}

impl Storefront {
    pub fn new(catalog: Catalog) -> Self {
        Self { catalog, store: MemoryStore::new() }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn search_products(&self, query: &str) -> SearchResults {
        self.catalog.search(query)
    }

    pub fn product_details(&self, id_or_name: &str) -> Result<&crate::domain::product::Product, CommerceError> {
        self.catalog
            .details(id_or_name)
            .ok_or_else(|| CommerceError::ProductNotFound(id_or_name.to_string()))
    }

    pub fn categories(&self) -> CategoryList {
        self.catalog.categories()
    }

    /// Adds `quantity` of a product to the customer's cart, creating the
    /// cart if absent and accumulating onto an existing line.
    pub fn add_to_cart(
        &self,
        product_id: &str,
        quantity: Decimal,
        customer_id: &str,
    ) -> Result<CartReceipt, CommerceError> {
        let product = self
            .catalog
            .details(product_id)
            .ok_or_else(|| CommerceError::ProductNotFound(product_id.to_string()))?
            .clone();

        if quantity > Decimal::from(product.stock) {
            return Err(CommerceError::InsufficientStock {
                name: product.name,
                available: product.stock,
                unit: product.unit,
            });
        }

        let (message, cart_total) = self.store.with_cart_mut(customer_id, |cart| {
            cart.entry(product.id.0.clone())
                .and_modify(|entry| entry.quantity += quantity)
                .or_insert_with(|| CartEntry { product: product.clone(), quantity });
            (
                format!("Added {quantity} {} of {} to the cart", product.unit, product.name),
                cart_total(cart),
            )
        });

        Ok(CartReceipt { success: true, message, cart_total })
    }

    /// Cart contents with per-line subtotals. An absent or empty cart is an
    /// explicit empty result, not an error.
    pub fn view_cart(&self, customer_id: &str) -> CartView {
        let Some(cart) = self.store.cart(customer_id) else {
            return CartView::empty();
        };
        if cart.is_empty() {
            return CartView::empty();
        }

        let items = cart
            .iter()
            .map(|(product_id, entry)| CartLine {
                product_id: product_id.clone(),
                name: entry.product.name.clone(),
                quantity: entry.quantity,
                unit: entry.product.unit.clone(),
                price_per_unit: entry.product.price,
                subtotal: (entry.product.price * entry.quantity).round_dp(2),
            })
            .collect::<Vec<_>>();

        let total = cart_total(&cart);
        let item_count = items.len();
        CartView { message: None, items, total, item_count }
    }

    /// Removes a line, resolving the identifier the same forgiving way as
    /// `add_to_cart` (id, key, or name) so one identifier round-trips.
    pub fn remove_from_cart(
        &self,
        product_id: &str,
        customer_id: &str,
    ) -> Result<CartReceipt, CommerceError> {
        if self.store.cart(customer_id).is_none() {
            return Err(CommerceError::NotInCart(product_id.to_string()));
        }

        let key = self
            .catalog
            .details(product_id)
            .map(|product| product.id.0.clone())
            .unwrap_or_else(|| product_id.to_string());

        self.store.with_cart_mut(customer_id, |cart| {
            let entry = cart
                .remove(&key)
                .ok_or_else(|| CommerceError::NotInCart(product_id.to_string()))?;
            Ok(CartReceipt {
                success: true,
                message: format!("{} removed from the cart", entry.product.name),
                cart_total: cart_total(cart),
            })
        })
    }

    /// Snapshots the cart into an immutable order, allocates the next
    /// sequential id, empties the cart, and returns a confirmation.
    pub fn place_order(&self, request: OrderRequest) -> Result<OrderConfirmation, CommerceError> {
        let cart = self.store.cart(&request.customer_id).unwrap_or_default();
        if cart.is_empty() {
            return Err(CommerceError::EmptyCart);
        }

        let items = cart
            .iter()
            .map(|(product_id, entry)| OrderLine {
                product_id: product_id.clone(),
                name: entry.product.name.clone(),
                quantity: entry.quantity,
                unit: entry.product.unit.clone(),
                price: entry.product.price,
                subtotal: (entry.product.price * entry.quantity).round_dp(2),
            })
            .collect::<Vec<_>>();
        let total = cart_total(&cart);

        let order_id = self.store.next_order_id();
        let order = Order {
            order_id: order_id.clone(),
            customer_id: request.customer_id.clone(),
            customer_name: request.customer_name,
            customer_email: request.customer_email,
            customer_phone: request.customer_phone,
            delivery_address: request.delivery_address,
            items,
            total,
            status: OrderStatus::Confirmed,
            created_at: Utc::now(),
        };

        self.store.insert_order(order.clone());
        self.store.clear_cart(&request.customer_id);

        Ok(OrderConfirmation {
            success: true,
            order_id: order_id.clone(),
            message: format!("Order {order_id} confirmed! Total: {total}"),
            order,
        })
    }

    pub fn order_status(&self, order_id: &str) -> Result<Order, CommerceError> {
        self.store
            .order(order_id)
            .ok_or_else(|| CommerceError::OrderNotFound(order_id.to_string()))
    }

    /// Three mutually exclusive modes, in priority order: by reference
    /// product, by cart categories, or the editorial popular list. The mode
    /// is picked by which argument is present: an unresolvable reference
    /// product stays in the first mode and yields no entries.
    pub fn recommendations(
        &self,
        product_id: Option<&str>,
        customer_id: Option<&str>,
    ) -> Recommendations {
        let mut recommendations = Vec::new();

        if let Some(product_id) = product_id {
            if let Some(reference) = self.catalog.details(product_id) {
                for product in self.catalog.iter() {
                    if product.category == reference.category && product.id != reference.id {
                        recommendations.push(Recommendation {
                            id: product.id.0.clone(),
                            name: product.name.clone(),
                            category: product.category.clone(),
                            price: product.price,
                            reason: format!("More from the {} category", product.category),
                        });
                    }
                }
            }
        } else if let Some(cart) =
            customer_id.and_then(|id| self.store.cart(id)).filter(|cart| !cart.is_empty())
        {
            let cart_categories = cart
                .values()
                .map(|entry| entry.product.category.clone())
                .collect::<std::collections::BTreeSet<_>>();
            for product in self.catalog.iter() {
                if cart_categories.contains(&product.category) {
                    recommendations.push(Recommendation {
                        id: product.id.0.clone(),
                        name: product.name.clone(),
                        category: product.category.clone(),
                        price: product.price,
                        reason: "Goes with what's in your cart".to_string(),
                    });
                }
            }
        } else {
            for key in POPULAR_KEYS {
                if let Some(product) = self.catalog.details(key) {
                    recommendations.push(Recommendation {
                        id: product.id.0.clone(),
                        name: product.name.clone(),
                        category: product.category.clone(),
                        price: product.price,
                        reason: "Popular product".to_string(),
                    });
                }
            }
        }

        recommendations.truncate(MAX_RECOMMENDATIONS);
        Recommendations { recommendations }
    }
}

fn cart_total(cart: &Cart) -> Decimal {
    cart.values()
        .map(|entry| entry.product.price * entry.quantity)
        .sum::<Decimal>()
        .round_dp(2)
}
