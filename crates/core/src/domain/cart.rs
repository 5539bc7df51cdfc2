use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::product::Product;

/// One line of a customer's cart. Holds a snapshot of the product so that
/// views and order placement never reach back into the catalog.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CartEntry {
    pub product: Product,
    pub quantity: Decimal,
}

/// A customer's in-progress selection, keyed by product id.
pub type Cart = BTreeMap<String, CartEntry>;

/// A cart line as presented to callers, with the per-line subtotal.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CartLine {
    pub product_id: String,
    pub name: String,
    pub quantity: Decimal,
    pub unit: String,
    pub price_per_unit: Decimal,
    pub subtotal: Decimal,
}

/// Full cart view. An empty cart is an explicit result, not an error.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CartView {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub items: Vec<CartLine>,
    pub total: Decimal,
    pub item_count: usize,
}

impl CartView {
    pub fn empty() -> Self {
        Self {
            message: Some("Your cart is empty".to_string()),
            items: Vec::new(),
            total: Decimal::ZERO,
            item_count: 0,
        }
    }
}

/// Result of a successful cart mutation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CartReceipt {
    pub success: bool,
    pub message: String,
    pub cart_total: Decimal,
}
