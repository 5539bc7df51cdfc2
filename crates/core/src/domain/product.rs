use std::collections::{BTreeMap, BTreeSet};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProductId(pub String);

impl std::fmt::Display for ProductId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A sellable product. Loaded once at startup, never mutated.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    /// Human-readable catalog key (e.g. `apples`), also usable for lookup.
    pub key: String,
    pub name: String,
    pub category: String,
    pub price: Decimal,
    pub unit: String,
    pub stock: u32,
    pub description: String,
    pub allergens: BTreeSet<String>,
    pub nutrition: BTreeMap<String, String>,
}

/// Compact projection returned by catalog search.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProductSummary {
    pub id: ProductId,
    pub name: String,
    pub category: String,
    pub price: Decimal,
    pub unit: String,
    pub stock: u32,
}

impl From<&Product> for ProductSummary {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id.clone(),
            name: product.name.clone(),
            category: product.category.clone(),
            price: product.price,
            unit: product.unit.clone(),
            stock: product.stock,
        }
    }
}
