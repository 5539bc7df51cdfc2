//! The static product catalog: every sellable product and its attributes.
//!
//! The catalog is seeded once at startup and never mutated. Lookups are
//! deliberately forgiving: details resolve by exact id, by catalog key, or
//! by product name, the latter two case-insensitively.

use std::collections::{BTreeMap, BTreeSet};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::product::{Product, ProductId, ProductSummary};

/// Catalog keys of the editorial "popular products" list, used as the
/// fallback recommendation mode.
pub const POPULAR_KEYS: &[&str] = &["apples", "bananas", "bread", "milk", "tomatoes"];

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SearchResults {
    pub products: Vec<ProductSummary>,
    pub count: usize,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CategoryList {
    pub categories: Vec<String>,
}

#[derive(Clone, Debug)]
pub struct Catalog {
    // BTreeMap keeps iteration order stable so search results and
    // recommendations are deterministic.
    products: BTreeMap<String, Product>,
}

impl Catalog {
    pub fn new(products: Vec<Product>) -> Self {
        let products = products.into_iter().map(|p| (p.key.clone(), p)).collect();
        Self { products }
    }

    /// The demo grocery assortment.
    pub fn seed() -> Self {
        Self::new(seed_products())
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Product> {
        self.products.values()
    }

    /// Case-insensitive substring match against name, category, description
    /// and catalog key. No ranking; all matches in iteration order.
    pub fn search(&self, query: &str) -> SearchResults {
        let needle = query.to_lowercase();
        let products = self
            .products
            .iter()
            .filter(|(key, product)| {
                product.name.to_lowercase().contains(&needle)
                    || product.category.to_lowercase().contains(&needle)
                    || product.description.to_lowercase().contains(&needle)
                    || key.to_lowercase().contains(&needle)
            })
            .map(|(_, product)| ProductSummary::from(product))
            .collect::<Vec<_>>();

        let count = products.len();
        SearchResults { products, count }
    }

    /// First match by exact id, exact key (case-insensitive), or exact name
    /// (case-insensitive). `None` on miss; the caller decides how to report.
    pub fn details(&self, id_or_name: &str) -> Option<&Product> {
        self.products.values().find(|product| {
            product.id.0 == id_or_name
                || product.key.eq_ignore_ascii_case(id_or_name)
                || product.name.eq_ignore_ascii_case(id_or_name)
        })
    }

    /// Sorted, deduplicated category names.
    pub fn categories(&self) -> CategoryList {
        let categories = self
            .products
            .values()
            .map(|product| product.category.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        CategoryList { categories }
    }
}

fn seed_products() -> Vec<Product> {
    vec![
        product(
            "prod_001",
            "apples",
            "Golden Apples",
            "Fruits",
            Decimal::new(350, 2),
            "kg",
            150,
            "Crisp, locally grown Golden apples",
            &[],
            &[("calories", "52"), ("carbs", "14g"), ("fiber", "2.4g")],
        ),
        product(
            "prod_002",
            "bananas",
            "Organic Bananas",
            "Fruits",
            Decimal::new(290, 2),
            "kg",
            200,
            "Organic bananas, perfectly ripe",
            &[],
            &[("calories", "89"), ("carbs", "23g"), ("fiber", "2.6g")],
        ),
        product(
            "prod_003",
            "tomatoes",
            "Cherry Tomatoes",
            "Vegetables",
            Decimal::new(420, 2),
            "kg",
            80,
            "Juicy, sweet cherry tomatoes",
            &[],
            &[("calories", "18"), ("carbs", "3.9g"), ("fiber", "1.2g")],
        ),
        product(
            "prod_004",
            "bread",
            "Country Bread",
            "Bakery",
            Decimal::new(250, 2),
            "piece",
            45,
            "Artisan country loaf, wood-fired",
            &["gluten"],
            &[("calories", "265"), ("carbs", "49g"), ("fiber", "2.7g")],
        ),
        product(
            "prod_005",
            "milk",
            "Organic Whole Milk",
            "Dairy",
            Decimal::new(180, 2),
            "litre",
            120,
            "Organic whole milk, fresh daily",
            &["lactose"],
            &[("calories", "61"), ("carbs", "4.8g"), ("protein", "3.2g")],
        ),
        product(
            "prod_006",
            "cheese",
            "Goat Cheese",
            "Dairy",
            Decimal::new(590, 2),
            "200g",
            60,
            "Artisan goat cheese, creamy and flavorful",
            &["lactose"],
            &[("calories", "364"), ("carbs", "2.4g"), ("protein", "22g")],
        ),
        product(
            "prod_007",
            "chicken",
            "Free-Range Chicken",
            "Meat",
            Decimal::new(1290, 2),
            "kg",
            30,
            "Free-range chicken, raised outdoors",
            &[],
            &[("calories", "239"), ("carbs", "0g"), ("protein", "27g")],
        ),
        product(
            "prod_008",
            "salmon",
            "Fresh Salmon",
            "Fish",
            Decimal::new(1850, 2),
            "kg",
            25,
            "Fresh salmon, sustainably caught",
            &["fish"],
            &[("calories", "208"), ("carbs", "0g"), ("protein", "20g")],
        ),
        product(
            "prod_009",
            "rice",
            "Organic Basmati Rice",
            "Pantry",
            Decimal::new(450, 2),
            "kg",
            100,
            "Organic basmati rice, long fragrant grain",
            &[],
            &[("calories", "365"), ("carbs", "80g"), ("fiber", "1.3g")],
        ),
        product(
            "prod_010",
            "olive_oil",
            "Extra Virgin Olive Oil",
            "Pantry",
            Decimal::new(890, 2),
            "500ml",
            70,
            "Extra virgin olive oil, first cold press",
            &[],
            &[("calories", "884"), ("carbs", "0g"), ("fat", "100g")],
        ),
    ]
}

#[allow(clippy::too_many_arguments)]
fn product(
    id: &str,
    key: &str,
    name: &str,
    category: &str,
    price: Decimal,
    unit: &str,
    stock: u32,
    description: &str,
    allergens: &[&str],
    nutrition: &[(&str, &str)],
) -> Product {
    Product {
        id: ProductId(id.to_string()),
        key: key.to_string(),
        name: name.to_string(),
        category: category.to_string(),
        price,
        unit: unit.to_string(),
        stock,
        description: description.to_string(),
        allergens: allergens.iter().map(|a| a.to_string()).collect(),
        nutrition: nutrition.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seed_catalog_has_ten_products() {
        let catalog = Catalog::seed();
        assert_eq!(catalog.len(), 10);
    }

    #[test]
    fn search_is_case_insensitive_over_all_fields() {
        let catalog = Catalog::seed();

        let by_name = catalog.search("GOLDEN");
        assert_eq!(by_name.count, 1);
        assert_eq!(by_name.products[0].id.0, "prod_001");

        let by_category = catalog.search("fruits");
        assert_eq!(by_category.count, 2);

        let by_description = catalog.search("wood-fired");
        assert_eq!(by_description.count, 1);
        assert_eq!(by_description.products[0].name, "Country Bread");

        let by_key = catalog.search("olive_oil");
        assert_eq!(by_key.count, 1);
    }

    #[test]
    fn search_returns_only_matching_products_and_count_matches_length() {
        let catalog = Catalog::seed();
        let results = catalog.search("organic");
        assert_eq!(results.count, results.products.len());
        for summary in &results.products {
            let product = catalog.details(&summary.id.0).expect("result must exist");
            let haystack = format!(
                "{} {} {} {}",
                product.name, product.category, product.description, product.key
            )
            .to_lowercase();
            assert!(haystack.contains("organic"), "{} should match", product.name);
        }
    }

    #[test]
    fn search_with_no_match_is_empty() {
        let catalog = Catalog::seed();
        let results = catalog.search("durian");
        assert_eq!(results.count, 0);
        assert!(results.products.is_empty());
    }

    #[test]
    fn details_resolves_by_id_key_and_name() {
        let catalog = Catalog::seed();
        assert_eq!(catalog.details("prod_003").expect("by id").name, "Cherry Tomatoes");
        assert_eq!(catalog.details("Tomatoes").expect("by key").id.0, "prod_003");
        assert_eq!(catalog.details("cherry tomatoes").expect("by name").id.0, "prod_003");
        assert!(catalog.details("prod_999").is_none());
    }

    #[test]
    fn categories_are_sorted_and_deduplicated() {
        let catalog = Catalog::seed();
        let list = catalog.categories().categories;
        assert_eq!(
            list,
            vec!["Bakery", "Dairy", "Fish", "Fruits", "Meat", "Pantry", "Vegetables"]
        );
    }
}
