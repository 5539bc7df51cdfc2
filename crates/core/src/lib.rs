pub mod catalog;
pub mod config;
pub mod domain;
pub mod errors;
pub mod store;
pub mod storefront;

pub use catalog::{Catalog, CategoryList, SearchResults};
pub use domain::cart::{Cart, CartEntry, CartLine, CartReceipt, CartView};
pub use domain::order::{Order, OrderConfirmation, OrderId, OrderLine, OrderStatus};
pub use domain::product::{Product, ProductId, ProductSummary};
pub use errors::CommerceError;
pub use store::MemoryStore;
pub use storefront::{OrderRequest, Recommendation, Recommendations, Storefront};
