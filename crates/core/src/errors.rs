use thiserror::Error;

/// Expected business conditions from storefront operations.
///
/// These are values, not panics: tool handlers and REST routes serialize
/// them into an `{"error": ...}` payload so a conversation (or API caller)
/// can recover, matching the relay semantics of the tool-calling loop.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum CommerceError {
    #[error("product `{0}` not found")]
    ProductNotFound(String),
    #[error("order `{0}` not found")]
    OrderNotFound(String),
    #[error("product `{0}` is not in the cart")]
    NotInCart(String),
    #[error("insufficient stock for {name}: {available} {unit} available")]
    InsufficientStock { name: String, available: u32, unit: String },
    #[error("the cart is empty; add products before placing an order")]
    EmptyCart,
    #[error("invalid request: {0}")]
    Validation(String),
}

impl CommerceError {
    /// True when the condition is a missing/malformed input rather than a
    /// business outcome; channel adapters map these to HTTP 400.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}
