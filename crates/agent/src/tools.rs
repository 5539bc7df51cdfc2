//! The tool surface the model may call during a conversation turn.
//!
//! Tools are registered in an explicit registry (name, description, JSON
//! parameter schema, handler) validated at registration time, so a
//! duplicate or mis-schemed tool fails at startup instead of at call time.
//! Dispatch never fails the turn: unknown names, malformed argument
//! payloads, and business errors all come back as `{"error": ...}` tool
//! results for the model to recover from.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use panier_core::errors::CommerceError;
use panier_core::storefront::{OrderRequest, Storefront};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;

#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &'static str;
    fn description(&self) -> &'static str;
    /// JSON-object parameter schema declared to the completion endpoint.
    fn parameters(&self) -> Value;
    async fn execute(&self, arguments: Value) -> Result<Value, CommerceError>;
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ToolRegistryError {
    #[error("tool `{0}` is registered twice")]
    DuplicateName(String),
    #[error("tool `{0}` declares a non-object parameter schema")]
    InvalidSchema(String),
}

#[derive(Default)]
pub struct ToolRegistry {
    // BTreeMap keeps the declared tool order stable across runs.
    tools: BTreeMap<String, Box<dyn Tool>>,
}

impl ToolRegistry {
    pub fn register<T>(&mut self, tool: T) -> Result<(), ToolRegistryError>
    where
        T: Tool + 'static,
    {
        let schema = tool.parameters();
        if schema.get("type").and_then(Value::as_str) != Some("object") {
            return Err(ToolRegistryError::InvalidSchema(tool.name().to_string()));
        }
        if self.tools.contains_key(tool.name()) {
            return Err(ToolRegistryError::DuplicateName(tool.name().to_string()));
        }
        self.tools.insert(tool.name().to_string(), Box::new(tool));
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    pub fn names(&self) -> Vec<&str> {
        self.tools.keys().map(String::as_str).collect()
    }

    /// Tool declarations in the shape the completion endpoint consumes.
    pub fn declarations(&self) -> Vec<Value> {
        self.tools
            .values()
            .map(|tool| {
                json!({
                    "type": "function",
                    "function": {
                        "name": tool.name(),
                        "description": tool.description(),
                        "parameters": tool.parameters(),
                    }
                })
            })
            .collect()
    }

    /// Executes one requested call. Always produces a result value; error
    /// conditions are structured payloads, never turn failures.
    pub async fn dispatch(&self, name: &str, raw_arguments: &str) -> Value {
        let Some(tool) = self.tools.get(name) else {
            return json!({ "error": format!("unknown tool `{name}`") });
        };

        let arguments: Value = if raw_arguments.trim().is_empty() {
            json!({})
        } else {
            match serde_json::from_str(raw_arguments) {
                Ok(value) => value,
                Err(err) => {
                    return json!({ "error": format!("invalid tool arguments: {err}") });
                }
            }
        };

        match tool.execute(arguments).await {
            Ok(result) => result,
            Err(err) => json!({ "error": err.to_string() }),
        }
    }
}

/// All nine storefront tools, registered against one storefront.
pub fn storefront_tools(storefront: Arc<Storefront>) -> Result<ToolRegistry, ToolRegistryError> {
    let mut registry = ToolRegistry::default();
    registry.register(SearchProducts(storefront.clone()))?;
    registry.register(GetProductDetails(storefront.clone()))?;
    registry.register(AddToCart(storefront.clone()))?;
    registry.register(ViewCart(storefront.clone()))?;
    registry.register(RemoveFromCart(storefront.clone()))?;
    registry.register(PlaceOrder(storefront.clone()))?;
    registry.register(GetOrderStatus(storefront.clone()))?;
    registry.register(GetRecommendations(storefront.clone()))?;
    registry.register(GetCategories(storefront))?;
    Ok(registry)
}

fn parse_args<T: DeserializeOwned>(arguments: Value) -> Result<T, CommerceError> {
    serde_json::from_value(arguments).map_err(|err| CommerceError::Validation(err.to_string()))
}

fn to_result<T: Serialize>(value: &T) -> Result<Value, CommerceError> {
    serde_json::to_value(value)
        .map_err(|err| CommerceError::Validation(format!("result serialization failed: {err}")))
}

struct SearchProducts(Arc<Storefront>);

#[derive(Deserialize)]
struct SearchProductsArgs {
    query: String,
}

#[async_trait]
impl Tool for SearchProducts {
    fn name(&self) -> &'static str {
        "search_products"
    }

    fn description(&self) -> &'static str {
        "Search food products by name, category, or description. \
         Use this to find products when the customer asks for something."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "Search term (product name, category, or keywords)"
                }
            },
            "required": ["query"]
        })
    }

    async fn execute(&self, arguments: Value) -> Result<Value, CommerceError> {
        let args: SearchProductsArgs = parse_args(arguments)?;
        to_result(&self.0.search_products(&args.query))
    }
}

struct GetProductDetails(Arc<Storefront>);

#[derive(Deserialize)]
struct GetProductDetailsArgs {
    product_id: String,
}

#[async_trait]
impl Tool for GetProductDetails {
    fn name(&self) -> &'static str {
        "get_product_details"
    }

    fn description(&self) -> &'static str {
        "Get the full details of a specific product \
         (price, description, allergens, nutrition, stock)."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "product_id": {
                    "type": "string",
                    "description": "The product id (e.g. prod_001) or the product name"
                }
            },
            "required": ["product_id"]
        })
    }

    async fn execute(&self, arguments: Value) -> Result<Value, CommerceError> {
        let args: GetProductDetailsArgs = parse_args(arguments)?;
        let product = self.0.product_details(&args.product_id)?;
        to_result(product)
    }
}

struct AddToCart(Arc<Storefront>);

#[derive(Deserialize)]
struct AddToCartArgs {
    product_id: String,
    quantity: Decimal,
    customer_id: String,
}

#[async_trait]
impl Tool for AddToCart {
    fn name(&self) -> &'static str {
        "add_to_cart"
    }

    fn description(&self) -> &'static str {
        "Add a product to the customer's cart. Creates a new cart if needed."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "product_id": {
                    "type": "string",
                    "description": "The id of the product to add"
                },
                "quantity": {
                    "type": "number",
                    "description": "The quantity to add"
                },
                "customer_id": {
                    "type": "string",
                    "description": "Unique customer identifier (may be generated for a new customer)"
                }
            },
            "required": ["product_id", "quantity", "customer_id"]
        })
    }

    async fn execute(&self, arguments: Value) -> Result<Value, CommerceError> {
        let args: AddToCartArgs = parse_args(arguments)?;
        let receipt = self.0.add_to_cart(&args.product_id, args.quantity, &args.customer_id)?;
        to_result(&receipt)
    }
}

struct ViewCart(Arc<Storefront>);

#[derive(Deserialize)]
struct ViewCartArgs {
    customer_id: String,
}

#[async_trait]
impl Tool for ViewCart {
    fn name(&self) -> &'static str {
        "view_cart"
    }

    fn description(&self) -> &'static str {
        "Show what is in the customer's cart along with the total."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "customer_id": {
                    "type": "string",
                    "description": "The customer identifier"
                }
            },
            "required": ["customer_id"]
        })
    }

    async fn execute(&self, arguments: Value) -> Result<Value, CommerceError> {
        let args: ViewCartArgs = parse_args(arguments)?;
        to_result(&self.0.view_cart(&args.customer_id))
    }
}

struct RemoveFromCart(Arc<Storefront>);

#[derive(Deserialize)]
struct RemoveFromCartArgs {
    product_id: String,
    customer_id: String,
}

#[async_trait]
impl Tool for RemoveFromCart {
    fn name(&self) -> &'static str {
        "remove_from_cart"
    }

    fn description(&self) -> &'static str {
        "Remove a product from the customer's cart."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "product_id": {
                    "type": "string",
                    "description": "The id of the product to remove"
                },
                "customer_id": {
                    "type": "string",
                    "description": "The customer identifier"
                }
            },
            "required": ["product_id", "customer_id"]
        })
    }

    async fn execute(&self, arguments: Value) -> Result<Value, CommerceError> {
        let args: RemoveFromCartArgs = parse_args(arguments)?;
        let receipt = self.0.remove_from_cart(&args.product_id, &args.customer_id)?;
        to_result(&receipt)
    }
}

struct PlaceOrder(Arc<Storefront>);

#[async_trait]
impl Tool for PlaceOrder {
    fn name(&self) -> &'static str {
        "place_order"
    }

    fn description(&self) -> &'static str {
        "Place the customer's order. Requires complete delivery information."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "customer_id": {
                    "type": "string",
                    "description": "The customer identifier"
                },
                "delivery_address": {
                    "type": "string",
                    "description": "Full delivery address"
                },
                "customer_name": {
                    "type": "string",
                    "description": "Customer name"
                },
                "customer_phone": {
                    "type": "string",
                    "description": "Customer phone number"
                },
                "customer_email": {
                    "type": "string",
                    "description": "Customer email"
                }
            },
            "required": [
                "customer_id",
                "delivery_address",
                "customer_name",
                "customer_phone",
                "customer_email"
            ]
        })
    }

    async fn execute(&self, arguments: Value) -> Result<Value, CommerceError> {
        let request: OrderRequest = parse_args(arguments)?;
        let confirmation = self.0.place_order(request)?;
        to_result(&confirmation)
    }
}

struct GetOrderStatus(Arc<Storefront>);

#[derive(Deserialize)]
struct GetOrderStatusArgs {
    order_id: String,
}

#[async_trait]
impl Tool for GetOrderStatus {
    fn name(&self) -> &'static str {
        "get_order_status"
    }

    fn description(&self) -> &'static str {
        "Check the status of an existing order."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "order_id": {
                    "type": "string",
                    "description": "The order number"
                }
            },
            "required": ["order_id"]
        })
    }

    async fn execute(&self, arguments: Value) -> Result<Value, CommerceError> {
        let args: GetOrderStatusArgs = parse_args(arguments)?;
        let order = self.0.order_status(&args.order_id)?;
        to_result(&order)
    }
}

struct GetRecommendations(Arc<Storefront>);

#[derive(Deserialize)]
struct GetRecommendationsArgs {
    #[serde(default)]
    product_id: Option<String>,
    #[serde(default)]
    customer_id: Option<String>,
}

#[async_trait]
impl Tool for GetRecommendations {
    fn name(&self) -> &'static str {
        "get_recommendations"
    }

    fn description(&self) -> &'static str {
        "Suggest similar or complementary products based on preferences \
         or the current cart."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "product_id": {
                    "type": "string",
                    "description": "Reference product id, or leave empty for general recommendations"
                },
                "customer_id": {
                    "type": "string",
                    "description": "Customer id for personalized recommendations"
                }
            },
            "required": []
        })
    }

    async fn execute(&self, arguments: Value) -> Result<Value, CommerceError> {
        let args: GetRecommendationsArgs = parse_args(arguments)?;
        to_result(&self.0.recommendations(args.product_id.as_deref(), args.customer_id.as_deref()))
    }
}

struct GetCategories(Arc<Storefront>);

#[async_trait]
impl Tool for GetCategories {
    fn name(&self) -> &'static str {
        "get_categories"
    }

    fn description(&self) -> &'static str {
        "List all available product categories."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {},
            "required": []
        })
    }

    async fn execute(&self, _arguments: Value) -> Result<Value, CommerceError> {
        to_result(&self.0.categories())
    }
}
