//! The HTTP surface: the conversational endpoint plus direct REST access to
//! the storefront operations.
//!
//! Business conditions (unknown product, empty cart, and so on) come back as
//! `200` with an `{"error": ...}` payload so conversational callers can relay
//! them; missing required request fields are `400`; completion-endpoint
//! failures are `500`.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use panier_agent::{SalesAgent, SessionStore};
use panier_core::errors::CommerceError;
use panier_core::storefront::{OrderRequest, Storefront};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::health;
use crate::webhooks;

#[derive(Clone)]
pub struct AppState {
    pub agent: Arc<SalesAgent>,
    pub storefront: Arc<Storefront>,
    pub sessions: Arc<SessionStore>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health))
        .route("/chat", post(chat))
        .route("/products/search", get(search_products))
        .route("/products/{product_id}", get(product_details))
        .route("/cart/{customer_id}", get(view_cart))
        .route("/cart/{customer_id}/add", post(add_to_cart))
        .route("/cart/{customer_id}/remove", post(remove_from_cart))
        .route("/orders", post(place_order))
        .route("/orders/{order_id}", get(order_status))
        .route("/recommendations", get(recommendations))
        .route("/categories", get(categories))
        .route("/sms/webhook", post(webhooks::sms))
        .route("/voice/webhook", post(webhooks::voice))
        .with_state(state)
}

pub type ApiError = (StatusCode, Json<Value>);

pub fn bad_request(message: impl Into<String>) -> ApiError {
    (StatusCode::BAD_REQUEST, Json(json!({ "error": message.into() })))
}

fn internal_error(message: impl Into<String>) -> ApiError {
    (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({ "error": message.into() })))
}

fn respond<T: Serialize>(value: T) -> Result<Json<Value>, ApiError> {
    match serde_json::to_value(value) {
        Ok(value) => Ok(Json(value)),
        Err(error) => Err(internal_error(format!("response serialization failed: {error}"))),
    }
}

/// Maps a storefront result onto the conversational error contract: an
/// expected business condition becomes a `200` error payload.
fn relay<T: Serialize>(result: Result<T, CommerceError>) -> Result<Json<Value>, ApiError> {
    match result {
        Ok(value) => respond(value),
        Err(error) => Ok(Json(json!({ "error": error.to_string() }))),
    }
}

/// Runs one agent turn for `(channel, user_id)` and records the exchange.
pub(crate) async fn run_turn(
    state: &AppState,
    channel: &str,
    user_id: &str,
    message: &str,
) -> Result<String, ApiError> {
    let correlation_id = Uuid::new_v4();
    let session = state.sessions.snapshot(channel, user_id);

    tracing::info!(
        event_name = "chat.turn.start",
        correlation_id = %correlation_id,
        channel,
        customer_id = %session.customer_id,
        "handling inbound message"
    );

    let reply = state
        .agent
        .chat(message, &session.history, &session.customer_id)
        .await
        .map_err(|error| {
            tracing::error!(
                event_name = "chat.turn.failed",
                correlation_id = %correlation_id,
                channel,
                error = %error,
                "agent turn failed"
            );
            internal_error(error.to_string())
        })?;

    state.sessions.record_exchange(channel, user_id, message, &reply);
    tracing::info!(
        event_name = "chat.turn.completed",
        correlation_id = %correlation_id,
        channel,
        "agent turn completed"
    );

    Ok(reply)
}

#[derive(Debug, Deserialize)]
struct ChatBody {
    message: Option<String>,
    channel: Option<String>,
    user_id: Option<String>,
}

async fn chat(
    State(state): State<AppState>,
    Json(body): Json<ChatBody>,
) -> Result<Json<Value>, ApiError> {
    let Some(message) = body.message.filter(|m| !m.trim().is_empty()) else {
        return Err(bad_request("message is required"));
    };
    let channel = body.channel.unwrap_or_else(|| "web".to_string());
    let user_id = body.user_id.unwrap_or_else(|| "default".to_string());

    let reply = run_turn(&state, &channel, &user_id, &message).await?;
    let customer_id = SessionStore::customer_id(&channel, &user_id);

    Ok(Json(json!({
        "response": reply,
        "channel": channel,
        "user_id": user_id,
        "customer_id": customer_id,
    })))
}

#[derive(Debug, Deserialize)]
struct SearchParams {
    q: Option<String>,
}

async fn search_products(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<Value>, ApiError> {
    let Some(query) = params.q.filter(|q| !q.trim().is_empty()) else {
        return Err(bad_request("query parameter `q` is required"));
    };
    respond(state.storefront.search_products(&query))
}

async fn product_details(
    State(state): State<AppState>,
    Path(product_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    relay(state.storefront.product_details(&product_id).map(Clone::clone))
}

async fn view_cart(
    State(state): State<AppState>,
    Path(customer_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    respond(state.storefront.view_cart(&customer_id))
}

#[derive(Debug, Deserialize)]
struct AddToCartBody {
    product_id: Option<String>,
    quantity: Option<Decimal>,
}

async fn add_to_cart(
    State(state): State<AppState>,
    Path(customer_id): Path<String>,
    Json(body): Json<AddToCartBody>,
) -> Result<Json<Value>, ApiError> {
    let Some(product_id) = body.product_id.filter(|id| !id.trim().is_empty()) else {
        return Err(bad_request("product_id is required"));
    };
    let quantity = body.quantity.unwrap_or(Decimal::ONE);
    relay(state.storefront.add_to_cart(&product_id, quantity, &customer_id))
}

#[derive(Debug, Deserialize)]
struct RemoveFromCartBody {
    product_id: Option<String>,
}

async fn remove_from_cart(
    State(state): State<AppState>,
    Path(customer_id): Path<String>,
    Json(body): Json<RemoveFromCartBody>,
) -> Result<Json<Value>, ApiError> {
    let Some(product_id) = body.product_id.filter(|id| !id.trim().is_empty()) else {
        return Err(bad_request("product_id is required"));
    };
    relay(state.storefront.remove_from_cart(&product_id, &customer_id))
}

#[derive(Debug, Default, Deserialize)]
struct PlaceOrderBody {
    customer_id: Option<String>,
    delivery_address: Option<String>,
    customer_name: Option<String>,
    customer_phone: Option<String>,
    customer_email: Option<String>,
}

async fn place_order(
    State(state): State<AppState>,
    Json(body): Json<PlaceOrderBody>,
) -> Result<Json<Value>, ApiError> {
    let mut missing = Vec::new();
    let field = |value: &Option<String>, name: &'static str, missing: &mut Vec<&'static str>| {
        match value.as_deref().filter(|v| !v.trim().is_empty()) {
            Some(value) => value.to_string(),
            None => {
                missing.push(name);
                String::new()
            }
        }
    };

    let request = OrderRequest {
        customer_id: field(&body.customer_id, "customer_id", &mut missing),
        delivery_address: field(&body.delivery_address, "delivery_address", &mut missing),
        customer_name: field(&body.customer_name, "customer_name", &mut missing),
        customer_phone: field(&body.customer_phone, "customer_phone", &mut missing),
        customer_email: field(&body.customer_email, "customer_email", &mut missing),
    };

    if !missing.is_empty() {
        return Err(bad_request(format!("missing required fields: {}", missing.join(", "))));
    }

    relay(state.storefront.place_order(request))
}

async fn order_status(
    State(state): State<AppState>,
    Path(order_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    relay(state.storefront.order_status(&order_id))
}

#[derive(Debug, Deserialize)]
struct RecommendationParams {
    product_id: Option<String>,
    customer_id: Option<String>,
}

async fn recommendations(
    State(state): State<AppState>,
    Query(params): Query<RecommendationParams>,
) -> Result<Json<Value>, ApiError> {
    respond(
        state
            .storefront
            .recommendations(params.product_id.as_deref(), params.customer_id.as_deref()),
    )
}

async fn categories(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    respond(state.storefront.categories())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use axum::{Json, Router};
    use panier_agent::testing::{final_answer, ScriptedChatClient};
    use panier_agent::tools::storefront_tools;
    use panier_agent::{SalesAgent, SessionStore};
    use panier_core::catalog::Catalog;
    use panier_core::storefront::Storefront;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::{router, AppState};

    fn app_with_script(responses: Vec<panier_agent::CompletionResponse>) -> (Router, AppState) {
        let storefront = Arc::new(Storefront::new(Catalog::seed()));
        let tools = storefront_tools(Arc::clone(&storefront)).expect("registry builds");
        let client = Arc::new(ScriptedChatClient::new(responses));
        let agent = Arc::new(SalesAgent::new(client, tools, "test-model", 0.0));
        let state = AppState { agent, storefront, sessions: Arc::new(SessionStore::new()) };
        (router(state.clone()), state)
    }

    fn app() -> (Router, AppState) {
        app_with_script(Vec::new())
    }

    async fn send(router: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = router.oneshot(request).await.expect("request handled");
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body readable");
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).expect("request builds")
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .expect("request builds")
    }

    #[tokio::test]
    async fn health_reports_ready() {
        let (router, _) = app();
        let (status, body) = send(router, get("/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ready");
        assert_eq!(body["service"], "panier-server");
    }

    #[tokio::test]
    async fn search_requires_a_query() {
        let (router, _) = app();
        let (status, body) = send(router, get("/products/search")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().expect("error message").contains("q"));
    }

    #[tokio::test]
    async fn search_returns_matches_with_count() {
        let (router, _) = app();
        let (status, body) = send(router, get("/products/search?q=fruits")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["count"], 2);
        assert_eq!(body["products"].as_array().expect("products").len(), 2);
    }

    #[tokio::test]
    async fn unknown_product_is_a_business_error_not_a_http_failure() {
        let (router, _) = app();
        let (status, body) = send(router, get("/products/prod_999")).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["error"].as_str().expect("error").contains("prod_999"));
    }

    #[tokio::test]
    async fn product_details_returns_the_full_record() {
        let (router, _) = app();
        let (status, body) = send(router, get("/products/prod_004")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["name"], "Country Bread");
        assert_eq!(body["allergens"][0], "gluten");
    }

    #[tokio::test]
    async fn cart_round_trip_add_view_remove() {
        let (router, _) = app();

        let (status, body) = send(
            router.clone(),
            post_json("/cart/c1/add", json!({ "product_id": "prod_001", "quantity": 2 })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["cart_total"], json!(7.0));

        let (status, body) = send(router.clone(), get("/cart/c1")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["item_count"], 1);

        let (status, body) = send(
            router.clone(),
            post_json("/cart/c1/remove", json!({ "product_id": "prod_001" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);

        let (_, body) = send(router, get("/cart/c1")).await;
        assert_eq!(body["item_count"], 0);
    }

    #[tokio::test]
    async fn add_without_a_product_id_is_rejected() {
        let (router, _) = app();
        let (status, body) = send(router, post_json("/cart/c1/add", json!({}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().expect("error").contains("product_id"));
    }

    #[tokio::test]
    async fn add_defaults_to_one_unit() {
        let (router, _) = app();
        send(router.clone(), post_json("/cart/c1/add", json!({ "product_id": "prod_005" }))).await;

        let (_, body) = send(router, get("/cart/c1")).await;
        assert_eq!(body["items"][0]["quantity"], json!(1.0));
    }

    #[tokio::test]
    async fn place_order_reports_every_missing_field_at_once() {
        let (router, _) = app();
        let (status, body) =
            send(router, post_json("/orders", json!({ "customer_id": "c1" }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let message = body["error"].as_str().expect("error");
        for field in ["delivery_address", "customer_name", "customer_phone", "customer_email"] {
            assert!(message.contains(field), "{field} should be reported");
        }
        assert!(!message.contains("customer_id,"), "provided field must not be reported");
    }

    #[tokio::test]
    async fn order_lifecycle_over_http() {
        let (router, _) = app();
        send(router.clone(), post_json("/cart/c1/add", json!({ "product_id": "prod_001", "quantity": 2 })))
            .await;

        let (status, body) = send(
            router.clone(),
            post_json(
                "/orders",
                json!({
                    "customer_id": "c1",
                    "delivery_address": "12 Market Street",
                    "customer_name": "Ada Example",
                    "customer_phone": "+15550100",
                    "customer_email": "ada@example.com",
                }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["order_id"], "CMD-1000");
        assert_eq!(body["order"]["status"], "confirmed");

        let (status, body) = send(router, get("/orders/CMD-1000")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total"], json!(7.0));
    }

    #[tokio::test]
    async fn empty_cart_order_is_a_business_error() {
        let (router, _) = app();
        let (status, body) = send(
            router,
            post_json(
                "/orders",
                json!({
                    "customer_id": "c1",
                    "delivery_address": "12 Market Street",
                    "customer_name": "Ada Example",
                    "customer_phone": "+15550100",
                    "customer_email": "ada@example.com",
                }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["error"].as_str().expect("error").contains("empty"));
    }

    #[tokio::test]
    async fn recommendations_fall_back_to_the_popular_list() {
        let (router, _) = app();
        let (status, body) = send(router, get("/recommendations")).await;
        assert_eq!(status, StatusCode::OK);
        let recs = body["recommendations"].as_array().expect("recommendations");
        assert_eq!(recs.len(), 5);
        assert_eq!(recs[0]["reason"], "Popular product");
    }

    #[tokio::test]
    async fn categories_lists_the_sorted_assortment() {
        let (router, _) = app();
        let (status, body) = send(router, get("/categories")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["categories"][0], "Bakery");
        assert_eq!(body["categories"].as_array().expect("categories").len(), 7);
    }

    #[tokio::test]
    async fn chat_requires_a_message() {
        let (router, _) = app();
        let (status, body) = send(router, post_json("/chat", json!({ "channel": "web" }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().expect("error").contains("message"));
    }

    #[tokio::test]
    async fn chat_relays_the_agent_reply_and_identifies_the_session() {
        let (router, state) = app_with_script(vec![final_answer("Hello! How can I help?")]);

        let (status, body) = send(
            router,
            post_json("/chat", json!({ "message": "hi", "channel": "web", "user_id": "u1" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["response"], "Hello! How can I help?");
        assert_eq!(body["channel"], "web");
        assert_eq!(body["user_id"], "u1");
        assert_eq!(body["customer_id"], "client_web_u1");

        // The exchange is recorded for the next turn.
        assert_eq!(state.sessions.snapshot("web", "u1").history.len(), 2);
    }

    #[tokio::test]
    async fn chat_defaults_channel_and_user() {
        let (router, state) = app_with_script(vec![final_answer("Welcome!")]);

        let (status, body) =
            send(router, post_json("/chat", json!({ "message": "hello" }))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["channel"], "web");
        assert_eq!(body["user_id"], "default");
        assert_eq!(body["customer_id"], "client_web_default");
        assert_eq!(state.sessions.len(), 1);
    }

    #[test]
    fn unserializable_response_maps_to_an_internal_error() {
        // JSON object keys must be strings; a tuple-keyed map cannot
        // serialize, so this exercises the serialization-failure arm.
        let mut payload = std::collections::BTreeMap::new();
        payload.insert((1u8, 2u8), "x");

        let (status, Json(body)) = super::respond(payload).expect_err("tuple keys do not serialize");
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body["error"].as_str().expect("error").contains("serialization"));
    }

    #[tokio::test]
    async fn exhausted_completion_backend_is_an_internal_error() {
        let (router, _) = app_with_script(Vec::new());

        let (status, body) =
            send(router, post_json("/chat", json!({ "message": "hi" }))).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body["error"].is_string());
    }
}
