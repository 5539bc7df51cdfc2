//! Webhook adapters for telephony providers.
//!
//! SMS and voice payloads accept both the provider's capitalized field names
//! and their snake_case equivalents, so the same handler serves provider
//! callbacks and local testing.

use axum::extract::State;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::routes::{bad_request, run_turn, ApiError, AppState};

const VOICE_GREETING: &str = "Hello! I am your virtual assistant. How can I help you today?";

#[derive(Debug, Deserialize)]
pub struct SmsPayload {
    #[serde(alias = "From")]
    from: Option<String>,
    #[serde(alias = "Body")]
    body: Option<String>,
}

pub async fn sms(
    State(state): State<AppState>,
    Json(payload): Json<SmsPayload>,
) -> Result<Json<Value>, ApiError> {
    let (Some(phone), Some(message)) = (payload.from, payload.body) else {
        return Err(bad_request("from and body are required"));
    };

    let reply = run_turn(&state, "sms", &phone, &message).await?;
    Ok(Json(json!({ "response": reply, "to": phone })))
}

#[derive(Debug, Deserialize)]
pub struct VoicePayload {
    #[serde(alias = "CallSid")]
    call_id: Option<String>,
    #[serde(alias = "TranscriptionText")]
    transcription: Option<String>,
}

/// A call without a transcription is the initial callback; it is answered
/// with a greeting and a prompt to gather speech.
pub async fn voice(
    State(state): State<AppState>,
    Json(payload): Json<VoicePayload>,
) -> Result<Json<Value>, ApiError> {
    let Some(transcription) = payload.transcription.filter(|t| !t.trim().is_empty()) else {
        return Ok(Json(json!({ "action": "gather", "message": VOICE_GREETING })));
    };

    let call_id = payload.call_id.unwrap_or_else(|| "unknown-call".to_string());
    let reply = run_turn(&state, "voice", &call_id, &transcription).await?;
    Ok(Json(json!({ "response": reply, "action": "say", "call_id": call_id })))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use axum::Router;
    use panier_agent::testing::{final_answer, ScriptedChatClient};
    use panier_agent::tools::storefront_tools;
    use panier_agent::{SalesAgent, SessionStore};
    use panier_core::catalog::Catalog;
    use panier_core::storefront::Storefront;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::routes::{router, AppState};

    fn app(replies: Vec<&str>) -> (Router, AppState) {
        let storefront = Arc::new(Storefront::new(Catalog::seed()));
        let tools = storefront_tools(Arc::clone(&storefront)).expect("registry builds");
        let client =
            Arc::new(ScriptedChatClient::new(replies.into_iter().map(final_answer).collect()));
        let agent = Arc::new(SalesAgent::new(client, tools, "test-model", 0.0));
        let state = AppState { agent, storefront, sessions: Arc::new(SessionStore::new()) };
        (router(state.clone()), state)
    }

    async fn post(router: Router, uri: &str, body: Value) -> (StatusCode, Value) {
        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .expect("request builds");
        let response = router.oneshot(request).await.expect("request handled");
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body readable");
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    #[tokio::test]
    async fn sms_accepts_provider_field_names() {
        let (router, state) = app(vec!["Sure, we have apples."]);

        let (status, body) = post(
            router,
            "/sms/webhook",
            json!({ "From": "+15550100", "Body": "do you have apples?" }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["response"], "Sure, we have apples.");
        assert_eq!(body["to"], "+15550100");

        let session = state.sessions.snapshot("sms", "+15550100");
        assert_eq!(session.customer_id, "client_sms_+15550100");
        assert_eq!(session.history.len(), 2);
    }

    #[tokio::test]
    async fn sms_accepts_snake_case_field_names() {
        let (router, _) = app(vec!["Hello!"]);

        let (status, body) =
            post(router, "/sms/webhook", json!({ "from": "+15550100", "body": "hi" })).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["to"], "+15550100");
    }

    #[tokio::test]
    async fn sms_without_sender_or_body_is_rejected() {
        let (router, _) = app(vec![]);

        let (status, body) = post(router, "/sms/webhook", json!({ "From": "+15550100" })).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().expect("error").contains("body"));
    }

    #[tokio::test]
    async fn voice_call_without_transcription_gets_the_greeting() {
        let (router, state) = app(vec![]);

        let (status, body) =
            post(router, "/voice/webhook", json!({ "CallSid": "CA123" })).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["action"], "gather");
        assert!(body["message"].as_str().expect("greeting").contains("virtual assistant"));
        // The greeting turn does not touch the agent or create a session.
        assert!(state.sessions.is_empty());
    }

    #[tokio::test]
    async fn voice_transcription_is_answered_with_a_say_action() {
        let (router, state) = app(vec!["We have fresh salmon today."]);

        let (status, body) = post(
            router,
            "/voice/webhook",
            json!({ "CallSid": "CA123", "TranscriptionText": "what fish do you have?" }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["action"], "say");
        assert_eq!(body["call_id"], "CA123");
        assert_eq!(body["response"], "We have fresh salmon today.");
        assert_eq!(state.sessions.snapshot("voice", "CA123").customer_id, "client_voice_CA123");
    }

    #[tokio::test]
    async fn voice_transcription_without_a_call_id_still_answers() {
        let (router, _) = app(vec!["Of course."]);

        let (status, body) =
            post(router, "/voice/webhook", json!({ "transcription": "hello" })).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["call_id"], "unknown-call");
    }
}
