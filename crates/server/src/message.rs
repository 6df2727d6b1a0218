//! `POST /message`: one chat message in, one reply out.

use std::sync::Arc;
use std::time::Duration;

use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use parley_agent::runtime::{AgentRuntime, MessageResponse};
use parley_core::domain::message::InboundMessage;
use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

#[derive(Clone)]
pub struct MessageState {
    agent_runtime: Arc<AgentRuntime>,
    request_timeout: Duration,
}

impl MessageState {
    pub fn new(agent_runtime: Arc<AgentRuntime>, request_timeout_ms: u64) -> Self {
        Self { agent_runtime, request_timeout: Duration::from_millis(request_timeout_ms) }
    }
}

#[derive(Debug, Deserialize)]
pub struct MessageRequest {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct MessageError {
    pub error: String,
    pub correlation_id: String,
}

pub fn router(state: MessageState) -> Router {
    Router::new().route("/message", post(handle_message)).with_state(state)
}

pub async fn handle_message(
    State(state): State<MessageState>,
    Json(request): Json<MessageRequest>,
) -> Result<Json<MessageResponse>, (StatusCode, Json<MessageError>)> {
    let correlation_id = Uuid::new_v4().to_string();
    let message = InboundMessage::new(request.message);

    // On expiry the dispatch future is dropped along with any pending call.
    match tokio::time::timeout(
        state.request_timeout,
        state.agent_runtime.dispatch(&message, &correlation_id),
    )
    .await
    {
        Ok(response) => Ok(Json(MessageResponse { response })),
        Err(_) => {
            warn!(
                event_name = "server.message.timed_out",
                correlation_id = %correlation_id,
                timeout_ms = state.request_timeout.as_millis() as u64,
                "message dispatch exceeded the request timeout"
            );
            Err((
                StatusCode::GATEWAY_TIMEOUT,
                Json(MessageError {
                    error: "message handling timed out".to_string(),
                    correlation_id,
                }),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use async_trait::async_trait;
    use axum::{
        body::{to_bytes, Body},
        http::{header::CONTENT_TYPE, Request, StatusCode},
    };
    use parley_agent::classifier::CLASSIFIER_ENDPOINT;
    use parley_agent::client::{EndpointConfig, ResponseBody, ServiceClient};
    use parley_agent::formatter::APOLOGY_TEXT;
    use parley_agent::handlers::{GREETING_TEXT, WEATHER_ENDPOINT};
    use parley_agent::runtime::AgentRuntime;
    use parley_agent::scripted::ScriptedServiceClient;
    use parley_core::config::AppConfig;
    use parley_core::errors::ServiceError;
    use serde_json::{json, Value};
    use tower::ServiceExt;
    use uuid::Uuid;

    use super::{router, MessageState};

    fn config() -> AppConfig {
        let mut config = AppConfig::default();
        config.classifier.access_token = "wit-test".to_string().into();
        config.weather.api_key = "owm-test".to_string().into();
        config
    }

    fn state(client: Arc<dyn ServiceClient>, request_timeout_ms: u64) -> MessageState {
        let runtime = AgentRuntime::from_config(client, &config()).expect("runtime builds");
        MessageState::new(Arc::new(runtime), request_timeout_ms)
    }

    async fn post_message(state: MessageState, body: Value) -> (StatusCode, Value) {
        let request = Request::builder()
            .method("POST")
            .uri("/message")
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .expect("request builds");

        let response = router(state).oneshot(request).await.expect("router responds");
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("body reads");
        let payload = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, payload)
    }

    #[tokio::test]
    async fn post_message_returns_response_field() {
        let client = Arc::new(ScriptedServiceClient::new().respond(
            CLASSIFIER_ENDPOINT,
            json!({ "intents": [{ "name": "greeting" }], "entities": {} }),
        ));

        let (status, payload) =
            post_message(state(client, 1_000), json!({ "message": "hello" })).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(payload, json!({ "response": GREETING_TEXT }));
    }

    #[tokio::test]
    async fn upstream_failures_still_answer_ok_with_apology() {
        let client = Arc::new(
            ScriptedServiceClient::new()
                .respond(
                    CLASSIFIER_ENDPOINT,
                    json!({
                        "intents": [{ "name": "weather" }],
                        "entities": { "location": [{ "value": "Paris" }] }
                    }),
                )
                .fail(
                    WEATHER_ENDPOINT,
                    ServiceError::Unreachable {
                        endpoint: WEATHER_ENDPOINT.to_string(),
                        detail: "dns failure".to_string(),
                    },
                ),
        );

        let (status, payload) =
            post_message(state(client, 1_000), json!({ "message": "weather in Paris" })).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(payload["response"], APOLOGY_TEXT);
    }

    #[tokio::test]
    async fn missing_message_field_is_rejected() {
        let client = Arc::new(ScriptedServiceClient::new());

        let (status, _) = post_message(state(client.clone(), 1_000), json!({ "text": "hi" })).await;

        assert!(status.is_client_error());
        assert!(client.calls().is_empty());
    }

    struct StalledClient {
        completed: AtomicBool,
        seen_text: Mutex<Option<String>>,
    }

    #[async_trait]
    impl ServiceClient for StalledClient {
        async fn call(
            &self,
            _endpoint: &EndpointConfig,
            params: &[(&str, &str)],
        ) -> Result<ResponseBody, ServiceError> {
            if let Ok(mut seen_text) = self.seen_text.lock() {
                *seen_text =
                    params.iter().find(|(key, _)| *key == "q").map(|(_, text)| text.to_string());
            }
            tokio::time::sleep(Duration::from_secs(5)).await;
            self.completed.store(true, Ordering::SeqCst);
            Ok(json!({ "intents": [{ "name": "greeting" }] }))
        }
    }

    #[tokio::test]
    async fn request_timeout_abandons_pending_call_without_reply_text() {
        let client = Arc::new(StalledClient {
            completed: AtomicBool::new(false),
            seen_text: Mutex::new(None),
        });

        let (status, payload) =
            post_message(state(client.clone(), 50), json!({ "message": "hello" })).await;

        assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(payload["response"], Value::Null);
        assert!(!client.completed.load(Ordering::SeqCst));
        assert_eq!(*client.seen_text.lock().expect("lock"), Some("hello".to_owned()));
        let correlation_id = payload["correlation_id"].as_str().unwrap_or_default();
        assert!(Uuid::parse_str(correlation_id).is_ok(), "bad correlation id: {payload}");
    }
}
