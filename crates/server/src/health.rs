use std::sync::Arc;

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use chrono::Utc;
use parley_agent::runtime::AgentRuntime;
use serde::Serialize;

#[derive(Clone)]
pub struct HealthState {
    agent_runtime: Arc<AgentRuntime>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthCheck {
    pub status: &'static str,
    pub detail: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: HealthCheck,
    pub handlers: HealthCheck,
    pub checked_at: String,
}

pub fn router(agent_runtime: Arc<AgentRuntime>) -> Router {
    Router::new().route("/health", get(health)).with_state(HealthState { agent_runtime })
}

pub async fn health(State(state): State<HealthState>) -> (StatusCode, Json<HealthResponse>) {
    let handlers = handlers_check(&state.agent_runtime);
    let ready = handlers.status == "ready";

    let payload = HealthResponse {
        status: if ready { "ready" } else { "degraded" },
        service: HealthCheck {
            status: "ready",
            detail: "parley-server runtime initialized".to_string(),
        },
        handlers,
        checked_at: Utc::now().to_rfc3339(),
    };

    let status_code = if ready { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    (status_code, Json(payload))
}

fn handlers_check(agent_runtime: &AgentRuntime) -> HealthCheck {
    let registry = agent_runtime.registry();
    if registry.is_empty() {
        return HealthCheck {
            status: "degraded",
            detail: "no intent handlers registered; every message gets the fallback reply"
                .to_string(),
        };
    }

    HealthCheck {
        status: "ready",
        detail: format!("intents: {}", registry.intents().join(", ")),
    }
}
