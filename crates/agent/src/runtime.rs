use std::sync::Arc;

use parley_core::config::AppConfig;
use parley_core::domain::message::{ClassificationResult, HandlerOutcome, InboundMessage};
use parley_core::errors::HandlerError;
use serde::Serialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::classifier::{IntentClassifier, CLASSIFIER_ENDPOINT};
use crate::client::{Credential, EndpointConfig, ServiceClient};
use crate::formatter::ResponseFormatter;
use crate::handlers::{
    GreetingHandler, JokeHandler, WeatherHandler, JOKE_ENDPOINT, WEATHER_ENDPOINT,
};
use crate::registry::HandlerRegistry;
use crate::templates::{ReplyTemplates, TemplateError};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DispatchStage {
    Classifying,
    Handling,
    Formatting,
    Responded,
}

impl DispatchStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Classifying => "classifying",
            Self::Handling => "handling",
            Self::Formatting => "formatting",
            Self::Responded => "responded",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct MessageResponse {
    pub response: String,
}

/// Request dispatcher: classify, run exactly one handler, format.
///
/// Holds no per-request state, so one instance can serve concurrent requests
/// behind an `Arc`. Dropping a pending `dispatch` future abandons the
/// in-flight outbound call and nothing is formatted.
pub struct AgentRuntime {
    classifier: IntentClassifier,
    registry: HandlerRegistry,
    formatter: ResponseFormatter,
}

impl AgentRuntime {
    pub fn new(
        classifier: IntentClassifier,
        registry: HandlerRegistry,
        formatter: ResponseFormatter,
    ) -> Self {
        Self { classifier, registry, formatter }
    }

    /// Wires the classifier and the `greeting`/`weather`/`joke` handlers
    /// against the configured endpoints.
    pub fn from_config(
        client: Arc<dyn ServiceClient>,
        config: &AppConfig,
    ) -> Result<Self, TemplateError> {
        let classifier_endpoint =
            EndpointConfig::new(CLASSIFIER_ENDPOINT, config.classifier.base_url.clone())
                .with_credential(Credential::Bearer(config.classifier.access_token.clone()));
        let weather_endpoint = EndpointConfig::new(WEATHER_ENDPOINT, config.weather.base_url.clone())
            .with_credential(Credential::QueryParam {
                name: "appid".to_string(),
                value: config.weather.api_key.clone(),
            });
        let joke_credential = match &config.joke.api_key {
            Some(api_key) => Credential::Bearer(api_key.clone()),
            None => Credential::None,
        };
        let joke_endpoint = EndpointConfig::new(JOKE_ENDPOINT, config.joke.base_url.clone())
            .with_credential(joke_credential);

        let classifier = IntentClassifier::new(client.clone(), classifier_endpoint)
            .with_api_version(config.classifier.api_version.clone());

        let mut registry = HandlerRegistry::new();
        registry.register(GreetingHandler);
        registry.register(WeatherHandler::new(
            client.clone(),
            weather_endpoint,
            config.weather.units,
            ReplyTemplates::new()?,
        ));
        registry.register(JokeHandler::new(client, joke_endpoint));

        Ok(Self::new(classifier, registry, ResponseFormatter))
    }

    pub fn registry(&self) -> &HandlerRegistry {
        &self.registry
    }

    pub async fn handle_message(&self, text: &str) -> MessageResponse {
        let correlation_id = Uuid::new_v4().to_string();
        let response = self.dispatch(&InboundMessage::new(text), &correlation_id).await;
        MessageResponse { response }
    }

    pub async fn dispatch(&self, message: &InboundMessage, correlation_id: &str) -> String {
        trace_stage(DispatchStage::Classifying, correlation_id);
        let outcome = match self.classifier.classify(message).await {
            Ok(classification) => {
                trace_stage(DispatchStage::Handling, correlation_id);
                self.run_handler(&classification, correlation_id).await
            }
            Err(error) => {
                warn!(
                    event_name = "agent.dispatch.classification_failed",
                    correlation_id,
                    error_kind = error.kind().as_str(),
                    error = %error,
                    "classification failed; skipping handler"
                );
                Err(HandlerError::Upstream(error))
            }
        };

        trace_stage(DispatchStage::Formatting, correlation_id);
        let succeeded = outcome.is_ok();
        let response = self.formatter.format(outcome);

        trace_stage(DispatchStage::Responded, correlation_id);
        info!(
            event_name = "agent.dispatch.responded",
            correlation_id,
            succeeded,
            "message dispatch completed"
        );
        response
    }

    async fn run_handler(
        &self,
        classification: &ClassificationResult,
        correlation_id: &str,
    ) -> Result<HandlerOutcome, HandlerError> {
        let handler = self.registry.resolve(&classification.intent);
        debug!(
            event_name = "agent.dispatch.handler_resolved",
            correlation_id,
            intent = %classification.intent,
            handler = handler.intent(),
            "handler resolved for intent"
        );

        let outcome = handler.execute(classification).await;
        if let Err(error) = &outcome {
            warn!(
                event_name = "agent.dispatch.handler_failed",
                correlation_id,
                handler = handler.intent(),
                error_kind = %error.kind(),
                error = %error,
                "handler failed; responding with apology"
            );
        }
        outcome
    }
}

fn trace_stage(stage: DispatchStage, correlation_id: &str) {
    debug!(
        event_name = "agent.dispatch.stage",
        correlation_id,
        stage = stage.as_str(),
        "dispatch stage entered"
    );
}
