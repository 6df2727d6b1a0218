use std::collections::BTreeMap;
use std::sync::Arc;

use parley_core::domain::message::{ClassificationResult, Entities, EntityValue, InboundMessage};
use parley_core::errors::ServiceError;
use serde::Deserialize;
use serde_json::Value;

use crate::client::{EndpointConfig, ResponseBody, ServiceClient};

pub const CLASSIFIER_ENDPOINT: &str = "classifier";

/// Adapter over a Wit.ai-style `GET /message?q=` classification endpoint.
pub struct IntentClassifier {
    client: Arc<dyn ServiceClient>,
    endpoint: EndpointConfig,
    api_version: Option<String>,
}

impl IntentClassifier {
    pub fn new(client: Arc<dyn ServiceClient>, endpoint: EndpointConfig) -> Self {
        Self { client, endpoint, api_version: None }
    }

    pub fn with_api_version(mut self, api_version: Option<String>) -> Self {
        self.api_version = api_version;
        self
    }

    pub async fn classify(
        &self,
        message: &InboundMessage,
    ) -> Result<ClassificationResult, ServiceError> {
        let mut params = vec![("q", message.text.as_str())];
        if let Some(version) = self.api_version.as_deref() {
            params.push(("v", version));
        }

        let body = self.client.call(&self.endpoint, &params).await?;
        parse_classification(&self.endpoint.name, body)
    }
}

#[derive(Debug, Deserialize)]
struct WireClassification {
    #[serde(default)]
    intents: Vec<WireIntent>,
    #[serde(default)]
    entities: BTreeMap<String, Vec<WireEntity>>,
}

#[derive(Debug, Deserialize)]
struct WireIntent {
    name: String,
}

#[derive(Debug, Deserialize)]
struct WireEntity {
    #[serde(default)]
    value: Option<Value>,
}

/// Keeps the classifier's own ranking: the first intent candidate wins.
fn parse_classification(
    endpoint: &str,
    body: ResponseBody,
) -> Result<ClassificationResult, ServiceError> {
    let wire = serde_json::from_value::<WireClassification>(body)
        .map_err(|error| ServiceError::malformed(endpoint, error.to_string()))?;

    let intent = wire.intents.into_iter().next().map(|intent| intent.name).unwrap_or_default();
    let entities = wire
        .entities
        .into_iter()
        .map(|(name, values)| {
            let values = values
                .into_iter()
                .filter_map(|entity| entity.value.map(entity_text))
                .map(EntityValue::new)
                .collect::<Vec<_>>();
            (name, values)
        })
        .collect::<Entities>();

    Ok(ClassificationResult { intent, entities })
}

fn entity_text(value: Value) -> String {
    match value {
        Value::String(text) => text,
        other => other.to_string(),
    }
}
