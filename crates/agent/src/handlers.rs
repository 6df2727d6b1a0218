use std::sync::Arc;

use async_trait::async_trait;
use parley_core::config::WeatherUnits;
use parley_core::domain::message::{ClassificationResult, HandlerOutcome};
use parley_core::errors::{HandlerError, ServiceError};
use serde_json::Value;

use crate::client::{EndpointConfig, ResponseBody, ServiceClient};
use crate::templates::ReplyTemplates;

pub const GREETING_INTENT: &str = "greeting";
pub const WEATHER_INTENT: &str = "weather";
pub const JOKE_INTENT: &str = "joke";
pub const FALLBACK_INTENT: &str = "fallback";

pub const WEATHER_ENDPOINT: &str = "weather";
pub const JOKE_ENDPOINT: &str = "joke";

pub const LOCATION_ENTITY: &str = "location";

pub const GREETING_TEXT: &str = "Hello! How can I assist you today?";
pub const FALLBACK_TEXT: &str =
    "I'm sorry, I didn't quite understand that. Can you please rephrase?";

/// Logic for one intent label. Makes at most one outbound call.
#[async_trait]
pub trait Handler: Send + Sync {
    fn intent(&self) -> &'static str;
    async fn execute(
        &self,
        classification: &ClassificationResult,
    ) -> Result<HandlerOutcome, HandlerError>;
}

#[derive(Clone, Debug, Default)]
pub struct GreetingHandler;

#[async_trait]
impl Handler for GreetingHandler {
    fn intent(&self) -> &'static str {
        GREETING_INTENT
    }

    async fn execute(
        &self,
        _classification: &ClassificationResult,
    ) -> Result<HandlerOutcome, HandlerError> {
        Ok(HandlerOutcome::new(GREETING_TEXT))
    }
}

#[derive(Clone, Debug, Default)]
pub struct FallbackHandler;

#[async_trait]
impl Handler for FallbackHandler {
    fn intent(&self) -> &'static str {
        FALLBACK_INTENT
    }

    async fn execute(
        &self,
        _classification: &ClassificationResult,
    ) -> Result<HandlerOutcome, HandlerError> {
        Ok(HandlerOutcome::new(FALLBACK_TEXT))
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct WeatherReport {
    pub description: String,
    pub temperature: f64,
}

impl WeatherReport {
    /// Reads `weather[0].description` and `main.temp` (or `main.temperature`).
    pub fn from_body(endpoint: &str, body: &ResponseBody) -> Result<Self, ServiceError> {
        let description = body
            .pointer("/weather/0/description")
            .and_then(Value::as_str)
            .ok_or_else(|| ServiceError::malformed(endpoint, "missing weather[0].description"))?;
        let temperature = body
            .pointer("/main/temp")
            .or_else(|| body.pointer("/main/temperature"))
            .and_then(Value::as_f64)
            .ok_or_else(|| ServiceError::malformed(endpoint, "missing numeric main.temp"))?;

        Ok(Self { description: description.to_owned(), temperature })
    }
}

pub struct WeatherHandler {
    client: Arc<dyn ServiceClient>,
    endpoint: EndpointConfig,
    units: WeatherUnits,
    templates: ReplyTemplates,
}

impl WeatherHandler {
    pub fn new(
        client: Arc<dyn ServiceClient>,
        endpoint: EndpointConfig,
        units: WeatherUnits,
        templates: ReplyTemplates,
    ) -> Self {
        Self { client, endpoint, units, templates }
    }
}

#[async_trait]
impl Handler for WeatherHandler {
    fn intent(&self) -> &'static str {
        WEATHER_INTENT
    }

    async fn execute(
        &self,
        classification: &ClassificationResult,
    ) -> Result<HandlerOutcome, HandlerError> {
        let location = classification
            .first_entity_value(LOCATION_ENTITY)
            .filter(|value| !value.trim().is_empty())
            .ok_or_else(|| HandlerError::MissingEntity(LOCATION_ENTITY.to_owned()))?;

        let body = self
            .client
            .call(&self.endpoint, &[("q", location), ("units", self.units.as_query())])
            .await?;
        let report = WeatherReport::from_body(&self.endpoint.name, &body)?;

        let text = self
            .templates
            .weather_report(location, &report.description, report.temperature, self.units.symbol())
            .map_err(|error| HandlerError::Template(error.to_string()))?;
        Ok(HandlerOutcome::new(text))
    }
}

pub struct JokeHandler {
    client: Arc<dyn ServiceClient>,
    endpoint: EndpointConfig,
}

impl JokeHandler {
    pub fn new(client: Arc<dyn ServiceClient>, endpoint: EndpointConfig) -> Self {
        Self { client, endpoint }
    }
}

#[async_trait]
impl Handler for JokeHandler {
    fn intent(&self) -> &'static str {
        JOKE_INTENT
    }

    async fn execute(
        &self,
        _classification: &ClassificationResult,
    ) -> Result<HandlerOutcome, HandlerError> {
        let body = self.client.call(&self.endpoint, &[]).await?;
        let joke = match &body {
            Value::String(text) => Some(text.as_str()),
            other => other.get("joke").and_then(Value::as_str),
        }
        .ok_or_else(|| ServiceError::malformed(&self.endpoint.name, "missing joke text"))?;

        Ok(HandlerOutcome::new(joke))
    }
}
