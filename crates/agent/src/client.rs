use std::time::{Duration, Instant};

use async_trait::async_trait;
use parley_core::errors::ServiceError;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use tracing::{debug, warn};

pub type ResponseBody = Value;

/// How an endpoint's credential is attached to the outbound request.
#[derive(Clone, Debug)]
pub enum Credential {
    None,
    Bearer(SecretString),
    QueryParam { name: String, value: SecretString },
}

#[derive(Clone, Debug)]
pub struct EndpointConfig {
    pub name: String,
    pub base_url: String,
    pub credential: Credential,
}

impl EndpointConfig {
    pub fn new(name: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self { name: name.into(), base_url: base_url.into(), credential: Credential::None }
    }

    pub fn with_credential(mut self, credential: Credential) -> Self {
        self.credential = credential;
        self
    }
}

#[async_trait]
pub trait ServiceClient: Send + Sync {
    async fn call(
        &self,
        endpoint: &EndpointConfig,
        params: &[(&str, &str)],
    ) -> Result<ResponseBody, ServiceError>;
}

/// `GET`s a JSON endpoint with the configured per-call timeout. No retries.
#[derive(Clone, Debug)]
pub struct HttpServiceClient {
    client: Client,
    timeout: Duration,
}

impl HttpServiceClient {
    pub fn new(timeout_ms: u64) -> Self {
        Self::with_client(Client::new(), timeout_ms)
    }

    pub fn with_client(client: Client, timeout_ms: u64) -> Self {
        Self { client, timeout: Duration::from_millis(timeout_ms) }
    }

    pub fn timeout_ms(&self) -> u64 {
        u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX)
    }

    fn transport_error(&self, endpoint: &EndpointConfig, error: reqwest::Error) -> ServiceError {
        // Query strings may carry credentials.
        let error = error.without_url();
        if error.is_timeout() {
            ServiceError::Timeout { endpoint: endpoint.name.clone(), timeout_ms: self.timeout_ms() }
        } else {
            ServiceError::Unreachable { endpoint: endpoint.name.clone(), detail: error.to_string() }
        }
    }
}

#[async_trait]
impl ServiceClient for HttpServiceClient {
    async fn call(
        &self,
        endpoint: &EndpointConfig,
        params: &[(&str, &str)],
    ) -> Result<ResponseBody, ServiceError> {
        let started = Instant::now();
        let mut request = self.client.get(&endpoint.base_url).query(params).timeout(self.timeout);
        match &endpoint.credential {
            Credential::None => {}
            Credential::Bearer(token) => {
                request = request.bearer_auth(token.expose_secret());
            }
            Credential::QueryParam { name, value } => {
                request = request.query(&[(name.as_str(), value.expose_secret())]);
            }
        }

        let response = match request.send().await {
            Ok(response) => response,
            Err(error) => {
                let error = self.transport_error(endpoint, error);
                warn!(
                    event_name = "agent.client.transport_failed",
                    endpoint = %endpoint.name,
                    error_kind = error.kind().as_str(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    error = %error,
                    "outbound call failed before a response was received"
                );
                return Err(error);
            }
        };

        let status = response.status();
        if !status.is_success() {
            warn!(
                event_name = "agent.client.bad_status",
                endpoint = %endpoint.name,
                status = status.as_u16(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                "outbound call returned a non-success status"
            );
            return Err(ServiceError::BadStatus {
                endpoint: endpoint.name.clone(),
                status: status.as_u16(),
            });
        }

        let bytes =
            response.bytes().await.map_err(|error| self.transport_error(endpoint, error))?;
        let body = serde_json::from_slice::<Value>(&bytes)
            .map_err(|error| ServiceError::malformed(&endpoint.name, error.to_string()))?;

        debug!(
            event_name = "agent.client.completed",
            endpoint = %endpoint.name,
            status = status.as_u16(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "outbound call completed"
        );
        Ok(body)
    }
}
