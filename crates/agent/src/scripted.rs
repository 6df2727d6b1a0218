use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use parley_core::errors::ServiceError;

use crate::client::{EndpointConfig, ResponseBody, ServiceClient};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecordedCall {
    pub endpoint: String,
    pub params: Vec<(String, String)>,
}

/// In-memory `ServiceClient` that answers each endpoint name with a fixed
/// result and records every call it receives.
#[derive(Debug, Default)]
pub struct ScriptedServiceClient {
    responses: HashMap<String, Result<ResponseBody, ServiceError>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl ScriptedServiceClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(mut self, endpoint: impl Into<String>, body: ResponseBody) -> Self {
        self.responses.insert(endpoint.into(), Ok(body));
        self
    }

    pub fn fail(mut self, endpoint: impl Into<String>, error: ServiceError) -> Self {
        self.responses.insert(endpoint.into(), Err(error));
        self
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().map(|calls| calls.clone()).unwrap_or_default()
    }

    pub fn calls_to(&self, endpoint: &str) -> Vec<RecordedCall> {
        self.calls().into_iter().filter(|call| call.endpoint == endpoint).collect()
    }
}

#[async_trait]
impl ServiceClient for ScriptedServiceClient {
    async fn call(
        &self,
        endpoint: &EndpointConfig,
        params: &[(&str, &str)],
    ) -> Result<ResponseBody, ServiceError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(RecordedCall {
                endpoint: endpoint.name.clone(),
                params: params
                    .iter()
                    .map(|(key, value)| ((*key).to_owned(), (*value).to_owned()))
                    .collect(),
            });
        }

        self.responses.get(&endpoint.name).cloned().unwrap_or_else(|| {
            Err(ServiceError::Unreachable {
                endpoint: endpoint.name.clone(),
                detail: "no scripted response".to_owned(),
            })
        })
    }
}
