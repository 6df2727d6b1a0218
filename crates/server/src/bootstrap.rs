use std::sync::Arc;

use parley_agent::client::HttpServiceClient;
use parley_agent::runtime::AgentRuntime;
use parley_agent::templates::TemplateError;
use parley_core::config::{AppConfig, ConfigError};
use thiserror::Error;
use tracing::info;

pub struct Application {
    pub config: AppConfig,
    pub agent_runtime: Arc<AgentRuntime>,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("reply templates failed to compile: {0}")]
    Templates(#[source] TemplateError),
}

pub fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        "starting application bootstrap"
    );
    let client = Arc::new(HttpServiceClient::new(config.http.timeout_ms));
    let agent_runtime =
        AgentRuntime::from_config(client, &config).map_err(BootstrapError::Templates)?;
    info!(
        event_name = "system.bootstrap.runtime_ready",
        correlation_id = "bootstrap",
        intents = ?agent_runtime.registry().intents(),
        timeout_ms = config.http.timeout_ms,
        "agent runtime initialized"
    );

    Ok(Application { config, agent_runtime: Arc::new(agent_runtime) })
}

#[cfg(test)]
mod tests {
    use parley_core::config::{AppConfig, ConfigOverrides, LoadOptions};

    use crate::bootstrap::{bootstrap_with_config, Application, BootstrapError};

    fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
        let config = AppConfig::load(options)?;
        bootstrap_with_config(config)
    }

    #[test]
    fn bootstrap_fails_fast_without_classifier_token() {
        let result = bootstrap(LoadOptions {
            overrides: ConfigOverrides {
                classifier_access_token: Some("   ".to_string()),
                weather_api_key: Some("owm-valid".to_string()),
                ..ConfigOverrides::default()
            },
            ..LoadOptions::default()
        });

        let message = match result {
            Ok(_) => String::new(),
            Err(error) => error.to_string(),
        };
        assert!(message.contains("classifier.access_token"));
    }

    #[test]
    fn bootstrap_registers_standard_intents() {
        let app = bootstrap(LoadOptions {
            overrides: ConfigOverrides {
                classifier_access_token: Some("wit-test".to_string()),
                weather_api_key: Some("owm-test".to_string()),
                http_timeout_ms: Some(750),
                ..ConfigOverrides::default()
            },
            ..LoadOptions::default()
        })
        .expect("bootstrap should succeed with valid overrides");

        assert_eq!(app.config.http.timeout_ms, 750);
        assert_eq!(app.agent_runtime.registry().intents(), vec!["greeting", "joke", "weather"]);
    }
}
