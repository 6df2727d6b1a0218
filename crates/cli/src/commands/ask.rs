use std::sync::Arc;

use anyhow::Context;
use parley_agent::client::HttpServiceClient;
use parley_agent::runtime::AgentRuntime;
use parley_core::config::{AppConfig, LoadOptions};

use crate::commands::CommandResult;

const COMMAND: &str = "ask";

/// Runs one message through the same dispatch path the server uses.
///
/// Upstream failures are part of the reply (the apology text), so they still
/// exit 0. Only local setup problems are reported as command failures.
pub fn run(text: &str) -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(COMMAND, "config_validation", error.to_string(), 2)
        }
    };

    let client = Arc::new(HttpServiceClient::new(config.http.timeout_ms));
    let agent_runtime = match AgentRuntime::from_config(client, &config) {
        Ok(agent_runtime) => agent_runtime,
        Err(error) => {
            return CommandResult::failure(
                COMMAND,
                "reply_templates",
                format!("reply templates failed to compile: {error}"),
                3,
            )
        }
    };

    match dispatch(&agent_runtime, text) {
        Ok(response) => CommandResult::reply(COMMAND, response),
        Err(error) => CommandResult::failure(COMMAND, "runtime", format!("{error:#}"), 4),
    }
}

fn dispatch(agent_runtime: &AgentRuntime, text: &str) -> anyhow::Result<String> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to initialize async runtime")?;

    let reply = runtime.block_on(agent_runtime.handle_message(text));
    Ok(reply.response)
}
