pub mod ask;
pub mod config;
pub mod doctor;

use serde::Serialize;
use serde_json::json;

#[derive(Debug, Clone)]
pub struct CommandResult {
    pub exit_code: u8,
    pub output: String,
}

#[derive(Clone, Copy, Debug, Serialize)]
#[serde(rename_all = "snake_case")]
enum CommandStatus {
    Ok,
    Error,
}

/// One JSON line per command. Replies carry `response`; failures carry
/// `error_class` and `message`.
#[derive(Debug, Serialize)]
struct CommandOutcome<'a> {
    command: &'a str,
    status: CommandStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    response: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error_class: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
}

impl CommandResult {
    pub fn reply(command: &str, response: impl Into<String>) -> Self {
        let payload = CommandOutcome {
            command,
            status: CommandStatus::Ok,
            response: Some(response.into()),
            error_class: None,
            message: None,
        };
        Self { exit_code: 0, output: serialize_payload(&payload) }
    }

    pub fn failure(
        command: &str,
        error_class: &str,
        message: impl Into<String>,
        exit_code: u8,
    ) -> Self {
        let payload = CommandOutcome {
            command,
            status: CommandStatus::Error,
            response: None,
            error_class: Some(error_class),
            message: Some(message.into()),
        };
        Self { exit_code, output: serialize_payload(&payload) }
    }
}

fn serialize_payload(payload: &CommandOutcome<'_>) -> String {
    serde_json::to_string(payload).unwrap_or_else(|error| {
        json!({
            "command": payload.command,
            "status": "error",
            "error_class": "serialization",
            "message": error.to_string(),
        })
        .to_string()
    })
}
