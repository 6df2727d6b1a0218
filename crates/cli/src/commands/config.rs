use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use parley_core::config::{AppConfig, LoadOptions};
use secrecy::{ExposeSecret, SecretString};
use toml::Value;

struct ConfigField {
    key_path: &'static str,
    env_keys: &'static [&'static str],
    value: String,
}

impl ConfigField {
    /// `env_keys` lists the variable and any aliases the loader accepts, in
    /// lookup order.
    fn new(
        key_path: &'static str,
        env_keys: &'static [&'static str],
        value: impl Into<String>,
    ) -> Self {
        Self { key_path, env_keys, value: value.into() }
    }
}

pub fn run() -> String {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let config_file_path = detect_config_path();
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());

    let mut lines =
        vec!["effective config (source precedence: env > file > default):".to_string()];
    for field in effective_fields(&config) {
        let source = field_source(
            field.key_path,
            field.env_keys,
            config_file_doc.as_ref(),
            config_file_path.as_deref(),
        );
        lines.push(render_line(field.key_path, &field.value, source));
    }

    lines.join("\n")
}

fn effective_fields(config: &AppConfig) -> Vec<ConfigField> {
    vec![
        ConfigField::new(
            "classifier.base_url",
            &["PARLEY_CLASSIFIER_BASE_URL"],
            config.classifier.base_url.as_str(),
        ),
        ConfigField::new(
            "classifier.access_token",
            &["PARLEY_CLASSIFIER_ACCESS_TOKEN"],
            redact_token(config.classifier.access_token.expose_secret()),
        ),
        ConfigField::new(
            "classifier.api_version",
            &["PARLEY_CLASSIFIER_API_VERSION"],
            config.classifier.api_version.as_deref().unwrap_or("<unset>"),
        ),
        ConfigField::new(
            "weather.base_url",
            &["PARLEY_WEATHER_BASE_URL"],
            config.weather.base_url.as_str(),
        ),
        ConfigField::new(
            "weather.api_key",
            &["PARLEY_WEATHER_API_KEY"],
            redact_token(config.weather.api_key.expose_secret()),
        ),
        ConfigField::new(
            "weather.units",
            &["PARLEY_WEATHER_UNITS"],
            config.weather.units.as_query(),
        ),
        ConfigField::new(
            "joke.base_url",
            &["PARLEY_JOKE_BASE_URL"],
            config.joke.base_url.as_str(),
        ),
        ConfigField::new(
            "joke.api_key",
            &["PARLEY_JOKE_API_KEY"],
            redact_optional(config.joke.api_key.as_ref()),
        ),
        ConfigField::new(
            "http.timeout_ms",
            &["PARLEY_HTTP_TIMEOUT_MS"],
            config.http.timeout_ms.to_string(),
        ),
        ConfigField::new(
            "server.bind_address",
            &["PARLEY_SERVER_BIND_ADDRESS"],
            config.server.bind_address.as_str(),
        ),
        ConfigField::new("server.port", &["PARLEY_SERVER_PORT"], config.server.port.to_string()),
        ConfigField::new(
            "server.request_timeout_ms",
            &["PARLEY_SERVER_REQUEST_TIMEOUT_MS"],
            config.server.request_timeout_ms.to_string(),
        ),
        ConfigField::new(
            "logging.level",
            &["PARLEY_LOGGING_LEVEL", "PARLEY_LOG_LEVEL"],
            config.logging.level.as_str(),
        ),
        ConfigField::new(
            "logging.format",
            &["PARLEY_LOGGING_FORMAT", "PARLEY_LOG_FORMAT"],
            format!("{:?}", config.logging.format),
        ),
    ]
}

fn detect_config_path() -> Option<PathBuf> {
    ["parley.toml", "config/parley.toml"].into_iter().map(PathBuf::from).find(|path| path.exists())
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let raw = fs::read_to_string(path?).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_keys: &[&str],
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if let Some(env_key) = env_keys.iter().find(|key| env::var_os(key).is_some()) {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}

fn redact_optional(secret: Option<&SecretString>) -> String {
    match secret {
        Some(secret) => redact_token(secret.expose_secret()),
        None => "<unset>".to_string(),
    }
}

/// Keeps a short prefix such as `wit-` so operators can tell credentials
/// apart, and hides everything else.
fn redact_token(token: &str) -> String {
    let trimmed = token.trim();
    if trimmed.is_empty() {
        return "<empty>".to_string();
    }

    if let Some((prefix, _)) = trimmed.split_once('-') {
        return format!("{prefix}-***");
    }

    "<redacted>".to_string()
}
