use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_CLASSIFIER_URL: &str = "https://api.wit.ai/message";
pub const DEFAULT_WEATHER_URL: &str = "https://api.openweathermap.org/data/2.5/weather";
pub const DEFAULT_JOKE_URL: &str = "https://api.somerandomjokeapi.com/jokes/random";

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub classifier: ClassifierConfig,
    pub weather: WeatherConfig,
    pub joke: JokeConfig,
    pub http: HttpConfig,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct ClassifierConfig {
    pub base_url: String,
    pub access_token: SecretString,
    pub api_version: Option<String>,
}

#[derive(Clone, Debug)]
pub struct WeatherConfig {
    pub base_url: String,
    pub api_key: SecretString,
    pub units: WeatherUnits,
}

#[derive(Clone, Debug)]
pub struct JokeConfig {
    pub base_url: String,
    pub api_key: Option<SecretString>,
}

#[derive(Clone, Debug)]
pub struct HttpConfig {
    pub timeout_ms: u64,
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
    pub request_timeout_ms: u64,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeatherUnits {
    Metric,
    Imperial,
    Standard,
}

impl WeatherUnits {
    pub fn as_query(&self) -> &'static str {
        match self {
            Self::Metric => "metric",
            Self::Imperial => "imperial",
            Self::Standard => "standard",
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Self::Metric => "°C",
            Self::Imperial => "°F",
            Self::Standard => "K",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub classifier_base_url: Option<String>,
    pub classifier_access_token: Option<String>,
    pub weather_base_url: Option<String>,
    pub weather_api_key: Option<String>,
    pub joke_base_url: Option<String>,
    pub joke_api_key: Option<String>,
    pub http_timeout_ms: Option<u64>,
    pub server_port: Option<u16>,
    pub log_level: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            classifier: ClassifierConfig {
                base_url: DEFAULT_CLASSIFIER_URL.to_string(),
                access_token: String::new().into(),
                api_version: None,
            },
            weather: WeatherConfig {
                base_url: DEFAULT_WEATHER_URL.to_string(),
                api_key: String::new().into(),
                units: WeatherUnits::Metric,
            },
            joke: JokeConfig { base_url: DEFAULT_JOKE_URL.to_string(), api_key: None },
            http: HttpConfig { timeout_ms: 5_000 },
            server: ServerConfig {
                bind_address: "127.0.0.1".to_string(),
                port: 8080,
                request_timeout_ms: 15_000,
            },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

fn secret_value(value: String) -> SecretString {
    value.into()
}

impl std::str::FromStr for WeatherUnits {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "metric" => Ok(Self::Metric),
            "imperial" => Ok(Self::Imperial),
            "standard" => Ok(Self::Standard),
            other => Err(ConfigError::Validation(format!(
                "unsupported weather units `{other}` (expected metric|imperial|standard)"
            ))),
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl AppConfig {
    /// Layers defaults, the config file, `PARLEY_*` env vars and explicit
    /// overrides (in that order), then validates the result.
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("parley.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(classifier) = patch.classifier {
            if let Some(base_url) = classifier.base_url {
                self.classifier.base_url = base_url;
            }
            if let Some(access_token) = classifier.access_token {
                self.classifier.access_token = secret_value(access_token);
            }
            if let Some(api_version) = classifier.api_version {
                self.classifier.api_version = Some(api_version);
            }
        }

        if let Some(weather) = patch.weather {
            if let Some(base_url) = weather.base_url {
                self.weather.base_url = base_url;
            }
            if let Some(api_key) = weather.api_key {
                self.weather.api_key = secret_value(api_key);
            }
            if let Some(units) = weather.units {
                self.weather.units = units;
            }
        }

        if let Some(joke) = patch.joke {
            if let Some(base_url) = joke.base_url {
                self.joke.base_url = base_url;
            }
            if let Some(api_key) = joke.api_key {
                self.joke.api_key = Some(secret_value(api_key));
            }
        }

        if let Some(http) = patch.http {
            if let Some(timeout_ms) = http.timeout_ms {
                self.http.timeout_ms = timeout_ms;
            }
        }

        if let Some(server) = patch.server {
            if let Some(bind_address) = server.bind_address {
                self.server.bind_address = bind_address;
            }
            if let Some(port) = server.port {
                self.server.port = port;
            }
            if let Some(request_timeout_ms) = server.request_timeout_ms {
                self.server.request_timeout_ms = request_timeout_ms;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("PARLEY_CLASSIFIER_BASE_URL") {
            self.classifier.base_url = value;
        }
        if let Some(value) = read_env("PARLEY_CLASSIFIER_ACCESS_TOKEN") {
            self.classifier.access_token = secret_value(value);
        }
        if let Some(value) = read_env("PARLEY_CLASSIFIER_API_VERSION") {
            self.classifier.api_version = Some(value);
        }

        if let Some(value) = read_env("PARLEY_WEATHER_BASE_URL") {
            self.weather.base_url = value;
        }
        if let Some(value) = read_env("PARLEY_WEATHER_API_KEY") {
            self.weather.api_key = secret_value(value);
        }
        if let Some(value) = read_env("PARLEY_WEATHER_UNITS") {
            self.weather.units = value.parse()?;
        }

        if let Some(value) = read_env("PARLEY_JOKE_BASE_URL") {
            self.joke.base_url = value;
        }
        if let Some(value) = read_env("PARLEY_JOKE_API_KEY") {
            self.joke.api_key = Some(secret_value(value));
        }

        if let Some(value) = read_env("PARLEY_HTTP_TIMEOUT_MS") {
            self.http.timeout_ms = parse_u64("PARLEY_HTTP_TIMEOUT_MS", &value)?;
        }

        if let Some(value) = read_env("PARLEY_SERVER_BIND_ADDRESS") {
            self.server.bind_address = value;
        }
        if let Some(value) = read_env("PARLEY_SERVER_PORT") {
            self.server.port = parse_u16("PARLEY_SERVER_PORT", &value)?;
        }
        if let Some(value) = read_env("PARLEY_SERVER_REQUEST_TIMEOUT_MS") {
            self.server.request_timeout_ms =
                parse_u64("PARLEY_SERVER_REQUEST_TIMEOUT_MS", &value)?;
        }

        let log_level = read_env("PARLEY_LOGGING_LEVEL").or_else(|| read_env("PARLEY_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("PARLEY_LOGGING_FORMAT").or_else(|| read_env("PARLEY_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(base_url) = overrides.classifier_base_url {
            self.classifier.base_url = base_url;
        }
        if let Some(access_token) = overrides.classifier_access_token {
            self.classifier.access_token = secret_value(access_token);
        }
        if let Some(base_url) = overrides.weather_base_url {
            self.weather.base_url = base_url;
        }
        if let Some(api_key) = overrides.weather_api_key {
            self.weather.api_key = secret_value(api_key);
        }
        if let Some(base_url) = overrides.joke_base_url {
            self.joke.base_url = base_url;
        }
        if let Some(api_key) = overrides.joke_api_key {
            self.joke.api_key = Some(secret_value(api_key));
        }
        if let Some(timeout_ms) = overrides.http_timeout_ms {
            self.http.timeout_ms = timeout_ms;
        }
        if let Some(port) = overrides.server_port {
            self.server.port = port;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_classifier(&self.classifier)?;
        validate_weather(&self.weather)?;
        validate_joke(&self.joke)?;
        validate_http(&self.http)?;
        validate_server(&self.server)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("parley.toml"), PathBuf::from("config/parley.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_base_url(key: &str, url: &str) -> Result<(), ConfigError> {
    let url = url.trim();
    if !url.starts_with("http://") && !url.starts_with("https://") {
        return Err(ConfigError::Validation(format!(
            "{key} must start with http:// or https:// (got `{url}`)"
        )));
    }
    Ok(())
}

fn validate_classifier(classifier: &ClassifierConfig) -> Result<(), ConfigError> {
    validate_base_url("classifier.base_url", &classifier.base_url)?;

    if classifier.access_token.expose_secret().trim().is_empty() {
        return Err(ConfigError::Validation(
            "classifier.access_token is required. Get it from your Wit.ai app > Management > Settings > Server Access Token".to_string(),
        ));
    }

    Ok(())
}

fn validate_weather(weather: &WeatherConfig) -> Result<(), ConfigError> {
    validate_base_url("weather.base_url", &weather.base_url)?;

    if weather.api_key.expose_secret().trim().is_empty() {
        return Err(ConfigError::Validation(
            "weather.api_key is required. Get it from https://home.openweathermap.org/api_keys"
                .to_string(),
        ));
    }

    Ok(())
}

fn validate_joke(joke: &JokeConfig) -> Result<(), ConfigError> {
    validate_base_url("joke.base_url", &joke.base_url)
}

fn validate_http(http: &HttpConfig) -> Result<(), ConfigError> {
    if http.timeout_ms == 0 || http.timeout_ms > 60_000 {
        return Err(ConfigError::Validation(
            "http.timeout_ms must be in range 1..=60000".to_string(),
        ));
    }

    Ok(())
}

fn validate_server(server: &ServerConfig) -> Result<(), ConfigError> {
    if server.port == 0 {
        return Err(ConfigError::Validation("server.port must be greater than zero".to_string()));
    }

    if server.request_timeout_ms == 0 {
        return Err(ConfigError::Validation(
            "server.request_timeout_ms must be greater than zero".to_string(),
        ));
    }

    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_u16(key: &str, value: &str) -> Result<u16, ConfigError> {
    value.parse::<u16>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.parse::<u64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    classifier: Option<ClassifierPatch>,
    weather: Option<WeatherPatch>,
    joke: Option<JokePatch>,
    http: Option<HttpPatch>,
    server: Option<ServerPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct ClassifierPatch {
    base_url: Option<String>,
    access_token: Option<String>,
    api_version: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct WeatherPatch {
    base_url: Option<String>,
    api_key: Option<String>,
    units: Option<WeatherUnits>,
}

#[derive(Debug, Default, Deserialize)]
struct JokePatch {
    base_url: Option<String>,
    api_key: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct HttpPatch {
    timeout_ms: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct ServerPatch {
    bind_address: Option<String>,
    port: Option<u16>,
    request_timeout_ms: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}

#[cfg(test)]
mod tests {
    use std::env;
    use std::fs;
    use std::io;
    use std::sync::{Mutex, OnceLock};

    use secrecy::ExposeSecret;
    use tempfile::TempDir;

    use super::{AppConfig, ConfigError, ConfigOverrides, LoadOptions, LogFormat, WeatherUnits};

    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

    const CREDENTIAL_VARS: [&str; 2] = ["PARLEY_CLASSIFIER_ACCESS_TOKEN", "PARLEY_WEATHER_API_KEY"];

    fn env_lock() -> &'static Mutex<()> {
        ENV_LOCK.get_or_init(|| Mutex::new(()))
    }

    fn clear_vars(vars: &[&str]) {
        for var in vars {
            env::remove_var(var);
        }
    }

    fn set_credentials() {
        env::set_var("PARLEY_CLASSIFIER_ACCESS_TOKEN", "wit-token-test");
        env::set_var("PARLEY_WEATHER_API_KEY", "owm-key-test");
    }

    fn ensure(condition: bool, message: &'static str) -> Result<(), String> {
        if condition {
            Ok(())
        } else {
            Err(message.to_string())
        }
    }

    #[test]
    fn file_load_supports_env_interpolation() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("TEST_WIT_TOKEN", "wit-from-env");
        env::set_var("TEST_OWM_KEY", "owm-from-env");

        let result = (|| -> Result<(), String> {
            let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
            let path = dir.path().join("parley.toml");
            fs::write(
                &path,
                r#"
[classifier]
access_token = "${TEST_WIT_TOKEN}"

[weather]
api_key = "${TEST_OWM_KEY}"
units = "imperial"
"#,
            )
            .map_err(|err| err.to_string())?;

            let config =
                AppConfig::load(LoadOptions { config_path: Some(path), ..LoadOptions::default() })
                    .map_err(|err| format!("config load failed: {err}"))?;

            ensure(
                config.classifier.access_token.expose_secret() == "wit-from-env",
                "classifier token should be loaded from environment",
            )?;
            ensure(
                config.weather.api_key.expose_secret() == "owm-from-env",
                "weather key should be loaded from environment",
            )?;
            ensure(config.weather.units == WeatherUnits::Imperial, "units should come from file")?;
            Ok(())
        })();

        clear_vars(&["TEST_WIT_TOKEN", "TEST_OWM_KEY"]);
        result
    }

    #[test]
    fn missing_interpolation_variable_is_reported() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
        let path = dir.path().join("parley.toml");
        fs::write(&path, "[classifier]\naccess_token = \"${PARLEY_TEST_UNSET_VAR}\"\n")
            .map_err(|err| err.to_string())?;

        let error =
            match AppConfig::load(LoadOptions { config_path: Some(path), ..LoadOptions::default() })
            {
                Ok(_) => return Err("expected interpolation failure".to_string()),
                Err(error) => error,
            };
        ensure(
            matches!(error, ConfigError::MissingEnvInterpolation { ref var } if var == "PARLEY_TEST_UNSET_VAR"),
            "missing variable should be named in the error",
        )
    }

    #[test]
    fn logging_env_aliases_are_supported() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        set_credentials();
        env::set_var("PARLEY_LOG_LEVEL", "warn");
        env::set_var("PARLEY_LOG_FORMAT", "pretty");

        let result = (|| -> Result<(), String> {
            let config = AppConfig::load(LoadOptions::default())
                .map_err(|err| format!("config load failed: {err}"))?;

            ensure(config.logging.level == "warn", "warning log level should be set from env var")?;
            ensure(
                matches!(config.logging.format, LogFormat::Pretty),
                "pretty logging format should be set from env var",
            )?;
            Ok(())
        })();

        clear_vars(&CREDENTIAL_VARS);
        clear_vars(&["PARLEY_LOG_LEVEL", "PARLEY_LOG_FORMAT"]);
        result
    }

    #[test]
    fn precedence_defaults_file_env_overrides() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("PARLEY_HTTP_TIMEOUT_MS", "1500");
        env::set_var("PARLEY_CLASSIFIER_ACCESS_TOKEN", "wit-from-env");

        let result = (|| -> Result<(), String> {
            let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
            let path = dir.path().join("parley.toml");
            fs::write(
                &path,
                r#"
[classifier]
access_token = "wit-from-file"

[weather]
api_key = "owm-from-file"

[http]
timeout_ms = 900

[server]
port = 9000

[logging]
level = "warn"
"#,
            )
            .map_err(|err| err.to_string())?;

            let config = AppConfig::load(LoadOptions {
                config_path: Some(path),
                overrides: ConfigOverrides {
                    server_port: Some(9100),
                    log_level: Some("debug".to_string()),
                    ..ConfigOverrides::default()
                },
                ..LoadOptions::default()
            })
            .map_err(|err| format!("config load failed: {err}"))?;

            ensure(config.server.port == 9100, "override port should win")?;
            ensure(config.logging.level == "debug", "overridden log level should be debug")?;
            ensure(config.http.timeout_ms == 1500, "env timeout should win over file")?;
            ensure(
                config.classifier.access_token.expose_secret() == "wit-from-env",
                "env classifier token should win over file and defaults",
            )?;
            ensure(
                config.weather.api_key.expose_secret() == "owm-from-file",
                "file weather key should win over defaults",
            )?;
            Ok(())
        })();

        clear_vars(&["PARLEY_HTTP_TIMEOUT_MS", "PARLEY_CLASSIFIER_ACCESS_TOKEN"]);
        result
    }

    #[test]
    fn validation_fails_fast_with_actionable_error() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("PARLEY_WEATHER_API_KEY", "owm-valid");

        let result = (|| -> Result<(), String> {
            let error = match AppConfig::load(LoadOptions::default()) {
                Ok(_) => {
                    return Err("expected validation failure but config load succeeded".to_string())
                }
                Err(error) => error,
            };
            let has_message = matches!(
                error,
                ConfigError::Validation(ref message) if message.contains("classifier.access_token")
            );
            ensure(has_message, "validation failure should mention classifier.access_token")
        })();

        clear_vars(&["PARLEY_WEATHER_API_KEY"]);
        result
    }

    #[test]
    fn out_of_range_timeout_is_rejected() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        set_credentials();
        let result = match AppConfig::load(LoadOptions {
            overrides: ConfigOverrides {
                http_timeout_ms: Some(0),
                ..ConfigOverrides::default()
            },
            ..LoadOptions::default()
        }) {
            Ok(_) => Err("zero timeout should be rejected".to_string()),
            Err(error) => ensure(
                matches!(error, ConfigError::Validation(ref message) if message.contains("http.timeout_ms")),
                "validation failure should mention http.timeout_ms",
            ),
        };

        clear_vars(&CREDENTIAL_VARS);
        result
    }

    #[test]
    fn invalid_numeric_env_override_is_reported() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        set_credentials();
        env::set_var("PARLEY_SERVER_PORT", "not-a-port");

        let result = match AppConfig::load(LoadOptions::default()) {
            Ok(_) => Err("non-numeric port should be rejected".to_string()),
            Err(error) => ensure(
                matches!(error, ConfigError::InvalidEnvOverride { ref key, .. } if key == "PARLEY_SERVER_PORT"),
                "error should name the offending variable",
            ),
        };

        clear_vars(&CREDENTIAL_VARS);
        clear_vars(&["PARLEY_SERVER_PORT"]);
        result
    }

    #[test]
    fn secret_values_are_not_leaked_by_debug() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("PARLEY_CLASSIFIER_ACCESS_TOKEN", "wit-secret-value");
        env::set_var("PARLEY_WEATHER_API_KEY", "owm-secret-value");
        env::set_var("PARLEY_JOKE_API_KEY", "joke-secret-value");

        let result = (|| -> Result<(), String> {
            let config = AppConfig::load(LoadOptions::default())
                .map_err(|err| format!("config load failed: {err}"))?;
            let debug = format!("{config:?}");

            ensure(!debug.contains("wit-secret-value"), "debug output should not contain token")?;
            ensure(!debug.contains("owm-secret-value"), "debug output should not contain key")?;
            ensure(!debug.contains("joke-secret-value"), "debug output should not contain key")?;
            ensure(
                matches!(config.logging.format, LogFormat::Compact),
                "default logging format should be compact",
            )?;
            Ok(())
        })();

        clear_vars(&CREDENTIAL_VARS);
        clear_vars(&["PARLEY_JOKE_API_KEY"]);
        result
    }

    #[test]
    fn weather_units_map_to_query_and_symbol() {
        assert_eq!(WeatherUnits::Metric.as_query(), "metric");
        assert_eq!(WeatherUnits::Imperial.symbol(), "°F");
        assert_eq!("Standard".parse::<WeatherUnits>().map(|units| units.symbol()).ok(), Some("K"));
        assert!("kelvin".parse::<WeatherUnits>().is_err());
    }
}
