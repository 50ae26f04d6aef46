use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

mod logging;

pub use logging::setup_logging;

pub type AppConfig = CoachConfig;

pub const CONFIG_PREFIX: &str = "COACH_SERVICE";
pub const CONFIG_PATH_ENV: &str = "COACH_SERVICE_CONFIG";
pub const RUN_ENV: &str = "RUN_ENV";
pub const GEMINI_API_KEY_ENV: &str = "GEMINI_API_KEY";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid value `{value}` for {key}")]
    InvalidEnv { key: String, value: String },
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CoachConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub service: ServiceConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_server_host")]
    pub host: String,
    #[serde(default = "default_server_port")]
    pub port: u16,
}

impl ServerConfig {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_true")]
    pub ansi: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServiceConfig {
    #[serde(default)]
    pub generator: GeneratorConfig,
    #[serde(default)]
    pub streaming: StreamingConfig,
}

#[derive(Clone, Serialize, Deserialize)]
pub struct GeneratorConfig {
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_generator_model")]
    pub model: String,
    #[serde(default = "default_generator_base_url")]
    pub base_url: String,
    #[serde(default = "default_generator_request_timeout_ms")]
    pub request_timeout_ms: u64,
    #[serde(default = "default_generator_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
}

impl GeneratorConfig {
    /// Blank keys count as absent.
    pub fn api_key(&self) -> Option<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }
}

impl fmt::Debug for GeneratorConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeneratorConfig")
            .field("api_key", &self.api_key().map(|_| "<redacted>"))
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("request_timeout_ms", &self.request_timeout_ms)
            .field("connect_timeout_ms", &self.connect_timeout_ms)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamingConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_streaming_path")]
    pub path: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_server_host(),
            port: default_server_port(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            ansi: true,
        }
    }
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: default_generator_model(),
            base_url: default_generator_base_url(),
            request_timeout_ms: default_generator_request_timeout_ms(),
            connect_timeout_ms: default_generator_connect_timeout_ms(),
        }
    }
}

impl Default for StreamingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: default_streaming_path(),
        }
    }
}

/// Defaults, then the config file if one resolves, then environment overrides.
pub fn load_config() -> Result<CoachConfig, ConfigError> {
    let lookup = |key: &str| std::env::var(key).ok();
    let mut config = match resolve_config_path(lookup) {
        Some(path) => load_config_file(&path)?,
        None => CoachConfig::default(),
    };
    apply_env_overrides(&mut config, lookup)?;

    tracing::debug!(
        host = %config.server.host,
        port = config.server.port,
        model = %config.service.generator.model,
        generator_configured = config.service.generator.api_key().is_some(),
        "configuration loaded"
    );
    Ok(config)
}

pub fn load_config_file(path: &Path) -> Result<CoachConfig, ConfigError> {
    let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&raw).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// An explicit path always wins; otherwise `config/{RUN_ENV}.toml` is used
/// only when it exists.
pub fn resolve_config_path(lookup: impl Fn(&str) -> Option<String>) -> Option<PathBuf> {
    if let Some(explicit) = lookup(CONFIG_PATH_ENV).filter(|value| !value.trim().is_empty()) {
        return Some(PathBuf::from(explicit));
    }
    let run_env = lookup(RUN_ENV).unwrap_or_else(|| "development".to_string());
    let candidate = PathBuf::from("config").join(format!("{run_env}.toml"));
    candidate.is_file().then_some(candidate)
}

pub fn apply_env_overrides(
    config: &mut CoachConfig,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<(), ConfigError> {
    let var = |suffix: &str| {
        let key = format!("{CONFIG_PREFIX}_{suffix}");
        lookup(&key).map(|value| (key, value))
    };

    if let Some((_, host)) = var("SERVER_HOST") {
        config.server.host = host;
    }
    if let Some((key, port)) = var("SERVER_PORT") {
        config.server.port = parse_env(&key, &port)?;
    }
    if let Some((_, level)) = var("LOG_LEVEL") {
        config.logging.level = level;
    }

    let generator = &mut config.service.generator;
    if let Some(api_key) = var("GENERATOR_API_KEY")
        .map(|(_, value)| value)
        .or_else(|| lookup(GEMINI_API_KEY_ENV))
    {
        generator.api_key = Some(api_key);
    }
    if let Some((_, model)) = var("GENERATOR_MODEL") {
        generator.model = model;
    }
    if let Some((_, base_url)) = var("GENERATOR_BASE_URL") {
        generator.base_url = base_url;
    }
    if let Some((key, timeout)) = var("GENERATOR_TIMEOUT_MS") {
        generator.request_timeout_ms = parse_env(&key, &timeout)?;
    }
    Ok(())
}

fn parse_env<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidEnv {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn default_server_host() -> String {
    "127.0.0.1".to_string()
}

fn default_server_port() -> u16 {
    8080
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

fn default_generator_model() -> String {
    "gemini-1.5-flash-latest".to_string()
}

fn default_generator_base_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

fn default_generator_request_timeout_ms() -> u64 {
    30_000
}

fn default_generator_connect_timeout_ms() -> u64 {
    5_000
}

fn default_streaming_path() -> String {
    "/ws".to_string()
}
