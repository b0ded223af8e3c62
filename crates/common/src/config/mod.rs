//! Configuration management for PdfQuery services
//!
//! Supports loading configuration from:
//! - Environment variables (prefixed with APP__)
//! - Configuration files (config/default.toml, config/{APP_ENV}.toml, config/local.toml)
//! - Default values
//!
//! The provider API key additionally falls back to `OPENAI_API_KEY`.

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Environment variable consulted when `llm.api_key` is not configured
pub const OPENAI_API_KEY_ENV: &str = "OPENAI_API_KEY";

/// Main application configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Database configuration
    #[serde(default)]
    pub database: DatabaseConfig,

    /// LLM provider configuration
    #[serde(default)]
    pub llm: LlmConfig,

    /// Query prompt configuration
    #[serde(default)]
    pub query: QueryConfig,

    /// Cross-origin configuration
    #[serde(default)]
    pub cors: CorsConfig,

    /// Observability configuration
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    /// Host to bind to
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,

    /// Upload body limit in bytes; unset disables the limit
    #[serde(default)]
    pub max_upload_bytes: Option<usize>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    /// SQLite database URL
    #[serde(default = "default_database_url")]
    pub url: String,

    /// Maximum number of connections
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// Minimum number of connections
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,

    /// Connection timeout in seconds
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    /// Idle timeout in seconds
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_secs: u64,
}

/// Shape of the provider call
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ApiStyle {
    /// `/chat/completions` with a system and a user message
    Chat,
    /// Legacy `/completions` with a bare prompt
    Completion,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LlmConfig {
    /// Chat or legacy completion endpoint
    #[serde(default = "default_api_style")]
    pub api_style: ApiStyle,

    /// API key for the provider
    pub api_key: Option<String>,

    /// API base URL (for custom endpoints)
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// Model (or engine) to use; defaults per api style
    pub model: Option<String>,

    /// Completion token budget per answer
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Request timeout in seconds
    #[serde(default = "default_llm_timeout")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct QueryConfig {
    /// Cap on the joined corpus embedded in the prompt (0 disables)
    #[serde(default = "default_max_corpus_chars")]
    pub max_corpus_chars: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CorsConfig {
    /// Origins allowed to call the API with credentials
    #[serde(default = "default_allowed_origins")]
    pub allowed_origins: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ObservabilityConfig {
    /// Log level (debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Enable JSON logging
    #[serde(default = "default_json_logging")]
    pub json_logging: bool,

    /// Metrics port (0 to disable)
    #[serde(default = "default_metrics_port")]
    pub metrics_port: u16,
}

// Default value functions
fn default_host() -> String { "0.0.0.0".to_string() }
fn default_port() -> u16 { 5000 }
fn default_database_url() -> String { "sqlite://ztea.db?mode=rwc".to_string() }
fn default_max_connections() -> u32 { 5 }
fn default_min_connections() -> u32 { 1 }
fn default_connect_timeout() -> u64 { 10 }
fn default_idle_timeout() -> u64 { 300 }
fn default_api_style() -> ApiStyle { ApiStyle::Chat }
fn default_api_base() -> String { "https://api.openai.com/v1".to_string() }
fn default_max_tokens() -> u32 { 1000 }
fn default_llm_timeout() -> u64 { 60 }
fn default_max_corpus_chars() -> usize { 48_000 }
fn default_allowed_origins() -> Vec<String> {
    vec![
        "http://localhost:3000".to_string(),
        "https://your-production-site.com".to_string(),
    ]
}
fn default_log_level() -> String { "info".to_string() }
fn default_json_logging() -> bool { true }
fn default_metrics_port() -> u16 { 9090 }

impl AppConfig {
    /// Load configuration from environment and files
    pub fn load() -> Result<Self, ConfigError> {
        let env = std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());

        let config = Config::builder()
            // Load base config file
            .add_source(File::with_name("config/default").required(false))
            // Load environment-specific config
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            // Load local overrides
            .add_source(File::with_name("config/local").required(false))
            // Load from environment variables with APP__ prefix
            // e.g., APP__SERVER__PORT=8081
            .add_source(
                Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let mut config: AppConfig = config.try_deserialize()?;
        config.llm.resolve_api_key_from_env();
        Ok(config)
    }

    /// Address the HTTP server binds to
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

impl LlmConfig {
    /// Model name, falling back to the default for the configured api style
    pub fn model_name(&self) -> &str {
        match (&self.model, self.api_style) {
            (Some(model), _) => model,
            (None, ApiStyle::Chat) => "gpt-3.5-turbo",
            (None, ApiStyle::Completion) => "gpt-3.5-turbo-instruct",
        }
    }

    /// Get provider timeout as Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    fn resolve_api_key_from_env(&mut self) {
        if self.api_key.as_deref().map_or(true, str::is_empty) {
            self.api_key = std::env::var(OPENAI_API_KEY_ENV)
                .ok()
                .filter(|key| !key.is_empty());
        }
    }
}

impl QueryConfig {
    /// Corpus cap, `None` when disabled
    pub fn corpus_limit(&self) -> Option<usize> {
        (self.max_corpus_chars > 0).then_some(self.max_corpus_chars)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            max_upload_bytes: None,
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_database_url(),
            max_connections: default_max_connections(),
            min_connections: default_min_connections(),
            connect_timeout_secs: default_connect_timeout(),
            idle_timeout_secs: default_idle_timeout(),
        }
    }
}

impl DatabaseConfig {
    /// Single-connection in-memory database, used by tests and dry runs
    pub fn in_memory() -> Self {
        Self {
            url: "sqlite::memory:".to_string(),
            max_connections: 1,
            min_connections: 1,
            ..Self::default()
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_style: default_api_style(),
            api_key: None,
            api_base: default_api_base(),
            model: None,
            max_tokens: default_max_tokens(),
            timeout_secs: default_llm_timeout(),
        }
    }
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            max_corpus_chars: default_max_corpus_chars(),
        }
    }
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: default_allowed_origins(),
        }
    }
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            json_logging: default_json_logging(),
            metrics_port: default_metrics_port(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            database: DatabaseConfig::default(),
            llm: LlmConfig::default(),
            query: QueryConfig::default(),
            cors: CorsConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}
