//! Configuration management for pensionweb
//!
//! This module handles loading, validation, and management of
//! portal configuration from YAML files and the environment.

pub mod error;

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub use error::ConfigError;

/// Environment variable that overrides the backend base URL
pub const API_URL_ENV: &str = "PENSION_API_URL";

// ==================== Configuration Types ====================

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,
    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    9002
}

/// External REST backend configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Base URL of the backend API, e.g. `http://localhost:8080/api`
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Timeout for the session check call, in milliseconds
    #[serde(default = "default_session_check_timeout")]
    pub session_check_timeout_ms: u64,
    /// Timeout for every other backend call, in milliseconds (0 disables)
    #[serde(default = "default_request_timeout")]
    pub request_timeout_ms: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            session_check_timeout_ms: default_session_check_timeout(),
            request_timeout_ms: default_request_timeout(),
        }
    }
}

fn default_base_url() -> String {
    "http://localhost:8080/api".to_string()
}

fn default_session_check_timeout() -> u64 {
    5000
}

fn default_request_timeout() -> u64 {
    10000
}

/// Data source selection mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceMode {
    /// Live backend, switching to fallback data when the circuit opens
    Auto,
    /// Always the live backend
    Live,
    /// Always the static fallback dataset
    Fallback,
}

impl Default for SourceMode {
    fn default() -> Self {
        SourceMode::Auto
    }
}

impl std::str::FromStr for SourceMode {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "auto" => Ok(SourceMode::Auto),
            "live" => Ok(SourceMode::Live),
            "fallback" | "mock" => Ok(SourceMode::Fallback),
            _ => Err(format!("Invalid source mode: {}", s)),
        }
    }
}

impl std::fmt::Display for SourceMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceMode::Auto => write!(f, "auto"),
            SourceMode::Live => write!(f, "live"),
            SourceMode::Fallback => write!(f, "fallback"),
        }
    }
}

/// Fallback data policy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FallbackConfig {
    #[serde(default)]
    pub mode: SourceMode,
    /// Consecutive live failures before switching to fallback data
    #[serde(default = "default_failure_threshold")]
    pub failure_threshold: u32,
    /// Seconds to serve fallback data before probing the backend again
    #[serde(default = "default_cooldown_secs")]
    pub cooldown_secs: u64,
}

impl Default for FallbackConfig {
    fn default() -> Self {
        Self {
            mode: SourceMode::Auto,
            failure_threshold: default_failure_threshold(),
            cooldown_secs: default_cooldown_secs(),
        }
    }
}

fn default_failure_threshold() -> u32 {
    3
}

fn default_cooldown_secs() -> u64 {
    30
}

/// A user allowed to sign in to the portal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserEntry {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub roles: Vec<String>,
}

/// Sign-in allow-list
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    #[serde(default = "default_users")]
    pub users: Vec<UserEntry>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            users: default_users(),
        }
    }
}

fn default_users() -> Vec<UserEntry> {
    vec![
        UserEntry {
            username: "admin".to_string(),
            password: "admin123".to_string(),
            roles: vec!["ADMIN".to_string(), "USER".to_string()],
        },
        UserEntry {
            username: "user".to_string(),
            password: "password".to_string(),
            roles: vec!["USER".to_string()],
        },
    ]
}

/// Generative model provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    Gemini,
    Disabled,
}

impl Default for LlmProvider {
    fn default() -> Self {
        LlmProvider::Gemini
    }
}

impl std::fmt::Display for LlmProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LlmProvider::Gemini => write!(f, "gemini"),
            LlmProvider::Disabled => write!(f, "disabled"),
        }
    }
}

/// Generative model settings used by the summary, analysis and chat flows
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default)]
    pub provider: LlmProvider,
    #[serde(default = "default_model")]
    pub model: String,
    /// Name of the environment variable holding the API key
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    #[serde(default = "default_llm_timeout")]
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: LlmProvider::Gemini,
            model: default_model(),
            api_key_env: default_api_key_env(),
            timeout_secs: default_llm_timeout(),
        }
    }
}

fn default_model() -> String {
    "gemini-1.5-flash".to_string()
}

fn default_api_key_env() -> String {
    "GOOGLE_API_KEY".to_string()
}

fn default_llm_timeout() -> u64 {
    60
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level: debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Pagination settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginationConfig {
    /// Records per page for lists
    #[serde(default = "default_records_per_page")]
    pub records_per_page: usize,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            records_per_page: default_records_per_page(),
        }
    }
}

fn default_records_per_page() -> usize {
    50
}

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Server settings
    #[serde(default)]
    pub server: ServerConfig,
    /// Backend API settings
    #[serde(default)]
    pub backend: BackendConfig,
    /// Fallback data policy
    #[serde(default)]
    pub fallback: FallbackConfig,
    /// Sign-in allow-list
    #[serde(default)]
    pub auth: AuthConfig,
    /// Generative model settings
    #[serde(default)]
    pub llm: LlmConfig,
    /// Logging settings
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Pagination settings
    #[serde(default)]
    pub pagination: PaginationConfig,
}

impl Config {
    /// Load configuration from a YAML file
    pub fn load(path: PathBuf) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::FileNotFound {
                path: path.display().to_string(),
            });
        }
        let content = std::fs::read_to_string(&path).map_err(|source| ConfigError::Unreadable {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_yaml(&content)
    }

    /// Load configuration, falling back to defaults when the file is absent
    pub fn load_or_default(path: PathBuf) -> Result<Self, ConfigError> {
        match Self::load(path.clone()) {
            Err(ConfigError::FileNotFound { .. }) => {
                log::warn!(
                    "Config file {} not found, using defaults",
                    path.display()
                );
                Ok(Self::default())
            }
            other => other,
        }
    }

    /// Parse and validate configuration from YAML text
    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_yaml::from_str(content).map_err(|e| ConfigError::InvalidYaml {
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from the process environment
    pub fn apply_env_overrides(&mut self) {
        let value = std::env::var(API_URL_ENV).ok();
        self.apply_api_url_override(value.as_deref());
    }

    /// Replace the backend base URL when an override value is set and non-empty
    pub fn apply_api_url_override(&mut self, value: Option<&str>) {
        if let Some(url) = value.map(str::trim).filter(|v| !v.is_empty()) {
            log::info!("Backend base URL overridden by {}: {}", API_URL_ENV, url);
            self.backend.base_url = url.trim_end_matches('/').to_string();
        }
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::InvalidValue {
                field: "server.port".to_string(),
                reason: "Port must be greater than 0".to_string(),
            });
        }

        let url = &self.backend.base_url;
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(ConfigError::InvalidValue {
                field: "backend.base_url".to_string(),
                reason: format!("'{}' must start with http:// or https://", url),
            });
        }

        if self.fallback.failure_threshold == 0 {
            return Err(ConfigError::InvalidValue {
                field: "fallback.failure_threshold".to_string(),
                reason: "Failure threshold must be at least 1".to_string(),
            });
        }

        if self.auth.users.is_empty() {
            return Err(ConfigError::MissingField {
                field: "auth.users".to_string(),
            });
        }

        if let Some(user) = self.auth.users.iter().find(|u| u.username.trim().is_empty()) {
            return Err(ConfigError::InvalidUser {
                message: format!("User entry with roles {:?} has an empty username", user.roles),
            });
        }

        Ok(())
    }

    /// Generate a default configuration file
    pub fn generate_default() -> &'static str {
        include_str!("../templates/default_config.yaml")
    }

    /// Full URL of a backend resource path
    pub fn backend_url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.backend.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

// ==================== Tests ====================
