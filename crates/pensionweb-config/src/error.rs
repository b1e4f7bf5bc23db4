//! Error types for pensionweb-config

use serde::Serialize;
use thiserror::Error;

/// Stable identifier of a configuration failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConfigErrorCode {
    FileNotFound,
    Unreadable,
    InvalidYaml,
    MissingField,
    InvalidValue,
    InvalidUser,
}

impl std::fmt::Display for ConfigErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let code = match self {
            ConfigErrorCode::FileNotFound => "FILE_NOT_FOUND",
            ConfigErrorCode::Unreadable => "UNREADABLE",
            ConfigErrorCode::InvalidYaml => "INVALID_YAML",
            ConfigErrorCode::MissingField => "MISSING_FIELD",
            ConfigErrorCode::InvalidValue => "INVALID_VALUE",
            ConfigErrorCode::InvalidUser => "INVALID_USER",
        };
        f.write_str(code)
    }
}

/// How bad a configuration failure is for startup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigErrorSeverity {
    /// The portal can still start on defaults
    Warning,
    /// Startup must stop
    Fatal,
}

/// What the binary prints when the configuration is rejected
#[derive(Debug, Clone, Serialize)]
pub struct ConfigErrorDetails {
    pub code: ConfigErrorCode,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub suggestions: Vec<String>,
}

impl std::fmt::Display for ConfigErrorDetails {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)?;
        if let Some(field) = &self.field {
            write!(f, " (at {})", field)?;
        }
        for suggestion in &self.suggestions {
            write!(f, "\n  hint: {}", suggestion)?;
        }
        Ok(())
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config file not found: {path}")]
    FileNotFound { path: String },

    #[error("Cannot read config file {path}: {source}")]
    Unreadable {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid YAML: {message}")]
    InvalidYaml { message: String },

    #[error("Missing required setting: {field}")]
    MissingField { field: String },

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("Invalid user entry: {message}")]
    InvalidUser { message: String },
}

impl ConfigError {
    pub fn code(&self) -> ConfigErrorCode {
        match self {
            ConfigError::FileNotFound { .. } => ConfigErrorCode::FileNotFound,
            ConfigError::Unreadable { .. } => ConfigErrorCode::Unreadable,
            ConfigError::InvalidYaml { .. } => ConfigErrorCode::InvalidYaml,
            ConfigError::MissingField { .. } => ConfigErrorCode::MissingField,
            ConfigError::InvalidValue { .. } => ConfigErrorCode::InvalidValue,
            ConfigError::InvalidUser { .. } => ConfigErrorCode::InvalidUser,
        }
    }

    /// A missing file only means defaults are used
    pub fn severity(&self) -> ConfigErrorSeverity {
        match self {
            ConfigError::FileNotFound { .. } => ConfigErrorSeverity::Warning,
            _ => ConfigErrorSeverity::Fatal,
        }
    }

    pub fn to_details(&self) -> ConfigErrorDetails {
        let (field, suggestions) = match self {
            ConfigError::FileNotFound { .. } => (
                None,
                vec![
                    "Pass --config with the path of your config file".to_string(),
                    "Run with --print-default-config to get a starting point".to_string(),
                ],
            ),
            ConfigError::Unreadable { .. } => (None, vec!["Check the file permissions".to_string()]),
            ConfigError::InvalidYaml { .. } => (
                None,
                vec!["Compare with the output of --print-default-config".to_string()],
            ),
            ConfigError::MissingField { field } => (
                Some(field.clone()),
                vec![format!("Add '{}' to the config file", field)],
            ),
            ConfigError::InvalidValue { field, reason } => (Some(field.clone()), vec![reason.clone()]),
            ConfigError::InvalidUser { .. } => (
                Some("auth.users".to_string()),
                vec!["Every user needs a non-empty username".to_string()],
            ),
        };

        ConfigErrorDetails {
            code: self.code(),
            message: self.to_string(),
            field,
            suggestions,
        }
    }
}

pub type ConfigResult<T> = Result<T, ConfigError>;

// ==================== Tests ====================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_display() {
        assert_eq!(ConfigErrorCode::InvalidYaml.to_string(), "INVALID_YAML");
        assert_eq!(ConfigErrorCode::InvalidUser.to_string(), "INVALID_USER");
    }

    #[test]
    fn test_missing_file_is_only_a_warning() {
        let error = ConfigError::FileNotFound { path: "config.yaml".to_string() };
        assert_eq!(error.severity(), ConfigErrorSeverity::Warning);

        let error = ConfigError::InvalidYaml { message: "bad".to_string() };
        assert_eq!(error.severity(), ConfigErrorSeverity::Fatal);
    }

    #[test]
    fn test_details_point_at_field() {
        let error = ConfigError::InvalidValue {
            field: "backend.base_url".to_string(),
            reason: "'localhost' must start with http:// or https://".to_string(),
        };
        let details = error.to_details();
        assert_eq!(details.field.as_deref(), Some("backend.base_url"));
        assert_eq!(details.suggestions.len(), 1);
        assert!(details.to_string().starts_with("[INVALID_VALUE] Invalid value for backend.base_url"));
    }
}
