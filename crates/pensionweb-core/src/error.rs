//! Error types for pensionweb-core
//!
//! `ApiError` is what the backend client returns; its `kind()` is the only
//! thing callers branch on. `CoreError` is the broader domain error with
//! codes, severities and suggestions for rendering and logging.

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ==================== Backend client errors ====================

/// Discriminant of a backend call failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApiErrorKind {
    /// Connection refused, DNS failure, reset
    Network,
    /// No response within the configured timeout
    Timeout,
    /// 404
    NotFound,
    /// 401 or 403
    Unauthorized,
    /// Other 4xx, or a payload that fails validation
    Validation,
    /// 5xx
    Server,
    /// Body is not the expected JSON shape
    Decode,
}

impl std::fmt::Display for ApiErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiErrorKind::Network => write!(f, "network"),
            ApiErrorKind::Timeout => write!(f, "timeout"),
            ApiErrorKind::NotFound => write!(f, "not_found"),
            ApiErrorKind::Unauthorized => write!(f, "unauthorized"),
            ApiErrorKind::Validation => write!(f, "validation"),
            ApiErrorKind::Server => write!(f, "server"),
            ApiErrorKind::Decode => write!(f, "decode"),
        }
    }
}

/// Backend client error
#[derive(Error, Debug, Clone)]
pub enum ApiError {
    #[error("Backend unreachable at {url}: {message}")]
    Network { url: String, message: String },

    #[error("Backend did not answer {url} in time")]
    Timeout { url: String },

    #[error("HTTP error! status: {status} ({url})")]
    Status { status: u16, url: String, body: String },

    #[error("Unexpected response from {url}: {message}")]
    Decode { url: String, message: String },

    #[error("Invalid {entity}: {message}")]
    Validation { entity: String, message: String },
}

impl ApiError {
    /// Classify the failure
    pub fn kind(&self) -> ApiErrorKind {
        match self {
            ApiError::Network { .. } => ApiErrorKind::Network,
            ApiError::Timeout { .. } => ApiErrorKind::Timeout,
            ApiError::Status { status, .. } => match status {
                401 | 403 => ApiErrorKind::Unauthorized,
                404 => ApiErrorKind::NotFound,
                500..=599 => ApiErrorKind::Server,
                _ => ApiErrorKind::Validation,
            },
            ApiError::Decode { .. } => ApiErrorKind::Decode,
            ApiError::Validation { .. } => ApiErrorKind::Validation,
        }
    }

    /// HTTP status, when the backend answered
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether the failure says the backend itself is unavailable
    ///
    /// Only these failures count against the fallback circuit.
    pub fn is_unavailable(&self) -> bool {
        matches!(
            self.kind(),
            ApiErrorKind::Network | ApiErrorKind::Timeout | ApiErrorKind::Server
        )
    }

    /// Build from a reqwest transport error
    pub fn from_transport(url: &str, error: reqwest::Error) -> Self {
        if error.is_timeout() {
            ApiError::Timeout { url: url.to_string() }
        } else if error.is_decode() {
            ApiError::Decode {
                url: url.to_string(),
                message: error.to_string(),
            }
        } else {
            ApiError::Network {
                url: url.to_string(),
                message: error.to_string(),
            }
        }
    }
}

/// Result type for backend calls
pub type ApiResult<T> = Result<T, ApiError>;

// ==================== Core errors ====================

/// Stable code for logs and JSON bodies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    BackendUnavailable,
    NotFound,
    Unauthorized,
    InvalidData,
    InvalidResponse,
    GenerationFailed,
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let code = match self {
            ErrorCode::BackendUnavailable => "BACKEND_UNAVAILABLE",
            ErrorCode::NotFound => "NOT_FOUND",
            ErrorCode::Unauthorized => "UNAUTHORIZED",
            ErrorCode::InvalidData => "INVALID_DATA",
            ErrorCode::InvalidResponse => "INVALID_RESPONSE",
            ErrorCode::GenerationFailed => "GENERATION_FAILED",
        };
        f.write_str(code)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorSeverity {
    Info,
    Warning,
    Error,
}

/// Code, message and operator hints of a `CoreError`
#[derive(Debug, Clone, Serialize)]
pub struct ErrorDetails {
    pub code: ErrorCode,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<ApiErrorKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub suggestions: Vec<String>,
}

impl std::fmt::Display for ErrorDetails {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)?;
        if let Some(status) = self.status {
            write!(f, " (HTTP {})", status)?;
        }
        for suggestion in &self.suggestions {
            write!(f, "; {}", suggestion)?;
        }
        Ok(())
    }
}

/// Failure of a portal operation, from the backend or from a flow
#[derive(Error, Debug)]
pub enum CoreError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("Invalid data: {message}")]
    InvalidData { message: String },

    #[error("Generation failed: {message}")]
    GenerationFailed { message: String },
}

impl CoreError {
    pub fn code(&self) -> ErrorCode {
        match self {
            CoreError::Api(api) => match api.kind() {
                ApiErrorKind::Network | ApiErrorKind::Timeout | ApiErrorKind::Server => {
                    ErrorCode::BackendUnavailable
                }
                ApiErrorKind::NotFound => ErrorCode::NotFound,
                ApiErrorKind::Unauthorized => ErrorCode::Unauthorized,
                ApiErrorKind::Validation => ErrorCode::InvalidData,
                ApiErrorKind::Decode => ErrorCode::InvalidResponse,
            },
            CoreError::InvalidData { .. } => ErrorCode::InvalidData,
            CoreError::GenerationFailed { .. } => ErrorCode::GenerationFailed,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.code() {
            ErrorCode::NotFound => ErrorSeverity::Info,
            ErrorCode::Unauthorized | ErrorCode::InvalidData => ErrorSeverity::Warning,
            ErrorCode::BackendUnavailable | ErrorCode::InvalidResponse | ErrorCode::GenerationFailed => {
                ErrorSeverity::Error
            }
        }
    }

    pub fn to_details(&self) -> ErrorDetails {
        let (kind, status) = match self {
            CoreError::Api(api) => (Some(api.kind()), api.status()),
            _ => (None, None),
        };
        let suggestions = match self.code() {
            ErrorCode::BackendUnavailable => vec![
                "Make sure the Spring Boot backend is running".to_string(),
                "Run pensionweb-diagnose to probe the usual ports".to_string(),
            ],
            ErrorCode::Unauthorized => vec!["Sign in again and retry".to_string()],
            ErrorCode::InvalidResponse => vec!["Check that the backend version matches the portal".to_string()],
            ErrorCode::GenerationFailed => vec!["Check the model API key and provider settings".to_string()],
            ErrorCode::NotFound | ErrorCode::InvalidData => Vec::new(),
        };

        ErrorDetails {
            code: self.code(),
            message: self.to_string(),
            kind,
            status,
            suggestions,
        }
    }
}

/// Error context for reporting
#[derive(Debug, Clone, Default)]
pub struct ErrorContext {
    /// Session id of the request, if any
    pub session_id: Option<String>,
    /// Signed-in user, if any
    pub username: Option<String>,
    /// Operation being performed
    pub operation: String,
}

impl ErrorContext {
    pub fn new(operation: &str) -> Self {
        Self {
            session_id: None,
            username: None,
            operation: operation.to_string(),
        }
    }

    pub fn with_session(mut self, session_id: &str) -> Self {
        self.session_id = Some(session_id.to_string());
        self
    }

    pub fn with_username(mut self, username: &str) -> Self {
        self.username = Some(username.to_string());
        self
    }
}

/// Error logger trait
pub trait ErrorLogger {
    /// Log an error
    fn log_error(&self, error: &CoreError, context: &ErrorContext);
    /// Log a warning
    fn log_warning(&self, message: &str, context: &ErrorContext);
}

/// Default error logger using log crate
#[derive(Default)]
pub struct DefaultErrorLogger;

impl ErrorLogger for DefaultErrorLogger {
    fn log_error(&self, error: &CoreError, context: &ErrorContext) {
        let details = error.to_details();
        match error.severity() {
            ErrorSeverity::Info => log::info!(
                target: "pensionweb::error",
                "[{}] {} - Operation: {} - User: {:?}",
                details.code, details.message, context.operation, context.username
            ),
            ErrorSeverity::Warning => log::warn!(
                target: "pensionweb::error",
                "[{}] {} - Operation: {} - User: {:?}",
                details.code, details.message, context.operation, context.username
            ),
            _ => log::error!(
                target: "pensionweb::error",
                "ERROR {} - Operation: {} - User: {:?} - Session: {:?}",
                details, context.operation, context.username, context.session_id
            ),
        }
    }

    fn log_warning(&self, message: &str, context: &ErrorContext) {
        log::warn!(
            target: "pensionweb::error",
            "WARNING: {} - Operation: {} - User: {:?}",
            message,
            context.operation,
            context.username
        );
    }
}

// ==================== Tests ====================
