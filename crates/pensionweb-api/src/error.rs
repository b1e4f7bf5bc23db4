//! Error types for pensionweb-api

use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use pensionweb_core::flows::FlowError;
use pensionweb_core::error::{DefaultErrorLogger, ErrorContext, ErrorLogger};
use pensionweb_core::{ApiError, ApiErrorKind, CoreError, UserRecord};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PageError {
    #[error("Unauthorized")]
    Unauthorized,

    #[error(transparent)]
    Backend(#[from] ApiError),
}

impl PageError {
    pub fn status(&self) -> StatusCode {
        match self {
            PageError::Unauthorized => StatusCode::UNAUTHORIZED,
            PageError::Backend(e) => match e.kind() {
                ApiErrorKind::NotFound => StatusCode::NOT_FOUND,
                ApiErrorKind::Unauthorized => StatusCode::UNAUTHORIZED,
                ApiErrorKind::Validation | ApiErrorKind::Decode => StatusCode::BAD_GATEWAY,
                ApiErrorKind::Network | ApiErrorKind::Timeout | ApiErrorKind::Server => StatusCode::SERVICE_UNAVAILABLE,
            },
        }
    }
}

/// JSON body `{"error": "..."}` with the matching status; backend failures also carry their code
impl IntoResponse for PageError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            PageError::Backend(e) => {
                let core = CoreError::from(e.clone());
                if status.is_server_error() {
                    DefaultErrorLogger.log_error(&core, &ErrorContext::new("json api"));
                }
                serde_json::json!({ "error": self.to_string(), "code": core.code() })
            }
            _ => serde_json::json!({ "error": self.to_string() }),
        };
        (status, [(axum::http::header::CONTENT_TYPE, "application/json")], body.to_string()).into_response()
    }
}

/// Context of a request made by a signed-in user
pub fn request_context(operation: &str, user: &UserRecord, headers: &HeaderMap) -> ErrorContext {
    let context = ErrorContext::new(operation).with_username(&user.username);
    match crate::session_id(headers) {
        Some(id) => context.with_session(&id),
        None => context,
    }
}

/// Report a failed model flow through the core error logger
pub fn log_flow_failure(error: &FlowError, context: &ErrorContext) {
    DefaultErrorLogger.log_error(&CoreError::from(error.clone()), context);
}

// ==================== Tests ====================
