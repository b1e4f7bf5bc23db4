//! Sign-in and sign-out handlers

use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::Json;
use pensionweb_core::UserRecord;

use super::page::login_form;
use crate::components::parse_form;
use crate::{redirect_to, session_cookie, session_id, AppState};

/// Check the submitted credentials and open a session
pub async fn htmx_login(
    state: axum::extract::State<AppState>,
    headers: axum::http::HeaderMap,
    body: String,
) -> Response {
    let params = parse_form(&body);
    let username = params.get("username").map(String::as_str).unwrap_or("");
    let password = params.get("password").map(String::as_str).unwrap_or("");

    let (id, result) = state.sessions.login(username, password).await;

    match id {
        Some(id) if result.success => {
            // A cookie sent before sign-in is never promoted to an authenticated session
            if let Some(previous) = session_id(&headers) {
                state.sessions.logout(&previous).await;
            }
            let mut response = redirect_to(&headers, "/");
            if let Ok(value) = session_cookie(&id).parse() {
                response.headers_mut().insert(header::SET_COOKIE, value);
            }
            response
        }
        _ => {
            let error = result.error.as_deref();
            axum::response::Html(login_form(error, username)).into_response()
        }
    }
}

/// Close the session and clear its cookie
pub async fn logout(
    state: axum::extract::State<AppState>,
    headers: axum::http::HeaderMap,
) -> Response {
    if let Some(id) = session_id(&headers) {
        state.sessions.logout(&id).await;
    }
    let mut response = redirect_to(&headers, "/login");
    if let Ok(value) = session_cookie("").parse() {
        response.headers_mut().insert(header::SET_COOKIE, value);
    }
    response
}

/// Current user (JSON API)
pub async fn api_session(axum::Extension(user): axum::Extension<UserRecord>) -> Json<UserRecord> {
    Json(user)
}

// ==================== Tests ====================

#[cfg(test)]
mod tests {
    use crate::create_router;
    use crate::testing::{admin_cookie, get_with_cookie, post_form, send, state_for};
    use axum::http::{header, StatusCode};
    use pensionweb_config::SourceMode;
    use pensionweb_core::session::INVALID_CREDENTIALS;

    fn state() -> crate::AppState {
        state_for("http://127.0.0.1:9/api", SourceMode::Fallback)
    }

    #[tokio::test]
    async fn test_login_sets_cookie_and_redirects() {
        let state = state();
        let request = post_form("/login", None, "username=admin&password=admin123");
        let (status, headers, _) = send(create_router(state.clone()), request).await;
        assert_eq!(status, StatusCode::SEE_OTHER);
        assert_eq!(headers.get(header::LOCATION).unwrap(), "/");

        let cookie = headers.get(header::SET_COOKIE).unwrap().to_str().unwrap();
        assert!(cookie.starts_with("pensionweb_sid="));
        let pair = cookie.split(';').next().unwrap().to_string();
        let (status, _, body) = send(create_router(state), get_with_cookie("/api/session", &pair)).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("\"username\":\"admin\""));
    }

    #[tokio::test]
    async fn test_login_ignores_cookie_sent_before_sign_in() {
        let state = state();
        let planted = "pensionweb_sid=planted-before-login";
        let request = post_form("/login", Some(planted), "username=admin&password=admin123");
        let (_, headers, _) = send(create_router(state.clone()), request).await;

        let cookie = headers.get(header::SET_COOKIE).unwrap().to_str().unwrap();
        assert!(!cookie.contains("planted-before-login"));

        let (status, _, _) = send(create_router(state), get_with_cookie("/api/session", planted)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_bad_login_shows_error() {
        let request = post_form("/login", None, "username=admin&password=wrong");
        let (status, headers, body) = send(create_router(state()), request).await;
        assert_eq!(status, StatusCode::OK);
        assert!(headers.get(header::SET_COOKIE).is_none());
        assert!(body.contains(&pensionweb_utils::escape_html(INVALID_CREDENTIALS)));
        assert!(body.contains("value='admin'"));
    }

    #[tokio::test]
    async fn test_logout_ends_session() {
        let state = state();
        let cookie = admin_cookie(&state).await;
        let (status, headers, _) = send(create_router(state.clone()), post_form("/logout", Some(&cookie), "")).await;
        assert_eq!(status, StatusCode::SEE_OTHER);
        assert!(headers.get(header::SET_COOKIE).unwrap().to_str().unwrap().contains("Max-Age=0"));

        let (status, _, _) = send(create_router(state), get_with_cookie("/api/session", &cookie)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_debug_page_lists_session() {
        let state = state();
        let cookie = admin_cookie(&state).await;
        let (status, _, body) = send(create_router(state), get_with_cookie("/debug", &cookie)).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("admin"));
        assert!(body.contains("Stockage"));
    }

    #[tokio::test]
    async fn test_login_page_redirects_signed_in_user() {
        let state = state();
        let cookie = admin_cookie(&state).await;
        let (status, headers, _) = send(create_router(state), get_with_cookie("/login", &cookie)).await;
        assert_eq!(status, StatusCode::SEE_OTHER);
        assert_eq!(headers.get(header::LOCATION).unwrap(), "/");
    }
}
