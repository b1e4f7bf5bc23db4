//! Settings API endpoints - JSON API

use axum::Json;
use serde_json::{json, Value};

use crate::AppState;

/// Effective configuration with passwords left out
pub async fn api_settings(state: axum::extract::State<AppState>) -> Json<Value> {
    let config = &state.config;
    let users: Vec<Value> = config
        .auth
        .users
        .iter()
        .map(|u| json!({ "username": u.username, "roles": u.roles }))
        .collect();

    Json(json!({
        "server": config.server,
        "backend": config.backend,
        "fallback": {
            "mode": config.fallback.mode,
            "failure_threshold": config.fallback.failure_threshold,
            "cooldown_secs": config.fallback.cooldown_secs,
            "circuit": state.portal.policy().state(),
        },
        "auth": { "users": users },
        "llm": config.llm,
        "flows_backend": state.flows.name(),
        "logging": config.logging,
        "pagination": config.pagination,
    }))
}

// ==================== Tests ====================

#[cfg(test)]
mod tests {
    use crate::create_router;
    use crate::testing::{admin_cookie, get_with_cookie, send, state_for};
    use axum::http::StatusCode;
    use pensionweb_config::SourceMode;

    #[tokio::test]
    async fn test_settings_json_hides_passwords() {
        let state = state_for("http://127.0.0.1:9/api", SourceMode::Fallback);
        let cookie = admin_cookie(&state).await;
        let (status, _, body) = send(create_router(state), get_with_cookie("/api/settings", &cookie)).await;
        assert_eq!(status, StatusCode::OK);

        let value: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(value["backend"]["base_url"], "http://127.0.0.1:9/api");
        assert_eq!(value["fallback"]["mode"], "fallback");
        assert_eq!(value["flows_backend"], "disabled");
        assert_eq!(value["auth"]["users"][0]["username"], "admin");
        assert!(!body.contains("admin123"));
        assert!(!body.contains("password"));
    }

    #[tokio::test]
    async fn test_settings_page_shows_backend() {
        let state = state_for("http://127.0.0.1:9/api", SourceMode::Fallback);
        let cookie = admin_cookie(&state).await;
        let (_, _, body) = send(create_router(state), get_with_cookie("/settings", &cookie)).await;
        assert!(body.contains("http://127.0.0.1:9/api"));
        assert!(body.contains("fallback"));
        assert!(!body.contains("admin123"));
    }
}
