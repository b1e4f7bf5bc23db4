//! Chat endpoint - one conversation turn

use pensionweb_core::flows::{self, ChatInput, ChatMessage, ChatRole, CHAT_FAILURE_REPLY};
use pensionweb_core::{stats, UserRecord};
use serde_json::{json, Value};

use super::page::render_turn;
use crate::components::{flow_error_panel, parse_form};
use crate::error::{log_flow_failure, request_context};
use crate::AppState;

/// Pensioners shown to the model alongside the summary
const CONTEXT_SAMPLE: usize = 10;

/// JSON slice of the portal data the assistant answers from
pub async fn chat_context(state: &AppState) -> Value {
    match state.portal.client().pensioners().list().await {
        Ok(pensioners) => json!({
            "totalPensioners": pensioners.len(),
            "pensioners": pensioners.iter().take(CONTEXT_SAMPLE).collect::<Vec<_>>(),
            "summary": stats::summarize(&pensioners, &[]),
        }),
        Err(e) => {
            log::warn!("Chat context unavailable: {}", e);
            json!({ "error": "Données non disponibles" })
        }
    }
}

/// Answer one message (HTMX)
pub async fn htmx_chat(
    state: axum::extract::State<AppState>,
    axum::Extension(user): axum::Extension<UserRecord>,
    headers: axum::http::HeaderMap,
    body: String,
) -> axum::response::Html<String> {
    let params = parse_form(&body);
    let message = params.get("message").cloned().unwrap_or_default();
    let mut history = match flows::parse_history(params.get("history").map(String::as_str).unwrap_or("")) {
        Ok(history) => history,
        Err(e) => return axum::response::Html(flow_error_panel(&e)),
    };

    let input = ChatInput {
        pension_data: chat_context(&state).await.to_string(),
        user_message: message.clone(),
        conversation_history: history.clone(),
    };

    match flows::chat_about_pensions(state.flows.as_ref(), &input).await {
        Ok(output) => {
            history.push(ChatMessage { role: ChatRole::User, content: message.clone() });
            history.push(ChatMessage { role: ChatRole::Assistant, content: output.reply.clone() });
            axum::response::Html(render_turn(&message, &output.reply, &output.suggested_questions, Some(&history)))
        }
        Err(e) if e.is_input_error() => axum::response::Html(flow_error_panel(&e)),
        Err(e) => {
            log_flow_failure(&e, &request_context("chat", &user, &headers));
            axum::response::Html(render_turn(&message, CHAT_FAILURE_REPLY, &[], None))
        }
    }
}

// ==================== Tests ====================

#[cfg(test)]
mod tests {
    use crate::create_router;
    use crate::testing::{admin_cookie, post_form, send, state_for, unreachable_url, CannedBackend};
    use axum::http::StatusCode;
    use pensionweb_config::SourceMode;
    use pensionweb_core::flows::CHAT_FAILURE_REPLY;
    use serde_json::json;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_chat_turn_with_canned_model() {
        let mut state = state_for(&unreachable_url().await, SourceMode::Auto);
        state.flows = Arc::new(CannedBackend(json!({
            "reply": "Il y a <b>5</b> pensionnaires.",
            "suggestedQuestions": ["Et par ville ?"]
        })));
        let cookie = admin_cookie(&state).await;

        let request = post_form("/chat", Some(&cookie), "message=Combien+%3F&history=");
        let (status, _, body) = send(create_router(state), request).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("Il y a &lt;b&gt;5&lt;/b&gt; pensionnaires."));
        assert!(body.contains("Combien ?"));
        assert!(body.contains("hx-swap-oob='true'"));
        assert!(body.contains("Et par ville ?"));
    }

    #[tokio::test]
    async fn test_chat_failure_keeps_history() {
        let state = state_for(&unreachable_url().await, SourceMode::Auto);
        let cookie = admin_cookie(&state).await;

        let request = post_form("/chat", Some(&cookie), "message=Bonjour&history=%5B%5D");
        let (_, _, body) = send(create_router(state), request).await;
        assert!(body.contains(&pensionweb_utils::escape_html(CHAT_FAILURE_REPLY)));
        assert!(!body.contains("chat-history"));
    }

    #[tokio::test]
    async fn test_chat_rejects_empty_message() {
        let mut state = state_for(&unreachable_url().await, SourceMode::Auto);
        state.flows = Arc::new(CannedBackend(json!({ "reply": "never" })));
        let cookie = admin_cookie(&state).await;

        let (_, _, body) = send(create_router(state), post_form("/chat", Some(&cookie), "message=+&history=")).await;
        assert!(body.contains("Données d'entrée invalides"));
        assert!(!body.contains("never"));
    }
}
