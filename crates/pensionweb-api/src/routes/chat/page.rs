//! Chat window rendering

use pensionweb_core::flows::{ChatMessage, ChatRole, CHAT_GREETING, CHAT_SUGGESTIONS};
use pensionweb_utils::{escape_html, escape_multiline};

fn bubble(role: ChatRole, content: &str) -> String {
    let (align, colors) = match role {
        ChatRole::User => ("justify-end", "bg-indigo-600 text-white"),
        ChatRole::Assistant => ("justify-start", "bg-gray-100 text-gray-800"),
    };
    format!(
        "<div class='flex {}'><div class='max-w-lg px-4 py-2 rounded-lg text-sm {}'>{}</div></div>",
        align,
        colors,
        escape_multiline(content)
    )
}

fn suggestion_buttons<S: AsRef<str>>(questions: &[S]) -> String {
    questions
        .iter()
        .map(|q| {
            let vals = serde_json::json!({ "message": q.as_ref() }).to_string();
            format!(
                "<button type='button' hx-post='/chat' hx-vals='{}' hx-include='#chat-history' hx-target='#chat-log' hx-swap='beforeend' class='px-3 py-1 text-xs rounded-full bg-indigo-50 text-indigo-700 hover:bg-indigo-100'>{}</button>",
                escape_html(&vals),
                escape_html(q.as_ref())
            )
        })
        .collect()
}

/// History field; `oob` marks it for an out-of-band swap
fn history_input(history: &[ChatMessage], oob: bool) -> String {
    let json = serde_json::to_string(history).unwrap_or_else(|_| "[]".to_string());
    format!(
        "<input type='hidden' id='chat-history' name='history' value='{}'{}>",
        escape_html(&json),
        if oob { " hx-swap-oob='true'" } else { "" }
    )
}

/// Assistant window: greeting, suggested questions, message form
pub fn chat_window(title: &str) -> String {
    format!(
        r#"<div class='bg-white rounded-xl shadow-sm p-6 mb-6'>
    <h3 class='text-lg font-semibold mb-4'>🤖 {}</h3>
    <div id='chat-log' class='space-y-3 max-h-96 overflow-auto mb-4'>{}</div>
    <div id='chat-suggestions' class='flex flex-wrap gap-2 mb-4'>{}</div>
    <form hx-post='/chat' hx-target='#chat-log' hx-swap='beforeend' hx-on::after-request='this.reset()' class='flex gap-2'>
        {}
        <input type='text' name='message' required placeholder='Posez une question sur les données de pension...' class='flex-1 px-4 py-2 border rounded-lg'>
        <button type='submit' class='px-4 py-2 bg-indigo-600 text-white rounded-lg hover:bg-indigo-700'>Envoyer <span class='htmx-indicator'>⏳</span></button>
    </form>
</div>"#,
        escape_html(title),
        bubble(ChatRole::Assistant, CHAT_GREETING),
        suggestion_buttons(&CHAT_SUGGESTIONS[..]),
        history_input(&[], false)
    )
}

/// One exchange appended to the log
///
/// `history` is the conversation including this exchange; `None` leaves the
/// stored history untouched.
pub fn render_turn(user_message: &str, reply: &str, suggestions: &[String], history: Option<&[ChatMessage]>) -> String {
    let mut html = bubble(ChatRole::User, user_message);
    html.push_str(&bubble(ChatRole::Assistant, reply));
    if let Some(history) = history {
        html.push_str(&history_input(history, true));
    }
    if !suggestions.is_empty() {
        html.push_str(&format!(
            "<div id='chat-suggestions' hx-swap-oob='true' class='flex flex-wrap gap-2 mb-4'>{}</div>",
            suggestion_buttons(suggestions)
        ));
    }
    html
}

// ==================== Tests ====================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_shows_greeting_and_suggestions() {
        let html = chat_window("Assistant");
        assert!(html.contains("Bonjour"));
        for question in CHAT_SUGGESTIONS {
            assert!(html.contains(&escape_html(question)));
        }
        assert!(html.contains("id='chat-history' name='history' value='[]'"));
    }

    #[test]
    fn test_turn_escapes_model_output() {
        let html = render_turn("salut", "<img src=x onerror=alert(1)>", &[], None);
        assert!(!html.contains("<img"));
        assert!(html.contains("&lt;img"));
        assert!(!html.contains("hx-swap-oob"));
    }

    #[test]
    fn test_turn_refreshes_history() {
        let history = vec![ChatMessage { role: ChatRole::User, content: "l'âge".to_string() }];
        let html = render_turn("l'âge", "ok", &["Et ensuite ?".to_string()], Some(&history));
        assert!(html.contains("id='chat-history' name='history' value='[{&quot;role&quot;:&quot;user&quot;"));
        assert!(html.contains("l&#x27;âge"));
        assert!(html.contains("<div id='chat-suggestions' hx-swap-oob='true'"));
    }
}
