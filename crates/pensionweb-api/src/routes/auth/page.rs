//! Login and session debug pages

use axum::response::{IntoResponse, Response};
use pensionweb_core::UserRecord;
use pensionweb_utils::escape_html;

use crate::{base_html, page_response, redirect_to, session_id, AppState};

/// Standalone login form, with an optional error above it
pub fn login_form(error: Option<&str>, username: &str) -> String {
    let error_html = error
        .map(|e| format!("<div class='bg-red-50 border border-red-200 text-red-700 text-sm rounded-lg p-3 mb-4'>{}</div>", escape_html(e)))
        .unwrap_or_default();

    base_html(
        "Connexion",
        &format!(
            r#"<div class='min-h-screen flex items-center justify-center'>
    <div class='bg-white rounded-xl shadow-sm p-8 w-full max-w-sm'>
        <h1 class='text-2xl font-bold text-indigo-600 mb-1'>Portail CIMR</h1>
        <p class='text-gray-500 mb-6'>Connectez-vous pour continuer</p>
        {}
        <form method='post' action='/login' class='space-y-4'>
            <div><label class='block text-sm text-gray-500 mb-1'>Nom d'utilisateur</label><input type='text' name='username' value='{}' required class='w-full px-3 py-2 border rounded-lg'></div>
            <div><label class='block text-sm text-gray-500 mb-1'>Mot de passe</label><input type='password' name='password' required class='w-full px-3 py-2 border rounded-lg'></div>
            <button type='submit' class='w-full px-4 py-2 bg-indigo-600 text-white rounded-lg hover:bg-indigo-700'>Se connecter</button>
        </form>
    </div>
</div>"#,
            error_html,
            escape_html(username)
        ),
    )
}

pub async fn page_login(
    state: axum::extract::State<AppState>,
    headers: axum::http::HeaderMap,
) -> Response {
    if let Some(id) = session_id(&headers) {
        if state.sessions.current_user(&id).await.is_some() {
            return redirect_to(&headers, "/");
        }
    }
    axum::response::Html(login_form(None, "")).into_response()
}

/// Authentication state and raw session storage
pub async fn page_debug(
    state: axum::extract::State<AppState>,
    headers: axum::http::HeaderMap,
    axum::Extension(user): axum::Extension<UserRecord>,
) -> axum::response::Html<String> {
    let entries = match session_id(&headers) {
        Some(id) => state.sessions.entries(&id).await,
        None => Vec::new(),
    };

    let rows: String = entries
        .iter()
        .map(|(key, value)| {
            format!(
                "<tr class='border-b'><td class='py-2 pr-4 font-mono text-sm'>{}</td><td class='py-2 font-mono text-xs text-gray-600 break-all'>{}</td></tr>",
                escape_html(key),
                escape_html(value)
            )
        })
        .collect();

    let inner_content = format!(
        r#"<div class='mb-6'><h2 class='text-2xl font-bold'>Session</h2><p class='text-gray-500'>État d'authentification et stockage de session</p></div>
        <div class='bg-white rounded-xl shadow-sm p-6 mb-6'>
            <dl class='grid grid-cols-2 gap-4'>
                <div><dt class='text-sm text-gray-500'>Authentifié</dt><dd class='font-medium'>✅ Oui</dd></div>
                <div><dt class='text-sm text-gray-500'>Utilisateur</dt><dd class='font-medium'>{}</dd></div>
                <div><dt class='text-sm text-gray-500'>Rôles</dt><dd class='font-medium'>{}</dd></div>
                <div><dt class='text-sm text-gray-500'>Administrateur</dt><dd class='font-medium'>{}</dd></div>
            </dl>
        </div>
        <div class='bg-white rounded-xl shadow-sm p-6'>
            <h3 class='text-lg font-semibold mb-4'>Stockage</h3>
            <table class='w-full'><thead><tr class='text-left text-sm text-gray-500 border-b'><th class='py-2'>Clé</th><th class='py-2'>Valeur</th></tr></thead><tbody>{}</tbody></table>
        </div>"#,
        escape_html(&user.username),
        escape_html(&user.roles.join(", ")),
        if user.is_admin() { "Oui" } else { "Non" },
        rows
    );

    axum::response::Html(page_response(&headers, "Session", "/debug", &inner_content))
}
