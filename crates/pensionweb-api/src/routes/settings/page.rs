//! Settings page rendering - Full page endpoints

use pensionweb_utils::escape_html;

use crate::AppState;

pub async fn page_settings(
    state: axum::extract::State<AppState>,
    headers: axum::http::HeaderMap,
) -> axum::response::Html<String> {
    let config = &state.config;
    let policy = state.portal.policy();

    let usernames: Vec<&str> = config.auth.users.iter().map(|u| u.username.as_str()).collect();

    let inner_content = format!(
        r#"<div class='mb-6'><h2 class='text-2xl font-bold'>Paramètres</h2></div>
        <div class='bg-white rounded-xl shadow-sm p-6 mb-6'>
            <h3 class='text-lg font-semibold mb-4'>Serveur</h3>
            <div class='grid grid-cols-2 gap-4 mb-4'>
                <div><p class='text-sm text-gray-500'>Hôte</p><p class='font-medium'>{}</p></div>
                <div><p class='text-sm text-gray-500'>Port</p><p class='font-medium'>{}</p></div>
                <div><p class='text-sm text-gray-500'>Utilisateurs autorisés</p><p class='font-medium'>{}</p></div>
            </div>
        </div>
        <div class='bg-white rounded-xl shadow-sm p-6 mb-6'>
            <h3 class='text-lg font-semibold mb-4'>Backend</h3>
            <div class='grid grid-cols-2 gap-4 mb-4'>
                <div><p class='text-sm text-gray-500'>URL de l'API</p><p class='font-medium font-mono text-sm'>{}</p></div>
                <div><p class='text-sm text-gray-500'>Délai des requêtes</p><p class='font-medium'>{} ms</p></div>
            </div>
        </div>
        <div class='bg-white rounded-xl shadow-sm p-6 mb-6'>
            <h3 class='text-lg font-semibold mb-4'>Données de démonstration</h3>
            <div class='grid grid-cols-2 gap-4 mb-4'>
                <div><p class='text-sm text-gray-500'>Mode</p><p class='font-medium'>{}</p></div>
                <div><p class='text-sm text-gray-500'>Circuit</p><p class='font-medium'>{}</p></div>
                <div><p class='text-sm text-gray-500'>Seuil d'échecs</p><p class='font-medium'>{}</p></div>
                <div><p class='text-sm text-gray-500'>Délai de réessai</p><p class='font-medium'>{} s</p></div>
            </div>
        </div>
        <div class='bg-white rounded-xl shadow-sm p-6 mb-6'>
            <h3 class='text-lg font-semibold mb-4'>Assistant IA</h3>
            <div class='grid grid-cols-2 gap-4 mb-4'>
                <div><p class='text-sm text-gray-500'>Fournisseur</p><p class='font-medium'>{}</p></div>
                <div><p class='text-sm text-gray-500'>Modèle</p><p class='font-medium'>{}</p></div>
                <div><p class='text-sm text-gray-500'>Moteur actif</p><p class='font-medium'>{}</p></div>
            </div>
        </div>
        <div class='bg-white rounded-xl shadow-sm p-6'>
            <h3 class='text-lg font-semibold mb-4'>Pagination</h3>
            <div><p class='text-sm text-gray-500'>Lignes par page</p><p class='font-medium'>{}</p></div>
        </div>"#,
        escape_html(&config.server.host),
        config.server.port,
        escape_html(&usernames.join(", ")),
        escape_html(&config.backend.base_url),
        config.backend.request_timeout_ms,
        policy.mode(),
        policy.state(),
        config.fallback.failure_threshold,
        config.fallback.cooldown_secs,
        config.llm.provider,
        escape_html(&config.llm.model),
        escape_html(state.flows.name()),
        config.pagination.records_per_page
    );

    axum::response::Html(crate::page_response(&headers, "Paramètres", "/settings", &inner_content))
}
