//! Refunds page rendering

use crate::{page_response, AppState};

pub async fn page_refunds(
    _state: axum::extract::State<AppState>,
    headers: axum::http::HeaderMap,
) -> axum::response::Html<String> {
    let inner_content = r#"<div class='mb-6'><h2 class='text-2xl font-bold'>Remboursements</h2><p class='text-gray-500'>Déductions et trop-perçus récupérés</p></div>
        <form class='flex gap-2 mb-4' onsubmit='return false'>
            <input type='search' name='q' placeholder='Rechercher par pensionnaire ou description...'
                hx-get='/refunds/list' hx-target='#refunds-content' hx-trigger='keyup changed delay:300ms, search'
                class='flex-1 px-4 py-2 border rounded-lg'>
        </form>
        <div id='refunds-content' hx-get='/refunds/list' hx-trigger='load' class='bg-white rounded-xl shadow-sm p-6'>
            <p class='text-center text-gray-500'>⏳ Chargement des données...</p>
        </div>"#;

    axum::response::Html(page_response(&headers, "Remboursements", "/refunds", inner_content))
}
