//! Company groups page rendering

use crate::{page_response, AppState};

pub async fn page_groups(
    _state: axum::extract::State<AppState>,
    headers: axum::http::HeaderMap,
) -> axum::response::Html<String> {
    let inner_content = r#"<div class='mb-6'><h2 class='text-2xl font-bold'>Groupes d'entreprises</h2><p class='text-gray-500'>Entreprises affiliées et leurs cotisations</p></div>
        <form class='flex flex-wrap gap-2 mb-4' onsubmit='return false'>
            <input type='search' name='q' placeholder='Rechercher une entreprise...'
                hx-get='/groups/list' hx-target='#groups-content' hx-trigger='keyup changed delay:300ms, search' hx-include='closest form'
                class='flex-1 px-4 py-2 border rounded-lg'>
            <span id='sector-filter'></span>
        </form>
        <div id='groups-content' hx-get='/groups/list' hx-trigger='load'>
            <p class='text-center text-gray-500'>⏳ Chargement des données...</p>
        </div>"#;

    axum::response::Html(page_response(&headers, "Groupes", "/groups", inner_content))
}
