//! Member pages rendering

use crate::{page_response, AppState};

fn list_page(title: &str, subtitle: &str, placeholder: &str, url: &str, target: &str, extra_filters: &str) -> String {
    format!(
        r#"<div class='mb-6'><h2 class='text-2xl font-bold'>{}</h2><p class='text-gray-500'>{}</p></div>
        <form class='flex flex-wrap gap-2 mb-4' onsubmit='return false'>
            <input type='search' name='q' placeholder='{}'
                hx-get='{}' hx-target='#{}' hx-trigger='keyup changed delay:300ms, search' hx-include='closest form'
                class='flex-1 px-4 py-2 border rounded-lg'>
            {}
        </form>
        <div id='{}' hx-get='{}' hx-trigger='load' class='bg-white rounded-xl shadow-sm p-6'>
            <p class='text-center text-gray-500'>⏳ Chargement des données...</p>
        </div>"#,
        title, subtitle, placeholder, url, target, extra_filters, target, url
    )
}

pub async fn page_affilies(
    _state: axum::extract::State<AppState>,
    headers: axum::http::HeaderMap,
) -> axum::response::Html<String> {
    let status_filter = "<select name='status' hx-get='/affilies/list' hx-target='#affilies-content' hx-trigger='change' hx-include='closest form' class='px-3 py-2 border rounded-lg text-sm'><option value='all'>Tous les statuts</option><option value='actif'>Actifs</option><option value='inactif'>Inactifs</option></select>";
    let inner_content = list_page(
        "Affiliés",
        "Membres cotisants rattachés aux adhérents",
        "Rechercher par matricule ou nom...",
        "/affilies/list",
        "affilies-content",
        status_filter,
    );
    axum::response::Html(page_response(&headers, "Affiliés", "/affilies", &inner_content))
}

pub async fn page_allocataires(
    _state: axum::extract::State<AppState>,
    headers: axum::http::HeaderMap,
) -> axum::response::Html<String> {
    let inner_content = list_page(
        "Allocataires",
        "Bénéficiaires rattachés aux affiliés",
        "Rechercher par numéro de dossier ou nom...",
        "/allocataires/list",
        "allocataires-content",
        "",
    );
    axum::response::Html(page_response(&headers, "Allocataires", "/allocataires", &inner_content))
}
