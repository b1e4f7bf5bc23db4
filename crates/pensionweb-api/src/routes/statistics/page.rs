//! Statistics page rendering

use crate::components::lazy_section;
use crate::routes::chat::chat_window;
use crate::{page_response, AppState};

pub async fn page_statistics(
    _state: axum::extract::State<AppState>,
    headers: axum::http::HeaderMap,
) -> axum::response::Html<String> {
    let inner_content = format!(
        r#"<div class='mb-6'><h2 class='text-2xl font-bold'>Statistiques</h2><p class='text-gray-500'>Répartition des pensionnaires et des paiements</p></div>
        <div class='mb-6'>{}</div>
        {}"#,
        lazy_section("statistics-summary", "/statistics/summary"),
        chat_window("Posez vos questions sur les statistiques")
    );

    axum::response::Html(page_response(&headers, "Statistiques", "/statistics", &inner_content))
}
