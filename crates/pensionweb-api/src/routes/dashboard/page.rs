//! Dashboard page rendering

use crate::components::lazy_section;
use crate::routes::chat::chat_window;
use crate::{page_response, AppState};

/// Dashboard page; every widget loads through its own partial
pub async fn page_dashboard(
    _state: axum::extract::State<AppState>,
    headers: axum::http::HeaderMap,
) -> axum::response::Html<String> {
    let inner_content = format!(
        r#"<div class='mb-6'><h2 class='text-2xl font-bold'>Tableau de bord</h2><p class='text-gray-500'>Vue d'ensemble des pensionnaires et des opérations</p></div>
        <div class='mb-6'>{}</div>
        <div class='grid grid-cols-1 lg:grid-cols-2 gap-6 mb-6'>
            <div class='bg-white rounded-xl shadow-sm p-6'>
                <h3 class='text-lg font-semibold mb-4'>Paiements mensuels</h3>
                {}
            </div>
            <div class='bg-white rounded-xl shadow-sm p-6'>
                <h3 class='text-lg font-semibold mb-4'>Activité récente</h3>
                {}
            </div>
        </div>
        {}"#,
        lazy_section("dashboard-stats", "/dashboard/stats"),
        lazy_section("dashboard-payments", "/dashboard/payments"),
        lazy_section("dashboard-recent", "/dashboard/recent"),
        chat_window("Assistant IA des pensions")
    );

    axum::response::Html(page_response(&headers, "Tableau de bord", "/dashboard", &inner_content))
}
