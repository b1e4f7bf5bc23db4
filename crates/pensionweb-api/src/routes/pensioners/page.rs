//! Pensioner pages rendering - Full page endpoints

use axum::extract::Path;
use pensionweb_core::models::PaymentMethod;
use pensionweb_utils::escape_html;

use crate::components::{filter_select, lazy_section};
use crate::{page_response, AppState};

/// Pensioner list page
pub async fn page_pensioners(
    _state: axum::extract::State<AppState>,
    headers: axum::http::HeaderMap,
) -> axum::response::Html<String> {
    let methods: Vec<(String, String)> = PaymentMethod::ALL
        .iter()
        .map(|m| (m.to_string(), m.label().to_string()))
        .collect();

    let inner_content = format!(
        r#"<div class='mb-6 flex justify-between items-center'>
            <div><h2 class='text-2xl font-bold'>Pensionnaires</h2><p class='text-gray-500'>Gestion des pensionnaires et de leurs paiements</p></div>
            <a href='/pensioners/new' class='px-4 py-2 bg-indigo-600 text-white rounded-lg hover:bg-indigo-700'>+ Nouveau pensionnaire</a>
        </div>
        <form id='pensioner-filters' class='flex flex-wrap gap-2 mb-4' onsubmit='return false'>
            <input type='search' name='q' placeholder='Rechercher par nom, identifiant ou téléphone...'
                hx-get='/pensioners/list' hx-target='#pensioners-content' hx-trigger='keyup changed delay:300ms, search' hx-include='closest form'
                class='flex-1 px-4 py-2 border rounded-lg'>
            <span id='city-filter'></span>
            {}
        </form>
        <div id='pensioners-content' hx-get='/pensioners/list' hx-trigger='load' class='bg-white rounded-xl shadow-sm p-6'>
            <p class='text-center text-gray-500'>⏳ Chargement des données...</p>
        </div>"#,
        filter_select("method", "Tous les modes", &methods, "all", "#pensioners-content", "/pensioners/list")
    );

    axum::response::Html(page_response(&headers, "Pensionnaires", "/pensioners", &inner_content))
}

/// Create form page
pub async fn page_pensioner_create(headers: axum::http::HeaderMap) -> axum::response::Html<String> {
    let method_options: String = PaymentMethod::ALL
        .iter()
        .map(|m| format!("<option value='{}'>{}</option>", m, m.label()))
        .collect();

    let inner_content = format!(
        r#"<div class='mb-6'><a href='/pensioners' class='text-sm text-indigo-600'>← Retour à la liste</a><h2 class='text-2xl font-bold'>Nouveau pensionnaire</h2></div>
        <div class='bg-white rounded-xl shadow-sm p-6 max-w-2xl'>
            <form hx-post='/pensioners/new' hx-target='#form-result' class='space-y-4'>
                <div><label class='block text-sm font-medium mb-1'>Nom complet *</label><input type='text' name='name' class='w-full px-3 py-2 border rounded-lg'></div>
                <div><label class='block text-sm font-medium mb-1'>Ville *</label><input type='text' name='city' class='w-full px-3 py-2 border rounded-lg'></div>
                <div><label class='block text-sm font-medium mb-1'>Paiement mensuel (MAD) *</label><input type='text' inputmode='decimal' name='monthly_payment' class='w-full px-3 py-2 border rounded-lg'></div>
                <div><label class='block text-sm font-medium mb-1'>Mode de paiement *</label><select name='payment_method' class='w-full px-3 py-2 border rounded-lg'><option value=''>Sélectionner...</option>{}</select></div>
                <div><label class='block text-sm font-medium mb-1'>Date de naissance</label><input type='date' name='birth_date' class='w-full px-3 py-2 border rounded-lg'></div>
                <div><label class='block text-sm font-medium mb-1'>Téléphone</label><input type='tel' name='phone_number' class='w-full px-3 py-2 border rounded-lg'></div>
                <div id='form-result'></div>
                <button type='submit' class='px-4 py-2 bg-indigo-600 text-white rounded-lg hover:bg-indigo-700'>Enregistrer <span class='htmx-indicator'>⏳</span></button>
            </form>
        </div>"#,
        method_options
    );

    axum::response::Html(page_response(&headers, "Nouveau pensionnaire", "/pensioners", &inner_content))
}

/// Detail page shell; the record loads through `/pensioners/:id/detail`
pub async fn page_pensioner_detail(
    Path(id): Path<String>,
    headers: axum::http::HeaderMap,
) -> axum::response::Html<String> {
    let id = urlencoding::encode(&id).into_owned();
    let inner_content = format!(
        r#"<div class='mb-6'><a href='/pensioners' class='text-sm text-indigo-600'>← Retour à la liste</a><h2 class='text-2xl font-bold'>Pensionnaire #{}</h2></div>
        {}"#,
        escape_html(&id),
        lazy_section("pensioner-detail", &format!("/pensioners/{}/detail", id))
    );

    axum::response::Html(page_response(&headers, "Détail du pensionnaire", "/pensioners", &inner_content))
}
