//! Pensioner partials - list, create, detail, summary

use std::collections::HashMap;
use std::str::FromStr;

use axum::extract::{Path, Query};
use axum::response::{IntoResponse, Response};
use pensionweb_core::flows::{self, RecordSummaryInput};
use pensionweb_core::models::{PaymentMethod, Pensioner};
use pensionweb_core::view::distinct_values;
use pensionweb_core::{FilterKey, ListFilter, PensionerDetail, Sourced, UserRecord, ViewState};
use pensionweb_utils::{escape_html, escape_multiline};
use rust_decimal::Decimal;

use crate::components::{
    display_time, empty_state, error_panel, filter_select, flow_error_panel, money, not_found_panel,
    parse_form, render_view, source_badge, truncation_note,
};
use crate::error::{log_flow_failure, request_context};
use crate::{redirect_to, AppState};

pub const REQUIRED_FIELDS_MESSAGE: &str = "Veuillez remplir tous les champs obligatoires";

// ==================== List ====================

/// Filtered pensioner table (HTMX partial)
pub async fn htmx_pensioners_list(
    state: axum::extract::State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> axum::response::Html<String> {
    let filter = ListFilter::from_params(&params);
    let view = ViewState::settled(
        state.portal.client().pensioners().list().await,
        &state.config.backend.base_url,
    );
    let page_size = state.config.pagination.records_per_page;

    axum::response::Html(render_view(&view, |pensioners| {
        render_pensioner_table(pensioners, &filter, page_size)
    }))
}

pub fn render_pensioner_table(pensioners: &[Pensioner], filter: &ListFilter, page_size: usize) -> String {
    let cities: Vec<(String, String)> = distinct_values(pensioners, FilterKey::City)
        .into_iter()
        .map(|c| (c.clone(), c))
        .collect();
    let city_filter = format!(
        "<span id='city-filter' hx-swap-oob='true'>{}</span>",
        filter_select(
            FilterKey::City.param(),
            "Toutes les villes",
            &cities,
            filter.category_value(FilterKey::City),
            "#pensioners-content",
            "/pensioners/list"
        )
    );

    let visible = filter.apply(pensioners);
    if visible.is_empty() {
        let message = if filter.is_active() {
            "Aucun pensionnaire ne correspond aux filtres"
        } else {
            "Aucun pensionnaire enregistré"
        };
        return format!("{}{}", empty_state(message), city_filter);
    }

    let rows: String = visible
        .iter()
        .take(page_size)
        .map(|p| {
            format!(
                r#"<tr class='border-b hover:bg-gray-50'>
                    <td class='py-2 px-3 text-gray-500'>{}</td>
                    <td class='py-2 px-3'><a href='/pensioners/{}' class='text-indigo-600 hover:underline'>{}</a></td>
                    <td class='py-2 px-3'>{}</td>
                    <td class='py-2 px-3 text-right'>{}</td>
                    <td class='py-2 px-3'>{}</td>
                    <td class='py-2 px-3 text-gray-500'>{}</td>
                </tr>"#,
                p.id_text(),
                p.id_text(),
                escape_html(&p.name),
                escape_html(&p.city),
                money(p.monthly_payment),
                p.payment_method.label(),
                escape_html(p.phone_number.as_deref().unwrap_or("—"))
            )
        })
        .collect();

    format!(
        r#"<table class='w-full text-sm'>
            <thead><tr class='text-left text-gray-500 border-b'><th class='py-2 px-3'>ID</th><th class='py-2 px-3'>Nom</th><th class='py-2 px-3'>Ville</th><th class='py-2 px-3 text-right'>Paiement mensuel</th><th class='py-2 px-3'>Mode</th><th class='py-2 px-3'>Téléphone</th></tr></thead>
            <tbody>{}</tbody>
        </table>{}{}"#,
        rows,
        truncation_note(visible.len().min(page_size), visible.len()),
        city_filter
    )
}

// ==================== Create ====================

/// Build a pensioner from the create form
///
/// Name, city, monthly payment and payment method are required.
pub fn pensioner_from_form(params: &HashMap<String, String>) -> Result<Pensioner, String> {
    let field = |name: &str| params.get(name).map(|v| v.trim().to_string()).unwrap_or_default();
    let optional = |name: &str| Some(field(name)).filter(|v| !v.is_empty());

    let (name, city, amount, method) = (field("name"), field("city"), field("monthly_payment"), field("payment_method"));
    if name.is_empty() || city.is_empty() || amount.is_empty() || method.is_empty() {
        return Err(REQUIRED_FIELDS_MESSAGE.to_string());
    }

    let monthly_payment = Decimal::from_str(&amount.replace(' ', "").replace(',', "."))
        .ok()
        .filter(|v| !v.is_sign_negative())
        .ok_or_else(|| format!("Montant mensuel invalide : {}", amount))?;
    let payment_method = PaymentMethod::from_str(&method)
        .map_err(|_| format!("Mode de paiement invalide : {}", method))?;

    Ok(Pensioner {
        id: None,
        name,
        city,
        monthly_payment,
        payment_method,
        last_payment_date: None,
        birth_date: optional("birth_date"),
        phone_number: optional("phone_number"),
    })
}

fn form_notice(message: &str) -> String {
    format!(
        "<div class='bg-red-50 border border-red-200 rounded-lg p-3 text-sm text-red-700'>{}</div>",
        escape_html(message)
    )
}

/// Create form submission (HTMX)
pub async fn htmx_pensioner_store(
    state: axum::extract::State<AppState>,
    headers: axum::http::HeaderMap,
    body: String,
) -> Response {
    let params = parse_form(&body);
    let pensioner = match pensioner_from_form(&params) {
        Ok(pensioner) => pensioner,
        Err(message) => return axum::response::Html(form_notice(&message)).into_response(),
    };

    match state.portal.client().pensioners().create(&pensioner).await {
        Ok(created) => {
            log::info!("Created pensioner {} ({})", created.id_text(), created.name);
            let location = match created.id {
                Some(id) => format!("/pensioners/{}", id),
                None => "/pensioners".to_string(),
            };
            redirect_to(&headers, &location)
        }
        Err(e) => {
            log::error!("Failed to create pensioner: {}", e);
            let view = pensionweb_core::ViewError::from_api(&e, &state.config.backend.base_url);
            axum::response::Html(error_panel(&view)).into_response()
        }
    }
}

// ==================== Detail ====================

fn detail_not_found() -> String {
    not_found_panel("Pensionnaire introuvable")
}

/// Pensioner record (HTMX partial)
pub async fn htmx_pensioner_detail(
    state: axum::extract::State<AppState>,
    Path(id): Path<String>,
) -> axum::response::Html<String> {
    let Ok(id) = id.parse::<i64>() else {
        return axum::response::Html(detail_not_found());
    };
    let view = ViewState::settled(state.portal.pensioner_detail(id).await, &state.config.backend.base_url);
    if view.error().map_or(false, |e| e.is_not_found()) {
        return axum::response::Html(detail_not_found());
    }
    axum::response::Html(render_view(&view, render_detail))
}

pub fn render_detail(detail: &Sourced<PensionerDetail>) -> String {
    let d = &detail.data;
    let p = &d.pensioner;
    let id = p.id_text();

    let banking = match &d.banking {
        Some(b) => format!(
            r#"<p class='text-sm text-gray-500'>Numéro de compte</p><p class='font-medium mb-2'>{}</p>
            <p class='text-sm text-gray-500'>Titulaire</p><p class='font-medium mb-2'>{}</p>
            <p class='text-sm text-gray-500'>Adresse de la banque</p><p class='font-medium'>{}</p>"#,
            escape_html(&b.account_number),
            escape_html(&b.account_holder_name),
            escape_html(&b.bank_address)
        ),
        None => "<p class='text-gray-500'>Aucune information bancaire disponible</p>".to_string(),
    };

    let operations = if d.operations.is_empty() {
        empty_state("Aucune opération enregistrée")
    } else {
        let rows: String = d
            .operations
            .iter()
            .map(|op| {
                format!(
                    "<tr class='border-b'><td class='py-2 px-3'>{}</td><td class='py-2 px-3'>{}</td><td class='py-2 px-3'>{}</td><td class='py-2 px-3 text-right'>{}</td></tr>",
                    display_time(&op.timestamp),
                    op.operation_type.label(),
                    escape_html(op.description.as_deref().unwrap_or("")),
                    money(op.amount)
                )
            })
            .collect();
        format!(
            "<table class='w-full text-sm'><thead><tr class='text-left text-gray-500 border-b'><th class='py-2 px-3'>Date</th><th class='py-2 px-3'>Type</th><th class='py-2 px-3'>Description</th><th class='py-2 px-3 text-right'>Montant</th></tr></thead><tbody>{}</tbody></table>",
            rows
        )
    };

    let demandes = if d.demandes.is_empty() {
        empty_state("Aucune demande")
    } else {
        d.demandes
            .iter()
            .map(|dm| {
                format!(
                    "<div class='flex justify-between py-2 border-b text-sm'><span>{} · {}</span><span>{}</span><span class='text-gray-500'>{}</span></div>",
                    escape_html(&dm.id),
                    escape_html(&dm.demande_type),
                    dm.status,
                    escape_html(&dm.submission_date)
                )
            })
            .collect()
    };

    format!(
        r#"<div class='mb-4'>{}</div>
        <div class='grid grid-cols-1 lg:grid-cols-2 gap-6 mb-6'>
            <div class='bg-white rounded-xl shadow-sm p-6'>
                <h3 class='text-lg font-semibold mb-4'>{}</h3>
                <p class='text-sm text-gray-500'>Ville</p><p class='font-medium mb-2'>{}</p>
                <p class='text-sm text-gray-500'>Paiement mensuel</p><p class='font-medium mb-2'>{}</p>
                <p class='text-sm text-gray-500'>Mode de paiement</p><p class='font-medium mb-2'>{}</p>
                <p class='text-sm text-gray-500'>Date de naissance</p><p class='font-medium mb-2'>{}</p>
                <p class='text-sm text-gray-500'>Téléphone</p><p class='font-medium mb-2'>{}</p>
                <p class='text-sm text-gray-500'>Dernier paiement</p><p class='font-medium'>{}</p>
            </div>
            <div class='bg-white rounded-xl shadow-sm p-6'>
                <h3 class='text-lg font-semibold mb-4'>Informations bancaires</h3>
                {}
            </div>
        </div>
        <div class='bg-white rounded-xl shadow-sm p-6 mb-6'>
            <div class='flex justify-between items-center mb-4'><h3 class='text-lg font-semibold'>Opérations</h3><span class='text-sm'>Total net : <span class='font-bold'>{}</span></span></div>
            {}
        </div>
        <div class='bg-white rounded-xl shadow-sm p-6 mb-6'>
            <h3 class='text-lg font-semibold mb-4'>Demandes</h3>
            {}
        </div>
        <div class='bg-white rounded-xl shadow-sm p-6'>
            <div class='flex justify-between items-center mb-4'>
                <h3 class='text-lg font-semibold'>Résumé IA</h3>
                <button hx-post='/pensioners/{}/summary' hx-target='#summary-result' class='px-4 py-2 bg-indigo-600 text-white rounded-lg hover:bg-indigo-700'>Générer le résumé <span class='htmx-indicator'>⏳</span></button>
            </div>
            <div id='summary-result' class='text-sm text-gray-700'></div>
        </div>"#,
        source_badge(detail.source),
        escape_html(&p.name),
        escape_html(&p.city),
        money(p.monthly_payment),
        p.payment_method.label(),
        escape_html(p.birth_date.as_deref().unwrap_or("—")),
        escape_html(p.phone_number.as_deref().unwrap_or("—")),
        escape_html(p.last_payment_date.as_deref().unwrap_or("—")),
        banking,
        money(d.net_total),
        operations,
        demandes,
        id
    )
}

/// Record summary from the assistant (HTMX)
///
/// The model's text is always escaped before it reaches the page.
pub async fn htmx_pensioner_summary(
    state: axum::extract::State<AppState>,
    axum::Extension(user): axum::Extension<UserRecord>,
    headers: axum::http::HeaderMap,
    Path(id): Path<String>,
) -> axum::response::Html<String> {
    let Ok(id) = id.parse::<i64>() else {
        return axum::response::Html(detail_not_found());
    };
    let detail = match state.portal.pensioner_detail(id).await {
        Ok(detail) => detail,
        Err(e) => {
            let view = pensionweb_core::ViewError::from_api(&e, &state.config.backend.base_url);
            return axum::response::Html(error_panel(&view));
        }
    };

    let record = match serde_json::to_string(&detail.data.record()) {
        Ok(json) => json,
        Err(e) => {
            log::error!("Failed to serialize record of pensioner {}: {}", id, e);
            return axum::response::Html(empty_state("Résumé indisponible"));
        }
    };
    let input = RecordSummaryInput { pensioner_record: record };

    match flows::generate_record_summary(state.flows.as_ref(), &input).await {
        Ok(output) => axum::response::Html(format!(
            "<div class='bg-indigo-50 rounded-lg p-4'>{}</div>",
            escape_multiline(&output.summary)
        )),
        Err(e) => {
            log_flow_failure(&e, &request_context(&format!("record summary of pensioner {}", id), &user, &headers));
            axum::response::Html(flow_error_panel(&e))
        }
    }
}

// ==================== Tests ====================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::create_router;
    use crate::testing::{admin_cookie, get_with_cookie, post_form, send, spawn_backend, state_for, unreachable_url, CannedBackend};
    use axum::http::StatusCode;
    use axum::routing::get;
    use axum::{Json, Router};
    use pensionweb_config::SourceMode;
    use pensionweb_core::FallbackDataset;
    use serde_json::{json, Value};
    use std::sync::Arc;

    fn form(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn test_form_requires_mandatory_fields() {
        let params = form(&[("name", "Ahmed"), ("city", ""), ("monthly_payment", "3500"), ("payment_method", "CASH")]);
        assert_eq!(pensioner_from_form(&params).unwrap_err(), REQUIRED_FIELDS_MESSAGE);
    }

    #[test]
    fn test_form_builds_pensioner() {
        let params = form(&[
            ("name", " Nadia Chraibi "),
            ("city", "Rabat"),
            ("monthly_payment", "2 750,50"),
            ("payment_method", "DIGITAL_WALLET"),
            ("phone_number", ""),
        ]);
        let p = pensioner_from_form(&params).unwrap();
        assert_eq!(p.name, "Nadia Chraibi");
        assert_eq!(p.monthly_payment, Decimal::from_str("2750.50").unwrap());
        assert_eq!(p.payment_method, PaymentMethod::DigitalWallet);
        assert_eq!(p.phone_number, None);

        let bad = form(&[("name", "A"), ("city", "B"), ("monthly_payment", "beaucoup"), ("payment_method", "CASH")]);
        assert!(pensioner_from_form(&bad).unwrap_err().starts_with("Montant mensuel invalide"));
    }

    #[test]
    fn test_table_filters_and_escapes() {
        let mut pensioners = FallbackDataset::new().pensioners().to_vec();
        pensioners[0].name = "<b>Ahmed</b> Benali".to_string();
        let filter = ListFilter::new().with_category(FilterKey::City, "Casablanca");

        let html = render_pensioner_table(&pensioners, &filter, 50);
        assert!(html.contains("&lt;b&gt;Ahmed&lt;/b&gt; Benali"));
        assert!(html.contains("<option value='Casablanca' selected>"));
        assert!(!html.contains("Rabat</td>"));
    }

    #[test]
    fn test_table_respects_page_size() {
        let pensioners = FallbackDataset::new().pensioners().to_vec();
        let html = render_pensioner_table(&pensioners, &ListFilter::new(), 2);
        assert!(html.contains(&format!("2 affichés sur {} résultats", pensioners.len())));
    }

    #[tokio::test]
    async fn test_list_partial_against_backend() {
        let backend = Router::new().route(
            "/api/pensioners",
            get(|| async {
                Json(json!([
                    { "id": 1, "name": "Youssef Alami", "city": "Rabat", "monthlyPayment": 4200, "paymentMethod": "CHECK", "phoneNumber": "0612345678" },
                    { "id": 2, "name": "Khadija Tazi", "city": "Fès", "monthlyPayment": 2800, "paymentMethod": "CASH" }
                ]))
            }),
        );
        let state = state_for(&spawn_backend(backend).await, SourceMode::Live);
        let cookie = admin_cookie(&state).await;

        let (status, _, body) = send(create_router(state), get_with_cookie("/pensioners/list?q=0612&city=all", &cookie)).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("Youssef Alami"));
        assert!(!body.contains("Khadija Tazi"));
    }

    #[tokio::test]
    async fn test_store_posts_to_backend() {
        let backend = Router::new().route(
            "/api/pensioners",
            axum::routing::post(|Json(mut body): Json<Value>| async move {
                body["id"] = json!(77);
                Json(body)
            }),
        );
        let state = state_for(&spawn_backend(backend).await, SourceMode::Live);
        let cookie = admin_cookie(&state).await;

        let request = post_form(
            "/pensioners/new",
            Some(&cookie),
            "name=Omar+Fassi&city=Tanger&monthly_payment=3100&payment_method=BANK_TRANSFER",
        );
        let (status, headers, _) = send(create_router(state), request).await;
        assert_eq!(status, StatusCode::SEE_OTHER);
        assert_eq!(headers.get(axum::http::header::LOCATION).unwrap(), "/pensioners/77");
    }

    #[tokio::test]
    async fn test_store_rejects_incomplete_form() {
        let state = state_for(&unreachable_url().await, SourceMode::Live);
        let cookie = admin_cookie(&state).await;
        let (_, _, body) = send(create_router(state), post_form("/pensioners/new", Some(&cookie), "name=Omar")).await;
        assert!(body.contains(REQUIRED_FIELDS_MESSAGE));
    }

    #[tokio::test]
    async fn test_detail_from_fallback_dataset() {
        let state = state_for(&unreachable_url().await, SourceMode::Fallback);
        let cookie = admin_cookie(&state).await;
        let (_, _, body) = send(create_router(state), get_with_cookie("/pensioners/1001/detail", &cookie)).await;
        assert!(body.contains("Ahmed Benali"));
        assert!(body.contains("Casablanca"));
        assert!(body.contains("Aucune information bancaire disponible"));
        assert!(body.contains("Données de démonstration"));
    }

    #[tokio::test]
    async fn test_detail_unknown_id() {
        let state = state_for(&unreachable_url().await, SourceMode::Fallback);
        let cookie = admin_cookie(&state).await;
        let router = create_router(state);
        let (_, _, body) = send(router.clone(), get_with_cookie("/pensioners/424242/detail", &cookie)).await;
        assert!(body.contains("Pensionnaire introuvable"));
        let (_, _, body) = send(router, get_with_cookie("/pensioners/abc/detail", &cookie)).await;
        assert!(body.contains("Pensionnaire introuvable"));
    }

    #[tokio::test]
    async fn test_summary_is_escaped() {
        let mut state = state_for(&unreachable_url().await, SourceMode::Fallback);
        state.flows = Arc::new(CannedBackend(json!({ "summary": "<script>alert(1)</script> Pensionnaire régulier" })));
        let cookie = admin_cookie(&state).await;

        let (_, _, body) = send(create_router(state), post_form("/pensioners/1001/summary", Some(&cookie), "")).await;
        assert!(body.contains("&lt;script&gt;alert(1)&lt;/script&gt; Pensionnaire régulier"));
        assert!(!body.contains("<script>"));
    }
}
