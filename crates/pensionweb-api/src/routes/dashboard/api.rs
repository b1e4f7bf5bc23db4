//! Dashboard widgets - JSON API and HTMX partials

use axum::Json;
use pensionweb_core::models::{DashboardStats, MonthlyPayment, Operation};
use pensionweb_core::stats::RECENT_ACTIVITY_LIMIT;
use pensionweb_core::{Sourced, ViewState};
use pensionweb_utils::{escape_html, format_number};
use rust_decimal::Decimal;

use crate::components::{display_time, empty_state, method_label, money, render_view, source_badge};
use crate::error::PageError;
use crate::AppState;

/// Dashboard figures (JSON API), tagged with their source
pub async fn api_dashboard_stats(
    state: axum::extract::State<AppState>,
) -> Result<Json<Sourced<DashboardStats>>, PageError> {
    Ok(Json(state.portal.dashboard_stats().await?))
}

/// Headline cards (HTMX partial)
pub async fn htmx_dashboard_stats(state: axum::extract::State<AppState>) -> axum::response::Html<String> {
    let view = ViewState::settled(state.portal.dashboard_stats().await, &state.config.backend.base_url);
    axum::response::Html(render_view(&view, render_stats_cards))
}

pub fn render_stats_cards(stats: &Sourced<DashboardStats>) -> String {
    let data = &stats.data;
    let breakdown = |rows: &[(String, u64)], label: &dyn Fn(&str) -> String| -> String {
        rows.iter()
            .map(|(name, count)| {
                format!(
                    "<div class='flex justify-between py-1 border-b text-sm'><span>{}</span><span class='font-medium'>{}</span></div>",
                    label(name),
                    format_number(count)
                )
            })
            .collect()
    };

    format!(
        r#"<div class='flex items-center mb-3'><span class='text-sm text-gray-500'>Statistiques générales</span>{}</div>
        <div class='grid grid-cols-1 md:grid-cols-2 lg:grid-cols-4 gap-4'>
            <div class='bg-indigo-50 p-4 rounded-lg border border-indigo-200'><p class='text-sm text-indigo-600'>Pensionnaires</p><p class='text-2xl font-bold text-indigo-700'>{}</p></div>
            <div class='bg-green-50 p-4 rounded-lg border border-green-200'><p class='text-sm text-green-600'>Opérations</p><p class='text-2xl font-bold text-green-700'>{}</p></div>
            <div class='bg-white p-4 rounded-lg border'><p class='text-sm text-gray-600 mb-2'>Par ville</p>{}</div>
            <div class='bg-white p-4 rounded-lg border'><p class='text-sm text-gray-600 mb-2'>Par mode de paiement</p>{}</div>
        </div>"#,
        source_badge(stats.source),
        format_number(data.total_pensioners),
        format_number(data.total_operations),
        breakdown(&data.pensioners_by_city, &|city: &str| escape_html(city)),
        breakdown(&data.pensioners_by_payment_method, &|code: &str| method_label(code)),
    )
}

/// Monthly payments chart (HTMX partial)
pub async fn htmx_dashboard_payments(state: axum::extract::State<AppState>) -> axum::response::Html<String> {
    axum::response::Html(render_payments_chart(&state.portal.monthly_payments()))
}

pub fn render_payments_chart(payments: &Sourced<Vec<MonthlyPayment>>) -> String {
    if payments.data.is_empty() {
        return empty_state("Aucun paiement enregistré");
    }
    let max = payments
        .data
        .iter()
        .map(|p| p.amount)
        .max()
        .unwrap_or(Decimal::ZERO);

    let mut html = format!("<div class='mb-2'>{}</div><div class='space-y-2'>", source_badge(payments.source));
    for payment in &payments.data {
        let percent = if max > Decimal::ZERO {
            (payment.amount * Decimal::from(100) / max).round()
        } else {
            Decimal::ZERO
        };
        html.push_str(&format!(
            r#"<div class='flex items-center gap-2 text-sm'>
                <span class='w-12 text-gray-500'>{}</span>
                <div class='flex-1 bg-gray-100 rounded h-4'><div class='bg-indigo-500 h-4 rounded' style='width: {}%'></div></div>
                <span class='w-32 text-right font-medium'>{}</span>
            </div>"#,
            escape_html(&payment.month),
            percent,
            money(payment.amount)
        ));
    }
    html.push_str("</div>");
    html
}

/// Recent operations (HTMX partial)
pub async fn htmx_dashboard_recent(state: axum::extract::State<AppState>) -> axum::response::Html<String> {
    let view = ViewState::settled(
        state.portal.recent_operations(RECENT_ACTIVITY_LIMIT).await,
        &state.config.backend.base_url,
    );
    axum::response::Html(render_view(&view, render_recent_activity))
}

pub fn render_recent_activity(operations: &Sourced<Vec<Operation>>) -> String {
    if operations.data.is_empty() {
        return empty_state("Aucune activité récente");
    }
    let mut html = format!("<div class='mb-2'>{}</div><ul class='divide-y'>", source_badge(operations.source));
    for op in &operations.data {
        let who = op
            .pensioner
            .as_ref()
            .map(|p| escape_html(&p.name))
            .unwrap_or_else(|| op.owner_id().map(|id| format!("Pensionnaire #{}", id)).unwrap_or_default());
        html.push_str(&format!(
            r#"<li class='py-2 flex justify-between text-sm'>
                <div><p class='font-medium'>{} · {}</p><p class='text-gray-500'>{}</p></div>
                <div class='text-right'><p class='font-medium'>{}</p><p class='text-gray-500'>{}</p></div>
            </li>"#,
            op.operation_type.label(),
            who,
            escape_html(op.description.as_deref().unwrap_or("")),
            money(op.amount),
            display_time(&op.timestamp)
        ));
    }
    html.push_str("</ul>");
    html
}

// ==================== Tests ====================
