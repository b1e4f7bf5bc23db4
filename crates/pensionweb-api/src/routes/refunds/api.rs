//! Refunds partial

use std::collections::HashMap;

use axum::extract::Query;
use pensionweb_core::models::{Operation, Pensioner};
use pensionweb_core::stats::{self, Refund};
use pensionweb_core::{ListFilter, ViewState};
use pensionweb_utils::escape_html;
use rust_decimal::Decimal;

use crate::components::{display_time, empty_state, money, render_view};
use crate::AppState;

/// Filtered deductions (HTMX partial)
pub async fn htmx_refunds_list(
    state: axum::extract::State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> axum::response::Html<String> {
    let filter = ListFilter::from_params(&params);
    let operations = state.portal.client().operations();
    let pensioners = state.portal.client().pensioners();
    let (operations, pensioners) = tokio::join!(operations.list(), pensioners.list());

    // Pensioner names are optional decoration; only the operations are required
    let pensioners = pensioners.unwrap_or_else(|e| {
        log::warn!("Pensioners unavailable for refunds view: {}", e);
        Vec::new()
    });
    let view = ViewState::settled(
        operations.map(|ops| refunds_matching(&ops, &pensioners, &filter)),
        &state.config.backend.base_url,
    );
    axum::response::Html(render_view(&view, |rows| render_refunds(rows)))
}

/// Deductions whose operation or pensioner matches the search
pub fn refunds_matching(operations: &[Operation], pensioners: &[Pensioner], filter: &ListFilter) -> Vec<Refund> {
    let term = filter.search.trim().to_lowercase();
    stats::refunds(operations, pensioners)
        .into_iter()
        .filter(|r| {
            term.is_empty()
                || filter.matches(&r.operation)
                || r.pensioner.as_ref().map_or(false, |p| p.name.to_lowercase().contains(&term))
        })
        .collect()
}

pub fn render_refunds(refunds: &[Refund]) -> String {
    if refunds.is_empty() {
        return empty_state("Aucun remboursement");
    }
    let total: Decimal = refunds.iter().map(|r| r.operation.amount).sum();

    let rows: String = refunds
        .iter()
        .map(|r| {
            let who = match &r.pensioner {
                Some(p) => format!("<a href='/pensioners/{}' class='text-indigo-600 hover:underline'>{}</a>", p.id_text(), escape_html(&p.name)),
                None => "<span class='text-gray-400'>Inconnu</span>".to_string(),
            };
            format!(
                "<tr class='border-b'><td class='py-2 px-3'>{}</td><td class='py-2 px-3'>{}</td><td class='py-2 px-3'>{}</td><td class='py-2 px-3 text-right text-red-600'>-{}</td></tr>",
                display_time(&r.operation.timestamp),
                who,
                escape_html(r.operation.description.as_deref().unwrap_or("")),
                money(r.operation.amount)
            )
        })
        .collect();

    format!(
        r#"<div class='flex justify-between mb-4'><p class='text-sm text-gray-500'>{} remboursement(s)</p><p class='text-sm'>Total : <span class='font-bold text-red-600'>{}</span></p></div>
        <table class='w-full text-sm'><thead><tr class='text-left text-gray-500 border-b'><th class='py-2 px-3'>Date</th><th class='py-2 px-3'>Pensionnaire</th><th class='py-2 px-3'>Motif</th><th class='py-2 px-3 text-right'>Montant</th></tr></thead><tbody>{}</tbody></table>"#,
        refunds.len(),
        money(total),
        rows
    )
}

// ==================== Tests ====================

#[cfg(test)]
mod tests {
    use super::*;
    use pensionweb_core::FallbackDataset;

    #[test]
    fn test_only_deductions_are_listed() {
        let dataset = FallbackDataset::new();
        let rows = refunds_matching(&dataset.recent_operations(5), dataset.pensioners(), &ListFilter::new());
        assert_eq!(rows.len(), 1);
        let html = render_refunds(&rows);
        assert!(html.contains("Correction - Trop-perçu"));
        assert!(html.contains("Aicha Benjelloun"));
        assert!(html.contains("-150,00 MAD"));
    }

    #[test]
    fn test_search_by_pensioner_name() {
        let dataset = FallbackDataset::new();
        let ops = dataset.recent_operations(5);
        let hit = refunds_matching(&ops, dataset.pensioners(), &ListFilter::new().with_search("benjelloun"));
        assert_eq!(hit.len(), 1);
        let miss = refunds_matching(&ops, dataset.pensioners(), &ListFilter::new().with_search("benali"));
        assert!(miss.is_empty());
        assert!(render_refunds(&miss).contains("Aucun remboursement"));
    }
}
