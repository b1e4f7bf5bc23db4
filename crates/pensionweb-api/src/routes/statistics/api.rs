//! Statistics partial

use pensionweb_core::stats::{self, StatisticsSummary};
use pensionweb_core::ViewState;
use pensionweb_utils::{escape_html, format_number};

use crate::components::{money, render_view};
use crate::AppState;

/// Aggregates over the full pensioner and operation lists (HTMX partial)
pub async fn htmx_statistics(state: axum::extract::State<AppState>) -> axum::response::Html<String> {
    let pensioners = state.portal.client().pensioners();
    let operations = state.portal.client().operations();
    let (pensioners, operations) = tokio::join!(pensioners.list(), operations.list());

    let summary = pensioners.and_then(|p| operations.map(|o| stats::summarize(&p, &o)));
    let view = ViewState::settled(summary, &state.config.backend.base_url);
    axum::response::Html(render_view(&view, render_statistics))
}

fn share_bars(rows: &[(String, usize)], total: usize) -> String {
    rows.iter()
        .map(|(label, count)| {
            let percent = if total == 0 { 0 } else { count * 100 / total };
            format!(
                r#"<div class='mb-2'>
                    <div class='flex justify-between text-sm'><span>{}</span><span class='text-gray-500'>{} ({}%)</span></div>
                    <div class='bg-gray-100 rounded h-2'><div class='bg-indigo-500 h-2 rounded' style='width: {}%'></div></div>
                </div>"#,
                label,
                format_number(count),
                percent,
                percent
            )
        })
        .collect()
}

pub fn render_statistics(summary: &StatisticsSummary) -> String {
    let cities: Vec<(String, usize)> = summary
        .by_city
        .iter()
        .map(|(city, n)| (escape_html(city), *n))
        .collect();
    let methods: Vec<(String, usize)> = summary
        .by_payment_method
        .iter()
        .map(|(method, n)| (method.label().to_string(), *n))
        .collect();

    format!(
        r#"<div class='grid grid-cols-1 md:grid-cols-2 lg:grid-cols-4 gap-4 mb-6'>
            <div class='bg-indigo-50 p-4 rounded-lg border border-indigo-200'><p class='text-sm text-indigo-600'>Pensionnaires</p><p class='text-2xl font-bold text-indigo-700'>{}</p></div>
            <div class='bg-green-50 p-4 rounded-lg border border-green-200'><p class='text-sm text-green-600'>Opérations</p><p class='text-2xl font-bold text-green-700'>{}</p></div>
            <div class='bg-blue-50 p-4 rounded-lg border border-blue-200'><p class='text-sm text-blue-600'>Total mensuel</p><p class='text-2xl font-bold text-blue-700'>{}</p></div>
            <div class='bg-yellow-50 p-4 rounded-lg border border-yellow-200'><p class='text-sm text-yellow-600'>Pension moyenne</p><p class='text-2xl font-bold text-yellow-700'>{}</p></div>
        </div>
        <div class='grid grid-cols-1 lg:grid-cols-2 gap-6'>
            <div class='bg-white rounded-xl shadow-sm p-6'><h3 class='text-lg font-semibold mb-4'>Par ville</h3>{}</div>
            <div class='bg-white rounded-xl shadow-sm p-6'><h3 class='text-lg font-semibold mb-4'>Par mode de paiement</h3>{}</div>
        </div>"#,
        format_number(summary.total_pensioners),
        format_number(summary.total_operations),
        money(summary.total_monthly_payments),
        money(summary.average_monthly_payment),
        share_bars(&cities, summary.total_pensioners),
        share_bars(&methods, summary.total_pensioners)
    )
}

// ==================== Tests ====================

#[cfg(test)]
mod tests {
    use super::*;
    use pensionweb_core::FallbackDataset;

    #[test]
    fn test_statistics_over_dataset() {
        let dataset = FallbackDataset::new();
        let summary = stats::summarize(dataset.pensioners(), &dataset.recent_operations(5));
        let html = render_statistics(&summary);
        // 3500 + 2800 + 4200 + 3100 + 3900
        assert!(html.contains("17 500,00 MAD"));
        assert!(html.contains("3 500,00 MAD"));
        assert!(html.contains("Virement Bancaire"));
        assert!(html.contains("3 (60%)"));
    }
}
