//! Company groups partial

use std::collections::HashMap;

use axum::extract::Query;
use pensionweb_core::models::CompanyGroup;
use pensionweb_core::view::distinct_values;
use pensionweb_core::{FilterKey, ListFilter, ViewState};
use pensionweb_utils::{escape_html, format_number};

use crate::components::{empty_state, filter_select, money, render_view, truncation_note};
use crate::AppState;

/// Filtered company group cards (HTMX partial)
pub async fn htmx_groups_list(
    state: axum::extract::State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> axum::response::Html<String> {
    let filter = ListFilter::from_params(&params);
    let view = ViewState::settled(
        state.portal.client().company_groups().list().await,
        &state.config.backend.base_url,
    );
    let page_size = state.config.pagination.records_per_page;
    axum::response::Html(render_view(&view, |groups| render_group_cards(groups, &filter, page_size)))
}

pub fn render_group_cards(groups: &[CompanyGroup], filter: &ListFilter, page_size: usize) -> String {
    let sectors: Vec<(String, String)> = distinct_values(groups, FilterKey::Sector)
        .into_iter()
        .map(|s| (s.clone(), s))
        .collect();
    let sector_filter = format!(
        "<span id='sector-filter' hx-swap-oob='true'>{}</span>",
        filter_select(
            FilterKey::Sector.param(),
            "Tous les secteurs",
            &sectors,
            filter.category_value(FilterKey::Sector),
            "#groups-content",
            "/groups/list"
        )
    );

    let visible = filter.apply(groups);
    if visible.is_empty() {
        return format!("{}{}", empty_state("Aucun groupe trouvé"), sector_filter);
    }

    let cards: String = visible
        .iter()
        .take(page_size)
        .map(|g| {
            format!(
                r#"<div class='bg-white rounded-xl shadow-sm p-6'>
                    <div class='flex justify-between items-start mb-3'>
                        <h3 class='text-lg font-semibold'>{}</h3>
                        <span class='px-2 py-0.5 text-xs rounded-full bg-indigo-50 text-indigo-700'>{}</span>
                    </div>
                    <p class='text-sm text-gray-500'>📍 {}</p>
                    <div class='grid grid-cols-2 gap-4 mt-4'>
                        <div><p class='text-sm text-gray-500'>Membres</p><p class='font-bold'>{}</p></div>
                        <div><p class='text-sm text-gray-500'>Cotisation totale</p><p class='font-bold'>{}</p></div>
                    </div>
                </div>"#,
                escape_html(&g.company_name),
                escape_html(&g.sector),
                escape_html(&g.city),
                format_number(g.member_count),
                money(g.total_contribution)
            )
        })
        .collect();

    format!(
        "<div class='grid grid-cols-1 md:grid-cols-2 lg:grid-cols-3 gap-4'>{}</div>{}{}",
        cards,
        truncation_note(visible.len().min(page_size), visible.len()),
        sector_filter
    )
}

// ==================== Tests ====================

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn group(id: i64, name: &str, sector: &str, city: &str) -> CompanyGroup {
        CompanyGroup {
            id,
            company_name: name.to_string(),
            sector: sector.to_string(),
            member_count: 1200,
            total_contribution: Decimal::from(250_000),
            city: city.to_string(),
        }
    }

    #[test]
    fn test_search_and_sector_are_anded() {
        let groups = vec![
            group(1, "OCP Group", "Industrie", "Casablanca"),
            group(2, "Maroc Telecom", "Télécommunications", "Rabat"),
            group(3, "OCP Services", "Services", "Casablanca"),
        ];
        let filter = ListFilter::new().with_search("ocp").with_category(FilterKey::Sector, "Industrie");
        let html = render_group_cards(&groups, &filter, 50);
        assert!(html.contains("OCP Group"));
        assert!(!html.contains("OCP Services"));
        assert!(!html.contains("Maroc Telecom</h3>"));
        assert!(html.contains("1 200"));
        assert!(html.contains("250 000,00 MAD"));
    }

    #[test]
    fn test_no_match_keeps_sector_filter() {
        let groups = vec![group(1, "OCP Group", "Industrie", "Casablanca")];
        let html = render_group_cards(&groups, &ListFilter::new().with_search("zzz"), 50);
        assert!(html.contains("Aucun groupe trouvé"));
        assert!(html.contains("id='sector-filter' hx-swap-oob='true'"));
    }
}
