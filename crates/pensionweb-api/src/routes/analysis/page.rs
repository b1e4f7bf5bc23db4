//! Analysis page rendering

use chrono::{Duration, Local};
use pensionweb_core::flows::{AnalysisType, ReportFormat};

use crate::{page_response, AppState};

/// Days covered by the default period
const DEFAULT_PERIOD_DAYS: i64 = 30;

pub async fn page_analysis(
    _state: axum::extract::State<AppState>,
    headers: axum::http::HeaderMap,
) -> axum::response::Html<String> {
    let today = Local::now().date_naive();
    let from = today - Duration::days(DEFAULT_PERIOD_DAYS);

    let type_options: String = AnalysisType::ALL
        .iter()
        .map(|t| format!("<option value='{}'>{}</option>", t, t.label()))
        .collect();
    let format_options: String = ReportFormat::ALL
        .iter()
        .map(|f| format!("<option value='{}'>{}</option>", f, f))
        .collect();

    let inner_content = format!(
        r#"<div class='mb-6'><h2 class='text-2xl font-bold'>Analyse IA</h2><p class='text-gray-500'>Analyse des données de pension par l'assistant</p></div>
        <div class='bg-white rounded-xl shadow-sm p-6 mb-6'>
            <h3 class='text-lg font-semibold mb-4'>1. Période</h3>
            <form hx-post='/analysis/data' hx-target='#analysis-data' hx-swap='outerHTML' class='flex flex-wrap items-end gap-4'>
                <div><label class='block text-sm text-gray-500 mb-1'>Du</label><input type='date' name='from' value='{}' class='px-3 py-2 border rounded-lg'></div>
                <div><label class='block text-sm text-gray-500 mb-1'>Au</label><input type='date' name='to' value='{}' class='px-3 py-2 border rounded-lg'></div>
                <button type='submit' class='px-4 py-2 bg-gray-800 text-white rounded-lg'>Charger les données <span class='htmx-indicator'>⏳</span></button>
            </form>
        </div>
        <div class='bg-white rounded-xl shadow-sm p-6 mb-6'>
            <h3 class='text-lg font-semibold mb-4'>2. Analyse</h3>
            <form hx-post='/analysis/run' hx-target='#analysis-result' class='space-y-4'>
                <textarea id='analysis-data' name='pension_data' rows='10' placeholder='[{{"id": 1001, "name": "...", "operations": [...]}}]' class='w-full px-3 py-2 border rounded-lg font-mono text-xs'></textarea>
                <div class='flex flex-wrap gap-4'>
                    <div><label class='block text-sm text-gray-500 mb-1'>Type d'analyse</label><select name='analysis_type' class='px-3 py-2 border rounded-lg'>{}</select></div>
                    <div><label class='block text-sm text-gray-500 mb-1'>Format du rapport</label><select name='report_format' class='px-3 py-2 border rounded-lg'>{}</select></div>
                </div>
                <button type='submit' class='px-4 py-2 bg-indigo-600 text-white rounded-lg hover:bg-indigo-700'>Lancer l'analyse <span class='htmx-indicator'>⏳</span></button>
            </form>
        </div>
        <div id='analysis-result'></div>"#,
        from.format("%Y-%m-%d"),
        today.format("%Y-%m-%d"),
        type_options,
        format_options
    );

    axum::response::Html(page_response(&headers, "Analyse IA", "/analysis", &inner_content))
}
