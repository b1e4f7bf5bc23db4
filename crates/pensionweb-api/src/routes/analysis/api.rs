//! Analysis endpoints - data loading and flow execution

use chrono::NaiveDate;
use pensionweb_core::flows::{self, AnalysisInput};
use pensionweb_core::stats;
use pensionweb_core::{UserRecord, ViewError};
use pensionweb_utils::{escape_html, escape_multiline};

use crate::components::{error_panel, flow_error_panel, parse_form};
use crate::error::{log_flow_failure, request_context};
use crate::AppState;

/// Inclusive `[from, to]` from `YYYY-MM-DD` fields
pub fn parse_period(from: &str, to: &str) -> Result<(NaiveDate, NaiveDate), String> {
    let parse = |value: &str| {
        NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|_| format!("Date invalide : {}", value))
    };
    let (from, to) = (parse(from)?, parse(to)?);
    if from > to {
        return Err("La date de début doit précéder la date de fin".to_string());
    }
    Ok((from, to))
}

fn data_textarea(content: &str, notice: &str) -> String {
    format!(
        "<div id='analysis-data'><textarea name='pension_data' rows='10' class='w-full px-3 py-2 border rounded-lg font-mono text-xs'>{}</textarea>{}</div>",
        escape_html(content),
        notice
    )
}

/// Load operations in the period as analysis input (HTMX)
pub async fn htmx_analysis_data(
    state: axum::extract::State<AppState>,
    body: String,
) -> axum::response::Html<String> {
    let params = parse_form(&body);
    let field = |name: &str| params.get(name).map(String::as_str).unwrap_or("");
    let (from, to) = match parse_period(field("from"), field("to")) {
        Ok(period) => period,
        Err(message) => {
            let notice = format!("<p class='text-sm text-red-600 mt-2'>{}</p>", escape_html(&message));
            return axum::response::Html(data_textarea("", &notice));
        }
    };

    let pensioners = state.portal.client().pensioners();
    let operations = state.portal.client().operations();
    let (pensioners, operations) = tokio::join!(pensioners.list(), operations.list());
    let sliced = match pensioners.and_then(|p| operations.map(|o| stats::slice_by_date(&p, &o, from, to))) {
        Ok(sliced) => sliced,
        Err(e) => {
            let view = ViewError::from_api(&e, &state.config.backend.base_url);
            return axum::response::Html(format!("<div id='analysis-data'>{}</div>", error_panel(&view)));
        }
    };

    let json = serde_json::to_string_pretty(&sliced).unwrap_or_else(|_| "[]".to_string());
    let notice = format!(
        "<p class='text-sm text-gray-500 mt-2'>{} pensionnaire(s) avec des opérations entre le {} et le {}</p>",
        sliced.len(),
        from.format("%d/%m/%Y"),
        to.format("%d/%m/%Y")
    );
    axum::response::Html(data_textarea(&json, &notice))
}

/// Run the analysis flow on the submitted data (HTMX)
pub async fn htmx_analysis_run(
    state: axum::extract::State<AppState>,
    axum::Extension(user): axum::Extension<UserRecord>,
    headers: axum::http::HeaderMap,
    body: String,
) -> axum::response::Html<String> {
    let params = parse_form(&body);
    let field = |name: &str| params.get(name).cloned().unwrap_or_default();
    let input = AnalysisInput {
        pension_data: field("pension_data"),
        analysis_type: field("analysis_type"),
        report_format: field("report_format"),
    };

    match flows::analyze_pension_data(state.flows.as_ref(), &input).await {
        Ok(output) => axum::response::Html(format!(
            r#"<div class='bg-white rounded-xl shadow-sm p-6'>
                <h3 class='text-lg font-semibold mb-2'>Résumé</h3>
                <p class='text-sm text-gray-700 mb-4'>{}</p>
                <h3 class='text-lg font-semibold mb-2'>Rapport</h3>
                <pre class='bg-gray-50 rounded-lg p-4 text-xs overflow-auto whitespace-pre-wrap'>{}</pre>
            </div>"#,
            escape_multiline(&output.summary),
            escape_html(&output.report)
        )),
        Err(e) => {
            log_flow_failure(&e, &request_context("analysis", &user, &headers));
            axum::response::Html(flow_error_panel(&e))
        }
    }
}

// ==================== Tests ====================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::create_router;
    use crate::testing::{admin_cookie, post_form, send, spawn_backend, state_for, unreachable_url, CannedBackend};
    use axum::routing::get;
    use axum::{Json, Router};
    use pensionweb_config::SourceMode;
    use serde_json::json;
    use std::sync::Arc;

    #[test]
    fn test_parse_period() {
        let (from, to) = parse_period("2024-01-01", "2024-01-31").unwrap();
        assert_eq!(from, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        assert_eq!(to, NaiveDate::from_ymd_opt(2024, 1, 31).unwrap());
        assert!(parse_period("2024-02-01", "2024-01-01").is_err());
        assert!(parse_period("demain", "2024-01-01").is_err());
    }

    #[tokio::test]
    async fn test_data_slices_operations_by_period() {
        let backend = Router::new()
            .route(
                "/api/pensioners",
                get(|| async {
                    Json(json!([
                        { "id": 1, "name": "Youssef Alami", "city": "Rabat", "monthlyPayment": 4200, "paymentMethod": "CHECK" },
                        { "id": 2, "name": "Khadija Tazi", "city": "Fès", "monthlyPayment": 2800, "paymentMethod": "CASH" }
                    ]))
                }),
            )
            .route(
                "/api/operations",
                get(|| async {
                    Json(json!([
                        { "id": 10, "pensionerId": 1, "amount": 4200, "type": "PAYMENT", "timestamp": "2024-01-15T10:00:00" },
                        { "id": 11, "pensionerId": 2, "amount": 2800, "type": "PAYMENT", "timestamp": "2024-03-15T10:00:00" }
                    ]))
                }),
            );
        let state = state_for(&spawn_backend(backend).await, SourceMode::Live);
        let cookie = admin_cookie(&state).await;

        let request = post_form("/analysis/data", Some(&cookie), "from=2024-01-01&to=2024-01-31");
        let (_, _, body) = send(create_router(state), request).await;
        assert!(body.contains("Youssef Alami"));
        assert!(!body.contains("Khadija Tazi"));
        assert!(body.contains("1 pensionnaire(s)"));
    }

    #[tokio::test]
    async fn test_run_rejects_bad_data_before_calling_model() {
        let mut state = state_for(&unreachable_url().await, SourceMode::Auto);
        state.flows = Arc::new(CannedBackend(json!({ "report": "r", "summary": "s" })));
        let cookie = admin_cookie(&state).await;

        let request = post_form(
            "/analysis/run",
            Some(&cookie),
            "pension_data=not+json&analysis_type=trend+identification&report_format=text",
        );
        let (_, _, body) = send(create_router(state), request).await;
        assert!(body.contains("Données d'entrée invalides"));
    }

    #[tokio::test]
    async fn test_run_renders_escaped_report() {
        let mut state = state_for(&unreachable_url().await, SourceMode::Auto);
        state.flows = Arc::new(CannedBackend(json!({ "report": "ville,total\n<Rabat>,1", "summary": "Stable" })));
        let cookie = admin_cookie(&state).await;

        let data = urlencoding::encode(r#"[{"id":1,"name":"Youssef Alami","city":"Rabat","monthlyPayment":4200,"paymentMethod":"CHECK","operations":[]}]"#).into_owned();
        let body = format!("pension_data={}&analysis_type=data+comparison&report_format=CSV", data);
        let (_, _, body) = send(create_router(state), post_form("/analysis/run", Some(&cookie), &body)).await;
        assert!(body.contains("Stable"));
        assert!(body.contains("&lt;Rabat&gt;,1"));
    }
}
